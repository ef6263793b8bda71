//! Stub generation end to end, for a project using directive defaults and
//! one configured through `sphinx-asdf.toml`.

use std::fs;
use std::path::Path;

use sphinx_asdf::{AsdfConfig, SchemaDocBuilder};
use tempfile::TempDir;

const INDEX: &str = "\
Schemas
=======

.. asdf-autoschemas::

   foo
   bar
   core/baz
";

fn write_schema(root: &Path, schema_root: &str, name: &str, title: &str) {
    let path = root.join(schema_root).join(format!("{}.yaml", name));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        format!("title: {}\ntype: object\nproperties:\n  value:\n    type: number\n", title),
    )
    .unwrap();
}

fn project(schema_root: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.rst"), INDEX).unwrap();
    for (name, title) in [("foo", "Foo"), ("bar", "Bar"), ("core/baz", "Baz")] {
        write_schema(dir.path(), schema_root, name, title);
    }
    dir
}

fn assert_stub(root: &Path, relative: &str, schema_root: &str, name: &str) {
    let stub = root.join("generated").join(relative);
    assert!(stub.exists(), "missing {}", stub.display());
    let expected = format!(".. asdf-schema::\n    :schema_root: {}\n\n    {}\n", schema_root, name);
    assert!(fs::read_to_string(stub).unwrap().contains(&expected));
}

#[tokio::test]
async fn test_basic_generation() {
    let dir = project("schemas");
    let root = dir.path();
    let config = AsdfConfig::load(root, None).unwrap();
    let builder = SchemaDocBuilder::new(config, root.to_path_buf(), root.join("_build")).unwrap();

    let stats = builder.build().await.unwrap();
    assert_eq!(stats.stubs_written, 3);
    assert_eq!(stats.errors, 0, "{:?}", stats.error_details);

    assert_stub(root, "foo.rst", "schemas", "foo");
    assert_stub(root, "bar.rst", "schemas", "bar");
    assert_stub(root, "core/baz.rst", "schemas", "core/baz");
    assert!(root.join("_build/generated/core/baz.html").exists());
}

#[tokio::test]
async fn test_generation_global_config() {
    let dir = project("a/b/c/schemas");
    let root = dir.path();
    fs::write(root.join("sphinx-asdf.toml"), "schema_path = \"a/b/c/schemas\"\n").unwrap();
    let config = AsdfConfig::load(root, None).unwrap();
    assert_eq!(config.schema_path, "a/b/c/schemas");
    let builder = SchemaDocBuilder::new(config, root.to_path_buf(), root.join("_build")).unwrap();

    let stats = builder.build().await.unwrap();
    assert_eq!(stats.errors, 0, "{:?}", stats.error_details);

    assert_stub(root, "foo.rst", "a/b/c/schemas", "foo");
    assert_stub(root, "bar.rst", "a/b/c/schemas", "bar");
    assert_stub(root, "core/baz.rst", "a/b/c/schemas", "core/baz");
}

#[tokio::test]
async fn test_rebuild_keeps_edited_stub() {
    let dir = project("schemas");
    let root = dir.path();
    let builder =
        SchemaDocBuilder::new(AsdfConfig::default(), root.to_path_buf(), root.join("_build")).unwrap();
    builder.build().await.unwrap();

    let stub = root.join("generated/foo.rst");
    let edited = fs::read_to_string(&stub).unwrap().replace("foo\n===", "Foo schema\n==========");
    fs::write(&stub, &edited).unwrap();

    let stats = builder.build().await.unwrap();
    assert_eq!(stats.stubs_written, 0);
    assert_eq!(fs::read_to_string(&stub).unwrap(), edited);
}
