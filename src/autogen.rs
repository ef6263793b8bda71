//! Discovery of `asdf-autoschemas` entries and generation of stub pages.
//!
//! Every schema listed by an `asdf-autoschemas` directive gets a stub at
//! `generated/<prefix>/<name>.rst` containing a label, a title and an
//! `asdf-schema` directive. Existing stubs are left untouched.

use indexmap::IndexSet;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AsdfConfig;
use crate::directives::{
    scan_directives, AutoschemasDirective, AutoschemasOutput, DirectiveMode, SchemaDef,
    AUTOSCHEMAS_DIRECTIVE, GENERATED_DIR,
};
use crate::error::Result;

/// Read each source and collect the schemas its `asdf-autoschemas`
/// directives name, without duplicates and in first-seen order.
pub fn discover_schema_defs(sources: &[PathBuf], config: &AsdfConfig) -> Result<Vec<SchemaDef>> {
    let mut defs = IndexSet::new();

    for source in sources {
        if source.extension().is_some_and(|ext| ext == "md") {
            debug!("Skipping Markdown source {}", source.display());
            continue;
        }
        let text = fs::read_to_string(source)?;
        let file = source.to_string_lossy();
        for directive in scan_directives(&text, &file)
            .iter()
            .filter(|d| d.name == AUTOSCHEMAS_DIRECTIVE)
        {
            if let AutoschemasOutput::Definitions(found) =
                AutoschemasDirective::from_parsed(directive).run(DirectiveMode::Discovery, config)
            {
                defs.extend(found);
            }
        }
    }

    Ok(defs.into_iter().collect())
}

pub fn stub_path(srcdir: &Path, def: &SchemaDef) -> PathBuf {
    let mut path = srcdir.join(GENERATED_DIR);
    if !def.standard_prefix.is_empty() {
        path.push(&def.standard_prefix);
    }
    path.push(format!("{}.rst", def.name));
    path
}

/// reST text of a stub page.
pub fn stub_contents(def: &SchemaDef) -> String {
    let label = if def.standard_prefix.is_empty() {
        def.name.clone()
    } else {
        format!("{}/{}", def.standard_prefix, def.name)
    };

    let mut text = format!(".. _{}:\n\n", label);
    text.push_str(&def.name);
    text.push('\n');
    text.push_str(&"=".repeat(def.name.chars().count()));
    text.push_str("\n\n.. asdf-schema::\n");
    if !def.standard_prefix.is_empty() {
        text.push_str(&format!("    :standard_prefix: {}\n", def.standard_prefix));
    }
    text.push_str(&format!("    :schema_root: {}\n\n", def.schema_root));
    text.push_str(&format!("    {}\n", def.name));
    text
}

/// Write stubs that do not exist yet and return their paths.
pub fn write_stubs(srcdir: &Path, defs: &[SchemaDef]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for def in defs {
        let path = stub_path(srcdir, def);
        if path.exists() {
            debug!("Keeping existing stub {}", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, stub_contents(def))?;
        written.push(path);
    }

    if !written.is_empty() {
        info!("Generated {} schema stub(s)", written.len());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn def(name: &str, prefix: &str) -> SchemaDef {
        SchemaDef {
            name: name.into(),
            standard_prefix: prefix.into(),
            schema_root: "schemas".into(),
        }
    }

    #[test]
    fn test_stub_contents_without_prefix() {
        let text = stub_contents(&def("foo", ""));
        assert!(text.starts_with(".. _foo:\n\nfoo\n===\n\n"));
        assert!(text.contains(".. asdf-schema::\n    :schema_root: schemas\n\n    foo\n"));
        assert!(!text.contains(":standard_prefix:"));
    }

    #[test]
    fn test_stub_contents_with_prefix() {
        let text = stub_contents(&def("ndarray-1.0.0", "core"));
        assert!(text.starts_with(".. _core/ndarray-1.0.0:\n"));
        assert!(text.contains(
            ".. asdf-schema::\n    :standard_prefix: core\n    :schema_root: schemas\n\n    ndarray-1.0.0\n"
        ));
    }

    #[test]
    fn test_existing_stub_is_kept() {
        let dir = TempDir::new().unwrap();
        let target = stub_path(dir.path(), &def("foo", ""));
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "custom").unwrap();

        let written = write_stubs(dir.path(), &[def("foo", ""), def("core/baz", "")]).unwrap();
        assert_eq!(written, vec![dir.path().join("generated/core/baz.rst")]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "custom");
    }

    #[test]
    fn test_discovery_skips_markdown_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let body = ".. asdf-autoschemas::\n\n   foo\n   bar\n";
        let rst = dir.path().join("index.rst");
        let other = dir.path().join("other.rst");
        let md = dir.path().join("notes.md");
        fs::write(&rst, body).unwrap();
        fs::write(&other, ".. asdf-autoschemas::\n\n   foo\n").unwrap();
        fs::write(&md, ".. asdf-autoschemas::\n\n   hidden\n").unwrap();

        let defs = discover_schema_defs(&[rst, other, md], &AsdfConfig::default()).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }
}
