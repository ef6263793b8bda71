//! Loading schema files and typed access to schema mappings.

use log::debug;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::error::{AsdfError, Result};

/// Keywords that combine subschemas, in dispatch order.
pub const COMBINERS: [&str; 3] = ["anyOf", "allOf", "oneOf"];

/// Location of a schema: `schema_root/standard_prefix/name.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    pub schema_root: PathBuf,
    pub standard_prefix: String,
    pub name: String,
}

impl SchemaSource {
    pub fn new(
        schema_root: impl Into<PathBuf>,
        standard_prefix: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            schema_root: schema_root.into(),
            standard_prefix: standard_prefix.into(),
            name: name.into(),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        let mut path = self.schema_root.clone();
        if !self.standard_prefix.is_empty() {
            path.push(&self.standard_prefix);
        }
        path.push(format!("{}.yaml", self.name));
        path
    }
}

/// A schema read from disk: the parsed tree and the verbatim text.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    pub path: PathBuf,
    pub raw: String,
    pub tree: Value,
}

impl LoadedSchema {
    pub fn load(source: &SchemaSource) -> Result<Self> {
        Self::load_path(&source.file_path())
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AsdfError::ResourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let tree = Self::parse(path, &raw)?;
        debug!("Loaded schema {} ({} bytes)", path.display(), raw.len());

        Ok(Self {
            path: path.to_path_buf(),
            raw,
            tree,
        })
    }

    /// Parse schema text. The document root must be a mapping.
    pub fn parse(path: &Path, raw: &str) -> Result<Value> {
        let tree: Value =
            serde_yaml::from_str(raw).map_err(|e| AsdfError::malformed(path, e))?;
        match tree {
            Value::Mapping(_) => Ok(tree),
            // A tagged root (e.g. `--- !<tag:...>`) still holds a mapping
            Value::Tagged(tagged) if tagged.value.is_mapping() => Ok(tagged.value),
            _ => Err(AsdfError::malformed(path, "schema root is not a mapping")),
        }
    }

    pub fn from_text(path: impl Into<PathBuf>, raw: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let raw = raw.into();
        let tree = Self::parse(&path, &raw)?;
        Ok(Self { path, raw, tree })
    }
}

/// Borrowed view over one schema mapping.
#[derive(Debug, Clone, Copy)]
pub struct SchemaNode<'a> {
    value: &'a Value,
}

impl<'a> SchemaNode<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn mapping(&self) -> Option<&'a Mapping> {
        self.value.as_mapping()
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The first combiner keyword present on this node.
    pub fn combiner(&self) -> Option<&'static str> {
        COMBINERS.iter().copied().find(|c| self.has(c))
    }

    /// Entries of `properties` in document order.
    pub fn properties(&self) -> Vec<(String, &'a Value)> {
        self.get("properties")
            .and_then(Value::as_mapping)
            .map(|props| {
                props
                    .iter()
                    .map(|(key, value)| (scalar_to_string(key), value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names listed in `required`.
    pub fn required(&self) -> Vec<String> {
        self.get("required")
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().map(scalar_to_string).collect())
            .unwrap_or_default()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required().iter().any(|r| r == name)
    }

    pub fn description(&self) -> &'a str {
        self.get_str("description").unwrap_or("")
    }
}

/// Text form of a scalar as it appears in rendered prose.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Whether a value is "empty" for the purpose of showing a default.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Tagged(tagged) => is_falsy(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_path_with_and_without_prefix() {
        let source = SchemaSource::new("docs/schemas", "core", "ndarray-1.0.0");
        assert_eq!(
            source.file_path(),
            PathBuf::from("docs/schemas/core/ndarray-1.0.0.yaml")
        );

        let source = SchemaSource::new("schemas", "", "foo");
        assert_eq!(source.file_path(), PathBuf::from("schemas/foo.yaml"));
    }

    #[test]
    fn test_missing_schema_is_resource_not_found() {
        let dir = TempDir::new().unwrap();
        let source = SchemaSource::new(dir.path(), "", "missing");
        match LoadedSchema::load(&source) {
            Err(AsdfError::ResourceNotFound { path }) => {
                assert!(path.ends_with("missing.yaml"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let result = LoadedSchema::from_text("bad.yaml", "type: [unclosed");
        assert!(matches!(result, Err(AsdfError::MalformedInput { .. })));

        let result = LoadedSchema::from_text("list.yaml", "- a\n- b\n");
        assert!(matches!(result, Err(AsdfError::MalformedInput { .. })));
    }

    #[test]
    fn test_properties_keep_document_order() {
        let schema = LoadedSchema::from_text(
            "s.yaml",
            "properties:\n  zeta: {type: string}\n  alpha: {type: number}\n  mid: {}\nrequired: [alpha]\n",
        )
        .unwrap();
        let node = SchemaNode::new(&schema.tree);
        let names: Vec<String> = node.properties().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(node.is_required("alpha"));
        assert!(!node.is_required("zeta"));
    }

    #[test]
    fn test_combiner_dispatch_order() {
        let schema = LoadedSchema::from_text("s.yaml", "oneOf: []\nanyOf: []\n").unwrap();
        assert_eq!(SchemaNode::new(&schema.tree).combiner(), Some("anyOf"));
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&Value::from(3)), "3");
        assert_eq!(scalar_to_string(&Value::from("abc")), "abc");
        assert_eq!(scalar_to_string(&Value::Bool(true)), "true");
    }
}
