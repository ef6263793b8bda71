//! Resolution of `$ref` and `tag` strings into documentation links.

use serde::{Deserialize, Serialize};

/// One rewrite rule: schema ids starting with `source` are documented under
/// `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMapping {
    pub source: String,
    pub destination: String,
}

impl ReferenceMapping {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// A reference after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Text shown for the link.
    pub display: String,
    /// Link target, `page.html#fragment`, `page.html` or `#fragment`.
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    mappings: Vec<ReferenceMapping>,
}

impl ReferenceResolver {
    pub fn new(mappings: Vec<ReferenceMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[ReferenceMapping] {
        &self.mappings
    }

    /// Map a schema id onto its documentation page. The first mapping whose
    /// source is a prefix of the id wins; unmatched ids are kept.
    pub fn resolve_schema_id(&self, schema_id: &str) -> String {
        let mut resolved = schema_id.to_string();

        if let Some(mapping) = self
            .mappings
            .iter()
            .find(|m| schema_id.starts_with(m.source.as_str()))
        {
            let mut relpath = schema_id[mapping.source.len()..].trim_matches('/');
            if relpath == "." {
                relpath = "";
            }
            let joined = if relpath.is_empty() {
                mapping.destination.clone()
            } else if mapping.destination.is_empty() {
                relpath.to_string()
            } else {
                format!("{}/{}", mapping.destination.trim_end_matches('/'), relpath)
            };
            resolved = joined.trim_matches('/').to_string();
        }

        if !resolved.ends_with(".html") {
            resolved.push_str(".html");
        }
        resolved
    }

    /// Resolve a reference string. With `shorten`, a same-document reference
    /// is displayed by its last pointer segment.
    pub fn resolve(&self, refname: &str, shorten: bool) -> ResolvedReference {
        let (schema_id, fragment) = refname.split_once('#').unwrap_or((refname, ""));

        let mut display = refname.to_string();
        let mut target = if schema_id.is_empty() {
            String::new()
        } else {
            self.resolve_schema_id(schema_id)
        };

        if !fragment.is_empty() {
            let components: Vec<&str> = fragment.split('/').collect();
            target.push('#');
            target.push_str(&components[1..].join("-"));
            if shorten && schema_id.is_empty() {
                if let Some(last) = components.last() {
                    display = last.to_string();
                }
            }
        }

        ResolvedReference { display, target }
    }
}
