//! Cross-reference labels for every anchored node of generated schema pages.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

use crate::directives::GENERATED_DIR;
use crate::error::Result;
use crate::nodes::{walk, DocNode, IdCollector};
use crate::path::normalize_name;

/// Where a label points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTarget {
    pub docname: String,
    pub labelid: String,
}

/// Lowercase and collapse whitespace, as reST does for reference names.
pub fn fully_normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LabelRegistry {
    #[serde(skip)]
    basepath: String,
    labels: IndexMap<String, LabelTarget>,
}

impl LabelRegistry {
    /// Labels are named relative to `generated/<standard_prefix>`.
    pub fn new(standard_prefix: &str) -> Self {
        let basepath = if standard_prefix.is_empty() {
            GENERATED_DIR.to_string()
        } else {
            format!("{}/{}", GENERATED_DIR, standard_prefix.trim_matches('/'))
        };
        Self {
            basepath,
            labels: IndexMap::new(),
        }
    }

    fn basename(&self, docname: &str) -> String {
        pathdiff::diff_paths(Path::new(docname), Path::new(&self.basepath))
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|| docname.to_string())
    }

    /// Label name for an anchor id of a document.
    pub fn label_name(&self, docname: &str, id: &str) -> String {
        let basename = self.basename(docname);
        if id == normalize_name(&basename) {
            basename
        } else {
            fully_normalize_name(&format!("{}:{}", basename, id))
        }
    }

    /// Register a label for every id in `document`; returns how many.
    pub fn register_document(&mut self, docname: &str, document: &DocNode) -> usize {
        let mut ids = IdCollector::default();
        walk(document, &mut ids);

        for id in &ids.ids {
            let name = self.label_name(docname, id);
            self.labels.insert(
                name,
                LabelTarget {
                    docname: docname.to_string(),
                    labelid: id.clone(),
                },
            );
        }
        ids.ids.len()
    }

    pub fn get(&self, name: &str) -> Option<&LabelTarget> {
        self.labels.get(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LabelTarget)> {
        self.labels.iter()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
