//! Build configuration.
//!
//! Values come from serde defaults, an optional configuration file
//! (`sphinx-asdf.toml`, `.yaml` or `.json` in the source directory, or an
//! explicit path) and `SPHINX_ASDF_*` environment variables, in that order.

use config::{Config, Environment, File};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::reference::ReferenceMapping;

const CONFIG_FILE_STEM: &str = "sphinx-asdf";
const CONFIG_EXTENSIONS: [&str; 3] = ["toml", "yaml", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsdfConfig {
    /// Directory holding schemas, relative to the source directory.
    pub schema_path: String,
    /// Sub-directory of `schema_path` used when a directive gives no prefix.
    pub standard_prefix: String,
    /// Ordered rewrite rules from schema ids to documentation links.
    pub reference_mappings: Vec<ReferenceMapping>,
    pub source_suffix: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// syntect theme used for literal blocks.
    pub highlight_theme: String,
    pub parallel_jobs: Option<usize>,
}

impl Default for AsdfConfig {
    fn default() -> Self {
        Self {
            schema_path: "schemas".to_string(),
            standard_prefix: String::new(),
            reference_mappings: Vec::new(),
            source_suffix: vec![".rst".to_string()],
            include_patterns: vec!["**".to_string()],
            exclude_patterns: Vec::new(),
            highlight_theme: "InspiredGitHub".to_string(),
            parallel_jobs: None,
        }
    }
}

impl AsdfConfig {
    /// Load configuration for a source directory. An explicit file must
    /// exist; otherwise the first `sphinx-asdf.<ext>` found is used.
    pub fn load(source_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(source_dir),
        };
        if let Some(path) = file {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix("SPHINX_ASDF").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn find_config_file(source_dir: &Path) -> Option<PathBuf> {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| source_dir.join(format!("{}.{}", CONFIG_FILE_STEM, ext)))
            .find(|path| path.is_file())
    }

    /// Whether `path` carries one of the configured source suffixes.
    pub fn is_source_file(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        self.source_suffix.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}
