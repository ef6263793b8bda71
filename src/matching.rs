//! Source discovery with Sphinx-style include and exclude patterns.
//!
//! Patterns are matched against paths relative to the source directory,
//! always with `/` separators:
//! - `**` matches any number of path segments
//! - `*` matches within one segment
//! - `?` matches one character other than `/`
//! - `[seq]` and `[!seq]` match character classes

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

use crate::config::AsdfConfig;
use crate::error::{AsdfError, Result};

lazy_static! {
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Translate a glob pattern into an anchored regular expression.
pub fn translate_pattern(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:[^/]+/)*");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let rest: String = chars.clone().collect();
                match rest.chars().position(|c| c == ']') {
                    Some(end) if end > 0 => {
                        let class: String = chars.by_ref().take(end).collect();
                        chars.next();
                        out.push('[');
                        match class.strip_prefix('!') {
                            Some(negated) => {
                                out.push('^');
                                out.push_str(negated);
                            }
                            None => out.push_str(&class),
                        }
                        out.push(']');
                    }
                    _ => out.push_str("\\["),
                }
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    out.push('$');
    out
}

pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut cache = PATTERN_CACHE
        .lock()
        .map_err(|_| AsdfError::Config("pattern cache poisoned".to_string()))?;
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(&translate_pattern(pattern))
        .map_err(|e| AsdfError::Config(format!("invalid pattern '{}': {}", pattern, e)))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

pub fn pattern_match(name: &str, pattern: &str) -> Result<bool> {
    Ok(compile_pattern(pattern)?.is_match(name))
}

/// Relative path with `/` separators.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Compiled include and exclude patterns. Exclusions win.
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl SourceMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            vec![compile_pattern("**")?]
        } else {
            include.iter().map(|p| compile_pattern(p)).collect::<Result<_>>()?
        };
        let exclude = exclude.iter().map(|p| compile_pattern(p)).collect::<Result<_>>()?;
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.include.iter().any(|r| r.is_match(relative))
            && !self.exclude.iter().any(|r| r.is_match(relative))
    }
}

/// A source document and its docname (relative path without suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub docname: String,
}

/// Walk `srcdir` for documents with a configured suffix, skipping any
/// directory in `skip_dirs` (such as the output directory).
pub fn find_sources(
    srcdir: &Path,
    config: &AsdfConfig,
    skip_dirs: &[PathBuf],
) -> Result<Vec<SourceDocument>> {
    let matcher = SourceMatcher::new(&config.include_patterns, &config.exclude_patterns)?;
    let skip: Vec<PathBuf> = skip_dirs
        .iter()
        .filter_map(|dir| dir.canonicalize().ok())
        .collect();

    let mut sources = Vec::new();
    let walker = WalkDir::new(srcdir).sort_by_file_name().into_iter();
    for entry in walker.filter_entry(|e| {
        !e.file_type().is_dir()
            || e.path()
                .canonicalize()
                .map(|p| !skip.contains(&p))
                .unwrap_or(true)
    }) {
        let entry = entry.map_err(|e| AsdfError::Io(e.into()))?;
        if !entry.file_type().is_file() || !config.is_source_file(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(srcdir) else {
            continue;
        };
        let relative = normalize_path(relative);
        if !matcher.matches(&relative) {
            debug!("Excluded by pattern: {}", relative);
            continue;
        }
        sources.push(SourceDocument {
            path: entry.path().to_path_buf(),
            docname: docname_for(&relative, config),
        });
    }

    Ok(sources)
}

/// Strip the matching source suffix from a relative path.
pub fn docname_for(relative: &str, config: &AsdfConfig) -> String {
    config
        .source_suffix
        .iter()
        .find_map(|suffix| relative.strip_suffix(suffix.as_str()))
        .unwrap_or(relative)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_translate_pattern() {
        assert_eq!(translate_pattern("*.rst"), "^[^/]*\\.rst$");
        assert_eq!(translate_pattern("**"), "^.*$");
        assert_eq!(translate_pattern("**/index.rst"), "^(?:[^/]+/)*index\\.rst$");
        assert_eq!(translate_pattern("[!ab].rst"), "^[^ab]\\.rst$");
        assert_eq!(translate_pattern("a[b"), "^a\\[b$");
    }

    #[test]
    fn test_pattern_match() {
        assert!(pattern_match("index.rst", "**/*.rst").unwrap());
        assert!(pattern_match("generated/core/x.rst", "generated/**").unwrap());
        assert!(!pattern_match("generated/x.rst", "*.rst").unwrap());
        assert!(pattern_match("d.rst", "[!abc].rst").unwrap());
        assert!(!pattern_match("a.rst", "[!abc].rst").unwrap());
    }

    #[test]
    fn test_matcher_exclusion_wins() {
        let matcher = SourceMatcher::new(&["**".into()], &["drafts/**".into()]).unwrap();
        assert!(matcher.matches("index.rst"));
        assert!(!matcher.matches("drafts/wip.rst"));
    }

    #[test]
    fn test_find_sources_skips_output_and_other_suffixes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("generated/core")).unwrap();
        fs::create_dir_all(root.join("_build")).unwrap();
        fs::write(root.join("index.rst"), "").unwrap();
        fs::write(root.join("notes.md"), "").unwrap();
        fs::write(root.join("generated/core/baz.rst"), "").unwrap();
        fs::write(root.join("_build/stale.rst"), "").unwrap();

        let sources =
            find_sources(root, &AsdfConfig::default(), &[root.join("_build")]).unwrap();
        let docnames: Vec<_> = sources.iter().map(|s| s.docname.as_str()).collect();
        assert_eq!(docnames, vec!["generated/core/baz", "index"]);
    }
}
