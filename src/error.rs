//! Error types for schema loading, rendering and ASDF file inspection.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the library entry points.
pub type Result<T> = std::result::Result<T, AsdfError>;

#[derive(Debug, Error)]
pub enum AsdfError {
    /// The requested schema (or ASDF file) does not exist.
    #[error("Resource not found: {}", path.display())]
    ResourceNotFound { path: PathBuf },

    /// The schema text could not be parsed.
    #[error("Malformed input in {}: {message}", path.display())]
    MalformedInput { path: PathBuf, message: String },

    /// The binary ASDF file violates the block layout.
    #[error("Invalid ASDF file {}: {message}", path.display())]
    InvalidAsdfFile { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AsdfError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AsdfError::MalformedInput {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_file(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AsdfError::InvalidAsdfFile {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<config::ConfigError> for AsdfError {
    fn from(err: config::ConfigError) -> Self {
        AsdfError::Config(err.to_string())
    }
}

impl From<minijinja::Error> for AsdfError {
    fn from(err: minijinja::Error) -> Self {
        AsdfError::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_serialization_errors() {
        let err: AsdfError = serde_json::from_str::<u8>("\"x\"").unwrap_err().into();
        assert!(matches!(err, AsdfError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
