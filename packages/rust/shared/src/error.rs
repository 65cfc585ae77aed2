//! Error types for the TecDoc exporter.
//!
//! Library crates use [`TecdocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all exporter operations.
#[derive(Debug, thiserror::Error)]
pub enum TecdocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the catalog API.
    #[error("network error: {0}")]
    Network(String),

    /// JSON payload could not be read.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A key required to build a record was absent or empty.
    #[error("missing required key: {key}")]
    MissingKey { key: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad flag value, unknown table, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// CSV serialization error.
    #[error("export error: {0}")]
    Export(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TecdocError>;

impl TecdocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Signal that `key` was absent from a payload.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "skip the record and keep going".
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TecdocError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = TecdocError::missing_key("legacyArticleId");
        assert_eq!(err.to_string(), "missing required key: legacyArticleId");
    }

    #[test]
    fn only_missing_key_is_a_skip() {
        assert!(TecdocError::missing_key("legacyArticleId").is_skip());
        assert!(!TecdocError::Network("timeout".into()).is_skip());
        assert!(!TecdocError::validation("bad").is_skip());
    }
}
