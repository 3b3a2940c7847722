//! Error types for Tijdmachine.
//!
//! Library crates use [`TijdmachineError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Tijdmachine operations.
#[derive(Debug, thiserror::Error)]
pub enum TijdmachineError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// Response or record parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Text generation service error (API failure, empty or malformed response).
    #[error("generation error: {0}")]
    Generation(String),

    /// Knowledge lookup service error.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty fields, unknown language tag, bad day/month, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TijdmachineError>;

impl TijdmachineError {
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

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TijdmachineError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = TijdmachineError::validation("unknown language tag 'de'");
        assert!(err.to_string().contains("'de'"));
    }

    #[test]
    fn timeout_display() {
        let err = TijdmachineError::timeout("summarize", 1500);
        assert_eq!(err.to_string(), "summarize timed out after 1500 ms");
    }
}
