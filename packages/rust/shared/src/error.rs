//! Error types for PromptDesk.
//!
//! Library crates use [`PromptDeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PromptDesk operations.
#[derive(Debug, thiserror::Error)]
pub enum PromptDeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a blob backend.
    #[error("network error: {0}")]
    Network(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (blank user id, unsafe blob path, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A requested record or blob does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Session initialization failed for a reason not covered by a fallback.
    #[error("failed to initialize chat session")]
    SessionInit,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PromptDeskError>;

impl PromptDeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
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
