//! Error types for LeadBridge.
//!
//! Library crates use [`LeadBridgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all LeadBridge operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadBridgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The CRM custom-field catalog could not be fetched (transport, auth,
    /// timeout, or undecodable body). Recoverable: the run degrades.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Network/HTTP error talking to the CRM outside of the catalog read.
    #[error("network error: {0}")]
    Network(String),

    /// A submitted value did not have the shape its field spec declares.
    #[error("unsupported value shape for '{field}': expected {expected}, found {found}")]
    UnsupportedValueShape {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// JSON or wire-format parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Submission validation error (missing contact data, bad email, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadBridgeError>;

impl LeadBridgeError {
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

    /// Create a shape error for a field.
    pub fn unsupported_shape(
        field: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::UnsupportedValueShape {
            field: field.into(),
            expected,
            found: found.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the catalog fetch failed and the caller
    /// should continue with contact basics only.
    pub fn is_catalog_unavailable(&self) -> bool {
        matches!(self, Self::CatalogUnavailable(_))
    }
}
