//! Core Error Types
//!
//! Error types shared across the Insight Engine workspace. Kept to
//! thiserror + serde_json so every crate can depend on them cheaply.

use thiserror::Error;

/// Core error type for the Insight Engine workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid arguments or payloads
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upstream data API failures (non-2xx, connection refused, ...)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An operation exceeded its time bound
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
