//! Error Handling
//!
//! Error type for the engine's own concerns (settings, storage, wiring).
//! Uses thiserror for ergonomic error definitions.

use insight_core::CoreError;
use insight_llm::TransportError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Errors raised by the core or tool crates
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Agent endpoint errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
