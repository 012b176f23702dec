//! Agent Transport
//!
//! The seam between a stream session and the network. A transport opens
//! one request and yields the raw response body; decoding is the frame
//! parser's job.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::request::InsightRequest;

/// Raw response body chunks, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP 429 from the agent endpoint
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// HTTP 400 from the agent endpoint
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Any other non-2xx response
    #[error("Agent endpoint returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Connection failures and mid-stream drops
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint URL or request body could not be used
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Opens streaming insight requests.
#[async_trait]
pub trait InsightTransport: Send + Sync {
    /// Returns a name for logging.
    fn name(&self) -> &str;

    /// Send the request. Non-2xx responses fail here, before any byte of the
    /// stream is handed out.
    async fn open(&self, request: &InsightRequest) -> TransportResult<ByteStream>;
}

/// Map a non-2xx response to a [`TransportError`].
///
/// The endpoint reports failures as `{"error": "..."}` (or
/// `{"error": {"message": "..."}}`); anything else is passed through raw.
pub fn parse_http_error(status: u16, body: &str) -> TransportError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {}", status)
        } else {
            trimmed.to_string()
        }
    });

    match status {
        429 => TransportError::RateLimited { message },
        400 => TransportError::InvalidRequest { message },
        _ => TransportError::Rejected { status, message },
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from),
    }
}
