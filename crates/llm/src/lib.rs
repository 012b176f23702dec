//! Insight LLM
//!
//! Client side of the insight agent endpoint: the request body, the HTTP
//! client factory, and the [`InsightTransport`] abstraction that yields the
//! raw response byte stream for the frame parser.
//!
//! The agent itself (model, prompting, tool-call loop) lives behind the
//! endpoint and is not implemented here.

pub mod agent;
pub mod http_client;
pub mod request;
pub mod transport;

pub use agent::HttpAgentTransport;
pub use http_client::{build_http_client, HttpClientOptions};
pub use request::{InsightRequest, WireMessage};
pub use transport::{parse_http_error, ByteStream, InsightTransport, TransportError, TransportResult};
