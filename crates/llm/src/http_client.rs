//! HTTP Client Factory
//!
//! Builds the `reqwest::Client` shared by the agent transport and the
//! upstream data tools.

use std::time::Duration;

/// Default connect timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Whole-request timeout. Leave unset for streaming responses.
    pub request_timeout: Option<Duration>,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            user_agent: format!("InsightEngine/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: None,
        }
    }
}

/// Build a `reqwest::Client` from the given options.
///
/// Falls back to a default client if the builder rejects the options.
pub fn build_http_client(options: &HttpClientOptions) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(options.user_agent.clone())
        .connect_timeout(options.connect_timeout);
    if let Some(timeout) = options.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}
