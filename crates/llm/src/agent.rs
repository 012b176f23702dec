//! HTTP Agent Transport
//!
//! Posts an [`InsightRequest`] to the agent endpoint and exposes the
//! streaming response body.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::http_client::{build_http_client, HttpClientOptions};
use crate::request::InsightRequest;
use crate::transport::{parse_http_error, ByteStream, InsightTransport, TransportError, TransportResult};

/// Transport backed by `reqwest`.
pub struct HttpAgentTransport {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpAgentTransport {
    /// Create a transport for `endpoint`. Only http(s) URLs are accepted.
    pub fn new(endpoint: &str, options: &HttpClientOptions) -> TransportResult<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| TransportError::Config(format!("invalid agent endpoint '{}': {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::Config(format!(
                "agent endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }
        Ok(Self {
            client: build_http_client(options),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl InsightTransport for HttpAgentTransport {
    fn name(&self) -> &str {
        "http-agent"
    }

    async fn open(&self, request: &InsightRequest) -> TransportResult<ByteStream> {
        tracing::debug!(
            "POST {} (component={}, follow_up={})",
            self.endpoint,
            request.component_type,
            request.is_follow_up()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            tracing::warn!("Agent endpoint rejected request: HTTP {}", status.as_u16());
            return Err(parse_http_error(status.as_u16(), &body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Network(e.to_string())));
        Ok(Box::pin(stream))
    }
}
