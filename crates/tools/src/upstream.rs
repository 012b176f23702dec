//! Upstream Analytics Client
//!
//! JSON access to the dashboard's analytics REST APIs. Responses are cached
//! briefly in memory because an agent often asks for the same endpoint more
//! than once within one conversation.

use std::time::Duration;

use async_trait::async_trait;
use insight_core::{CoreError, CoreResult};
use insight_llm::{build_http_client, HttpClientOptions};
use mini_moka::sync::Cache;
use serde_json::Value;

/// Response cache TTL (60 seconds)
const RESPONSE_CACHE_TTL_SECS: u64 = 60;

/// Maximum cached responses
const MAX_CACHED_RESPONSES: u64 = 200;

/// Read-only JSON source for tools.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// GET `path` (relative to the API base) with optional query pairs.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> CoreResult<Value>;
}

/// `reqwest`-backed upstream client with a short-lived response cache.
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    cache: Cache<String, Value>,
}

impl HttpUpstream {
    pub fn new(base_url: &str, timeout: Duration, options: &HttpClientOptions) -> CoreResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| CoreError::config(format!("invalid upstream base URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CoreError::config(format!(
                "upstream base URL must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        let options = HttpClientOptions {
            request_timeout: Some(timeout),
            ..options.clone()
        };
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_RESPONSES)
            .time_to_live(Duration::from_secs(RESPONSE_CACHE_TTL_SECS))
            .build();

        Ok(Self {
            client: build_http_client(&options),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            cache,
        })
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> CoreResult<url::Url> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| CoreError::internal(format!("bad upstream path '{}': {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn map_request_error(&self, err: reqwest::Error, path: &str) -> CoreError {
        if err.is_timeout() {
            CoreError::Timeout(self.timeout.as_millis() as u64)
        } else {
            CoreError::upstream(format!("request to {} failed: {}", path, err))
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> CoreResult<Value> {
        let url = self.build_url(path, query)?;
        let key = url.to_string();

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Upstream cache hit: {}", key);
            return Ok(cached);
        }

        tracing::debug!("GET {}", key);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e, path))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::upstream(format!(
                "HTTP {} from {}",
                status.as_u16(),
                path
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e, path))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| CoreError::parse(format!("malformed JSON from {}: {}", path, e)))?;

        self.cache.insert(key, value.clone());
        Ok(value)
    }
}
