//! Settings Models
//!
//! Engine configuration stored in config.json.

use serde::{Deserialize, Serialize};

/// Engine configuration. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Agent endpoint that accepts insight requests and streams frames back
    pub agent_endpoint: String,
    /// Base URL of the analytics REST APIs the tools read from
    pub upstream_base_url: String,
    /// Bound on a single tool call, in seconds
    pub tool_timeout_secs: u64,
    /// Bound on a whole insight stream, in seconds
    pub stream_timeout_secs: u64,
    /// Lifetime of a cached insight, in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of cached insights
    pub cache_max_entries: usize,
    /// User-Agent sent to the agent endpoint and upstream APIs
    pub user_agent: String,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            agent_endpoint: "http://localhost:8787/api/insights".to_string(),
            upstream_base_url: "http://localhost:8787/api/v1".to_string(),
            tool_timeout_secs: 8,
            stream_timeout_secs: 120,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
            user_agent: format!("InsightEngine/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub agent_endpoint: Option<String>,
    pub upstream_base_url: Option<String>,
    pub tool_timeout_secs: Option<u64>,
    pub stream_timeout_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_max_entries: Option<usize>,
    pub user_agent: Option<String>,
}

impl InsightSettings {
    /// Apply a partial update to the settings
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(endpoint) = update.agent_endpoint {
            self.agent_endpoint = endpoint;
        }
        if let Some(url) = update.upstream_base_url {
            self.upstream_base_url = url;
        }
        if let Some(secs) = update.tool_timeout_secs {
            self.tool_timeout_secs = secs;
        }
        if let Some(secs) = update.stream_timeout_secs {
            self.stream_timeout_secs = secs;
        }
        if let Some(secs) = update.cache_ttl_secs {
            self.cache_ttl_secs = secs;
        }
        if let Some(max) = update.cache_max_entries {
            self.cache_max_entries = max;
        }
        if let Some(user_agent) = update.user_agent {
            self.user_agent = user_agent;
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("agent_endpoint", &self.agent_endpoint),
            ("upstream_base_url", &self.upstream_base_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(format!("Invalid {}: {}. Must be an http(s) URL", field, value));
            }
        }

        if self.tool_timeout_secs == 0 || self.tool_timeout_secs > 60 {
            return Err("tool_timeout_secs must be between 1 and 60".to_string());
        }

        // A stream has to outlive at least one tool call.
        if self.stream_timeout_secs < self.tool_timeout_secs {
            return Err("stream_timeout_secs cannot be shorter than tool_timeout_secs".to_string());
        }

        if self.cache_ttl_secs == 0 {
            return Err("cache_ttl_secs must be at least 1 second".to_string());
        }

        if self.cache_max_entries == 0 || self.cache_max_entries > 10_000 {
            return Err("cache_max_entries must be between 1 and 10000".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("user_agent cannot be empty".to_string());
        }

        Ok(())
    }
}
