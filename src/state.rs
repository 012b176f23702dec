//! Engine State
//!
//! Everything a dashboard needs to open insight panels, built once from
//! [`InsightSettings`] and shared across panels.

use std::sync::Arc;
use std::time::Duration;

use insight_core::AnalysisContext;
use insight_llm::{HttpAgentTransport, HttpClientOptions, InsightTransport};
use insight_tools::{HttpUpstream, ToolCatalog, ToolExecutor, UpstreamClient};

use crate::models::settings::InsightSettings;
use crate::services::insight::{ConversationManager, InsightCache, StreamSession};
use crate::utils::error::{AppError, AppResult};

pub struct EngineState {
    settings: InsightSettings,
    transport: Arc<dyn InsightTransport>,
    cache: Arc<InsightCache>,
    executor: ToolExecutor,
}

impl EngineState {
    /// Build the HTTP transport, upstream client, tool executor and cache.
    pub fn from_settings(settings: InsightSettings) -> AppResult<Self> {
        settings.validate().map_err(AppError::validation)?;
        let options = HttpClientOptions {
            user_agent: settings.user_agent.clone(),
            ..HttpClientOptions::default()
        };
        let transport = HttpAgentTransport::new(&settings.agent_endpoint, &options)?;
        let upstream = HttpUpstream::new(
            &settings.upstream_base_url,
            Duration::from_secs(settings.tool_timeout_secs),
            &options,
        )?;
        Ok(Self::with_parts(settings, Arc::new(transport), Arc::new(upstream)))
    }

    /// Assemble from an already-built transport and upstream.
    pub fn with_parts(
        settings: InsightSettings,
        transport: Arc<dyn InsightTransport>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        let cache = Arc::new(InsightCache::new(
            Duration::from_secs(settings.cache_ttl_secs),
            settings.cache_max_entries,
        ));
        let executor = ToolExecutor::new(ToolCatalog::default(), upstream)
            .with_timeout(Duration::from_secs(settings.tool_timeout_secs));
        Self {
            settings,
            transport,
            cache,
            executor,
        }
    }

    pub fn settings(&self) -> &InsightSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<InsightCache> {
        &self.cache
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn catalog(&self) -> &ToolCatalog {
        self.executor.catalog()
    }

    /// Open a conversation for one panel.
    pub fn conversation(&self, title: impl Into<String>, context: AnalysisContext) -> ConversationManager {
        let sessions = StreamSession::new(self.transport.clone())
            .with_timeout(Duration::from_secs(self.settings.stream_timeout_secs));
        ConversationManager::new(title, context, sessions, self.cache.clone())
    }
}
