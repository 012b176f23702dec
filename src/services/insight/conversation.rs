//! Conversation Manager
//!
//! Owns one panel's conversation: the analytical context, the ordered turn
//! history and at most one open stream session. The first request for a
//! context may be answered from the shared [`InsightCache`]; follow-ups
//! always stream and are never cached under the context key.

use std::sync::Arc;

use insight_core::{AnalysisContext, ConversationMessage, Phase, StreamState};
use insight_llm::InsightRequest;
use tokio::sync::watch;

use super::cache::InsightCache;
use super::session::{CompletionHook, PanelChannel, SessionHandle, SessionOutcome, StreamSession};
use crate::utils::error::{AppError, AppResult};

/// How a request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightStart {
    /// Answered from cache; the state is already `done`
    Cached,
    /// A stream session was started
    Streaming,
}

pub struct ConversationManager {
    title: String,
    context: AnalysisContext,
    history: Vec<ConversationMessage>,
    panel: Arc<PanelChannel>,
    sessions: StreamSession,
    cache: Arc<InsightCache>,
    current: Option<SessionHandle>,
}

impl ConversationManager {
    pub fn new(
        title: impl Into<String>,
        context: AnalysisContext,
        sessions: StreamSession,
        cache: Arc<InsightCache>,
    ) -> Self {
        Self {
            title: title.into(),
            context,
            history: Vec::new(),
            panel: Arc::new(PanelChannel::new()),
            sessions,
            cache,
            current: None,
        }
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn cache_key(&self) -> String {
        self.context.cache_key()
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    pub fn state(&self) -> StreamState {
        self.panel.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.panel.subscribe()
    }

    pub fn is_streaming(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Explain the current context: from cache when this is the first turn
    /// and the key is live, otherwise by streaming.
    pub fn request_insight(&mut self) -> InsightStart {
        self.cancel();

        let key = self.cache_key();
        if self.history.is_empty() {
            if let Some(cached) = self.cache.get(&key) {
                tracing::info!("Insight served from cache: {}", key);
                self.panel.replace(cached.to_state());
                return InsightStart::Cached;
            }
        }

        let on_complete: Option<CompletionHook> = if self.history.is_empty() {
            let cache = self.cache.clone();
            Some(Box::new(move |insight| {
                if cache.put(&key, insight) {
                    tracing::debug!("Insight cached: {}", key);
                }
            }))
        } else {
            None
        };
        self.start(on_complete);
        InsightStart::Streaming
    }

    /// Ask a follow-up question about the same context.
    pub fn ask_follow_up(&mut self, question: &str) -> AppResult<()> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::validation("Follow-up question cannot be empty"));
        }

        let state = self.panel.snapshot();
        self.cancel();
        if state.phase == Phase::Done && !state.answer.is_empty() {
            self.history.push(ConversationMessage::assistant(state.answer));
        }
        self.history.push(ConversationMessage::user(question));
        self.start(None);
        Ok(())
    }

    /// Stop the open session, if any. No state change from it is visible
    /// after this returns.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            self.panel.invalidate();
            handle.abort_read();
            tracing::debug!(epoch = handle.epoch(), "Insight session cancelled by caller");
        }
    }

    /// Forget the conversation and return to `idle`.
    pub fn reset(&mut self) {
        self.cancel();
        self.history.clear();
        self.panel.begin();
    }

    /// Reset and move to another context.
    pub fn switch_context(&mut self, title: impl Into<String>, context: AnalysisContext) {
        self.reset();
        self.title = title.into();
        self.context = context;
    }

    /// Wait for the open session to end. `None` when no session is open.
    pub async fn wait(&mut self) -> Option<SessionOutcome> {
        let handle = self.current.take()?;
        Some(handle.join().await)
    }

    fn start(&mut self, on_complete: Option<CompletionHook>) {
        let request =
            InsightRequest::new(self.title.clone(), self.context.clone()).with_messages(&self.history);
        let handle = self.sessions.start(self.panel.clone(), request, on_complete);
        self.current = Some(handle);
    }
}

impl Drop for ConversationManager {
    fn drop(&mut self) {
        self.cancel();
    }
}
