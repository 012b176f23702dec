//! Insight Services
//!
//! Per-panel conversation with the insight agent:
//! - `cache` - completed insights keyed by context, first-writer-wins
//! - `session` - one streaming request, its epoch and cancellation
//! - `conversation` - turn history, single-flight ownership, cache-or-stream

pub mod cache;
pub mod conversation;
pub mod session;

pub use cache::{CachedInsight, InsightCache, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL};
pub use conversation::{ConversationManager, InsightStart};
pub use session::{
    CompletionHook, PanelChannel, SessionHandle, SessionOutcome, StreamSession, DEFAULT_STREAM_TIMEOUT,
};
