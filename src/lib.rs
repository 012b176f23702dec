//! Insight Engine
//!
//! Conversational insights for dashboard panels. A panel hands the engine
//! its analytical context; the engine streams the agent's explanation,
//! tracks the tools the agent calls, and caches finished answers.
//! It includes:
//! - Settings model and JSON settings store
//! - Insight services (cache, stream session, conversation manager)
//! - Engine state wiring transports, tools and cache together

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{InsightSettings, SettingsUpdate};
pub use services::insight::{
    CachedInsight, ConversationManager, InsightCache, InsightStart, SessionOutcome, StreamSession,
};
pub use state::EngineState;
pub use utils::error::{AppError, AppResult};
