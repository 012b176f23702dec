//! Insight Core
//!
//! Foundational types for the Insight Engine workspace. Everything here is
//! synchronous and free of I/O, so it can be tested against hand-built
//! inputs.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Analysis contexts and cache key derivation
//! - `streaming` - Protocol event types and session phases
//! - `frame` - Incremental frame parser for the streaming protocol
//! - `state` - Stream state reducer and tool call records
//! - `conversation` - Conversation turn types

pub mod context;
pub mod conversation;
pub mod error;
pub mod frame;
pub mod state;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context ────────────────────────────────────────────────────────────
pub use context::{derive_key, AnalysisContext, ContextKind, TableRow};

// ── Streaming Protocol ─────────────────────────────────────────────────
pub use frame::{decode_frame, parse_frames, FrameDecoder, FrameError, ParsedFrames};
pub use streaming::{Phase, Source, StreamEvent};

// ── State ──────────────────────────────────────────────────────────────
pub use state::{Applied, StreamState, ToolCallRecord};

// ── Conversation ───────────────────────────────────────────────────────
pub use conversation::{ConversationMessage, Role};
