//! Stream State Reducer
//!
//! Folds decoded [`StreamEvent`]s into the single view a panel renders.
//! The reducer is synchronous and applies events strictly in the order given.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::streaming::{Phase, Source, StreamEvent};

/// One tool invocation made by the agent during a session.
///
/// Created by `tool_start` with no result and `duration_ms == 0` (in flight),
/// completed in place by the matching `tool_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub turn: u32,
    pub name: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ToolCallRecord {
    pub fn started(turn: u32, name: impl Into<String>, args: Value) -> Self {
        Self {
            turn,
            name: name.into(),
            args,
            result: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.duration_ms == 0 && self.result.is_none() && self.error.is_none()
    }

    fn complete(&mut self, duration_ms: u64, result: Option<Value>, error: Option<String>) {
        self.duration_ms = duration_ms;
        self.result = result;
        self.error = error;
    }
}

/// Effect of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event did not change the state
    Ignored,
    /// The state changed
    Updated,
    /// The state entered `done` with this event
    Completed,
}

/// Everything a panel shows for the current request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    pub phase: Phase,
    pub thinking: String,
    pub answer: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached: bool,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to `idle`, the only phase a new session starts from.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Terminal error state for failures outside the event stream
    /// (transport rejected, dropped connection, timeout).
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Error,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True once the session finished with something worth caching.
    pub fn has_answer(&self) -> bool {
        self.phase == Phase::Done && !self.answer.is_empty()
    }

    /// Tool calls still waiting for their `tool_end`.
    pub fn in_flight_tools(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|r| r.is_in_flight())
    }

    /// Apply one event. Events arriving after `done`/`error` are ignored.
    pub fn apply(&mut self, event: StreamEvent) -> Applied {
        if self.phase.is_terminal() {
            tracing::debug!(
                "Ignoring '{}' event after terminal phase {}",
                event.event_type(),
                self.phase
            );
            return Applied::Ignored;
        }

        match event {
            StreamEvent::Status { phase, .. } => {
                // Terminal phases only come from done/error events, idle only from reset.
                if matches!(phase, Phase::Idle | Phase::Done | Phase::Error) {
                    tracing::debug!("Ignoring status event with phase {}", phase);
                    return Applied::Ignored;
                }
                if self.phase == phase {
                    return Applied::Ignored;
                }
                self.phase = phase;
            }
            StreamEvent::Thinking { text } => {
                self.phase = Phase::Thinking;
                self.thinking.push_str(&text);
            }
            StreamEvent::ToolStart { name, args, turn } => {
                self.phase = Phase::Fetching;
                self.tool_calls.push(ToolCallRecord::started(turn, name, args));
            }
            StreamEvent::ToolEnd {
                name,
                duration_ms,
                result,
                error,
            } => {
                // No call id on the wire: match the most recent in-flight call
                // with the same name.
                match self
                    .tool_calls
                    .iter_mut()
                    .rev()
                    .find(|r| r.name == name && r.is_in_flight())
                {
                    Some(record) => record.complete(duration_ms, result, error),
                    None => {
                        tracing::warn!("tool_end for '{}' has no in-flight tool_start", name);
                        return Applied::Ignored;
                    }
                }
            }
            StreamEvent::Text { chunk } => {
                self.phase = Phase::Streaming;
                self.answer.push_str(&chunk);
            }
            StreamEvent::Done {
                sources,
                debug,
                cached,
            } => {
                self.phase = Phase::Done;
                self.sources = sources;
                self.debug = debug;
                self.cached = cached;
                return Applied::Completed;
            }
            StreamEvent::Error { message } => {
                self.phase = Phase::Error;
                self.error = Some(message);
            }
        }
        Applied::Updated
    }
}
