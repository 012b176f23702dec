//! Stream Protocol Types
//!
//! Typed events carried by the insight agent's streaming response, and the
//! session phases they drive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Phase of an insight session.
///
/// `idle -> thinking -> fetching -> streaming -> done`, with `error`
/// reachable from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Thinking,
    Fetching,
    Streaming,
    Done,
    Error,
}

impl Phase {
    /// `done` and `error` end a session; nothing moves out of them except a reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Thinking => "thinking",
            Phase::Fetching => "fetching",
            Phase::Streaming => "streaming",
            Phase::Done => "done",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation attached to a finished answer.
///
/// The agent may send either a bare label or `{title, url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SourceRepr")]
pub struct Source {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRepr {
    Label(String),
    Full {
        title: String,
        #[serde(default)]
        url: Option<String>,
    },
}

impl From<SourceRepr> for Source {
    fn from(repr: SourceRepr) -> Self {
        match repr {
            SourceRepr::Label(title) => Source { title, url: None },
            SourceRepr::Full { title, url } => Source { title, url },
        }
    }
}

/// Decoded protocol event. Produced by the frame parser, consumed by the
/// stream state reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Coarse phase transition (e.g. entering `fetching`)
    Status {
        phase: Phase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Reasoning text delta
    Thinking { text: String },

    /// The agent started a tool call
    ToolStart {
        name: String,
        #[serde(default)]
        args: Value,
        #[serde(default)]
        turn: u32,
    },

    /// A tool call finished. The wire protocol carries no call id.
    ToolEnd {
        name: String,
        #[serde(rename = "duration", default)]
        duration_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Answer text delta
    Text {
        #[serde(alias = "text")]
        chunk: String,
    },

    /// Terminal success
    Done {
        #[serde(default)]
        sources: Vec<Source>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        debug: Option<Value>,
        #[serde(default)]
        cached: bool,
    },

    /// Terminal failure reported by the agent
    Error { message: String },
}

impl StreamEvent {
    /// Event names understood on the wire.
    pub const KNOWN_TYPES: [&'static str; 7] = [
        "status",
        "thinking",
        "tool_start",
        "tool_end",
        "text",
        "done",
        "error",
    ];

    pub fn is_known_type(event_type: &str) -> bool {
        Self::KNOWN_TYPES.contains(&event_type)
    }

    /// Build an event from a frame's `event:` name and decoded `data:` JSON.
    pub fn from_wire(event_type: &str, data: Value) -> Result<Self, serde_json::Error> {
        let mut object = match data {
            Value::Object(map) => map,
            // Scalar payloads are only meaningful for delta events.
            Value::String(s) => {
                let mut map = serde_json::Map::new();
                let field = match event_type {
                    "thinking" => "text",
                    "error" => "message",
                    _ => "chunk",
                };
                map.insert(field.to_string(), Value::String(s));
                map
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected JSON object payload, got {}",
                    other
                )))
            }
        };
        object.insert("type".to_string(), Value::String(event_type.to_string()));
        serde_json::from_value(Value::Object(object))
    }

    /// Wire name of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Status { .. } => "status",
            StreamEvent::Thinking { .. } => "thinking",
            StreamEvent::ToolStart { .. } => "tool_start",
            StreamEvent::ToolEnd { .. } => "tool_end",
            StreamEvent::Text { .. } => "text",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
        }
    }
}
