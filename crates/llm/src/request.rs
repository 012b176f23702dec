//! Insight Request Body

use insight_core::{AnalysisContext, ContextKind, ConversationMessage, Role};
use serde::{Deserialize, Serialize};

/// A conversation turn as sent to the agent (no timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ConversationMessage> for WireMessage {
    fn from(msg: &ConversationMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// JSON body posted to the agent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub component_type: ContextKind,
    pub title: String,
    pub context: AnalysisContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<WireMessage>>,
}

impl InsightRequest {
    pub fn new(title: impl Into<String>, context: AnalysisContext) -> Self {
        Self {
            component_type: context.kind(),
            title: title.into(),
            context,
            messages: None,
        }
    }

    /// Attach conversation history. An empty history is omitted from the body.
    pub fn with_messages(mut self, messages: &[ConversationMessage]) -> Self {
        self.messages = if messages.is_empty() {
            None
        } else {
            Some(messages.iter().map(WireMessage::from).collect())
        };
        self
    }

    pub fn is_follow_up(&self) -> bool {
        self.messages.as_ref().is_some_and(|m| !m.is_empty())
    }
}
