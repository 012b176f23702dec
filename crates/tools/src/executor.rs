//! Sandboxed Tool Executor
//!
//! Runs one tool call against the upstream and always produces a
//! [`ToolOutcome`]. Unknown tools, bad arguments, upstream failures,
//! timeouts and panics inside a tool body all become `{"error": ...}`;
//! nothing here can abort the conversation that issued the call.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use insight_core::{ContextKind, ToolCallRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ToolCatalog;
use crate::truncate::truncate_value;
use crate::upstream::UpstreamClient;

/// Per-call bound when none is configured.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(8);

/// Result of a tool call. Serializes as `{"data": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Data { data: Value },
    Error { error: String },
}

impl ToolOutcome {
    pub fn data(data: Value) -> Self {
        ToolOutcome::Data { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Error { error } => Some(error),
            ToolOutcome::Data { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolOutcome::Data { data } => serde_json::json!({ "data": data }),
            ToolOutcome::Error { error } => serde_json::json!({ "error": error }),
        }
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    catalog: ToolCatalog,
    upstream: Arc<dyn UpstreamClient>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(catalog: ToolCatalog, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            catalog,
            upstream,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `name` with `args`. Never fails.
    pub async fn execute(&self, name: &str, args: &Value) -> ToolOutcome {
        let Some(tool) = self.catalog.resolve(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return ToolOutcome::error(format!("Unknown tool: {}", name));
        };

        let run = AssertUnwindSafe(tool.run(self.upstream.as_ref(), args)).catch_unwind();
        match tokio::time::timeout(self.timeout, run).await {
            Err(_) => {
                tracing::warn!(tool = name, timeout_ms = self.timeout.as_millis() as u64, "Tool timed out");
                ToolOutcome::error(format!(
                    "Tool '{}' timed out after {} ms",
                    name,
                    self.timeout.as_millis()
                ))
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::warn!(tool = name, panic = %message, "Tool panicked");
                ToolOutcome::error(format!("Tool '{}' failed: {}", name, message))
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(tool = name, error = %e, "Tool failed");
                ToolOutcome::error(e.to_string())
            }
            Ok(Ok(Ok(data))) => ToolOutcome::data(truncate_value(&data, &tool.truncation())),
        }
    }

    /// Like [`execute`](Self::execute), but refuses tools not offered for `kind`.
    pub async fn execute_for(&self, kind: ContextKind, name: &str, args: &Value) -> ToolOutcome {
        if !self.catalog.is_allowed(kind, name) {
            tracing::warn!(tool = name, kind = %kind, "Tool not offered for context kind");
            return ToolOutcome::error(format!("Tool '{}' is not available for {} context", name, kind));
        }
        self.execute(name, args).await
    }

    /// Execute and record the call as a completed [`ToolCallRecord`].
    pub async fn execute_call(&self, turn: u32, name: &str, args: Value) -> ToolCallRecord {
        let started = Instant::now();
        let outcome = self.execute(name, &args).await;
        // Zero marks a record as in flight, so completed calls take at least 1 ms.
        let duration_ms = (started.elapsed().as_millis() as u64).max(1);
        tracing::debug!(tool = name, turn, duration_ms, error = outcome.is_error(), "Tool call recorded");

        let mut record = ToolCallRecord::started(turn, name, args);
        record.duration_ms = duration_ms;
        match outcome {
            ToolOutcome::Data { data } => record.result = Some(data),
            ToolOutcome::Error { error } => record.error = Some(error),
        }
        record
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("catalog", &self.catalog)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
