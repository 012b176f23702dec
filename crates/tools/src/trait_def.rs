//! Tool Trait and Registry
//!
//! A tool pairs a function-calling declaration with an async body that reads
//! from the upstream analytics APIs. The registry is the global set of tools;
//! which of them an agent is offered is decided by the catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use insight_core::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

/// Declaration offered to the agent. Pure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolDeclaration {
    /// Function-calling shape: `{"type": "function", "function": {...}}`.
    pub fn to_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// A data-fetching tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the agent calls the tool by.
    fn name(&self) -> &str;

    /// Human-readable description shown to the agent.
    fn description(&self) -> &str;

    /// JSON schema describing the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Output bounds applied by the executor after `run` returns.
    fn truncation(&self) -> TruncationPolicy {
        TruncationPolicy::default()
    }

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Fetch and shape the tool's data. Errors are contained by the executor.
    async fn run(&self, upstream: &dyn UpstreamClient, args: &Value) -> CoreResult<Value>;
}

/// Object schema from `(name, schema)` properties.
pub fn object_schema(properties: &[(&str, Value)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

pub fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn integer_param(description: &str, minimum: u64, maximum: u64) -> Value {
    json!({
        "type": "integer",
        "description": description,
        "minimum": minimum,
        "maximum": maximum,
    })
}

/// Registry of every known tool, with insertion-ordered iteration.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Declarations of every registered tool, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.declaration())
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}
