//! Per-context tool exposure.
//!
//! The agent only ever sees the tools listed for the kind of context it is
//! explaining. Names are resolved against the registry at lookup time, so a
//! name missing from the registry is silently skipped.

use std::sync::Arc;

use insight_core::ContextKind;
use serde_json::Value;

use crate::impls::default_registry;
use crate::trait_def::{Tool, ToolDeclaration, ToolRegistry};

const TABLE_TOOLS: &[&str] = &[
    "get_landing_summary",
    "get_economics_summary",
    "get_fee_table",
    "get_chain_timeseries",
];

const CHAIN_TOOLS: &[&str] = &[
    "get_chain_overview",
    "get_chain_timeseries",
    "get_fee_table",
    "get_economics_summary",
];

const CHART_TOOLS: &[&str] = &["get_chain_timeseries", "get_landing_summary"];

const CARD_TOOLS: &[&str] = &["get_landing_summary", "get_chain_overview"];

/// Ordered tool names offered for `kind`.
pub fn tool_names(kind: ContextKind) -> &'static [&'static str] {
    match kind {
        ContextKind::Table => TABLE_TOOLS,
        ContextKind::Chain => CHAIN_TOOLS,
        ContextKind::Chart => CHART_TOOLS,
        ContextKind::Card => CARD_TOOLS,
    }
}

#[derive(Clone)]
pub struct ToolCatalog {
    registry: Arc<ToolRegistry>,
}

impl ToolCatalog {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Declarations offered for `kind`, in catalog order.
    pub fn tools_for(&self, kind: ContextKind) -> Vec<ToolDeclaration> {
        tool_names(kind)
            .iter()
            .filter_map(|name| self.registry.get(name))
            .map(|tool| tool.declaration())
            .collect()
    }

    /// `tools_for` in function-calling shape.
    pub fn function_declarations(&self, kind: ContextKind) -> Vec<Value> {
        self.tools_for(kind)
            .iter()
            .map(ToolDeclaration::to_function)
            .collect()
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    pub fn is_allowed(&self, kind: ContextKind, name: &str) -> bool {
        tool_names(kind).contains(&name) && self.registry.contains(name)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new(Arc::new(default_registry()))
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("tools", &self.registry.names())
            .finish()
    }
}
