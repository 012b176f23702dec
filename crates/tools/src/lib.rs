//! Insight Tools
//!
//! The data-fetching tools the insight agent may call, and the sandbox they
//! run in:
//! - `Tool` trait and `ToolRegistry` - declaration + execution, ordered lookup
//! - `ToolCatalog` - which tools each context kind is offered
//! - `ToolExecutor` - timeout, error containment and truncation; never fails
//! - `UpstreamClient` - JSON access to the dashboard's analytics APIs
//! - `impls` - the five dashboard tools

pub mod catalog;
pub mod executor;
pub mod impls;
pub mod trait_def;
pub mod truncate;
pub mod upstream;

pub use catalog::ToolCatalog;
pub use executor::{ToolExecutor, ToolOutcome, DEFAULT_TOOL_TIMEOUT};
pub use impls::default_registry;
pub use trait_def::{Tool, ToolDeclaration, ToolRegistry};
pub use truncate::{truncate_value, TruncationPolicy};
pub use upstream::{HttpUpstream, UpstreamClient};
