//! `get_chain_overview` - headline facts for one chain.

use async_trait::async_trait;
use insight_core::{CoreError, CoreResult};
use serde_json::Value;

use super::args::required_id;
use crate::trait_def::{object_schema, string_param, Tool};
use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

const MAX_LIST_ITEMS: usize = 15;

pub struct ChainOverviewTool;

#[async_trait]
impl Tool for ChainOverviewTool {
    fn name(&self) -> &str {
        "get_chain_overview"
    }

    fn description(&self) -> &str {
        "Overview of one chain: stack, launch date, current activity, fees and ranking among chains."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(
            &[("chain_id", string_param("Chain identifier, e.g. 'base'"))],
            &["chain_id"],
        )
    }

    fn truncation(&self) -> TruncationPolicy {
        // The overview is a single object; its direct fields are the blocks.
        TruncationPolicy::default()
            .with_max_items(MAX_LIST_ITEMS)
            .with_keep_depth(1)
    }

    async fn run(&self, upstream: &dyn UpstreamClient, args: &Value) -> CoreResult<Value> {
        let chain_id = required_id(args, "chain_id")?;
        let path = format!("/chains/{}/overview", chain_id);
        let payload = upstream.get_json(&path, &[]).await?;

        // Some deployments wrap the overview in {"data": {...}}.
        let overview = match payload.get("data") {
            Some(inner @ Value::Object(_)) => inner.clone(),
            _ => payload,
        };
        if !overview.is_object() {
            return Err(CoreError::parse(format!(
                "expected an object from {}, got {}",
                path,
                type_name(&overview)
            )));
        }
        Ok(overview)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
