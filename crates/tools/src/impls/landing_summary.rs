//! `get_landing_summary` - cross-chain totals and per-chain ranking.

use async_trait::async_trait;
use insight_core::CoreResult;
use serde_json::{json, Value};

use super::rows::{rows_of, scalar_fields};
use crate::trait_def::{object_schema, Tool};
use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

const PATH: &str = "/landing";

/// Chains kept from the ranking
const MAX_CHAINS: usize = 20;

pub struct LandingSummaryTool;

#[async_trait]
impl Tool for LandingSummaryTool {
    fn name(&self) -> &str {
        "get_landing_summary"
    }

    fn description(&self) -> &str {
        "Cross-chain overview: ecosystem totals plus the leading chains with their headline metrics."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(&[], &[])
    }

    fn truncation(&self) -> TruncationPolicy {
        TruncationPolicy::default().with_max_items(MAX_CHAINS)
    }

    async fn run(&self, upstream: &dyn UpstreamClient, _args: &Value) -> CoreResult<Value> {
        let payload = upstream.get_json(PATH, &[]).await?;
        let chains = rows_of(&payload, &["chains"], PATH)?;
        Ok(json!({
            "totals": scalar_fields(&payload),
            "chain_count": chains.len(),
            "chains": chains.iter().take(MAX_CHAINS).collect::<Vec<_>>(),
        }))
    }
}
