//! `get_fee_table` - current user-facing fees per chain.

use async_trait::async_trait;
use insight_core::{CoreError, CoreResult};
use serde_json::{json, Value};

use super::args::optional_id;
use super::rows::{rows_for_chain, rows_of};
use crate::trait_def::{object_schema, string_param, Tool};
use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

const PATH: &str = "/fees/table";

const MAX_ROWS: usize = 20;

pub struct FeeTableTool;

#[async_trait]
impl Tool for FeeTableTool {
    fn name(&self) -> &str {
        "get_fee_table"
    }

    fn description(&self) -> &str {
        "Current transaction fees per chain (median fee, native transfer, swap). Optionally restricted to one chain."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(
            &[("chain_id", string_param("Restrict to this chain, e.g. 'base'"))],
            &[],
        )
    }

    fn truncation(&self) -> TruncationPolicy {
        // Per-row fee histories are large; summarize them early.
        TruncationPolicy::default()
            .with_max_items(MAX_ROWS)
            .with_max_nested_bytes(1024)
    }

    async fn run(&self, upstream: &dyn UpstreamClient, args: &Value) -> CoreResult<Value> {
        let chain_id = optional_id(args, "chain_id")?;
        let payload = upstream.get_json(PATH, &[]).await?;
        let rows = rows_of(&payload, &["rows", "chains"], PATH)?;

        match chain_id {
            Some(chain_id) => {
                let row = rows_for_chain(rows, &chain_id)
                    .into_iter()
                    .next()
                    .ok_or_else(|| CoreError::not_found(format!("no fee data for chain '{}'", chain_id)))?;
                Ok(json!({ "chain_id": chain_id, "fees": row }))
            }
            None => Ok(json!({
                "row_count": rows.len(),
                "rows": rows.iter().take(MAX_ROWS).collect::<Vec<_>>(),
            })),
        }
    }
}
