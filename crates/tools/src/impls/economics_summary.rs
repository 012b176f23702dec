//! `get_economics_summary` - revenue, costs and profit per chain.

use async_trait::async_trait;
use insight_core::{CoreError, CoreResult};
use serde_json::{json, Value};

use super::args::optional_id;
use super::rows::{rows_for_chain, rows_of};
use crate::trait_def::{object_schema, string_param, Tool};
use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

const PATH: &str = "/economics";

/// Rows kept when no chain filter is given
const MAX_ROWS: usize = 15;

pub struct EconomicsSummaryTool;

#[async_trait]
impl Tool for EconomicsSummaryTool {
    fn name(&self) -> &str {
        "get_economics_summary"
    }

    fn description(&self) -> &str {
        "Onchain economics per chain: fee revenue, settlement and data-availability costs, and profit. Optionally restricted to one chain."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(
            &[("chain_id", string_param("Restrict to this chain, e.g. 'base'"))],
            &[],
        )
    }

    fn truncation(&self) -> TruncationPolicy {
        TruncationPolicy::default().with_max_items(MAX_ROWS)
    }

    async fn run(&self, upstream: &dyn UpstreamClient, args: &Value) -> CoreResult<Value> {
        let chain_id = optional_id(args, "chain_id")?;
        let payload = upstream.get_json(PATH, &[]).await?;
        let rows = rows_of(&payload, &["rows", "chains", "data"], PATH)?;

        match chain_id {
            Some(chain_id) => {
                let matched = rows_for_chain(rows, &chain_id);
                let row = matched.first().ok_or_else(|| {
                    CoreError::not_found(format!("no economics data for chain '{}'", chain_id))
                })?;
                Ok(json!({ "chain_id": chain_id, "economics": row }))
            }
            None => Ok(json!({
                "row_count": rows.len(),
                "rows": rows.iter().take(MAX_ROWS).collect::<Vec<_>>(),
            })),
        }
    }
}
