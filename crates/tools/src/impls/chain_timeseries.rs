//! `get_chain_timeseries` - one metric's history for one chain.
//!
//! Keeps the most recent points (30 by default, fewer if `days` asks for
//! less) and adds window statistics so the agent rarely needs the raw series.

use async_trait::async_trait;
use insight_core::CoreResult;
use serde_json::{json, Value};

use super::args::{optional_count, required_id};
use super::rows::rows_of;
use crate::trait_def::{integer_param, object_schema, string_param, Tool};
use crate::truncate::TruncationPolicy;
use crate::upstream::UpstreamClient;

/// Points returned to the agent when `days` is not given
const MAX_POINTS: u64 = 30;

pub struct ChainTimeseriesTool;

#[async_trait]
impl Tool for ChainTimeseriesTool {
    fn name(&self) -> &str {
        "get_chain_timeseries"
    }

    fn description(&self) -> &str {
        "Daily history of one metric for one chain (e.g. txcount, daa, fees, tvl). Returns the most recent points with min, max, latest value and change over the window."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(
            &[
                ("chain_id", string_param("Chain identifier, e.g. 'base'")),
                ("metric", string_param("Metric key, e.g. 'txcount', 'daa', 'fees'")),
                ("days", integer_param("Number of most recent daily points", 1, MAX_POINTS)),
            ],
            &["chain_id", "metric"],
        )
    }

    fn truncation(&self) -> TruncationPolicy {
        TruncationPolicy::default().with_max_items(MAX_POINTS as usize)
    }

    async fn run(&self, upstream: &dyn UpstreamClient, args: &Value) -> CoreResult<Value> {
        let chain_id = required_id(args, "chain_id")?;
        let metric = required_id(args, "metric")?;
        let days = optional_count(args, "days", MAX_POINTS)?;
        let window = days.unwrap_or(MAX_POINTS) as usize;

        let path = format!("/chains/{}/timeseries/{}", chain_id, metric);
        let query: Vec<(&str, String)> = days.map(|d| ("days", d.to_string())).into_iter().collect();
        let payload = upstream.get_json(&path, &query).await?;
        let points = rows_of(&payload, &["data", "points"], &path)?;

        let start = points.len().saturating_sub(window);
        let recent = &points[start..];
        let values: Vec<f64> = recent.iter().filter_map(point_value).collect();

        let mut out = json!({
            "chain_id": chain_id,
            "metric": metric,
            "total_points": points.len(),
            "points": recent,
        });
        if let (Some(first), Some(last)) = (values.first(), values.last()) {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            out["stats"] = json!({
                "latest": last,
                "min": min,
                "max": max,
                "change_pct": if *first != 0.0 {
                    Some(((last - first) / first * 1000.0).round() / 10.0)
                } else {
                    None
                },
            });
        }
        Ok(out)
    }
}

/// Numeric value of a point: `[ts, value]`, `{value}` or `{v}`.
fn point_value(point: &Value) -> Option<f64> {
    match point {
        Value::Array(pair) => pair.get(1).and_then(Value::as_f64),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("v"))
            .and_then(Value::as_f64),
        _ => None,
    }
}
