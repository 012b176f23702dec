//! Analysis Context
//!
//! The on-screen analytical state an insight is requested for, and the
//! cache key derived from it.
//!
//! Key layout per kind (`:` separates components, `,` separates list items):
//!
//! - `table:{total_items}:{sorted row keys}:{sorted_by | default}`
//! - `chain:{chain_id}:{rounded weekly active addresses}`
//! - `chart:{chart_id}:{sorted series}:{range | default}`
//! - `card:{card_id}:{rounded value}`
//!
//! Free-text components have `%`, `:` and `,` percent-encoded, and an empty
//! list item is written as `%00`, so distinct row sets never share a key.
//!
//! Headline metrics are rounded to the nearest whole unit so that
//! sub-unit jitter between refreshes maps onto the same cache entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Placeholder used when an optional ordering/range field is absent.
const DEFAULT_MARKER: &str = "default";

/// Placeholder for a non-finite headline metric.
const NON_FINITE_MARKER: &str = "na";

/// Kind of analytical component an insight is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Table,
    Chain,
    Chart,
    Card,
}

impl ContextKind {
    /// All kinds, in declaration order.
    pub const ALL: [ContextKind; 4] = [
        ContextKind::Table,
        ContextKind::Chain,
        ContextKind::Chart,
        ContextKind::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Table => "table",
            ContextKind::Chain => "chain",
            ContextKind::Chart => "chart",
            ContextKind::Card => "card",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ContextKind::Table),
            "chain" => Ok(ContextKind::Chain),
            "chart" => Ok(ContextKind::Chart),
            "card" => Ok(ContextKind::Card),
            other => Err(CoreError::validation(format!(
                "unknown context kind: {}",
                other
            ))),
        }
    }
}

/// A visible table row. Only `key` participates in the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TableRow {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
        }
    }
}

/// Analytical context attached to an insight request.
///
/// Immutable once a session starts; sessions hold their own clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisContext {
    #[serde(rename_all = "camelCase")]
    Table {
        total_items: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sorted_by: Option<String>,
        rows: Vec<TableRow>,
        /// Visible column headers. Display metadata, not part of the key.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        columns: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Chain {
        chain_id: String,
        weekly_active_addresses: f64,
    },
    #[serde(rename_all = "camelCase")]
    Chart {
        chart_id: String,
        series: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Card { card_id: String, value: f64 },
}

impl AnalysisContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            AnalysisContext::Table { .. } => ContextKind::Table,
            AnalysisContext::Chain { .. } => ContextKind::Chain,
            AnalysisContext::Chart { .. } => ContextKind::Chart,
            AnalysisContext::Card { .. } => ContextKind::Card,
        }
    }

    /// Convenience for `derive_key(self)`.
    pub fn cache_key(&self) -> String {
        derive_key(self)
    }
}

/// Derive the stable cache key for a context.
///
/// Pure and deterministic: list components are sorted before joining, so
/// the key depends on the *set* of visible rows/series, never their order.
pub fn derive_key(context: &AnalysisContext) -> String {
    match context {
        AnalysisContext::Table {
            total_items,
            sorted_by,
            rows,
            ..
        } => {
            let keys = sorted_joined(rows.iter().map(|r| r.key.as_str()));
            format!(
                "table:{}:{}:{}",
                total_items,
                keys,
                escape(or_default(sorted_by.as_deref()))
            )
        }
        AnalysisContext::Chain {
            chain_id,
            weekly_active_addresses,
        } => format!(
            "chain:{}:{}",
            escape(chain_id),
            round_metric(*weekly_active_addresses)
        ),
        AnalysisContext::Chart {
            chart_id,
            series,
            range,
        } => {
            let series = sorted_joined(series.iter().map(String::as_str));
            format!(
                "chart:{}:{}:{}",
                escape(chart_id),
                series,
                escape(or_default(range.as_deref()))
            )
        }
        AnalysisContext::Card { card_id, value } => {
            format!("card:{}:{}", escape(card_id), round_metric(*value))
        }
    }
}

fn sorted_joined<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let mut items: Vec<String> = items
        .map(|item| if item.is_empty() { "%00".to_string() } else { escape(item) })
        .collect();
    items.sort_unstable();
    items.join(",")
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            ',' => out.push_str("%2C"),
            other => out.push(other),
        }
    }
    out
}

fn or_default(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_MARKER,
    }
}

fn round_metric(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value.round() as i64)
    } else {
        NON_FINITE_MARKER.to_string()
    }
}
