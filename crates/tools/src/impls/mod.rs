//! Dashboard Data Tools
//!
//! | Tool | Upstream path | Kept | Summarized |
//! |---|---|---|---|
//! | `get_chain_timeseries` | `/chains/{chain_id}/timeseries/{metric}` | most recent 30 points + window stats | nothing |
//! | `get_landing_summary` | `/landing` | top-level totals, first 20 chains | per-chain nested breakdowns |
//! | `get_economics_summary` | `/economics` | first 15 rows, or the requested chain's row | nested cost breakdowns |
//! | `get_fee_table` | `/fees/table` | first 20 rows, or the requested chain's row | per-row fee histories |
//! | `get_chain_overview` | `/chains/{chain_id}/overview` | scalar facts, lists capped at 15 | nested blocks |

mod args;
mod chain_overview;
mod chain_timeseries;
mod economics_summary;
mod fee_table;
mod landing_summary;
mod rows;

use std::sync::Arc;

pub use chain_overview::ChainOverviewTool;
pub use chain_timeseries::ChainTimeseriesTool;
pub use economics_summary::EconomicsSummaryTool;
pub use fee_table::FeeTableTool;
pub use landing_summary::LandingSummaryTool;

use crate::trait_def::ToolRegistry;

/// Registry holding every dashboard tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ChainTimeseriesTool));
    registry.register(Arc::new(LandingSummaryTool));
    registry.register(Arc::new(EconomicsSummaryTool));
    registry.register(Arc::new(FeeTableTool));
    registry.register(Arc::new(ChainOverviewTool));
    registry
}
