//! Liquidity module for the Flaunch dashboard
//!
//! Turns tagged tick ranges into chart-ready bins:
//! - Tick to price and market cap conversion
//! - Zoom-aware bin width selection and overlap binning
//! - Cube-root display compression with the raw value retained
//! - Viewport pan, zoom and auto-recenter
//! - Stacked-bar model for the canvas sketch

use tracing::info;

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod format;
pub mod memo;
pub mod sketch;
pub mod tick;
pub mod view;
pub mod viewport;

pub use aggregate::{
    aggregate_liquidity, compress, effective_tick_spacing, BinValue, ChartBin, LiquidityRange,
    LiquidityTag,
};
pub use chart::{bar_size, max_y_value, mcap_domain, BarSide, McapDomain};
pub use config::ChartConfig;
pub use format::{format_coin, format_mcap};
pub use memo::Memo;
pub use sketch::{SketchBar, SketchPosition, StackedBars};
pub use tick::{price_at_tick, PriceModel, TickDomain, MAX_TICK, MIN_TICK};
pub use view::{ChartSnapshot, LiquidityView, Tooltip, TooltipEntry};
pub use viewport::{AutoRecenter, Viewport};

/// Error types for the liquidity module
///
/// Aggregation itself never fails; malformed ranges are skipped. Only an
/// unusable chart configuration is reported.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Invalid chart configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for the liquidity module
pub type ChartResult<T> = std::result::Result<T, ChartError>;

/// Initialize the module
pub fn init() {
    info!("Initializing liquidity module");
}
