//! Tick range aggregation
//!
//! Liquidity arrives as tagged half-open tick ranges with an ETH-equivalent
//! density per tick. The visible domain is cut into bins of an effective
//! width (a multiple of the atomic spacing chosen so the bin count stays
//! near a target) and every range contributes to each bin in proportion to
//! its overlap with it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::tick::{PriceModel, TickDomain};

/// Category of a liquidity range
///
/// Ordered bottom to top of the stacked bar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LiquidityTag {
    EthAtCurrentTick,
    FairLaunchCoinOnly,
    InFairLaunch,
    FairLaunchEthOnly,
    BidWall,
    PendingBidWall,
    Custom(String),
}

impl LiquidityTag {
    pub fn as_str(&self) -> &str {
        match self {
            LiquidityTag::EthAtCurrentTick => "ETHAtCurrentTick",
            LiquidityTag::FairLaunchCoinOnly => "FairLaunchCoinOnly",
            LiquidityTag::InFairLaunch => "InFairLaunch",
            LiquidityTag::FairLaunchEthOnly => "FairLaunchETHOnly",
            LiquidityTag::BidWall => "BidWall",
            LiquidityTag::PendingBidWall => "PendingBidWall",
            LiquidityTag::Custom(name) => name,
        }
    }
}

impl From<String> for LiquidityTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ETHAtCurrentTick" => LiquidityTag::EthAtCurrentTick,
            "FairLaunchCoinOnly" => LiquidityTag::FairLaunchCoinOnly,
            "InFairLaunch" => LiquidityTag::InFairLaunch,
            "FairLaunchETHOnly" => LiquidityTag::FairLaunchEthOnly,
            "BidWall" => LiquidityTag::BidWall,
            "PendingBidWall" => LiquidityTag::PendingBidWall,
            _ => LiquidityTag::Custom(value),
        }
    }
}

impl From<&str> for LiquidityTag {
    fn from(value: &str) -> Self {
        LiquidityTag::from(value.to_string())
    }
}

impl From<LiquidityTag> for String {
    fn from(tag: LiquidityTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for LiquidityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged liquidity over `[start_tick, end_tick)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRange {
    pub tag: LiquidityTag,

    #[serde(alias = "startTick")]
    pub start_tick: i32,

    #[serde(alias = "endTick")]
    pub end_tick: i32,

    /// ETH-equivalent liquidity per tick
    #[serde(alias = "ethEquivalentPerTick")]
    pub eth_per_tick: f64,
}

impl LiquidityRange {
    pub fn new(
        tag: impl Into<LiquidityTag>,
        start_tick: i32,
        end_tick: i32,
        eth_per_tick: f64,
    ) -> Self {
        Self {
            tag: tag.into(),
            start_tick,
            end_tick,
            eth_per_tick,
        }
    }

    /// Ranges with no positive density or no width contribute nothing
    pub fn is_empty(&self) -> bool {
        !(self.eth_per_tick > 0.0) || self.start_tick >= self.end_tick
    }
}

/// Accumulated magnitude of one tag in one bin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinValue {
    /// Sum of overlap-weighted magnitudes
    pub raw: f64,

    /// Compressed value for display
    pub display: f64,
}

/// One chart bar covering `[tick, tick + width)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBin {
    pub tick: i32,
    pub width: i32,

    /// Market cap at the bin's starting tick
    pub mcap: f64,

    pub values: BTreeMap<LiquidityTag, BinValue>,
}

impl ChartBin {
    pub fn end_tick(&self) -> i64 {
        self.tick as i64 + self.width as i64
    }

    pub fn value(&self, tag: &LiquidityTag) -> BinValue {
        self.values.get(tag).copied().unwrap_or_default()
    }

    /// Sum of raw magnitudes across tags
    pub fn total_raw(&self) -> f64 {
        self.values.values().map(|v| v.raw).sum()
    }
}

/// Cube-root display compression; non-positive values map to zero
pub fn compress(raw: f64) -> f64 {
    if raw > 0.0 {
        raw.cbrt()
    } else {
        0.0
    }
}

/// Bin width for `domain`: a multiple of `tick_spacing` keeping the bin
/// count at or below `max_data_points`
///
/// Empty or inverted domains fall back to the atomic spacing.
pub fn effective_tick_spacing(
    domain: TickDomain,
    tick_spacing: i32,
    max_data_points: usize,
) -> i32 {
    let spacing = tick_spacing.max(1);
    let range = domain.width();
    if range <= 0 || max_data_points == 0 {
        return spacing;
    }

    let atomic_points = range as f64 / spacing as f64;
    let target_points = (max_data_points as f64).min(atomic_points);
    let factor = (atomic_points / target_points).ceil().max(1.0);

    spacing.saturating_mul(factor as i32)
}

/// Bin `ranges` across `domain` with bins of `effective_spacing` ticks
///
/// Every tag seen in `ranges` gets an entry in every bin, zero when the tag
/// has no liquidity there. Each range contributes
/// `eth_per_tick * effective_spacing * height_per_eth` spread over the bins
/// it overlaps, weighted by overlap length over bin width.
pub fn aggregate_liquidity(
    domain: TickDomain,
    effective_spacing: i32,
    ranges: &[LiquidityRange],
    model: &PriceModel,
    height_per_eth: f64,
) -> Vec<ChartBin> {
    let spacing = effective_spacing.max(1);
    let step = spacing as i64;

    let empty: BTreeMap<LiquidityTag, BinValue> = ranges
        .iter()
        .map(|range| (range.tag.clone(), BinValue::default()))
        .collect();

    let mut bins = Vec::new();
    let mut tick = domain.min as i64;
    while tick <= domain.max as i64 {
        bins.push(ChartBin {
            tick: tick as i32,
            width: spacing,
            mcap: model.market_cap(tick as i32),
            values: empty.clone(),
        });
        tick += step;
    }

    let mut skipped = 0usize;
    for range in ranges {
        if range.is_empty() {
            skipped += 1;
            continue;
        }

        let start = range.start_tick as i64;
        let end = range.end_tick as i64;
        let total = range.eth_per_tick * spacing as f64 * height_per_eth;

        for bin in bins.iter_mut() {
            let bin_start = bin.tick as i64;
            let bin_end = bin_start + step;
            if bin_end <= start || bin_start >= end {
                continue;
            }

            let overlap = bin_end.min(end) - bin_start.max(start);
            if overlap <= 0 {
                continue;
            }

            let adjusted = total * (overlap as f64 / spacing as f64);
            if let Some(value) = bin.values.get_mut(&range.tag) {
                value.raw += adjusted;
            }
        }
    }

    for bin in bins.iter_mut() {
        for value in bin.values.values_mut() {
            value.display = compress(value.raw);
        }
    }

    if skipped > 0 {
        trace!(skipped, "Skipped empty liquidity ranges");
    }
    debug!(
        min = domain.min,
        max = domain.max,
        effective_spacing = spacing,
        bins = bins.len(),
        ranges = ranges.len(),
        "Aggregated liquidity"
    );

    bins
}
