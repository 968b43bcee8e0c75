//! Chart state bundle
//!
//! `LiquidityView` owns everything the chart renders from: the viewport,
//! auto-recenter tracker, price model and tick data. Derived bins are
//! memoized on the inputs that determine them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{
    aggregate_liquidity, effective_tick_spacing, ChartBin, LiquidityRange, LiquidityTag,
};
use crate::chart::{bar_size, max_y_value, mcap_domain, McapDomain};
use crate::config::ChartConfig;
use crate::format::format_mcap;
use crate::memo::Memo;
use crate::tick::{PriceModel, TickDomain};
use crate::viewport::{AutoRecenter, Viewport};
use crate::ChartResult;

/// Inputs that determine the binned data
#[derive(Debug, Clone, PartialEq)]
struct BinsKey {
    domain: TickDomain,
    effective_spacing: i32,
    data_version: u64,
    model: PriceModel,
    height_per_eth: f64,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub domain: TickDomain,
    pub zoom_level: f64,
    pub effective_spacing: i32,
    pub bins: Arc<Vec<ChartBin>>,
    pub mcap_domain: McapDomain,
    pub current_tick: i32,
    pub current_mcap: f64,
    pub bar_size: u32,
    pub max_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipEntry {
    pub tag: LiquidityTag,
    pub raw: f64,
}

/// Hover details for one bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub label: String,
    pub entries: Vec<TooltipEntry>,
}

pub struct LiquidityView {
    config: ChartConfig,
    model: PriceModel,
    viewport: Viewport,
    auto_recenter: AutoRecenter,
    current_tick: i32,
    ranges: Vec<LiquidityRange>,
    data_version: u64,
    bins: Memo<BinsKey, Vec<ChartBin>>,
}

impl LiquidityView {
    pub fn new(
        config: ChartConfig,
        ranges: Vec<LiquidityRange>,
        current_tick: i32,
        eth_is_token0: bool,
        usd_per_eth: f64,
    ) -> ChartResult<Self> {
        config.validate()?;

        let model = PriceModel::from_config(&config, eth_is_token0, usd_per_eth);
        let viewport = Viewport::around(current_tick, &config);
        let mut auto_recenter = AutoRecenter::new(config.auto_recenter);
        auto_recenter.seed(current_tick);

        info!(
            current_tick,
            ranges = ranges.len(),
            eth_is_token0,
            "Created liquidity view"
        );

        Ok(Self {
            config,
            model,
            viewport,
            auto_recenter,
            current_tick,
            ranges,
            data_version: 0,
            bins: Memo::new(),
        })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn model(&self) -> &PriceModel {
        &self.model
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn current_tick(&self) -> i32 {
        self.current_tick
    }

    pub fn ranges(&self) -> &[LiquidityRange] {
        &self.ranges
    }

    /// Replace the tick data
    pub fn set_ranges(&mut self, ranges: Vec<LiquidityRange>) {
        self.ranges = ranges;
        self.data_version += 1;
    }

    pub fn set_usd_per_eth(&mut self, usd_per_eth: f64) {
        self.model.usd_per_eth = usd_per_eth;
    }

    /// Move the current tick; returns true if the viewport was recentered
    pub fn set_current_tick(&mut self, tick: i32) -> bool {
        self.current_tick = tick;
        let recentered = self.auto_recenter.observe(tick, &mut self.viewport, &self.model);
        if recentered {
            debug!(tick, "Current tick left the visible range");
        }
        recentered
    }

    pub fn set_auto_recenter(&mut self, enabled: bool) {
        self.auto_recenter.set_enabled(enabled);
    }

    pub fn auto_recenter_enabled(&self) -> bool {
        self.auto_recenter.is_enabled()
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset(self.current_tick);
    }

    pub fn pan_left(&mut self) {
        self.viewport.pan_left(self.model.eth_is_token0);
    }

    pub fn pan_right(&mut self) {
        self.viewport.pan_right(self.model.eth_is_token0);
    }

    pub fn recenter(&mut self) {
        self.viewport.recenter(self.current_tick);
    }

    pub fn effective_spacing(&self) -> i32 {
        effective_tick_spacing(
            self.viewport.domain(),
            self.config.tick_spacing,
            self.config.max_data_points,
        )
    }

    fn bins(&mut self) -> Arc<Vec<ChartBin>> {
        let key = BinsKey {
            domain: self.viewport.domain(),
            effective_spacing: self.effective_spacing(),
            data_version: self.data_version,
            model: self.model,
            height_per_eth: self.config.height_per_eth,
        };

        let ranges = &self.ranges;
        self.bins.get_or_compute(key, |key| {
            aggregate_liquidity(
                key.domain,
                key.effective_spacing,
                ranges,
                &key.model,
                key.height_per_eth,
            )
        })
    }

    pub fn snapshot(&mut self) -> ChartSnapshot {
        let bins = self.bins();
        let domain = self.viewport.domain();
        let mcap = mcap_domain(domain, &self.model);

        ChartSnapshot {
            domain,
            zoom_level: self.viewport.zoom_level(),
            effective_spacing: self.effective_spacing(),
            bar_size: bar_size(bins.len(), mcap, &self.config),
            max_y: max_y_value(&bins, self.config.y_padding_factor),
            mcap_domain: mcap,
            current_tick: self.current_tick,
            current_mcap: self.model.market_cap(self.current_tick),
            bins,
        }
    }

    /// Market cap label and non-zero raw values for the bin starting at `bin_tick`
    pub fn tooltip(&mut self, bin_tick: i32) -> Option<Tooltip> {
        let bins = self.bins();
        let bin = bins.iter().find(|bin| bin.tick == bin_tick)?;

        let entries = bin
            .values
            .iter()
            .filter(|(_, value)| value.raw != 0.0)
            .map(|(tag, value)| TooltipEntry {
                tag: tag.clone(),
                raw: value.raw,
            })
            .collect();

        Some(Tooltip {
            label: format!("Market Cap: {}", format_mcap(bin.mcap)),
            entries,
        })
    }

    /// `(hits, misses)` of the bin cache
    pub fn cache_stats(&self) -> (u64, u64) {
        self.bins.stats()
    }
}
