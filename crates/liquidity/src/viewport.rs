//! Visible tick domain and its pan/zoom state

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::mcap_domain;
use crate::config::ChartConfig;
use crate::tick::{PriceModel, TickDomain};

/// Parameters the viewport needs from the chart configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Bounds {
    tick_spacing: i32,
    zoom_factor: f64,
    pan_factor: f64,
    initial_range: i32,
    min_tick: i32,
    max_tick: i32,
}

impl From<&ChartConfig> for Bounds {
    fn from(config: &ChartConfig) -> Self {
        Self {
            tick_spacing: config.tick_spacing.max(1),
            zoom_factor: config.zoom_factor,
            pan_factor: config.pan_factor,
            initial_range: config.initial_range,
            min_tick: config.min_tick,
            max_tick: config.max_tick,
        }
    }
}

/// Visible domain plus zoom level
///
/// Domain edges are kept on multiples of the atomic tick spacing except
/// where they are pinned to the global bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    bounds: Bounds,
    domain: TickDomain,
    zoom_level: f64,
}

impl Viewport {
    /// Initial viewport: `initial_range` ticks centered on `current_tick`
    pub fn around(current_tick: i32, config: &ChartConfig) -> Self {
        let bounds = Bounds::from(config);
        let mut viewport = Self {
            bounds,
            domain: TickDomain::new(current_tick, current_tick),
            zoom_level: 1.0,
        };
        viewport.domain = viewport.centered(current_tick, bounds.initial_range as f64);
        viewport
    }

    pub fn domain(&self) -> TickDomain {
        self.domain
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn zoom_in(&mut self) {
        let spacing = self.bounds.tick_spacing;
        let center = self.snap_round(self.center());
        let new_range = self.domain.width() as f64 / self.bounds.zoom_factor;

        let min = self.snap_floor(center as f64 - new_range / 2.0);
        let mut max = self.snap_ceil(center as f64 + new_range / 2.0);
        if max <= min {
            max = min + spacing;
        }

        self.domain = self.clamp(TickDomain::new(min, max));
        self.zoom_level *= self.bounds.zoom_factor;
        debug!(
            min = self.domain.min,
            max = self.domain.max,
            zoom = self.zoom_level,
            "Zoomed in"
        );
    }

    pub fn zoom_out(&mut self) {
        let max_range = self.bounds.max_tick as f64 - self.bounds.min_tick as f64;
        let center = self.snap_round(self.center());
        let new_range = (self.domain.width() as f64 * self.bounds.zoom_factor).min(max_range);

        let mut min = self.snap_floor(center as f64 - new_range / 2.0);
        let mut max = self.snap_ceil(center as f64 + new_range / 2.0);

        if min < self.bounds.min_tick {
            min = self.bounds.min_tick;
            max = (min as f64 + new_range).min(self.bounds.max_tick as f64) as i32;
        }
        if max > self.bounds.max_tick {
            max = self.bounds.max_tick;
            min = (max as f64 - new_range).max(self.bounds.min_tick as f64) as i32;
        }

        self.domain = TickDomain::new(min, max);
        self.zoom_level /= self.bounds.zoom_factor;
        debug!(min, max, zoom = self.zoom_level, "Zoomed out");
    }

    /// Zoom level back to 1 with the initial range around `current_tick`
    pub fn reset(&mut self, current_tick: i32) {
        self.domain = self.centered(current_tick, self.bounds.initial_range as f64);
        self.zoom_level = 1.0;
    }

    /// Move toward lower market caps
    pub fn pan_left(&mut self, eth_is_token0: bool) {
        let shift = self.pan_shift();
        self.shift(if eth_is_token0 { shift } else { -shift });
    }

    /// Move toward higher market caps
    pub fn pan_right(&mut self, eth_is_token0: bool) {
        let shift = self.pan_shift();
        self.shift(if eth_is_token0 { -shift } else { shift });
    }

    /// Center on `current_tick` keeping the current width
    pub fn recenter(&mut self, current_tick: i32) {
        self.domain = self.centered(current_tick, self.domain.width() as f64);
        debug!(
            current_tick,
            min = self.domain.min,
            max = self.domain.max,
            "Recentered viewport"
        );
    }

    fn center(&self) -> f64 {
        (self.domain.min as f64 + self.domain.max as f64) / 2.0
    }

    fn centered(&self, center: i32, range: f64) -> TickDomain {
        let min = self.snap_floor(center as f64 - range / 2.0);
        let max = self.snap_ceil(center as f64 + range / 2.0);
        self.clamp(TickDomain::new(min, max))
    }

    /// Ticks moved per pan step, shrinking as the zoom level grows
    fn pan_shift(&self) -> i32 {
        let scaled = self.bounds.pan_factor / self.zoom_level;
        self.snap_round(scaled)
    }

    fn shift(&mut self, delta: i32) {
        let shifted = TickDomain::new(
            self.domain.min.saturating_add(delta),
            self.domain.max.saturating_add(delta),
        );
        self.domain = self.clamp(shifted);
    }

    /// Slide `domain` back inside the global bounds without changing its width
    fn clamp(&self, domain: TickDomain) -> TickDomain {
        let (lo, hi) = (self.bounds.min_tick as i64, self.bounds.max_tick as i64);
        let width = domain.width();
        if width >= hi - lo {
            return TickDomain::new(self.bounds.min_tick, self.bounds.max_tick);
        }

        let min = (domain.min as i64).clamp(lo, hi - width);
        TickDomain::new(min as i32, (min + width) as i32)
    }

    fn snap_floor(&self, tick: f64) -> i32 {
        let spacing = self.bounds.tick_spacing as f64;
        ((tick / spacing).floor() * spacing) as i32
    }

    fn snap_ceil(&self, tick: f64) -> i32 {
        let spacing = self.bounds.tick_spacing as f64;
        ((tick / spacing).ceil() * spacing) as i32
    }

    fn snap_round(&self, tick: f64) -> i32 {
        let spacing = self.bounds.tick_spacing as f64;
        ((tick / spacing).round() * spacing) as i32
    }
}

/// Recenters the viewport when the current tick leaves the visible market cap range
#[derive(Debug, Clone, Default)]
pub struct AutoRecenter {
    enabled: bool,
    last_tick: Option<i32>,
}

impl AutoRecenter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_tick: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Record the tick the viewport was built around
    pub fn seed(&mut self, current_tick: i32) {
        self.last_tick = Some(current_tick);
    }

    /// Feed a current tick update; returns true if the viewport was recentered
    ///
    /// The first observed tick only seeds the tracker. Later updates recenter
    /// only when the tick changed and its market cap is outside the visible
    /// market cap range.
    pub fn observe(
        &mut self,
        current_tick: i32,
        viewport: &mut Viewport,
        model: &PriceModel,
    ) -> bool {
        let previous = self.last_tick.replace(current_tick);
        let Some(previous) = previous else {
            return false;
        };

        if !self.enabled || previous == current_tick {
            return false;
        }

        let visible = mcap_domain(viewport.domain(), model);
        if visible.contains(model.market_cap(current_tick)) {
            return false;
        }

        viewport.recenter(current_tick);
        true
    }
}
