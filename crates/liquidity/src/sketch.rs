//! Stacked position model behind the canvas sketch
//!
//! Positions are stacked per tick; a tick's bar height is the sum of every
//! position covering it.

use serde::{Deserialize, Serialize};

/// Height assigned to one ETH of liquidity
pub const DEFAULT_HEIGHT_PER_ETH: f64 = 40.0;

/// Number of bars drawn
pub const DEFAULT_BAR_COUNT: usize = 20;

/// Bars drawn to the left of the current tick
pub const DEFAULT_STARTING_TICK_OFFSET: i32 = 4;

/// Liquidity drawn over `[start_tick, end_tick)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchPosition {
    pub label: String,
    pub height: f64,
    pub start_tick: i32,
    pub end_tick: i32,
}

impl SketchPosition {
    pub fn covers(&self, tick: i32) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }
}

/// One drawn bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchBar {
    pub tick: i32,
    pub height: f64,

    /// Share of the bar filled by ETH; only set at the current tick
    pub eth_fill_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBars {
    height_per_eth: f64,
    positions: Vec<SketchPosition>,
}

impl Default for StackedBars {
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT_PER_ETH)
    }
}

impl StackedBars {
    pub fn new(height_per_eth: f64) -> Self {
        Self {
            height_per_eth,
            positions: Vec::new(),
        }
    }

    pub fn eth_to_height(&self, eth: f64) -> f64 {
        eth * self.height_per_eth
    }

    pub fn height_to_eth(&self, height: f64) -> f64 {
        if self.height_per_eth == 0.0 {
            0.0
        } else {
            height / self.height_per_eth
        }
    }

    /// Add a position holding `eth` over `[start_tick, end_tick)`
    pub fn push_eth(&mut self, label: impl Into<String>, eth: f64, start_tick: i32, end_tick: i32) {
        let height = self.eth_to_height(eth);
        self.positions.push(SketchPosition {
            label: label.into(),
            height,
            start_tick,
            end_tick,
        });
    }

    pub fn push(&mut self, position: SketchPosition) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[SketchPosition] {
        &self.positions
    }

    pub fn tick_bar_height(&self, tick: i32) -> f64 {
        self.positions
            .iter()
            .filter(|p| p.covers(tick))
            .map(|p| p.height)
            .sum()
    }

    /// Share of the bar at `tick` that `eth` fills; zero for empty bars
    pub fn eth_fill_ratio(&self, tick: i32, eth: f64) -> f64 {
        let capacity = self.height_to_eth(self.tick_bar_height(tick));
        if capacity > 0.0 {
            eth / capacity
        } else {
            0.0
        }
    }

    /// `count` bars starting `offset` ticks left of `current_tick`
    ///
    /// The window stops early at the edge of the `i32` tick range.
    pub fn bars(
        &self,
        current_tick: i32,
        eth_at_current_tick: f64,
        count: usize,
        offset: i32,
    ) -> Vec<SketchBar> {
        let start = current_tick.saturating_sub(offset);
        (0..count)
            .map_while(|i| i32::try_from(i).ok().and_then(|i| start.checked_add(i)))
            .map(|tick| SketchBar {
                tick,
                height: self.tick_bar_height(tick),
                eth_fill_ratio: (tick == current_tick)
                    .then(|| self.eth_fill_ratio(tick, eth_at_current_tick)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> StackedBars {
        let mut bars = StackedBars::default();
        bars.push_eth("FairLaunchETHOnly", 1.0, 1, 15);
        bars.push_eth("BidWall", 2.0, 3, 4);
        bars
    }

    #[test]
    fn test_tick_bar_height_stacks() {
        let bars = bars();
        assert_eq!(bars.tick_bar_height(0), 0.0);
        assert_eq!(bars.tick_bar_height(1), 40.0);
        assert_eq!(bars.tick_bar_height(3), 120.0);
        assert_eq!(bars.tick_bar_height(14), 40.0);
        assert_eq!(bars.tick_bar_height(15), 0.0);
    }

    #[test]
    fn test_eth_fill_ratio() {
        let bars = bars();
        assert_eq!(bars.eth_fill_ratio(3, 1.5), 0.5);
        assert_eq!(bars.eth_fill_ratio(20, 1.0), 0.0);
    }

    #[test]
    fn test_bar_window() {
        let bars = bars();
        let drawn = bars.bars(5, 0.5, DEFAULT_BAR_COUNT, DEFAULT_STARTING_TICK_OFFSET);
        assert_eq!(drawn.len(), 20);
        assert_eq!(drawn[0].tick, 1);
        assert_eq!(drawn[4].eth_fill_ratio, Some(0.5));
        assert!(drawn.iter().filter(|b| b.eth_fill_ratio.is_some()).count() == 1);
    }

    #[test]
    fn test_bar_window_at_tick_range_edges() {
        let bars = bars();

        let drawn = bars.bars(i32::MAX, 1.0, 5, -3);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].tick, i32::MAX);
        assert_eq!(drawn[0].eth_fill_ratio, Some(0.0));

        let drawn = bars.bars(i32::MIN + 1, 1.0, 3, 10);
        let ticks: Vec<i32> = drawn.iter().map(|b| b.tick).collect();
        assert_eq!(ticks, vec![i32::MIN, i32::MIN + 1, i32::MIN + 2]);
        assert_eq!(drawn[1].eth_fill_ratio, Some(0.0));
    }
}
