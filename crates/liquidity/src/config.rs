//! Chart configuration

use serde::{Deserialize, Serialize};

use crate::tick::{MAX_TICK, MIN_TICK};
use crate::{ChartError, ChartResult};

/// Configuration for the liquidity chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Atomic tick spacing of the pool
    pub tick_spacing: i32,

    /// Total coin supply used for market cap
    pub coin_supply: f64,

    /// Base of the tick price function
    pub price_base: f64,

    /// Bar height contributed by one ETH of liquidity
    pub height_per_eth: f64,

    /// Domain scale factor applied per zoom step
    pub zoom_factor: f64,

    /// Pan distance in ticks at zoom level 1
    pub pan_factor: f64,

    /// Target number of bins across the visible domain
    pub max_data_points: usize,

    /// Initial domain width in ticks, centered on the current tick
    pub initial_range: i32,

    /// Lowest tick the viewport may show
    pub min_tick: i32,

    /// Highest tick the viewport may show
    pub max_tick: i32,

    /// Chart width the bar size is computed against
    pub canvas_width_px: f64,

    /// Multiplier applied to the bar width so adjacent bars touch
    pub bar_overlap_factor: f64,

    pub min_bar_width_px: u32,

    pub max_bar_width_px: u32,

    /// Bar width used when there is a single bin
    pub single_bar_width_px: u32,

    /// Headroom multiplier above the tallest bin
    pub y_padding_factor: f64,

    /// Recenter on the current tick when it leaves the visible market cap range
    pub auto_recenter: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            tick_spacing: 60,
            coin_supply: 100_000_000_000.0,
            price_base: 1.0001,
            height_per_eth: 1.0,
            zoom_factor: 2.0,
            pan_factor: 500.0,
            max_data_points: 50,
            initial_range: 2000,
            min_tick: MIN_TICK,
            max_tick: MAX_TICK,
            canvas_width_px: 1200.0,
            bar_overlap_factor: 1.5,
            min_bar_width_px: 3,
            max_bar_width_px: 50,
            single_bar_width_px: 10,
            y_padding_factor: 2.0,
            auto_recenter: true,
        }
    }
}

impl ChartConfig {
    /// Width of the global tick range
    pub fn max_range(&self) -> i32 {
        self.max_tick - self.min_tick
    }

    /// Validate the configuration
    pub fn validate(&self) -> ChartResult<()> {
        if self.tick_spacing <= 0 {
            return Err(ChartError::InvalidConfig(format!(
                "tick_spacing must be positive, got {}",
                self.tick_spacing
            )));
        }

        if self.max_data_points == 0 {
            return Err(ChartError::InvalidConfig(
                "max_data_points must be greater than 0".to_string(),
            ));
        }

        if self.min_tick >= self.max_tick {
            return Err(ChartError::InvalidConfig(format!(
                "min_tick ({}) must be below max_tick ({})",
                self.min_tick, self.max_tick
            )));
        }

        if self.initial_range <= 0 {
            return Err(ChartError::InvalidConfig(
                "initial_range must be positive".to_string(),
            ));
        }

        if !(self.zoom_factor > 1.0) {
            return Err(ChartError::InvalidConfig(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }

        if !(self.price_base > 0.0) || !(self.coin_supply > 0.0) {
            return Err(ChartError::InvalidConfig(
                "price_base and coin_supply must be positive".to_string(),
            ));
        }

        if self.min_bar_width_px > self.max_bar_width_px {
            return Err(ChartError::InvalidConfig(format!(
                "min_bar_width_px ({}) exceeds max_bar_width_px ({})",
                self.min_bar_width_px, self.max_bar_width_px
            )));
        }

        if self.y_padding_factor < 1.0 {
            return Err(ChartError::InvalidConfig(
                "y_padding_factor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ChartConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_range(), 2 * 887272);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ChartConfig {
            tick_spacing: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ChartConfig {
            max_data_points: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ChartConfig {
            min_tick: 10,
            max_tick: -10,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ChartConfig {
            zoom_factor: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ChartConfig = serde_json::from_str(r#"{"tick_spacing": 200}"#).unwrap();
        assert_eq!(config.tick_spacing, 200);
        assert_eq!(config.max_data_points, 50);
    }
}
