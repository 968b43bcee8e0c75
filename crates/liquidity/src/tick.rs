//! Tick and price math

use serde::{Deserialize, Serialize};

use crate::config::ChartConfig;

/// Lowest usable tick
pub const MIN_TICK: i32 = -887272;

/// Highest usable tick
pub const MAX_TICK: i32 = 887272;

/// Closed tick range shown by the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickDomain {
    pub min: i32,
    pub max: i32,
}

impl TickDomain {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> i64 {
        self.max as i64 - self.min as i64
    }

    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.min && tick <= self.max
    }
}

/// `base^tick`
pub fn price_at_tick(tick: i32, base: f64) -> f64 {
    base.powi(tick)
}

/// Converts ticks to per-coin ETH prices and market caps
///
/// `eth_is_token0` flips the price direction: when ETH is token0 the pool
/// price is coins per ETH and has to be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    pub price_base: f64,
    pub coin_supply: f64,
    pub eth_is_token0: bool,
    pub usd_per_eth: f64,
}

impl PriceModel {
    pub fn new(eth_is_token0: bool, usd_per_eth: f64) -> Self {
        Self::from_config(&ChartConfig::default(), eth_is_token0, usd_per_eth)
    }

    pub fn from_config(config: &ChartConfig, eth_is_token0: bool, usd_per_eth: f64) -> Self {
        Self {
            price_base: config.price_base,
            coin_supply: config.coin_supply,
            eth_is_token0,
            usd_per_eth,
        }
    }

    pub fn price(&self, tick: i32) -> f64 {
        price_at_tick(tick, self.price_base)
    }

    /// ETH paid for one coin at `tick`
    pub fn eth_per_coin(&self, tick: i32) -> f64 {
        let price = self.price(tick);
        if self.eth_is_token0 {
            1.0 / price
        } else {
            price
        }
    }

    /// Market cap in USD at `tick`
    pub fn market_cap(&self, tick: i32) -> f64 {
        self.eth_per_coin(tick) * self.coin_supply * self.usd_per_eth
    }
}
