//! Derived chart parameters

use serde::{Deserialize, Serialize};

use crate::aggregate::ChartBin;
use crate::config::ChartConfig;
use crate::tick::{PriceModel, TickDomain};

/// Market cap range covered by the visible tick domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McapDomain {
    pub min: f64,
    pub max: f64,
}

impl McapDomain {
    pub fn span(&self) -> f64 {
        (self.max - self.min).abs()
    }

    pub fn contains(&self, mcap: f64) -> bool {
        mcap >= self.min && mcap <= self.max
    }
}

/// Market cap at both ends of `domain`, ordered low to high
pub fn mcap_domain(domain: TickDomain, model: &PriceModel) -> McapDomain {
    let a = model.market_cap(domain.min);
    let b = model.market_cap(domain.max);
    if a <= b {
        McapDomain { min: a, max: b }
    } else {
        McapDomain { min: b, max: a }
    }
}

/// Which side of the current market cap a bar sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarSide {
    Left,
    Right,
}

impl BarSide {
    pub fn of(bin: &ChartBin, current_mcap: f64) -> Self {
        if bin.mcap > current_mcap {
            BarSide::Right
        } else {
            BarSide::Left
        }
    }
}

/// Pixel width of one bar
///
/// The average market cap covered by a bin, as a share of the whole range,
/// scaled to the canvas and widened so neighbouring bars overlap.
pub fn bar_size(bin_count: usize, mcap: McapDomain, config: &ChartConfig) -> u32 {
    if bin_count <= 1 {
        return config.single_bar_width_px;
    }

    let span = mcap.span();
    let base_width = if span > 0.0 && span.is_finite() {
        let avg_per_bin = span / bin_count as f64;
        (avg_per_bin / span) * config.canvas_width_px
    } else {
        config.canvas_width_px / bin_count as f64
    };

    let width = (base_width * config.bar_overlap_factor).ceil();
    let clamped = width.clamp(
        config.min_bar_width_px as f64,
        config.max_bar_width_px as f64,
    );
    clamped as u32
}

/// Tallest compressed value times `padding`
pub fn max_y_value(bins: &[ChartBin], padding: f64) -> f64 {
    let tallest = bins
        .iter()
        .flat_map(|bin| bin.values.values())
        .map(|value| value.display)
        .fold(0.0_f64, f64::max);

    tallest * padding
}
