//! Utility functions for the CLI

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use flaunch_dash_liquidity::{LiquidityRange, LiquidityTag, MAX_TICK, MIN_TICK};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// ETH price used when neither the flag nor the data file sets one
pub const FALLBACK_USD_PER_ETH: f64 = 3000.0;

/// Pool snapshot read by the chart commands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickData {
    #[serde(default)]
    pub current_tick: Option<i32>,

    #[serde(default)]
    pub eth_is_token0: Option<bool>,

    #[serde(default)]
    pub usd_per_eth: Option<f64>,

    #[serde(alias = "tickData")]
    pub ranges: Vec<LiquidityRange>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TickDataFile {
    Full(TickData),
    Ranges(Vec<LiquidityRange>),
}

impl TickData {
    /// Parse either a full snapshot object or a bare array of ranges
    pub fn parse(content: &str) -> Result<Self> {
        let file: TickDataFile =
            serde_json::from_str(content).context("Failed to parse tick data")?;
        Ok(match file {
            TickDataFile::Full(data) => data,
            TickDataFile::Ranges(ranges) => TickData {
                ranges,
                ..Default::default()
            },
        })
    }

    /// ETH held at the current tick, summed over its ranges
    pub fn eth_at_current_tick(&self, current_tick: i32) -> f64 {
        self.ranges
            .iter()
            .filter(|range| range.tag == LiquidityTag::EthAtCurrentTick)
            .filter(|range| range.start_tick <= current_tick && current_tick < range.end_tick)
            .map(|range| range.eth_per_tick)
            .sum()
    }

    /// Current tick from the file, else the middle of the data
    ///
    /// Clamped to the valid pool tick range.
    pub fn resolve_current_tick(&self, flag: Option<i32>) -> i32 {
        flag.or(self.current_tick)
            .unwrap_or_else(|| {
                let min = self.ranges.iter().map(|r| r.start_tick).min().unwrap_or(0);
                let max = self.ranges.iter().map(|r| r.end_tick).max().unwrap_or(0);
                ((min as i64 + max as i64) / 2) as i32
            })
            .clamp(MIN_TICK, MAX_TICK)
    }

    pub fn resolve_usd_per_eth(&self, flag: Option<f64>) -> f64 {
        flag.or(self.usd_per_eth).unwrap_or(FALLBACK_USD_PER_ETH)
    }
}

/// Load a tick data file
pub fn load_tick_data<P: AsRef<Path>>(path: P) -> Result<TickData> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tick data file: {:?}", path))?;
    TickData::parse(&content).with_context(|| format!("Invalid tick data in {:?}", path))
}

/// Create a spinner with the specified message
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Prompt for confirmation with yes/no
pub fn confirm(message: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_snapshot() {
        let data = TickData::parse(
            r#"{
                "currentTick": 120,
                "ethIsToken0": true,
                "tickData": [
                    {"tag": "ETHAtCurrentTick", "startTick": 120, "endTick": 180, "ethEquivalentPerTick": 0.5},
                    {"tag": "BidWall", "startTick": -600, "endTick": 60, "ethEquivalentPerTick": 0.1}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(data.current_tick, Some(120));
        assert_eq!(data.eth_is_token0, Some(true));
        assert_eq!(data.ranges.len(), 2);
        assert_eq!(data.ranges[1].tag, LiquidityTag::BidWall);
        assert_eq!(data.eth_at_current_tick(120), 0.5);
        assert_eq!(data.eth_at_current_tick(60), 0.0);
        assert_eq!(data.resolve_usd_per_eth(None), FALLBACK_USD_PER_ETH);
    }

    #[test]
    fn test_parse_bare_ranges() {
        let data = TickData::parse(
            r#"[{"tag": "InFairLaunch", "start_tick": -120, "end_tick": 360, "eth_per_tick": 1.0}]"#,
        )
        .unwrap();

        assert!(data.current_tick.is_none());
        assert_eq!(data.resolve_current_tick(None), 120);
        assert_eq!(data.resolve_current_tick(Some(-60)), -60);
        assert_eq!(data.resolve_current_tick(Some(i32::MAX)), MAX_TICK);
        assert_eq!(data.resolve_current_tick(Some(i32::MIN)), MIN_TICK);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_tick_data(dir.path().join("missing.json")).is_err());
    }
}
