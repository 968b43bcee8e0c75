//! Display utilities for rendering output

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use console::style;
use flaunch_dash_core::{
    format_number_with_commas, format_time_ago, resolve_ipfs, ChainInfo, FeedItem,
};
use flaunch_dash_feed::{FeedEvent, FeedMetricsSnapshot};
use flaunch_dash_liquidity::{
    format_coin, format_mcap, BarSide, ChartSnapshot, LiquidityTag, SketchBar, Tooltip,
};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Width of the tallest sketch bar, in characters
const SKETCH_WIDTH: usize = 40;

/// Window of the "new launches" count
pub const LOOKBACK_SECS: u64 = 4 * 60 * 60;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayFormat {
    /// Text format (tables)
    Text,

    /// JSON format
    Json,

    /// YAML format
    Yaml,
}

/// Loaded coins launched inside the lookback window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentLaunches {
    /// Window label, e.g. `4hrs`
    pub window: String,

    /// Blocks covered by the window on chains with a fixed block time
    pub blocks: Option<u64>,

    pub count: usize,
}

impl RecentLaunches {
    pub fn within(
        items: &[FeedItem],
        chain: &ChainInfo,
        now: DateTime<Utc>,
        window_secs: u64,
    ) -> Self {
        let start = now - Duration::seconds(window_secs as i64);
        let count = items
            .iter()
            .filter_map(|item| item.metadata.as_ref()?.launched_at)
            .filter(|launched| *launched >= start && *launched <= now)
            .count();

        Self {
            window: format_time_ago(start, now, true),
            blocks: chain.blocks_for_lookback(window_secs),
            count,
        }
    }
}

/// Everything the `feed` command produced
#[derive(Debug, Serialize)]
pub struct FeedReport {
    pub chain: &'static ChainInfo,
    pub manager: String,
    pub loaded: usize,
    pub total: usize,
    pub page_size: usize,
    pub failure: Option<String>,
    pub items: Vec<FeedItem>,
    pub events: Vec<FeedEvent>,
    pub metrics: FeedMetricsSnapshot,
    pub recent: RecentLaunches,
}

/// Chart state plus an optional hovered bin
#[derive(Debug, Serialize)]
pub struct ChartReport {
    pub snapshot: ChartSnapshot,
    pub usd_per_eth: f64,
    pub tooltip: Option<Tooltip>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Debug, Serialize)]
pub struct SketchReport {
    pub current_tick: i32,
    pub eth_at_current_tick: f64,
    pub height_per_eth: f64,
    pub bars: Vec<SketchBar>,
}

/// Renderer for formatting output
pub struct Renderer {
    format: DisplayFormat,
    ipfs_gateway: String,
}

impl Renderer {
    pub fn new(format: DisplayFormat, ipfs_gateway: impl Into<String>) -> Self {
        Self {
            format,
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    /// Serialize for the machine-readable formats; false for text
    fn render_structured<T: Serialize>(&self, value: &T) -> Result<bool> {
        match self.format {
            DisplayFormat::Text => Ok(false),
            DisplayFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
                Ok(true)
            }
            DisplayFormat::Yaml => {
                println!("{}", serde_yaml::to_string(value)?);
                Ok(true)
            }
        }
    }

    /// Render the loaded coin grid
    pub fn render_feed(&self, report: &FeedReport) -> Result<()> {
        if self.render_structured(report)? {
            return Ok(());
        }

        #[derive(Tabled)]
        struct CoinRow {
            #[tabled(rename = "#")]
            index: usize,
            #[tabled(rename = "Symbol")]
            symbol: String,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Token")]
            token: String,
            #[tabled(rename = "Image")]
            image: String,
            #[tabled(rename = "Launched")]
            launched: String,
            #[tabled(rename = "Tx")]
            tx: String,
        }

        let now = Utc::now();
        let rows = report
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| CoinRow {
                index: i + 1,
                symbol: item.display_symbol(),
                name: item.display_name().to_string(),
                token: item.id.to_string(),
                image: item
                    .metadata
                    .as_ref()
                    .map(|m| resolve_ipfs(&m.image, &self.ipfs_gateway))
                    .unwrap_or_default(),
                launched: item
                    .metadata
                    .as_ref()
                    .and_then(|m| m.launched_at)
                    .map(|at| format_time_ago(at, now, false))
                    .unwrap_or_default(),
                tx: item
                    .metadata
                    .as_ref()
                    .and_then(|m| m.launch_tx.as_deref())
                    .and_then(|tx| report.chain.tx_url(tx))
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        println!(
            "{} ({}/{})",
            style("Viewing Quotes").bold().cyan(),
            report.loaded,
            report.total
        );

        let recent = &report.recent;
        let blocks = recent
            .blocks
            .map(|blocks| format!(" (~{} blocks on {})", blocks, report.chain.name))
            .unwrap_or_default();
        println!(
            "{} new launches in the past {}{}",
            recent.count, recent.window, blocks
        );

        if !rows.is_empty() {
            let table = Table::new(rows)
                .with(Style::modern())
                .with(Modify::new(Columns::single(0)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        for event in &report.events {
            if let FeedEvent::MetadataUnavailable { offset, count, reason } = event {
                println!(
                    "{} metadata for items {}..{} unavailable: {}",
                    style("!").yellow().bold(),
                    offset,
                    offset + count,
                    reason
                );
            }
        }

        if let Some(failure) = &report.failure {
            println!("{} {}", style("Failed to load coins:").red().bold(), failure);
        }

        let metrics = &report.metrics;
        println!(
            "Pages: {}  Items: {}  Metadata failures: {}  Skipped loads: {}  Id cache hits: {}",
            metrics.pages_loaded,
            metrics.items_loaded,
            metrics.metadata_failures,
            metrics.loads_skipped,
            metrics.id_cache_hits
        );

        Ok(())
    }

    /// Render the binned chart
    pub fn render_chart(&self, report: &ChartReport) -> Result<()> {
        if self.render_structured(report)? {
            return Ok(());
        }

        let snapshot = &report.snapshot;
        println!(
            "{} ticks [{}, {}]  zoom {:.2}x  spacing {}  bar {}px",
            style("Liquidity").bold().cyan(),
            snapshot.domain.min,
            snapshot.domain.max,
            snapshot.zoom_level,
            snapshot.effective_spacing,
            snapshot.bar_size
        );
        println!(
            "Current tick {} at {}  (range {} to {})  ETH/USD ${}",
            snapshot.current_tick,
            style(format_mcap(snapshot.current_mcap)).green(),
            format_mcap(snapshot.mcap_domain.min),
            format_mcap(snapshot.mcap_domain.max),
            format_number_with_commas(report.usd_per_eth)
        );

        let mut tags: Vec<&LiquidityTag> = snapshot
            .bins
            .iter()
            .flat_map(|bin| bin.values.keys())
            .collect();
        tags.sort();
        tags.dedup();

        let mut builder = Builder::default();
        let mut header = vec!["Tick".to_string(), "Market Cap".to_string(), "Side".to_string()];
        header.extend(tags.iter().map(|tag| tag.to_string()));
        builder.push_record(header);

        for bin in snapshot.bins.iter().filter(|bin| bin.total_raw() > 0.0) {
            let side = match BarSide::of(bin, snapshot.current_mcap) {
                BarSide::Left => "left",
                BarSide::Right => "right",
            };
            let mut record = vec![bin.tick.to_string(), format_mcap(bin.mcap), side.to_string()];
            record.extend(tags.iter().map(|tag| {
                let value = bin.value(tag);
                if value.raw > 0.0 {
                    format!("{:.4} ({:.3})", value.raw, value.display)
                } else {
                    String::new()
                }
            }));
            builder.push_record(record);
        }

        let table = builder
            .build()
            .with(Style::modern())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!("Max Y: {:.3}", snapshot.max_y);

        if let Some(tooltip) = &report.tooltip {
            self.render_tooltip(tooltip);
        }

        Ok(())
    }

    pub fn render_tooltip(&self, tooltip: &Tooltip) {
        println!("{}", style(&tooltip.label).bold());
        for entry in &tooltip.entries {
            println!("  {}: {}", entry.tag, format_coin(entry.raw));
        }
    }

    /// Render the stacked sketch as horizontal bars
    pub fn render_sketch(&self, report: &SketchReport) -> Result<()> {
        if self.render_structured(report)? {
            return Ok(());
        }

        let tallest = report
            .bars
            .iter()
            .map(|bar| bar.height)
            .fold(0.0_f64, f64::max);

        for bar in &report.bars {
            let width = if tallest > 0.0 {
                ((bar.height / tallest) * SKETCH_WIDTH as f64).round() as usize
            } else {
                0
            };
            let fill = bar
                .eth_fill_ratio
                .map(|ratio| format!(" {:.1}% ETH", ratio * 100.0))
                .unwrap_or_default();

            let line = "█".repeat(width);
            let line = if bar.tick == report.current_tick {
                style(line).green().to_string()
            } else {
                style(line).blue().to_string()
            };
            println!("{:>8} {} {:.1}{}", bar.tick, line, bar.height, fill);
        }

        Ok(())
    }

    /// Single line of chart state for the explorer prompt
    pub fn status_line(snapshot: &ChartSnapshot, auto_recenter: bool) -> String {
        format!(
            "[{}, {}] zoom {:.2}x spacing {} bins {} mcap {}{}",
            snapshot.domain.min,
            snapshot.domain.max,
            snapshot.zoom_level,
            snapshot.effective_spacing,
            snapshot.bins.len(),
            format_mcap(snapshot.current_mcap),
            if auto_recenter { " (auto)" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaunch_dash_core::{Address, CoinMetadata, ItemId, ANVIL, BASE};

    fn launched(token_id: u64, at: Option<DateTime<Utc>>) -> FeedItem {
        let flaunch = Address::parse("0x124f62e1BF232AfD29c7725904F351399C83f572").unwrap();
        FeedItem::with_metadata(
            ItemId::new(flaunch.clone(), token_id),
            CoinMetadata {
                coin_address: flaunch,
                name: format!("Coin {}", token_id),
                symbol: format!("C{}", token_id),
                image: String::new(),
                description: String::new(),
                launched_at: at,
                launch_tx: None,
            },
        )
    }

    #[test]
    fn test_recent_launches_window() {
        let now = Utc::now();
        let items = vec![
            launched(1, Some(now - Duration::minutes(5))),
            launched(2, Some(now - Duration::hours(3))),
            launched(3, Some(now - Duration::hours(5))),
            launched(4, None),
            FeedItem::id_only(ItemId::new(
                Address::parse("0x124f62e1BF232AfD29c7725904F351399C83f572").unwrap(),
                5,
            )),
        ];

        let recent = RecentLaunches::within(&items, &BASE, now, LOOKBACK_SECS);
        assert_eq!(recent.count, 2);
        assert_eq!(recent.window, "4hrs");
        assert_eq!(recent.blocks, Some(7200));

        let recent = RecentLaunches::within(&items, &ANVIL, now, LOOKBACK_SECS);
        assert_eq!(recent.blocks, None);
    }
}
