//! Command Line Interface for the Flaunch dashboard
//!
//! Drives the coin feed and the liquidity chart against local data:
//! - Page through a fixture source with simulated scrolling
//! - Bin tick data into chart bars, with zoom and pan steps
//! - Explore a chart interactively
//! - Render the stacked position sketch
//! - Generate a configuration file

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use flaunch_dash_config::{ConfigLoader, DashboardConfig};
use flaunch_dash_core::Address;
use flaunch_dash_feed::{
    FeedEvent, Fixture, FixtureSource, InfiniteScroll, MetadataSource, Paginator, ScrollViewport,
    SessionIdCache, VisibilitySensor,
};
use flaunch_dash_liquidity::{sketch, LiquidityView, StackedBars};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};

mod display;
mod interactive;
mod utils;

use display::{
    ChartReport, DisplayFormat, FeedReport, RecentLaunches, Renderer, SketchReport, LOOKBACK_SECS,
};
use interactive::ChartExplorer;
use utils::{confirm, create_spinner, load_tick_data, print_error, print_success, print_warning};

/// Height of one grid row in the simulated feed layout
const ROW_HEIGHT_PX: f64 = 280.0;

const VIEWPORT_HEIGHT_PX: f64 = 900.0;

const SENTINEL_HEIGHT_PX: f64 = 20.0;

/// Flaunch dashboard CLI
#[derive(Parser, Debug)]
#[clap(name = "flaunch-dash", version, about, long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the configured log level
    #[clap(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Page through a manager's coins with simulated infinite scroll
    Feed {
        /// JSON fixture file with coins per manager
        #[clap(long, value_name = "FILE", conflicts_with = "generate")]
        fixture: Option<PathBuf>,

        /// Generate this many synthetic coins instead of reading a fixture
        #[clap(long, value_name = "COUNT")]
        generate: Option<u64>,

        /// Manager address; defaults to the configured one
        #[clap(long)]
        manager: Option<String>,

        /// Viewport width used to pick the column count
        #[clap(long, value_name = "PX")]
        width: Option<u32>,

        /// Explicit column count
        #[clap(long, conflicts_with = "width")]
        columns: Option<usize>,

        /// Stop after this many scroll-triggered loads
        #[clap(long)]
        max_pages: Option<usize>,

        /// Zero-based metadata calls of the synthetic source that fail
        #[clap(long = "fail-batch", value_name = "N")]
        fail_batches: Vec<usize>,

        /// Simulated latency of the synthetic source
        #[clap(long, default_value = "0")]
        latency_ms: u64,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: DisplayFormat,
    },

    /// Bin tick data into chart bars
    Chart {
        #[clap(flatten)]
        pool: PoolArgs,

        /// View changes applied in order before rendering
        #[clap(long = "step", value_enum)]
        steps: Vec<ChartStep>,

        /// Show the tooltip of the bin starting at this tick
        #[clap(long, allow_hyphen_values = true)]
        tooltip: Option<i32>,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: DisplayFormat,
    },

    /// Interactive pan and zoom over tick data
    Explore {
        #[clap(flatten)]
        pool: PoolArgs,
    },

    /// Render stacked positions around the current tick
    Sketch {
        #[clap(flatten)]
        pool: PoolArgs,

        /// ETH at the current tick; summed from the data when omitted
        #[clap(long)]
        eth: Option<f64>,

        /// Number of bars
        #[clap(long, default_value_t = sketch::DEFAULT_BAR_COUNT)]
        bars: usize,

        /// Bars drawn left of the current tick
        #[clap(long, default_value_t = sketch::DEFAULT_STARTING_TICK_OFFSET)]
        offset: i32,

        #[clap(long, default_value_t = sketch::DEFAULT_HEIGHT_PER_ETH)]
        height_per_eth: f64,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: DisplayFormat,
    },

    /// Generate a default configuration
    GenerateConfig {
        /// Output file, JSON or YAML by extension
        #[clap(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Overwrite without asking
        #[clap(long)]
        force: bool,
    },
}

/// Tick data input shared by the chart commands
#[derive(clap::Args, Debug)]
struct PoolArgs {
    /// JSON tick data file
    #[clap(value_name = "FILE")]
    data: PathBuf,

    /// Current pool tick; read from the file when omitted
    #[clap(long, allow_hyphen_values = true)]
    current_tick: Option<i32>,

    /// Whether ETH is token0 of the pool
    #[clap(long)]
    eth_is_token0: Option<bool>,

    /// ETH price in USD for market caps
    #[clap(long)]
    usd_per_eth: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChartStep {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    Recenter,
    Reset,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_cli_config_path(cli.config.as_ref());
    let mut config = loader.load().context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging = config.logging.clone().with_level(level.as_str());
    }

    let _guard = flaunch_dash_logging::init(config.logging.clone())
        .context("Failed to initialize logging")?;
    debug!("Configuration sources: {}", loader.get_used_sources().join(", "));

    initialize_modules();

    if let Err(err) = process_command(cli.command, &config).await {
        print_error(&format!("{:#}", err));
        return Err(err);
    }

    Ok(())
}

/// Initialize all modules
fn initialize_modules() {
    flaunch_dash_core::init();
    flaunch_dash_feed::init();
    flaunch_dash_liquidity::init();

    info!("All modules initialized successfully");
}

/// Process CLI command
async fn process_command(command: Commands, config: &DashboardConfig) -> Result<()> {
    match command {
        Commands::Feed {
            fixture,
            generate,
            manager,
            width,
            columns,
            max_pages,
            fail_batches,
            latency_ms,
            format,
        } => {
            let manager = match manager {
                Some(manager) => Address::parse(&manager)?,
                None => config.network.manager_address()?,
            };

            let source: Arc<dyn MetadataSource> = match (fixture, generate) {
                (Some(path), _) => Arc::new(
                    FixtureSource::load(&path)
                        .with_context(|| format!("Failed to load fixture {:?}", path))?,
                ),
                (None, Some(count)) => {
                    let mut fixture = Fixture::synthetic(&manager, &manager, count);
                    fixture.fail_metadata_batches = fail_batches.into_iter().collect();
                    fixture.latency_ms = latency_ms;
                    Arc::new(FixtureSource::new(fixture))
                }
                (None, None) => bail!("either --fixture or --generate is required"),
            };

            let report = run_feed(config, source, manager, width, columns, max_pages).await?;
            Renderer::new(format, &config.network.ipfs_gateway).render_feed(&report)?;
        }
        Commands::Chart {
            pool,
            steps,
            tooltip,
            format,
        } => {
            let mut view = build_view(config, &pool)?;
            for step in steps {
                apply_step(&mut view, step);
            }

            let report = chart_report(&mut view, tooltip);
            if tooltip.is_some() && report.tooltip.is_none() {
                print_warning("No bin starts at the requested tooltip tick");
            }
            Renderer::new(format, &config.network.ipfs_gateway).render_chart(&report)?;
        }
        Commands::Explore { pool } => {
            let view = build_view(config, &pool)?;
            let renderer = Renderer::new(DisplayFormat::Text, &config.network.ipfs_gateway);
            ChartExplorer::new(view, renderer)?.run()?;
        }
        Commands::Sketch {
            pool,
            eth,
            bars,
            offset,
            height_per_eth,
            format,
        } => {
            let data = load_tick_data(&pool.data)?;
            let current_tick = data.resolve_current_tick(pool.current_tick);
            let eth = eth.unwrap_or_else(|| data.eth_at_current_tick(current_tick));

            let mut stack = StackedBars::new(height_per_eth);
            for range in data.ranges.iter().filter(|range| !range.is_empty()) {
                stack.push_eth(
                    range.tag.to_string(),
                    range.eth_per_tick,
                    range.start_tick,
                    range.end_tick,
                );
            }

            let report = SketchReport {
                current_tick,
                eth_at_current_tick: eth,
                height_per_eth,
                bars: stack.bars(current_tick, eth, bars, offset),
            };
            Renderer::new(format, &config.network.ipfs_gateway).render_sketch(&report)?;
        }
        Commands::GenerateConfig { output, force } => {
            if output.exists()
                && !force
                && !confirm(&format!("{:?} exists. Overwrite?", output), false)?
            {
                print_warning("Configuration not written");
                return Ok(());
            }

            ConfigLoader::new()
                .save_config(&DashboardConfig::default(), &output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            print_success(&format!("Configuration generated: {:?}", output));
        }
    }

    Ok(())
}

/// Initialize the feed and keep scrolling to the bottom until nothing loads
async fn run_feed(
    config: &DashboardConfig,
    source: Arc<dyn MetadataSource>,
    manager: Address,
    width: Option<u32>,
    columns: Option<usize>,
    max_pages: Option<usize>,
) -> Result<FeedReport> {
    let paginator = Arc::new(
        Paginator::new(
            source,
            config.network.chain.clone(),
            manager.clone(),
            config.feed.clone(),
        )
        .with_id_cache(Arc::new(SessionIdCache::new())),
    );

    let grid_columns = match columns {
        Some(columns) => {
            paginator.set_columns(Some(columns));
            columns.max(1)
        }
        None => {
            paginator.set_viewport_width(width);
            width
                .map(|w| config.feed.columns_for_width(w))
                .unwrap_or(config.feed.default_columns)
        }
    };

    let mut rx = paginator.subscribe();
    let mut events = Vec::new();

    let spinner = create_spinner("Loading coins...");
    let initialized = paginator.initialize().await;
    spinner.finish_and_clear();
    if let Err(err) = initialized {
        print_error(&err.to_string());
    }
    drain_events(&mut rx, &mut events);

    let sensor = VisibilitySensor::new();
    let scroll = InfiniteScroll::attach(Arc::clone(&paginator), &sensor, Handle::current());
    let mut triggered = 0;

    while paginator.should_load() && max_pages.map_or(true, |max| triggered < max) {
        let (loaded, _) = paginator.progress();
        let content_height = loaded.div_ceil(grid_columns) as f64 * ROW_HEIGHT_PX;
        let geometry = ScrollViewport {
            scroll_top: (content_height - VIEWPORT_HEIGHT_PX).max(0.0),
            viewport_height: VIEWPORT_HEIGHT_PX,
            sentinel_top: content_height,
            sentinel_height: SENTINEL_HEIGHT_PX,
        };

        sensor.report_geometry(
            &geometry,
            config.feed.lookahead_margin_px,
            config.feed.visibility_threshold,
        );
        while scroll.is_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drain_events(&mut rx, &mut events);

        if paginator.progress().0 == loaded {
            debug!("Scroll produced no new items");
            break;
        }
        triggered += 1;
    }

    scroll.detach();

    let (loaded, total) = paginator.progress();
    let chain = config.network.chain_info()?;
    let items = paginator.items();
    let recent = RecentLaunches::within(&items, chain, Utc::now(), LOOKBACK_SECS);
    let report = FeedReport {
        chain,
        manager: manager.to_string(),
        loaded,
        total,
        page_size: paginator.page_size(),
        failure: paginator.failure(),
        items,
        events,
        metrics: paginator.metrics().snapshot(),
        recent,
    };
    paginator.shutdown();

    Ok(report)
}

fn drain_events(rx: &mut broadcast::Receiver<FeedEvent>, events: &mut Vec<FeedEvent>) {
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(missed)) => debug!(missed, "Feed events dropped"),
            Err(_) => break,
        }
    }
}

/// Load the pool data and open a chart view on it
fn build_view(config: &DashboardConfig, pool: &PoolArgs) -> Result<LiquidityView> {
    let data = load_tick_data(&pool.data)?;
    let current_tick = data.resolve_current_tick(pool.current_tick);
    let eth_is_token0 = pool.eth_is_token0.or(data.eth_is_token0).unwrap_or(false);
    let usd_per_eth = data.resolve_usd_per_eth(pool.usd_per_eth);

    LiquidityView::new(
        config.chart.clone(),
        data.ranges,
        current_tick,
        eth_is_token0,
        usd_per_eth,
    )
    .context("Invalid chart configuration")
}

fn apply_step(view: &mut LiquidityView, step: ChartStep) {
    match step {
        ChartStep::ZoomIn => view.zoom_in(),
        ChartStep::ZoomOut => view.zoom_out(),
        ChartStep::PanLeft => view.pan_left(),
        ChartStep::PanRight => view.pan_right(),
        ChartStep::Recenter => view.recenter(),
        ChartStep::Reset => view.reset_zoom(),
    }
}

/// Snapshot of `view`, with the tooltip of the bin at `tooltip` if any
pub(crate) fn chart_report(view: &mut LiquidityView, tooltip: Option<i32>) -> ChartReport {
    let snapshot = view.snapshot();
    let tooltip = tooltip.and_then(|tick| view.tooltip(tick));
    let (cache_hits, cache_misses) = view.cache_stats();

    ChartReport {
        snapshot,
        usd_per_eth: view.model().usd_per_eth,
        tooltip,
        cache_hits,
        cache_misses,
    }
}
