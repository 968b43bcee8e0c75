//! Feed module for the Flaunch dashboard
//!
//! Pages through the coins of a revenue manager:
//! - Full id list fetched once per session, optionally from a session cache
//! - Metadata resolved in batches sized by the visible grid
//! - Infinite scroll driven by a visibility sensor on a sentinel element
//! - Non-fatal metadata failures broadcast as events

use tracing::info;

pub mod cache;
pub mod config;
pub mod metrics;
pub mod paginator;
pub mod sensor;
pub mod source;

pub use cache::{IdCacheStats, SessionIdCache};
pub use config::{Breakpoint, FeedConfig};
pub use metrics::{FeedMetrics, FeedMetricsSnapshot};
pub use paginator::{FeedEvent, LoadOutcome, Paginator};
pub use sensor::{InfiniteScroll, ScrollViewport, Subscription, VisibilitySensor};
pub use source::{Fixture, FixtureCoin, FixtureSource, MetadataSource};

/// Error types for the feed module
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    /// The full id list could not be fetched; terminal for the session
    #[error("Failed to fetch id list: {0}")]
    IdListFetch(String),

    /// A metadata batch could not be resolved; the page is kept without metadata
    #[error("Failed to fetch metadata: {0}")]
    MetadataFetch(String),

    #[error("Paginator not initialized")]
    NotInitialized,

    #[error("Paginator shut down")]
    Shutdown,

    #[error("Source error: {0}")]
    Source(String),

    #[error("Invalid feed configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Serialization(err.to_string())
    }
}

/// Result type for the feed module
pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Initialize the module
pub fn init() {
    info!("Initializing feed module");
}
