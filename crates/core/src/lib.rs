//! Core module for the Flaunch dashboard
//!
//! Shared building blocks used by the feed and liquidity crates:
//! - Coin identifiers and metadata records
//! - Supported chain table
//! - IPFS URI resolution
//! - Time and number formatting helpers

use tracing::info;

pub mod chains;
pub mod format;
pub mod ipfs;
pub mod types;

pub use chains::{chain_by_key, ChainInfo, ANVIL, BASE, BASE_SEPOLIA, SUPPORTED_CHAINS};
pub use format::{format_number_with_commas, format_time_ago};
pub use ipfs::{resolve_ipfs, DEFAULT_IPFS_GATEWAY};
pub use types::{Address, CoinMetadata, FeedItem, ItemId};

/// Error types for the core module
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),
}

/// Result type for the core module
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Module version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the module
pub fn init() {
    info!("Initializing core module");
}
