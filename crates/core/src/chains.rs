//! Supported chains

use serde::Serialize;

use crate::{CoreError, CoreResult};

/// Static description of a chain the dashboard can read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    /// Key used in configuration and routes
    pub key: &'static str,

    /// EVM chain id
    pub id: u64,

    /// Human readable name
    pub name: &'static str,

    /// Average block time in seconds, when known
    pub block_time_secs: Option<u64>,

    /// Public RPC endpoint used when no override is configured
    pub default_rpc_url: &'static str,

    /// Block explorer base URL
    pub explorer_url: Option<&'static str>,
}

pub const BASE: ChainInfo = ChainInfo {
    key: "base",
    id: 8453,
    name: "Base",
    block_time_secs: Some(2),
    default_rpc_url: "https://mainnet.base.org",
    explorer_url: Some("https://basescan.org"),
};

pub const BASE_SEPOLIA: ChainInfo = ChainInfo {
    key: "base-sepolia",
    id: 84532,
    name: "Base Sepolia",
    block_time_secs: Some(2),
    default_rpc_url: "https://sepolia.base.org",
    explorer_url: Some("https://sepolia.basescan.org"),
};

/// Local fork; reuses the Base Sepolia explorer
pub const ANVIL: ChainInfo = ChainInfo {
    key: "anvil",
    id: 31337,
    name: "Anvil",
    block_time_secs: None,
    default_rpc_url: "http://127.0.0.1:8545",
    explorer_url: Some("https://sepolia.basescan.org"),
};

pub static SUPPORTED_CHAINS: [ChainInfo; 3] = [BASE, BASE_SEPOLIA, ANVIL];

/// Look up a chain by its configuration key
pub fn chain_by_key(key: &str) -> CoreResult<&'static ChainInfo> {
    SUPPORTED_CHAINS
        .iter()
        .find(|chain| chain.key == key)
        .ok_or_else(|| CoreError::UnknownChain(key.to_string()))
}

impl ChainInfo {
    /// Number of blocks covering the last `seconds` seconds
    ///
    /// Returns `None` on chains without a fixed block time.
    pub fn blocks_for_lookback(&self, seconds: u64) -> Option<u64> {
        match self.block_time_secs {
            Some(block_time) if block_time > 0 => Some(seconds / block_time),
            _ => None,
        }
    }

    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url.map(|base| format!("{}/tx/{}", base, tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_lookup() {
        assert_eq!(chain_by_key("base").map(|c| c.id), Ok(8453));
        assert_eq!(chain_by_key("base-sepolia").map(|c| c.id), Ok(84532));
        assert_eq!(
            chain_by_key("mainnet"),
            Err(CoreError::UnknownChain("mainnet".to_string()))
        );
    }

    #[test]
    fn test_lookback_blocks() {
        // four hours of two-second blocks
        assert_eq!(BASE.blocks_for_lookback(4 * 60 * 60), Some(7200));
        assert_eq!(ANVIL.blocks_for_lookback(60), None);
    }

    #[test]
    fn test_tx_url() {
        assert_eq!(
            BASE.tx_url("0xabc").as_deref(),
            Some("https://basescan.org/tx/0xabc")
        );
    }
}
