//! Configuration schema definitions

use flaunch_dash_core::{chain_by_key, Address, ChainInfo, DEFAULT_IPFS_GATEWAY};
use flaunch_dash_feed::FeedConfig;
use flaunch_dash_liquidity::ChartConfig;
use flaunch_dash_logging::LoggingConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Revenue manager shown when none is configured
pub const DEFAULT_MANAGER: &str = "0x124f62e1BF232AfD29c7725904F351399C83f572";

/// Chain and data source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Key into the supported chain table
    pub chain: String,

    /// JSON-RPC endpoint; the chain's public endpoint when unset
    pub rpc_url: Option<String>,

    /// Revenue manager whose coins are listed
    pub manager: String,

    pub ipfs_gateway: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain: "base".to_string(),
            rpc_url: None,
            manager: DEFAULT_MANAGER.to_string(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn chain_info(&self) -> ConfigResult<&'static ChainInfo> {
        Ok(chain_by_key(&self.chain)?)
    }

    pub fn manager_address(&self) -> ConfigResult<Address> {
        Ok(Address::parse(&self.manager)?)
    }
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub network: NetworkConfig,

    /// Coin feed pagination
    pub feed: FeedConfig,

    /// Liquidity chart
    pub chart: ChartConfig,

    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Check every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.network.chain_info()?;
        self.network.manager_address()?;

        if !self.network.ipfs_gateway.ends_with('/') {
            return Err(ConfigError::invalid("network", "ipfs_gateway must end with '/'"));
        }

        if let Some(url) = &self.network.rpc_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "network",
                    format!("rpc_url must be an http(s) URL, got {}", url),
                ));
            }
        }

        self.feed.validate().map_err(|e| ConfigError::invalid("feed", e))?;
        self.chart.validate().map_err(|e| ConfigError::invalid("chart", e))?;
        self.logging.validate().map_err(|e| ConfigError::invalid("logging", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaunch_dash_core::CoreError;

    #[test]
    fn test_default_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.chain_info().unwrap().key, "base");
    }

    #[test]
    fn test_invalid_sections() {
        let mut config = DashboardConfig::default();
        config.network.chain = "mainnet".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Network(CoreError::UnknownChain(_)))
        ));

        let mut config = DashboardConfig::default();
        config.network.manager = "0x1234".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Network(CoreError::InvalidAddress(_)))
        ));

        let mut config = DashboardConfig::default();
        config.feed.rows_per_page = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSection { section: "feed", .. })
        ));

        let mut config = DashboardConfig::default();
        config.chart.tick_spacing = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSection { section: "chart", .. })
        ));

        let mut config = DashboardConfig::default();
        config.network.rpc_url = Some("ws://localhost".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSection { section: "network", .. })
        ));
    }

    #[test]
    fn test_partial_yaml() {
        let config: DashboardConfig = serde_yaml::from_str(
            "network:\n  chain: base-sepolia\nfeed:\n  rows_per_page: 6\n",
        )
        .unwrap();
        assert_eq!(config.network.chain, "base-sepolia");
        assert_eq!(config.feed.rows_per_page, 6);
        assert_eq!(config.feed.default_columns, 5);
        assert_eq!(config.chart, ChartConfig::default());
    }
}
