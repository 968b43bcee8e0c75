use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// EVM address, stored as the checksummed or lowercase `0x` string it was parsed from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse a `0x`-prefixed, 20-byte hex address
    pub fn parse(value: &str) -> CoreResult<Self> {
        let hex = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidAddress(value.to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(value.to_string()));
        }

        Ok(Self(format!("0x{}", hex)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive key, used for cache lookups
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Identifier of a coin inside a revenue manager
///
/// Unique by (flaunch contract, token id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    /// Flaunch contract the token was minted on
    pub flaunch: Address,

    /// Token id within the flaunch contract
    pub token_id: u64,
}

impl ItemId {
    pub fn new(flaunch: Address, token_id: u64) -> Self {
        Self { flaunch, token_id }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.flaunch, self.token_id)
    }
}

/// Coin metadata resolved from the token URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMetadata {
    /// Address of the memecoin ERC20
    pub coin_address: Address,

    /// Display name
    pub name: String,

    /// Ticker symbol
    pub symbol: String,

    /// Image reference, usually an `ipfs://` URI
    pub image: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Block time of the launch, when the source knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<DateTime<Utc>>,

    /// Hash of the launch transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_tx: Option<String>,
}

/// Entry of the displayed feed
///
/// Metadata is `None` when the batch lookup for the item failed; the item is
/// still shown so paging can make progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: ItemId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CoinMetadata>,
}

impl FeedItem {
    pub fn with_metadata(id: ItemId, metadata: CoinMetadata) -> Self {
        Self {
            id,
            metadata: Some(metadata),
        }
    }

    pub fn id_only(id: ItemId) -> Self {
        Self { id, metadata: None }
    }

    /// Symbol rendered as `$SYMBOL`, or `-` when unknown
    pub fn display_symbol(&self) -> String {
        self.metadata
            .as_ref()
            .map(|m| format!("${}", m.symbol))
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn display_name(&self) -> &str {
        self.metadata.as_ref().map(|m| m.name.as_str()).unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANAGER: &str = "0x124f62e1BF232AfD29c7725904F351399C83f572";

    #[test]
    fn test_address_parse() {
        let address = Address::parse(MANAGER).unwrap();
        assert_eq!(address.as_str(), MANAGER);
        assert_eq!(address.normalized(), MANAGER.to_ascii_lowercase());

        assert!(Address::parse("124f62e1BF232AfD29c7725904F351399C83f572").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xZZ4f62e1BF232AfD29c7725904F351399C83f572").is_err());
    }

    #[test]
    fn test_address_serde() {
        let json = format!("\"{}\"", MANAGER);
        let address: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&address).unwrap(), json);

        let bad: Result<Address, _> = serde_json::from_str("\"0xnope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_feed_item_display() {
        let id = ItemId::new(Address::parse(MANAGER).unwrap(), 7);
        let bare = FeedItem::id_only(id.clone());
        assert_eq!(bare.display_symbol(), "-");
        assert_eq!(bare.display_name(), "-");

        let item = FeedItem::with_metadata(
            id,
            CoinMetadata {
                coin_address: Address::parse(MANAGER).unwrap(),
                name: "Quote".to_string(),
                symbol: "QUOTE".to_string(),
                image: "ipfs://cid".to_string(),
                description: String::new(),
                launched_at: None,
                launch_tx: None,
            },
        );
        assert_eq!(item.display_symbol(), "$QUOTE");
        assert_eq!(item.display_name(), "Quote");
    }
}
