//! Id and metadata source
//!
//! The paginator only relies on two reads: the full ordered id list of a
//! manager, and a batched metadata lookup whose results line up with the
//! requested ids.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use flaunch_dash_core::{Address, CoinMetadata, ItemId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{FeedError, FeedResult};

/// Read-only coin source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Every coin id held by `manager`, in a stable order for the session
    async fn fetch_all_ids(&self, manager: &Address, sort_desc: bool) -> FeedResult<Vec<ItemId>>;

    /// Metadata for `ids`, one entry per id in the same order
    async fn fetch_metadata(&self, ids: &[ItemId]) -> FeedResult<Vec<CoinMetadata>>;
}

/// Coin entry of a fixture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCoin {
    pub flaunch: Address,
    pub token_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CoinMetadata>,
}

impl FixtureCoin {
    pub fn id(&self) -> ItemId {
        ItemId::new(self.flaunch.clone(), self.token_id)
    }
}

/// Contents of a fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Coins keyed by manager address
    pub managers: HashMap<Address, Vec<FixtureCoin>>,

    /// Zero-based metadata calls that fail
    pub fail_metadata_batches: HashSet<usize>,

    /// Fail the id list fetch
    pub fail_id_list: bool,

    /// Simulated latency per call
    pub latency_ms: u64,
}

/// Spacing between generated launches, newest token first
pub const SYNTHETIC_LAUNCH_INTERVAL_MINS: i64 = 9;

impl Fixture {
    /// `count` coins with generated metadata under `manager`
    pub fn synthetic(manager: &Address, flaunch: &Address, count: u64) -> Self {
        let now = Utc::now();
        let coins = (1..=count)
            .map(|token_id| FixtureCoin {
                flaunch: flaunch.clone(),
                token_id,
                metadata: Some(CoinMetadata {
                    coin_address: flaunch.clone(),
                    name: format!("Quote #{}", token_id),
                    symbol: format!("Q{}", token_id),
                    image: format!("ipfs://fixture/{}", token_id),
                    description: String::new(),
                    launched_at: Some(
                        now - ChronoDuration::minutes(
                            (count - token_id) as i64 * SYNTHETIC_LAUNCH_INTERVAL_MINS,
                        ),
                    ),
                    launch_tx: Some(format!("0x{:064x}", token_id)),
                }),
            })
            .collect();

        let mut managers = HashMap::new();
        managers.insert(manager.clone(), coins);
        Self {
            managers,
            ..Default::default()
        }
    }
}

/// Source backed by an in-memory fixture
pub struct FixtureSource {
    fixture: Fixture,
    metadata: HashMap<ItemId, CoinMetadata>,
    metadata_calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new(fixture: Fixture) -> Self {
        let metadata = fixture
            .managers
            .values()
            .flatten()
            .filter_map(|coin| coin.metadata.clone().map(|m| (coin.id(), m)))
            .collect();

        Self {
            fixture,
            metadata,
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Load a JSON fixture file
    pub fn load(path: impl AsRef<Path>) -> FeedResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        info!(
            "Loaded fixture from {} with {} managers",
            path.display(),
            fixture.managers.len()
        );
        Ok(Self::new(fixture))
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if self.fixture.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.fixture.latency_ms)).await;
        }
    }
}

#[async_trait]
impl MetadataSource for FixtureSource {
    async fn fetch_all_ids(&self, manager: &Address, sort_desc: bool) -> FeedResult<Vec<ItemId>> {
        self.simulate_latency().await;

        if self.fixture.fail_id_list {
            return Err(FeedError::Source(format!(
                "id list unavailable for {}",
                manager
            )));
        }

        let key = manager.normalized();
        let mut coins: Vec<&FixtureCoin> = self
            .fixture
            .managers
            .iter()
            .filter(|(address, _)| address.normalized() == key)
            .flat_map(|(_, coins)| coins.iter())
            .collect();

        coins.sort_by_key(|coin| coin.token_id);
        if sort_desc {
            coins.reverse();
        }

        debug!(manager = %manager, count = coins.len(), "Fixture id list");
        Ok(coins.into_iter().map(FixtureCoin::id).collect())
    }

    async fn fetch_metadata(&self, ids: &[ItemId]) -> FeedResult<Vec<CoinMetadata>> {
        let call = self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fixture.fail_metadata_batches.contains(&call) {
            return Err(FeedError::Source(format!("metadata batch {} unavailable", call)));
        }

        ids.iter()
            .map(|id| {
                self.metadata
                    .get(id)
                    .cloned()
                    .ok_or_else(|| FeedError::Source(format!("no metadata for {}", id)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: &str) -> Address {
        Address::parse(&format!("0x{}", byte.repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn test_fixture_order_and_metadata() {
        let manager = address("a");
        let source = FixtureSource::new(Fixture::synthetic(&manager, &address("b"), 5));

        let desc = source.fetch_all_ids(&manager, true).await.unwrap();
        assert_eq!(desc.first().map(|id| id.token_id), Some(5));

        let asc = source.fetch_all_ids(&manager, false).await.unwrap();
        assert_eq!(asc.first().map(|id| id.token_id), Some(1));

        let metadata = source.fetch_metadata(&asc[1..3]).await.unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[0].symbol, "Q2");
        assert_eq!(metadata[1].symbol, "Q3");
        assert_eq!(source.metadata_calls(), 1);
    }

    #[tokio::test]
    async fn test_fixture_manager_is_case_insensitive() {
        let manager = Address::parse("0x124f62e1BF232AfD29c7725904F351399C83f572").unwrap();
        let source = FixtureSource::new(Fixture::synthetic(&manager, &address("b"), 3));

        let lower = Address::parse(&manager.normalized()).unwrap();
        assert_eq!(source.fetch_all_ids(&lower, true).await.unwrap().len(), 3);
        assert!(source.fetch_all_ids(&address("c"), true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_failures() {
        let manager = address("a");
        let mut fixture = Fixture::synthetic(&manager, &address("b"), 4);
        fixture.fail_metadata_batches.insert(1);
        let source = FixtureSource::new(fixture);

        let ids = source.fetch_all_ids(&manager, false).await.unwrap();
        assert!(source.fetch_metadata(&ids[..2]).await.is_ok());
        assert!(source.fetch_metadata(&ids[2..]).await.is_err());
        assert!(source.fetch_metadata(&ids[2..]).await.is_ok());

        let mut fixture = Fixture::synthetic(&manager, &address("b"), 1);
        fixture.fail_id_list = true;
        let source = FixtureSource::new(fixture);
        assert!(source.fetch_all_ids(&manager, true).await.is_err());
    }

    #[test]
    fn test_load_fixture_file() {
        let manager = address("a");
        let fixture = Fixture::synthetic(&manager, &address("b"), 2);
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string(&fixture).unwrap()).unwrap();

        let source = FixtureSource::load(file.path()).unwrap();
        assert_eq!(source.fixture.managers[&manager].len(), 2);
    }

    #[test]
    fn test_synthetic_launch_times() {
        let manager = address("a");
        let fixture = Fixture::synthetic(&manager, &address("b"), 3);
        let coins = &fixture.managers[&manager];
        let launched: Vec<_> = coins
            .iter()
            .map(|coin| coin.metadata.as_ref().unwrap().launched_at.unwrap())
            .collect();

        assert_eq!(
            launched[2] - launched[0],
            ChronoDuration::minutes(2 * SYNTHETIC_LAUNCH_INTERVAL_MINS)
        );
        assert_eq!(
            coins[0].metadata.as_ref().unwrap().launch_tx,
            Some(format!("0x{:064x}", 1))
        );
    }
}
