//! Paginated coin feed
//!
//! The paginator owns the full id list of a manager and the prefix of it
//! that has been loaded with metadata. Pages are cut by the number of items
//! already loaded, so a page size change between loads never skips or
//! repeats ids. One load runs at a time; a request made while another is in
//! flight is skipped, which keeps pages applied in request order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use flaunch_dash_core::{Address, FeedItem, ItemId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::SessionIdCache;
use crate::config::FeedConfig;
use crate::metrics::FeedMetrics;
use crate::source::MetadataSource;
use crate::{FeedError, FeedResult};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications published by the paginator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Id list fetched
    Initialized { total: usize },

    /// Items appended
    PageLoaded {
        offset: usize,
        count: usize,
        loaded: usize,
        total: usize,
    },

    /// A batch was appended without metadata
    MetadataUnavailable {
        offset: usize,
        count: usize,
        reason: String,
    },

    /// The id list could not be fetched; the feed stays empty
    IdListFailed { reason: String },
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOutcome {
    /// Another load was in flight
    Skipped,

    /// Items were appended
    Loaded { count: usize, metadata_missing: bool },

    /// Nothing left to load
    Exhausted,
}

#[derive(Debug, Default)]
struct FeedState {
    all_ids: Arc<Vec<ItemId>>,
    items: Vec<FeedItem>,
    has_more: bool,
    initialized: bool,
    failure: Option<String>,
}

/// Clears the in-flight flag when the load finishes or is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Paginated feed of a revenue manager's coins
pub struct Paginator {
    source: Arc<dyn MetadataSource>,
    chain: String,
    manager: Address,
    config: FeedConfig,
    id_cache: Option<Arc<SessionIdCache>>,
    state: Mutex<FeedState>,
    page_size: AtomicUsize,
    in_flight: AtomicBool,
    alive: AtomicBool,
    events: broadcast::Sender<FeedEvent>,
    metrics: Arc<FeedMetrics>,
}

impl Paginator {
    pub fn new(
        source: Arc<dyn MetadataSource>,
        chain: impl Into<String>,
        manager: Address,
        config: FeedConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let page_size = config.page_size_for(None);

        Self {
            source,
            chain: chain.into(),
            manager,
            config,
            id_cache: None,
            state: Mutex::new(FeedState::default()),
            page_size: AtomicUsize::new(page_size),
            in_flight: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            events,
            metrics: Arc::new(FeedMetrics::new()),
        }
    }

    /// Use a session cache for the id list
    ///
    /// Ignored when `id_cache_enabled` is off.
    pub fn with_id_cache(mut self, cache: Arc<SessionIdCache>) -> Self {
        if self.config.id_cache_enabled {
            self.id_cache = Some(cache);
        }
        self
    }

    pub fn manager(&self) -> &Address {
        &self.manager
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> Arc<FeedMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.load(Ordering::Acquire)
    }

    /// Change the size used by the next load; zero is ignored
    pub fn set_page_size(&self, page_size: usize) {
        if page_size == 0 {
            warn!("Ignoring zero page size");
            return;
        }
        let previous = self.page_size.swap(page_size, Ordering::AcqRel);
        if previous != page_size {
            debug!(previous, page_size, "Page size changed");
        }
    }

    /// Resize pages for a grid of `columns` columns; `None` when unknown
    pub fn set_columns(&self, columns: Option<usize>) {
        self.set_page_size(self.config.page_size_for(columns));
    }

    pub fn set_viewport_width(&self, width_px: Option<u32>) {
        self.set_page_size(self.config.page_size_for_width(width_px));
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.state.lock().items.clone()
    }

    /// `(loaded, total)`
    pub fn progress(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.items.len(), state.all_ids.len())
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Reason the id list fetch failed, if it did
    pub fn failure(&self) -> Option<String> {
        self.state.lock().failure.clone()
    }

    /// True when a scroll trigger should start a load
    pub fn should_load(&self) -> bool {
        if !self.is_alive() || self.is_loading() {
            return false;
        }
        let state = self.state.lock();
        state.initialized && state.has_more
    }

    /// Stop applying results; loads in flight finish without touching state
    pub fn shutdown(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            info!(manager = %self.manager, "Paginator shut down");
        }
    }

    fn begin_load(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Fetch the id list and the first page
    #[instrument(skip(self), fields(chain = %self.chain, manager = %self.manager))]
    pub async fn initialize(&self) -> FeedResult<LoadOutcome> {
        if !self.is_alive() {
            return Err(FeedError::Shutdown);
        }

        let Some(_guard) = self.begin_load() else {
            self.metrics.record_skipped_load();
            debug!("Initialize skipped, load in flight");
            return Ok(LoadOutcome::Skipped);
        };

        let all_ids = match self.fetch_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                let reason = err.to_string();
                error!("Failed to fetch id list: {}", reason);
                if self.is_alive() {
                    {
                        let mut state = self.state.lock();
                        *state = FeedState {
                            initialized: true,
                            failure: Some(reason.clone()),
                            ..FeedState::default()
                        };
                    }
                    self.emit(FeedEvent::IdListFailed {
                        reason: reason.clone(),
                    });
                }
                return Err(FeedError::IdListFetch(reason));
            }
        };

        if !self.is_alive() {
            debug!("Discarding id list after shutdown");
            return Err(FeedError::Shutdown);
        }

        let total = all_ids.len();
        {
            let mut state = self.state.lock();
            *state = FeedState {
                has_more: total > 0,
                initialized: true,
                all_ids,
                ..FeedState::default()
            };
        }

        info!(total, page_size = self.page_size(), "Feed initialized");
        self.emit(FeedEvent::Initialized { total });

        if total == 0 {
            return Ok(LoadOutcome::Exhausted);
        }

        self.load_batch().await
    }

    /// Append the next page
    ///
    /// A no-op when a load is already running or everything is loaded.
    #[instrument(skip(self), fields(manager = %self.manager))]
    pub async fn load_next_page(&self) -> FeedResult<LoadOutcome> {
        if !self.is_alive() {
            return Err(FeedError::Shutdown);
        }

        {
            let state = self.state.lock();
            if !state.initialized {
                return Err(FeedError::NotInitialized);
            }
            if !state.has_more {
                return Ok(LoadOutcome::Exhausted);
            }
        }

        let Some(_guard) = self.begin_load() else {
            self.metrics.record_skipped_load();
            debug!("Load skipped, another load in flight");
            return Ok(LoadOutcome::Skipped);
        };

        self.load_batch().await
    }

    async fn fetch_ids(&self) -> FeedResult<Arc<Vec<ItemId>>> {
        if let Some(cache) = &self.id_cache {
            if let Some(ids) = cache.get(&self.chain, &self.manager) {
                self.metrics.record_id_cache_hit();
                debug!(count = ids.len(), "Id list served from session cache");
                return Ok(ids);
            }
        }

        let result = self
            .source
            .fetch_all_ids(&self.manager, self.config.sort_desc)
            .await;
        self.metrics.record_id_list_fetch(result.is_ok());
        let ids = result?;

        Ok(match &self.id_cache {
            Some(cache) => cache.insert(&self.chain, &self.manager, ids),
            None => Arc::new(ids),
        })
    }

    /// Resolve and append the ids following the loaded prefix
    ///
    /// Callers hold the in-flight guard.
    async fn load_batch(&self) -> FeedResult<LoadOutcome> {
        let page_size = self.page_size();
        let (offset, next_ids) = {
            let state = self.state.lock();
            let offset = state.items.len();
            let end = (offset + page_size).min(state.all_ids.len());
            (offset, state.all_ids[offset..end].to_vec())
        };

        if next_ids.is_empty() {
            self.state.lock().has_more = false;
            return Ok(LoadOutcome::Exhausted);
        }

        let fetched = self.source.fetch_metadata(&next_ids).await;
        let (batch, metadata_error) = match fetched {
            Ok(metadata) if metadata.len() == next_ids.len() => {
                let items = next_ids
                    .into_iter()
                    .zip(metadata)
                    .map(|(id, metadata)| FeedItem::with_metadata(id, metadata))
                    .collect::<Vec<_>>();
                (items, None)
            }
            Ok(metadata) => {
                let reason = FeedError::MetadataFetch(format!(
                    "expected {} entries, got {}",
                    next_ids.len(),
                    metadata.len()
                ));
                (id_only(next_ids), Some(reason.to_string()))
            }
            Err(err) => {
                let reason = FeedError::MetadataFetch(err.to_string());
                (id_only(next_ids), Some(reason.to_string()))
            }
        };

        if !self.is_alive() {
            debug!(offset, "Discarding page after shutdown");
            return Err(FeedError::Shutdown);
        }

        let count = batch.len();
        let (loaded, total) = {
            let mut state = self.state.lock();
            state.items.extend(batch);
            state.has_more = state.items.len() < state.all_ids.len();
            (state.items.len(), state.all_ids.len())
        };

        self.metrics.record_page(count);

        let metadata_missing = metadata_error.is_some();
        if let Some(reason) = metadata_error {
            warn!(offset, count, "Appending page without metadata: {}", reason);
            self.metrics.record_metadata_failure();
            self.emit(FeedEvent::MetadataUnavailable {
                offset,
                count,
                reason,
            });
        }

        debug!(offset, count, loaded, total, "Page loaded");
        self.emit(FeedEvent::PageLoaded {
            offset,
            count,
            loaded,
            total,
        });

        Ok(LoadOutcome::Loaded {
            count,
            metadata_missing,
        })
    }
}

fn id_only(ids: Vec<ItemId>) -> Vec<FeedItem> {
    ids.into_iter().map(FeedItem::id_only).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Fixture, FixtureSource, MockMetadataSource};
    use flaunch_dash_core::CoinMetadata;
    use std::collections::HashSet;

    fn manager() -> Address {
        Address::parse("0x124f62e1BF232AfD29c7725904F351399C83f572").unwrap()
    }

    fn flaunch() -> Address {
        Address::parse("0xb4512bf57d50fbcb64a3adf8b17a79b2a204c18c").unwrap()
    }

    fn fixture_source(count: u64) -> Arc<FixtureSource> {
        Arc::new(FixtureSource::new(Fixture::synthetic(&manager(), &flaunch(), count)))
    }

    fn paginator(source: Arc<dyn MetadataSource>, page_size: usize) -> Paginator {
        let paginator = Paginator::new(source, "base", manager(), FeedConfig::default());
        paginator.set_page_size(page_size);
        paginator
    }

    fn metadata_for(ids: &[ItemId]) -> Vec<CoinMetadata> {
        ids.iter()
            .map(|id| CoinMetadata {
                coin_address: id.flaunch.clone(),
                name: format!("Coin {}", id.token_id),
                symbol: format!("C{}", id.token_id),
                image: String::new(),
                description: String::new(),
                launched_at: None,
                launch_tx: None,
            })
            .collect()
    }

    fn drain(rx: &mut broadcast::Receiver<FeedEvent>) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_thirty_seven_items_in_pages_of_twelve() {
        let feed = paginator(fixture_source(37), 12);

        assert!(matches!(
            feed.initialize().await.unwrap(),
            LoadOutcome::Loaded { count: 12, .. }
        ));
        assert_eq!(feed.progress(), (12, 37));
        assert!(feed.has_more());

        feed.load_next_page().await.unwrap();
        feed.load_next_page().await.unwrap();
        assert_eq!(feed.progress(), (36, 37));
        assert!(feed.has_more());

        assert!(matches!(
            feed.load_next_page().await.unwrap(),
            LoadOutcome::Loaded { count: 1, .. }
        ));
        assert_eq!(feed.progress(), (37, 37));
        assert!(!feed.has_more());

        assert_eq!(feed.load_next_page().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(feed.progress(), (37, 37));
    }

    #[tokio::test]
    async fn test_loaded_count_after_k_loads() {
        for (total, page_size) in [(0u64, 5usize), (5, 5), (23, 4), (100, 7)] {
            let feed = paginator(fixture_source(total), page_size);
            feed.initialize().await.unwrap();
            for k in 0..6 {
                let expected = (total as usize).min((k + 1) * page_size);
                assert_eq!(feed.progress().0, expected, "total {} k {}", total, k);
                let _ = feed.load_next_page().await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_order_preserved_without_duplicates() {
        let source = fixture_source(30);
        let all_ids = source.fetch_all_ids(&manager(), true).await.unwrap();
        let feed = paginator(source, 8);

        feed.initialize().await.unwrap();
        while feed.has_more() {
            feed.load_next_page().await.unwrap();
        }

        let ids: Vec<ItemId> = feed.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, all_ids);
        let unique: HashSet<&ItemId> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_page_size_change_uses_current_size() {
        let source = fixture_source(40);
        let all_ids = source.fetch_all_ids(&manager(), true).await.unwrap();
        let feed = paginator(source, 12);
        let loaded_ids = || -> Vec<ItemId> {
            feed.items().into_iter().map(|item| item.id).collect()
        };

        feed.initialize().await.unwrap();
        assert_eq!(feed.progress().0, 12);
        assert_eq!(loaded_ids(), all_ids[..12]);

        feed.set_columns(Some(2));
        assert_eq!(feed.page_size(), 8);
        feed.load_next_page().await.unwrap();
        assert_eq!(feed.progress().0, 20);
        assert_eq!(loaded_ids(), all_ids[..20]);

        feed.set_columns(None);
        feed.load_next_page().await.unwrap();
        assert_eq!(feed.progress().0, 40);
        assert!(!feed.has_more());

        let ids = loaded_ids();
        assert_eq!(ids, all_ids);
        let unique: HashSet<&ItemId> = ids.iter().collect();
        assert_eq!(unique.len(), 40);

        feed.set_page_size(0);
        assert_eq!(feed.page_size(), 20);
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_page() {
        let mut fixture = Fixture::synthetic(&manager(), &flaunch(), 30);
        fixture.fail_metadata_batches.insert(1);
        let feed = paginator(Arc::new(FixtureSource::new(fixture)), 12);
        let mut rx = feed.subscribe();

        feed.initialize().await.unwrap();
        let outcome = feed.load_next_page().await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                count: 12,
                metadata_missing: true
            }
        );

        let items = feed.items();
        assert_eq!(items.len(), 24);
        assert!(items[..12].iter().all(|item| item.metadata.is_some()));
        assert!(items[12..].iter().all(|item| item.metadata.is_none()));
        assert!(feed.has_more());

        feed.load_next_page().await.unwrap();
        assert_eq!(feed.progress(), (30, 30));
        assert!(!feed.has_more());

        let failures = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, FeedEvent::MetadataUnavailable { .. }))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(feed.metrics().snapshot().metadata_failures, 1);
    }

    #[tokio::test]
    async fn test_misaligned_metadata_is_a_failure() {
        let mut source = MockMetadataSource::new();
        source
            .expect_fetch_all_ids()
            .times(1)
            .returning(|_, _| Ok((1..=4).map(|i| ItemId::new(flaunch(), i)).collect()));
        source
            .expect_fetch_metadata()
            .times(1)
            .returning(|ids| Ok(metadata_for(&ids[..1])));

        let feed = paginator(Arc::new(source), 4);
        let outcome = feed.initialize().await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                count: 4,
                metadata_missing: true
            }
        );
        assert!(feed.items().iter().all(|item| item.metadata.is_none()));
    }

    #[tokio::test]
    async fn test_id_list_failure_is_terminal() {
        let mut source = MockMetadataSource::new();
        source
            .expect_fetch_all_ids()
            .times(1)
            .returning(|_, _| Err(FeedError::Source("rpc down".to_string())));
        source.expect_fetch_metadata().never();

        let feed = paginator(Arc::new(source), 12);
        let mut rx = feed.subscribe();

        let err = feed.initialize().await.unwrap_err();
        assert!(matches!(err, FeedError::IdListFetch(_)));
        assert!(feed.failure().is_some());
        assert!(!feed.has_more());
        assert!(!feed.should_load());
        assert!(feed.items().is_empty());
        assert_eq!(feed.load_next_page().await.unwrap(), LoadOutcome::Exhausted);

        assert!(matches!(
            drain(&mut rx).as_slice(),
            [FeedEvent::IdListFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn test_empty_id_list() {
        let feed = paginator(fixture_source(0), 12);
        assert_eq!(feed.initialize().await.unwrap(), LoadOutcome::Exhausted);
        assert!(!feed.has_more());
        assert!(feed.items().is_empty());
    }

    #[tokio::test]
    async fn test_load_before_initialize() {
        let feed = paginator(fixture_source(3), 12);
        assert!(matches!(
            feed.load_next_page().await,
            Err(FeedError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_load_is_skipped() {
        let mut fixture = Fixture::synthetic(&manager(), &flaunch(), 50);
        fixture.latency_ms = 20;
        let feed = Arc::new(paginator(Arc::new(FixtureSource::new(fixture)), 10));
        feed.initialize().await.unwrap();

        let (a, b) = tokio::join!(feed.load_next_page(), feed.load_next_page());
        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes.contains(&LoadOutcome::Skipped));
        assert_eq!(feed.progress().0, 20);
        assert_eq!(feed.metrics().snapshot().loads_skipped, 1);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_shutdown_suppresses_updates() {
        let mut fixture = Fixture::synthetic(&manager(), &flaunch(), 50);
        fixture.latency_ms = 20;
        let feed = Arc::new(paginator(Arc::new(FixtureSource::new(fixture)), 10));
        feed.initialize().await.unwrap();

        let pending = {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.load_next_page().await })
        };
        tokio::task::yield_now().await;
        feed.shutdown();

        assert!(matches!(pending.await.unwrap(), Err(FeedError::Shutdown)));
        assert_eq!(feed.progress().0, 10);
        assert!(matches!(
            feed.load_next_page().await,
            Err(FeedError::Shutdown)
        ));
    }

    #[tokio::test]
    async fn test_session_cache_reuses_id_list() {
        let mut source = MockMetadataSource::new();
        source
            .expect_fetch_all_ids()
            .times(1)
            .returning(|_, _| Ok((1..=3).map(|i| ItemId::new(flaunch(), i)).collect()));
        source
            .expect_fetch_metadata()
            .returning(|ids| Ok(metadata_for(ids)));
        let source: Arc<dyn MetadataSource> = Arc::new(source);
        let cache = Arc::new(SessionIdCache::new());

        let first = paginator(Arc::clone(&source), 12).with_id_cache(Arc::clone(&cache));
        first.initialize().await.unwrap();

        let second = paginator(source, 12).with_id_cache(Arc::clone(&cache));
        second.initialize().await.unwrap();
        assert_eq!(second.progress(), (3, 3));
        assert_eq!(second.metrics().snapshot().id_cache_hits, 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
