use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of feed metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMetricsSnapshot {
    /// Id list fetches sent to the source
    pub id_list_fetches: u64,

    /// Id list fetches that failed
    pub id_list_failures: u64,

    /// Id lists served from the session cache
    pub id_cache_hits: u64,

    /// Pages appended to the feed
    pub pages_loaded: u64,

    /// Items appended to the feed
    pub items_loaded: u64,

    /// Metadata batches that fell back to id-only items
    pub metadata_failures: u64,

    /// Load requests ignored because a load was already running
    pub loads_skipped: u64,
}

/// Metrics for the paginator
#[derive(Debug, Default)]
pub struct FeedMetrics {
    id_list_fetches: AtomicU64,
    id_list_failures: AtomicU64,
    id_cache_hits: AtomicU64,
    pages_loaded: AtomicU64,
    items_loaded: AtomicU64,
    metadata_failures: AtomicU64,
    loads_skipped: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_id_list_fetch(&self, success: bool) {
        self.id_list_fetches.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.id_list_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_id_cache_hit(&self) {
        self.id_cache_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_page(&self, items: usize) {
        self.pages_loaded.fetch_add(1, Ordering::SeqCst);
        self.items_loaded.fetch_add(items as u64, Ordering::SeqCst);
    }

    pub fn record_metadata_failure(&self) {
        self.metadata_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skipped_load(&self) {
        self.loads_skipped.fetch_add(1, Ordering::SeqCst);
    }

    /// Get a snapshot of the current metrics
    pub fn snapshot(&self) -> FeedMetricsSnapshot {
        FeedMetricsSnapshot {
            id_list_fetches: self.id_list_fetches.load(Ordering::SeqCst),
            id_list_failures: self.id_list_failures.load(Ordering::SeqCst),
            id_cache_hits: self.id_cache_hits.load(Ordering::SeqCst),
            pages_loaded: self.pages_loaded.load(Ordering::SeqCst),
            items_loaded: self.items_loaded.load(Ordering::SeqCst),
            metadata_failures: self.metadata_failures.load(Ordering::SeqCst),
            loads_skipped: self.loads_skipped.load(Ordering::SeqCst),
        }
    }
}
