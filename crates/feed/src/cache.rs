//! Session-scoped id list cache
//!
//! The full id list of a manager is fetched once per session. The cache is
//! owned by whoever owns the session and is cleared when it ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use flaunch_dash_core::{Address, ItemId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Id lists keyed by (chain, manager)
#[derive(Debug, Default)]
pub struct SessionIdCache {
    entries: DashMap<(String, String), Arc<Vec<ItemId>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SessionIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(chain: &str, manager: &Address) -> (String, String) {
        (chain.to_string(), manager.normalized())
    }

    pub fn get(&self, chain: &str, manager: &Address) -> Option<Arc<Vec<ItemId>>> {
        match self.entries.get(&Self::key(chain, manager)) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, chain: &str, manager: &Address, ids: Vec<ItemId>) -> Arc<Vec<ItemId>> {
        let ids = Arc::new(ids);
        debug!(chain, manager = %manager, count = ids.len(), "Caching id list");
        self.entries.insert(Self::key(chain, manager), Arc::clone(&ids));
        ids
    }

    pub fn invalidate(&self, chain: &str, manager: &Address) {
        self.entries.remove(&Self::key(chain, manager));
    }

    /// Drop every entry; called when the session ends
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        info!("Cleared {} cached id lists", count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IdCacheStats {
        IdCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
