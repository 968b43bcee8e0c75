//! Single-slot memoization keyed by an input tuple

use std::sync::Arc;

/// Caches the last computed value together with the inputs that produced it
///
/// A lookup with equal inputs returns the cached value; any other input
/// recomputes and replaces it.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
    hits: u64,
    misses: u64,
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            slot: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> Arc<V> {
        if let Some((cached_key, value)) = &self.slot {
            if *cached_key == key {
                self.hits += 1;
                return Arc::clone(value);
            }
        }

        let value = Arc::new(compute(&key));
        self.misses += 1;
        self.slot = Some((key, Arc::clone(&value)));
        value
    }

    /// `(hits, misses)`
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl<K: PartialEq, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
