//! Bounded recent-shape cache for kernel selection
//!
//! The dispatcher remembers which kernel it picked for a given operation
//! and operand shapes. The cache is a pure performance aid: a miss simply
//! re-runs the selection policy, so evicting an entry never changes a
//! result.
//!
//! # Design
//!
//! - **Eviction**: least recently used, tracked with a logical clock
//! - **Thread safety**: `Arc<parking_lot::Mutex<..>>`, clones share storage
//! - **Get/insert**: O(1) average, eviction scans the entries (the cache is small)
//!
//! # Examples
//!
//! ```
//! use tenalg_core::cache::ShapeCache;
//!
//! let cache: ShapeCache<&str, u32> = ShapeCache::try_new(2).unwrap();
//! assert_eq!(cache.get_or_insert_with("a", || 1), 1);
//! assert_eq!(cache.get_or_insert_with("a", || 99), 1);
//! assert_eq!(cache.stats().hits, 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, TensorError};

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Number of evictions
    pub evictions: usize,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`; zero before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    last_access: u64,
}

#[derive(Debug)]
struct ShapeCacheInner<K, V> {
    capacity: usize,
    entries: HashMap<K, CacheEntry<V>>,
    clock: u64,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> ShapeCacheInner<K, V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!(capacity = self.capacity, "shape cache eviction");
        }
    }
}

/// Thread-safe LRU cache keyed by operation and operand shapes.
#[derive(Debug)]
pub struct ShapeCache<K, V> {
    inner: Arc<Mutex<ShapeCacheInner<K, V>>>,
}

impl<K, V> Clone for ShapeCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> ShapeCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            inner: Arc::new(Mutex::new(ShapeCacheInner {
                capacity,
                entries: HashMap::with_capacity(capacity),
                clock: 0,
                stats: CacheStats::default(),
            })),
        }
    }

    /// [`ShapeCache::new`] from a plain count.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or_else(|| TensorError::invalid_argument("cache capacity must be greater than 0"))
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs outside the lock, so two threads missing on the same key
    /// may both compute; the later insert wins, which is harmless for a pure
    /// selection function.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let value = compute();

        let mut inner = self.inner.lock();
        let now = inner.tick();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.capacity {
            inner.evict_lru();
        }
        inner.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                last_access: now,
            },
        );
        inner.stats.entries = inner.entries.len();
        value
    }

    /// Look up `key`, refreshing its recency on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let now = inner.tick();
        let hit = inner.entries.get_mut(key).map(|entry| {
            entry.last_access = now;
            entry.value.clone()
        });
        if hit.is_some() {
            inner.stats.hits += 1;
            tracing::trace!("shape cache hit");
        } else {
            inner.stats.misses += 1;
        }
        hit
    }

    /// Whether `key` is cached, without touching statistics or recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    /// Drop all entries and reset statistics.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::default();
    }
}
