//! Bounded in-memory LRU cache.
//!
//! A thin wrapper over `moka::sync::Cache` with the LRU eviction policy.
//! Pending maintenance runs after every insert, so the entry count never
//! exceeds capacity when observed.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::hash::Hash;

/// Default number of distinct keys kept by windowed catalog sources.
pub const DEFAULT_CAPACITY: usize = 512;

pub struct LruCache<K, V> {
    inner: Cache<K, V>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Cache::builder()
                .max_capacity(capacity as u64)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test that does not refresh recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns a clone of the cached value and marks the key most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// Insert or replace `key`, evicting the least recently used entry when full.
    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
        self.inner.run_pending_tasks();
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
