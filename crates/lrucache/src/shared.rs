//! Thread-safe handle around a single [`LruCache`]
//!
//! Every operation, reads included, reorders the recency list, so the whole
//! cache sits behind one mutex.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::lru::LruCache;
use crate::stats::StatsSnapshot;

/// Cloneable, lock-guarded LRU cache for multi-threaded hosts
pub struct SharedLruCache<K, V> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> Clone for SharedLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a shared cache holding at most `capacity` entries
    pub fn new<C: TryInto<usize>>(capacity: C) -> Result<Self> {
        LruCache::new(capacity).map(Self::from)
    }

    /// Create a shared cache from a full set of options
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        LruCache::with_config(config).map(Self::from)
    }

    /// Insert or replace a value; returns the evicted entry, if any
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        self.inner.lock().set(key, value)
    }

    /// Read a copy of a value, promoting it to most recently used
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Remove an entry and return its value
    pub fn remove<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remove(key)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Copy the current statistics and occupancy
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.inner.lock().stats_snapshot()
    }

    /// Run `f` with exclusive access to the underlying cache
    pub fn with<R>(&self, f: impl FnOnce(&mut LruCache<K, V>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}

impl<K, V> From<LruCache<K, V>> for SharedLruCache<K, V> {
    fn from(cache: LruCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }
}
