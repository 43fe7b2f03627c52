//! LRU (Least Recently Used) cache engine
//!
//! A hash index maps each key to its slot in the recency list, so lookup,
//! promotion and eviction are all O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use ahash::RandomState;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::order::RecencyList;
use crate::stats::{CacheStats, StatsSnapshot};

/// LRU cache with fixed capacity
///
/// # Example
///
/// ```
/// use lrucache::{Error, LruCache};
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.set(1, "a");
/// cache.set(2, "b");
/// cache.get(&1).unwrap();
///
/// // 2 is now the least recently used entry
/// assert_eq!(cache.set(3, "c"), Some((2, "b")));
/// assert_eq!(cache.get(&2), Err(Error::NotFound));
/// ```
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    order: RecencyList<K, V>,
    capacity: usize,
    max_age: Option<Duration>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache holding at most `capacity` entries
    ///
    /// Fails with [`Error::InvalidCapacity`] for zero, negative, or
    /// out-of-range capacities.
    pub fn new<C: TryInto<usize>>(capacity: C) -> Result<Self> {
        let capacity = capacity.try_into().map_err(|_| Error::InvalidCapacity)?;
        Self::with_config(CacheConfig::new(capacity))
    }

    /// Create a cache from a full set of options
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let initial = config.initial_capacity();
        let max_age = config.max_age();
        trace!(
            capacity = config.max_elements,
            initial,
            max_age_ms = config.max_age_ms,
            "creating LRU cache"
        );

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(initial, RandomState::new()),
            order: RecencyList::with_capacity(initial),
            capacity: config.max_elements,
            max_age,
            stats: CacheStats::new(),
        })
    }

    /// Insert or replace a value, leaving `key` most recently used
    ///
    /// Returns the entry evicted to make room, if any. Replacing the value
    /// of an existing key never evicts.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        let stamp = self.max_age.map(|_| Instant::now());

        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.order.get_mut(idx) {
                node.value = value;
                node.stamp = stamp;
            }
            self.order.move_to_front(idx);
            self.stats.record_update();
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.order.push_front(key.clone(), value, stamp);
        self.map.insert(key, idx);
        self.stats.record_insert();

        evicted
    }

    /// Read a value, promoting it to most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.touch(key)?;
        self.order
            .get(idx)
            .map(|node| &node.value)
            .ok_or(Error::NotFound)
    }

    /// Mutable variant of [`get`](Self::get)
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.touch(key)?;
        self.order
            .get_mut(idx)
            .map(|node| &mut node.value)
            .ok_or(Error::NotFound)
    }

    /// Remove an entry and hand its value back to the caller
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.live_slot(key).ok_or(Error::NotFound)?;
        self.map.remove(key);

        let node = self.order.remove(idx).ok_or(Error::NotFound)?;
        self.stats.record_removal();
        Ok(node.value)
    }

    /// Read a value without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        if self.is_expired(idx) {
            return None;
        }
        self.order.get(idx).map(|node| &node.value)
    }

    /// Check for a live entry without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    /// The entry that the next insertion of a new key would evict
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let node = self.order.get(self.order.tail()?)?;
        Some((&node.key, &node.value))
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> + '_ {
        self.order.iter()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.order.iter().map(|(key, _)| key)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum entry age, if expiry is enabled
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Copy the current statistics and occupancy
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.len(), self.capacity, self.map.capacity())
    }

    /// Drop every entry and reset statistics
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.stats.reset();
    }

    // Resolve a key for reading: promote on hit, count the outcome.
    fn touch<Q>(&mut self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.live_slot(key) {
            Some(idx) => {
                self.order.move_to_front(idx);
                self.stats.record_hit();
                Ok(idx)
            }
            None => {
                self.stats.record_miss();
                Err(Error::NotFound)
            }
        }
    }

    // Slot of a present, unexpired key. Expired entries are dropped here.
    fn live_slot<Q>(&mut self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        if !self.is_expired(idx) {
            return Some(idx);
        }

        self.map.remove(key);
        self.order.remove(idx);
        self.stats.record_expiration();
        debug!(len = self.map.len(), "dropped expired entry");
        None
    }

    fn is_expired(&self, idx: usize) -> bool {
        let stamp = self.order.get(idx).and_then(|node| node.stamp);
        let (Some(max_age), Some(stamp)) = (self.max_age, stamp) else {
            return false;
        };
        stamp.elapsed() > max_age
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let node = self.order.pop_back()?;
        self.map.remove(&node.key);
        self.stats.record_eviction();
        debug!(
            len = self.order.len(),
            capacity = self.capacity,
            "evicted least recently used entry"
        );
        Some((node.key, node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::thread;

    fn keys<V>(cache: &LruCache<i32, V>) -> Vec<i32> {
        cache.keys().copied().collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.get(&1), Ok(&"a"));
        assert_eq!(cache.get(&2), Ok(&"b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_lru_invalid_capacity() {
        assert_eq!(
            LruCache::<i32, &str>::new(0).err(),
            Some(Error::InvalidCapacity)
        );
        assert_eq!(
            LruCache::<i32, &str>::new(-1).err(),
            Some(Error::InvalidCapacity)
        );
        assert_eq!(
            LruCache::<i32, &str>::new(i64::MIN).err(),
            Some(Error::InvalidCapacity)
        );
        assert_eq!(
            LruCache::<i32, &str>::with_config(CacheConfig::new(0)).err(),
            Some(Error::InvalidCapacity)
        );
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        assert_eq!(cache.set(3, "c"), Some((1, "a")));

        assert_eq!(cache.get(&1), Err(Error::NotFound));
        assert_eq!(cache.get(&2), Ok(&"b"));
        assert_eq!(cache.get(&3), Ok(&"c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_get_promotes() {
        // capacity 2; touching 1 makes 2 the victim
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.get(&1).unwrap();
        assert_eq!(cache.set(3, "c"), Some((2, "b")));

        assert_eq!(cache.get(&2), Err(Error::NotFound));
        assert_eq!(cache.get(&1), Ok(&"a"));
        assert_eq!(cache.get(&3), Ok(&"c"));
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(1).unwrap();

        cache.set(1, "a");
        assert_eq!(cache.set(1, "b"), None);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Ok(&"b"));
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(cache.stats().updates(), 1);
    }

    #[test]
    fn test_lru_untouched_key_evicted() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c");
        cache.get(&1).unwrap();
        cache.get(&2).unwrap();
        assert_eq!(cache.set(4, "d"), Some((3, "c")));

        assert_eq!(cache.get(&3), Err(Error::NotFound));
        assert_eq!(keys(&cache), vec![4, 2, 1]);
    }

    #[test]
    fn test_lru_set_promotes_existing() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(1, "z");
        assert_eq!(keys(&cache), vec![1, 2]);

        assert_eq!(cache.set(3, "c"), Some((2, "b")));
        assert_eq!(cache.get(&1), Ok(&"z"));
    }

    #[test]
    fn test_lru_miss_has_no_side_effect() {
        let mut cache = LruCache::new(2).unwrap();
        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.get(&9), Err(Error::NotFound));
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_lru_idempotent_read() {
        let mut cache = LruCache::new(4).unwrap();
        cache.set("k", 7);

        let first = *cache.get("k").unwrap();
        let second = *cache.get("k").unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c");

        assert_eq!(cache.remove(&2), Ok("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), Err(Error::NotFound));
        assert_eq!(cache.remove(&2), Err(Error::NotFound));
        assert_eq!(keys(&cache), vec![3, 1]);

        // A removed key comes back as a fresh entry
        cache.set(2, "new");
        assert_eq!(cache.get(&2), Ok(&"new"));
        assert_eq!(cache.stats().removals(), 1);
    }

    #[test]
    fn test_lru_remove_then_fill() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.remove(&1).unwrap();

        // Room was freed, so no eviction
        assert_eq!(cache.set(3, "c"), None);
        assert_eq!(cache.set(4, "d"), Some((2, "b")));
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2).unwrap();
        cache.set(1, vec![1]);
        cache.set(2, vec![2]);

        cache.get_mut(&1).unwrap().push(10);

        assert_eq!(cache.peek(&1), Some(&vec![1, 10]));
        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.get_mut(&3), Err(Error::NotFound));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut cache = LruCache::new(2).unwrap();
        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.peek(&1), Some(&"a"));
        assert!(cache.contains(&1));
        assert_eq!(cache.peek_lru(), Some((&1, &"a")));

        assert_eq!(cache.set(3, "c"), Some((1, "a")));
        assert!(!cache.contains(&1));
    }

    #[test]
    fn test_lru_borrowed_keys() {
        let mut cache: LruCache<String, usize> = LruCache::new(2).unwrap();
        cache.set("alpha".to_string(), 1);

        assert_eq!(cache.get("alpha"), Ok(&1));
        assert_eq!(cache.remove("alpha"), Ok(1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_capacity_bound() {
        let mut cache = LruCache::new(5).unwrap();

        for i in 0..50 {
            cache.set(i, i * 10);
            assert!(cache.len() <= 5);
            if i >= 4 {
                assert_eq!(cache.len(), 5);
            }
        }

        assert_eq!(keys(&cache), vec![49, 48, 47, 46, 45]);
        assert_eq!(cache.stats().evictions(), 45);
        assert_eq!(cache.stats().inserts(), 50);
    }

    #[test]
    fn test_lru_releases_evicted_values() {
        let payload = Rc::new([0u8; 64]);
        let mut cache = LruCache::new(1).unwrap();

        cache.set(1, Rc::clone(&payload));
        assert_eq!(Rc::strong_count(&payload), 2);

        drop(cache.set(2, Rc::new([1u8; 64])));
        assert_eq!(Rc::strong_count(&payload), 1);

        cache.set(3, Rc::clone(&payload));
        drop(cache);
        assert_eq!(Rc::strong_count(&payload), 1);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.get(&1).unwrap();
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits(), 0);
        assert_eq!(cache.iter().count(), 0);

        cache.set(4, "d");
        assert_eq!(cache.get(&4), Ok(&"d"));
    }

    #[test]
    fn test_lru_stats_snapshot() {
        let mut cache = LruCache::new(2).unwrap();
        cache.set(1, "a");
        cache.get(&1).unwrap();
        cache.get(&2).unwrap_err();

        let snapshot = cache.stats_snapshot();
        assert_eq!(snapshot.size, 1);
        assert_eq!(snapshot.capacity, 2);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.hit_ratio, 0.5);
        assert!(snapshot.buckets >= 1);
        assert!(snapshot.load_factor > 0.0 && snapshot.load_factor <= 1.0);
    }

    #[test]
    fn test_lru_expired_entry_reads_absent() {
        let config = CacheConfig::new(4).with_max_age(Duration::from_millis(20));
        let mut cache = LruCache::with_config(config).unwrap();

        cache.set(1, "a");
        assert_eq!(cache.get(&1), Ok(&"a"));

        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.peek(&1), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Err(Error::NotFound));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations(), 1);
    }

    #[test]
    fn test_lru_set_refreshes_age() {
        let config = CacheConfig::new(4).with_max_age(Duration::from_millis(40));
        let mut cache = LruCache::with_config(config).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        thread::sleep(Duration::from_millis(80));
        cache.set(1, "a2");

        assert_eq!(cache.get(&1), Ok(&"a2"));
        assert_eq!(cache.remove(&2), Err(Error::NotFound));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_huge_capacity_allocates_lazily() {
        let mut cache = LruCache::new(usize::MAX).unwrap();
        assert_eq!(cache.capacity(), usize::MAX);

        cache.set(1u64, 1u64);
        assert_eq!(cache.get(&1), Ok(&1));

        let hinted = CacheConfig::new(usize::MAX).with_size_hint(16);
        let cache = LruCache::<u64, u64>::with_config(hinted).unwrap();
        assert!(cache.stats_snapshot().buckets >= 16);
    }

    #[test]
    fn test_lru_sub_millisecond_max_age_expires() {
        let config = CacheConfig::new(4).with_max_age(Duration::from_micros(500));
        let mut cache = LruCache::with_config(config).unwrap();
        assert_eq!(cache.max_age(), Some(Duration::from_millis(1)));

        cache.set(1, "a");
        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&1), Err(Error::NotFound));
        assert_eq!(cache.stats().expirations(), 1);
    }

    #[test]
    fn test_lru_eviction_ignores_expiry() {
        let config = CacheConfig::new(2).with_max_age(Duration::from_millis(100));
        let mut cache = LruCache::with_config(config).unwrap();

        cache.set(1, "a");
        thread::sleep(Duration::from_millis(60));
        cache.set(2, "b");
        cache.get(&1).unwrap();
        thread::sleep(Duration::from_millis(60));

        // 1 has expired but sits at the head; the live tail goes
        assert_eq!(cache.set(3, "c"), Some((2, "b")));
        assert_eq!(cache.get(&1), Err(Error::NotFound));
    }

    #[test]
    fn test_lru_long_max_age_keeps_entries() {
        let config = CacheConfig::new(2).with_max_age(Duration::from_secs(3600));
        let mut cache = LruCache::with_config(config).unwrap();

        cache.set(1, "a");
        assert_eq!(cache.max_age(), Some(Duration::from_secs(3600)));
        assert_eq!(cache.get(&1), Ok(&"a"));
        assert_eq!(cache.stats().expirations(), 0);
    }
}
