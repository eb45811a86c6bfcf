//! Concurrent sharded LRU cache

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::CacheError;

use super::shard::CacheShard;

/// Point-in-time snapshot of cache effectiveness counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit percentage over all lookups, 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64 * 100.0
    }
}

/// A thread-safe, bounded, lookaside LRU cache split into independently
/// locked shards
///
/// Keys are routed to shards by their standard hash, so operations on keys
/// that land in different shards proceed in parallel. Total capacity is
/// distributed across shards at construction: each shard receives
/// `capacity / shard_count` slots and the first `capacity % shard_count`
/// shards one extra, so the slot sum equals the configured capacity exactly.
/// Shards that would receive zero slots are dropped and the shard count
/// adjusted down.
///
/// No lock is ever held across I/O, and no runtime operation can fail.
///
/// # Example
///
/// ```rust
/// use cachefront::cache::ShardedCache;
///
/// let cache: ShardedCache<i32, String> = ShardedCache::new(1024, 32).unwrap();
/// cache.put(7, "value-7".to_string());
/// assert_eq!(cache.get(&7), Some("value-7".to_string()));
/// assert!(cache.remove(&7));
/// ```
pub struct ShardedCache<K, V> {
    shards: Vec<Mutex<CacheShard<K, V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> ShardedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache with the given total capacity and shard count
    ///
    /// A power-of-two shard count keeps the hash-to-shard mapping cheap.
    /// Fails when capacity or shard count is zero, or when distribution
    /// leaves no usable shard.
    pub fn new(capacity: usize, shard_count: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        if shard_count == 0 {
            return Err(CacheError::ZeroShardCount);
        }

        let base = capacity / shard_count;
        let remainder = capacity % shard_count;

        let mut shards = Vec::with_capacity(shard_count);
        for i in 0..shard_count {
            let slots = base + usize::from(i < remainder);
            if slots > 0 {
                shards.push(Mutex::new(CacheShard::new(slots)));
            }
        }

        if shards.is_empty() {
            return Err(CacheError::NoUsableShards);
        }

        Ok(Self {
            shards,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// Insert or overwrite a value, refreshing its recency; evicts the
    /// containing shard's LRU entry on overflow
    pub fn put(&self, key: K, value: V) {
        if self.shard_for(&key).lock().put(key, value).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Look up a value; a hit promotes the key to most-recently-used
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.shard_for(key).lock().get(key);
        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    /// Remove a key; returns whether an entry was removed
    pub fn remove(&self, key: &K) -> bool {
        self.shard_for(key).lock().remove(key)
    }

    /// Remove every entry, locking each shard in turn
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    /// Entry count summed shard by shard
    ///
    /// A snapshot, not a linearization point: concurrent mutators on other
    /// shards may move entries while the sum is taken.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Whether the snapshot count is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of usable shards after capacity distribution
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total configured capacity across all shards
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().capacity()).sum()
    }

    /// Snapshot of the effectiveness counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn shard_for(&self, key: &K) -> &Mutex<CacheShard<K, V>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            ShardedCache::<i32, i32>::new(0, 4),
            Err(CacheError::ZeroCapacity)
        ));
        assert!(matches!(
            ShardedCache::<i32, i32>::new(16, 0),
            Err(CacheError::ZeroShardCount)
        ));
    }

    #[test]
    fn test_capacity_distribution_exact() {
        // 10 slots over 4 shards: 3 + 3 + 2 + 2
        let cache: ShardedCache<i32, i32> = ShardedCache::new(10, 4).unwrap();
        assert_eq!(cache.shard_count(), 4);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_zero_slot_shards_dropped() {
        // 2 slots over 8 shards: only the first two shards survive
        let cache: ShardedCache<i32, i32> = ShardedCache::new(2, 8).unwrap();
        assert_eq!(cache.shard_count(), 2);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_put_get_remove() {
        let cache: ShardedCache<i32, String> = ShardedCache::new(64, 8).unwrap();

        cache.put(1, "one".to_string());
        cache.put(2, "two".to_string());

        assert_eq!(cache.get(&1), Some("one".to_string()));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.len(), 2);

        assert!(cache.remove(&1));
        assert!(!cache.remove(&1));
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_remove_then_get_always_empty() {
        let cache: ShardedCache<i32, i32> = ShardedCache::new(32, 4).unwrap();
        for key in 0..100 {
            cache.put(key, key);
            cache.remove(&key);
            assert_eq!(cache.get(&key), None);
        }
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let cache: ShardedCache<i32, i32> = ShardedCache::new(16, 4).unwrap();
        cache.put(42, 1);
        cache.put(42, 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&42), Some(2));
    }

    #[test]
    fn test_total_capacity_bound() {
        let cache: ShardedCache<i32, i32> = ShardedCache::new(100, 8).unwrap();
        for key in 0..10_000 {
            cache.put(key, key);
            assert!(cache.len() <= 100);
        }
    }

    #[test]
    fn test_single_shard_lru_law() {
        // One shard makes the global recency order observable
        let cache: ShardedCache<i32, i32> = ShardedCache::new(3, 1).unwrap();
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30);
        cache.get(&1);

        cache.put(4, 40);

        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.get(&4), Some(40));
    }

    #[test]
    fn test_stats_counting() {
        let cache: ShardedCache<i32, i32> = ShardedCache::new(2, 1).unwrap();
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.stats().hit_rate(), 0.0);

        cache.put(1, 10);
        cache.put(2, 20);
        cache.get(&1);
        cache.get(&1);
        cache.get(&99);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 0);
        assert!((stats.hit_rate() - 66.666).abs() < 0.01);

        // Key 2 is the LRU after the hits on key 1
        cache.put(3, 30);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_recency_law_with_get_touches() {
        // The three most recently touched distinct keys stay resident
        let cache: ShardedCache<i32, i32> = ShardedCache::new(3, 1).unwrap();
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30);
        cache.get(&3);
        cache.get(&2);
        cache.get(&1);

        // Touch order is now 4, 1, 2 once key 4 lands; 3 is the victim
        cache.put(4, 40);
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.get(&4), Some(40));
    }

    #[test]
    fn test_clear() {
        let cache: ShardedCache<i32, i32> = ShardedCache::new(64, 8).unwrap();
        for key in 0..50 {
            cache.put(key, key);
        }
        cache.clear();
        assert!(cache.is_empty());
        for key in 0..50 {
            assert_eq!(cache.get(&key), None);
        }
    }

    #[test]
    fn test_keys_stay_in_one_shard() {
        // Same key, repeated puts: the entry count stays at one, which
        // fails if the key ever routed to a second shard
        let cache: ShardedCache<i32, i32> = ShardedCache::new(64, 16).unwrap();
        for round in 0..32 {
            cache.put(7, round);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache: Arc<ShardedCache<i32, i32>> = Arc::new(ShardedCache::new(256, 16).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..2_000 {
                        let key = t * 10_000 + i;
                        cache.put(key, i);
                        cache.get(&key);
                        if i % 3 == 0 {
                            cache.remove(&key);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 256);
    }
}
