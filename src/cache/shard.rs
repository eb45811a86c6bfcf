//! Single cache partition: a bounded LRU over a key-linked recency list
//!
//! The recency order lives inside the entries themselves: each entry carries
//! the keys of its neighbors, and the shard tracks the MRU head and LRU tail.
//! Promotion and tail eviction are O(1) hash lookups plus link surgery, with
//! no separate list allocation and no `unsafe`.

use std::collections::HashMap;
use std::hash::Hash;

/// One entry plus its position in the shard's recency order
#[derive(Debug)]
struct Entry<K, V> {
    value: V,
    /// Neighbor toward the MRU head
    prev: Option<K>,
    /// Neighbor toward the LRU tail
    next: Option<K>,
}

/// A bounded LRU map holding one shard's disjoint subset of keys
///
/// Not synchronized; `ShardedCache` wraps each shard in its own mutex.
#[derive(Debug)]
pub(crate) struct CacheShard<K, V> {
    entries: HashMap<K, Entry<K, V>>,
    /// Most recently used key
    head: Option<K>,
    /// Least recently used key
    tail: Option<K>,
    capacity: usize,
}

impl<K, V> CacheShard<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a shard with a fixed, non-zero capacity
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            entries: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Number of slots allotted to this shard
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert or overwrite; refreshes recency and evicts the shard's LRU
    /// key when a fresh insert would exceed capacity
    ///
    /// Returns the evicted key, if the insert displaced one.
    pub(crate) fn put(&mut self, key: K, value: V) -> Option<K> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            self.detach(&key);
            self.attach_front(key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        self.entries.insert(
            key.clone(),
            Entry {
                value,
                prev: None,
                next: None,
            },
        );
        self.attach_front(key);
        evicted
    }

    /// Look up a key and promote it to most-recently-used on hit
    pub(crate) fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.detach(key);
        self.attach_front(key.clone());
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Remove a key if present; returns whether a removal occurred
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        if !self.entries.contains_key(key) {
            return false;
        }
        self.detach(key);
        self.entries.remove(key);
        true
    }

    /// Drop every entry
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    /// Unlink a resident key from the recency order, leaving its own links stale
    fn detach(&mut self, key: &K) {
        let (prev, next) = match self.entries.get(key) {
            Some(entry) => (entry.prev.clone(), entry.next.clone()),
            None => return,
        };

        match prev.as_ref() {
            Some(p) => {
                if let Some(entry) = self.entries.get_mut(p) {
                    entry.next = next.clone();
                }
            }
            None => self.head = next.clone(),
        }
        match next.as_ref() {
            Some(n) => {
                if let Some(entry) = self.entries.get_mut(n) {
                    entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Link a resident, detached key in as the new MRU head
    fn attach_front(&mut self, key: K) {
        let old_head = self.head.replace(key.clone());
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.prev = None;
            entry.next = old_head.clone();
        }
        match old_head {
            Some(h) => {
                if let Some(entry) = self.entries.get_mut(&h) {
                    entry.prev = Some(key);
                }
            }
            None => self.tail = Some(key),
        }
    }

    /// Evict the least-recently-used key, if any
    fn evict_lru(&mut self) -> Option<K> {
        let victim = self.tail.clone()?;
        self.detach(&victim);
        self.entries.remove(&victim);
        Some(victim)
    }

    /// Current LRU key, oldest first
    #[cfg(test)]
    fn lru_key(&self) -> Option<&K> {
        self.tail.as_ref()
    }

    /// Current MRU key
    #[cfg(test)]
    fn mru_key(&self) -> Option<&K> {
        self.head.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let mut shard: CacheShard<i32, String> = CacheShard::new(4);
        shard.put(1, "one".to_string());
        shard.put(2, "two".to_string());

        assert_eq!(shard.len(), 2);
        assert_eq!(shard.get(&1), Some("one".to_string()));
        assert_eq!(shard.get(&3), None);
    }

    #[test]
    fn test_eviction_order() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(3);
        shard.put(1, 10);
        shard.put(2, 20);
        shard.put(3, 30);

        // 1 is the LRU; inserting 4 evicts it
        shard.put(4, 40);
        assert_eq!(shard.len(), 3);
        assert_eq!(shard.get(&1), None);
        assert_eq!(shard.get(&2), Some(20));
    }

    #[test]
    fn test_get_promotes() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(3);
        shard.put(1, 10);
        shard.put(2, 20);
        shard.put(3, 30);

        // Touch 1 so that 2 becomes the LRU
        assert_eq!(shard.get(&1), Some(10));
        assert_eq!(shard.lru_key(), Some(&2));

        shard.put(4, 40);
        assert_eq!(shard.get(&2), None);
        assert_eq!(shard.get(&1), Some(10));
    }

    #[test]
    fn test_overwrite_refreshes_recency() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(2);
        shard.put(1, 10);
        shard.put(2, 20);

        // Overwriting 1 makes 2 the eviction victim
        shard.put(1, 11);
        assert_eq!(shard.mru_key(), Some(&1));
        shard.put(3, 30);

        assert_eq!(shard.get(&2), None);
        assert_eq!(shard.get(&1), Some(11));
        assert_eq!(shard.get(&3), Some(30));
    }

    #[test]
    fn test_remove() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(4);
        shard.put(1, 10);
        shard.put(2, 20);
        shard.put(3, 30);

        // Removing the middle entry keeps the list intact
        assert!(shard.remove(&2));
        assert!(!shard.remove(&2));
        assert_eq!(shard.len(), 2);
        assert_eq!(shard.get(&2), None);
        assert_eq!(shard.lru_key(), Some(&1));
        assert_eq!(shard.mru_key(), Some(&3));
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(4);
        shard.put(1, 10);
        shard.put(2, 20);
        shard.put(3, 30);

        assert!(shard.remove(&3)); // head
        assert_eq!(shard.mru_key(), Some(&2));
        assert!(shard.remove(&1)); // tail
        assert_eq!(shard.lru_key(), Some(&2));
        assert_eq!(shard.mru_key(), Some(&2));

        assert!(shard.remove(&2));
        assert_eq!(shard.len(), 0);
        assert_eq!(shard.mru_key(), None);
        assert_eq!(shard.lru_key(), None);
    }

    #[test]
    fn test_clear() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(4);
        shard.put(1, 10);
        shard.put(2, 20);
        shard.clear();

        assert_eq!(shard.len(), 0);
        assert_eq!(shard.get(&1), None);

        // Usable after clearing
        shard.put(3, 30);
        assert_eq!(shard.get(&3), Some(30));
    }

    #[test]
    fn test_put_reports_eviction() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(2);
        assert_eq!(shard.put(1, 10), None);
        assert_eq!(shard.put(2, 20), None);
        // Overwrite displaces nothing
        assert_eq!(shard.put(1, 11), None);
        assert_eq!(shard.put(3, 30), Some(2));
    }

    #[test]
    fn test_capacity_one() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(1);
        shard.put(1, 10);
        shard.put(2, 20);

        assert_eq!(shard.len(), 1);
        assert_eq!(shard.get(&1), None);
        assert_eq!(shard.get(&2), Some(20));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut shard: CacheShard<i32, i32> = CacheShard::new(8);
        for i in 0..1_000 {
            shard.put(i, i);
            assert!(shard.len() <= 8);
        }
        // The eight most recent keys survive
        for i in 992..1_000 {
            assert_eq!(shard.get(&i), Some(i));
        }
    }
}
