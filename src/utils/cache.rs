//! Time-to-live cache with a bounded entry count
//!
//! Expired entries are only removed when they are read. Once the entry count
//! exceeds the limit, the oldest-inserted entries are evicted first.

use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
    time::{Duration, Instant},
};

use tracing::debug;

#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<K, (V, Instant)>,
    insertion_order: VecDeque<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let inserted_at = self.entries.get(key).map(|(_, at)| *at)?;
        if now.saturating_duration_since(inserted_at) >= self.ttl {
            self.remove(key);
            debug!("Cache entry expired");
            return None;
        }
        self.entries.get(key).map(|(value, _)| value.clone())
    }

    pub(crate) fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if self.entries.insert(key.clone(), (value, now)).is_some() {
            self.insertion_order.retain(|k| k != &key);
        }
        self.insertion_order.push_back(key);

        while self.entries.len() > self.max_entries {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (value, _) = self.entries.remove(key)?;
        self.insertion_order.retain(|k| k != key);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    /// Entry count, expired-but-unread entries included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_lazy() {
        let mut cache = TtlCache::new(Duration::from_secs(10), 8);
        let start = Instant::now();
        cache.insert_at("a", 1, start);

        assert_eq!(cache.get_at(&"a", start + Duration::from_secs(9)), Some(1));
        // Still stored until read after expiry
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"a", start + Duration::from_secs(10)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_inserted_evicted_first() {
        let mut cache = TtlCache::new(Duration::from_secs(60), 2);
        let now = Instant::now();
        cache.insert_at("a", 1, now);
        cache.insert_at("b", 2, now);
        // Reading does not refresh insertion order
        assert_eq!(cache.get_at(&"a", now), Some(1));
        cache.insert_at("c", 3, now);

        assert_eq!(cache.get_at(&"a", now), None);
        assert_eq!(cache.get_at(&"b", now), Some(2));
        assert_eq!(cache.get_at(&"c", now), Some(3));
    }

    #[test]
    fn test_reinsert_moves_to_back() {
        let mut cache = TtlCache::new(Duration::from_secs(60), 2);
        let now = Instant::now();
        cache.insert_at("a", 1, now);
        cache.insert_at("b", 2, now);
        cache.insert_at("a", 10, now);
        cache.insert_at("c", 3, now);

        assert_eq!(cache.get_at(&"a", now), Some(10));
        assert_eq!(cache.get_at(&"b", now), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = TtlCache::new(Duration::from_secs(60), 4);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
