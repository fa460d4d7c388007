// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The bounded in-process tier (L1).

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use dashmap::DashMap;
use parking_lot::Mutex;
use stash_tier::CacheEntry;
use tokio::time::Instant;

struct Slot<V> {
    entry: CacheEntry<V>,
    seq: u64,
}

/// Insertion order of the live keys, plus stale records left behind by removals.
///
/// A record is live only while the slot under its key carries the same sequence number.
#[derive(Default)]
struct Order {
    queue: VecDeque<(u64, String)>,
    next_seq: u64,
}

/// A size-bounded map of expiring entries with insertion-order eviction.
///
/// Reads go straight to a sharded map and never take a global lock. Inserts of new keys
/// serialize on the insertion-order queue so that the size bound holds exactly: inserting
/// a new key into a full store evicts the oldest inserted key. Overwriting an existing key
/// keeps its original position. Expired entries are removed lazily on read.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stash::BoundedStore;
///
/// let store = BoundedStore::new(2);
/// let ttl = Duration::from_secs(60);
/// store.insert("a".to_string(), 1, ttl);
/// store.insert("b".to_string(), 2, ttl);
/// store.insert("c".to_string(), 3, ttl);
///
/// assert_eq!(store.get("a"), None);
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.keys(), vec!["b", "c"]);
/// ```
pub struct BoundedStore<V> {
    entries: DashMap<String, Slot<V>, ahash::RandomState>,
    order: Mutex<Order>,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> std::fmt::Debug for BoundedStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedStore")
            .field("len", &self.entries.len())
            .field("max_size", &self.max_size)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<V: Clone> BoundedStore<V> {
    /// Creates an empty store holding at most `max_size` entries.
    ///
    /// A `max_size` of zero is treated as one.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            order: Mutex::new(Order::default()),
            max_size: max_size.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the live value under `key`, recording a hit or a miss.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let stale_seq = match self.entries.get(key) {
            Some(slot) if !slot.entry.is_expired_at(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(slot.entry.value().clone());
            }
            Some(slot) => Some(slot.seq),
            None => None,
        };

        if let Some(seq) = stale_seq {
            self.entries
                .remove_if(key, |_, slot| slot.seq == seq && slot.entry.is_expired_at(now));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Returns the live value under `key` without touching the counters.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|slot| !slot.entry.is_expired_at(now))
            .map(|slot| slot.entry.value().clone())
    }

    /// Stores `value` under `key` for `ttl`, returning the keys evicted to make room.
    pub fn insert(&self, key: String, value: V, ttl: Duration) -> Vec<String> {
        let entry = CacheEntry::new(value, ttl);
        let mut order = self.order.lock();

        if let Some(mut slot) = self.entries.get_mut(&key) {
            slot.entry = entry;
            return Vec::new();
        }

        let mut evicted = Vec::new();
        while self.entries.len() >= self.max_size {
            let Some((seq, oldest)) = order.queue.pop_front() else {
                break;
            };
            if self.entries.remove_if(&oldest, |_, slot| slot.seq == seq).is_some() {
                evicted.push(oldest);
            }
        }

        let seq = order.next_seq;
        order.next_seq += 1;
        self.entries.insert(key.clone(), Slot { entry, seq });
        order.queue.push_back((seq, key));

        if order.queue.len() > self.max_size.saturating_mul(2) {
            order
                .queue
                .retain(|(seq, key)| self.entries.get(key).is_some_and(|slot| slot.seq == *seq));
        }

        if !evicted.is_empty() {
            tracing::event!(
                name: "stash.evicted",
                tracing::Level::DEBUG,
                stash.evicted.count = evicted.len(),
                stash.size = self.entries.len(),
            );
        }
        evicted
    }

    /// Removes `key`, returning `true` if an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        let mut order = self.order.lock();
        self.entries.clear();
        order.queue.clear();
    }

    /// Returns the live keys, oldest insertion first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let order = self.order.lock();
        order
            .queue
            .iter()
            .filter(|(seq, key)| {
                self.entries
                    .get(key)
                    .is_some_and(|slot| slot.seq == *seq && !slot.entry.is_expired_at(now))
            })
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Returns the number of stored entries, including expired ones not yet removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured bound.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the number of reads that found a live entry.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the number of reads that found nothing or an expired entry.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn overwrite_keeps_position_and_does_not_evict() {
        let store = BoundedStore::new(2);
        store.insert("a".into(), 1, TTL);
        store.insert("b".into(), 2, TTL);

        assert!(store.insert("a".into(), 10, TTL).is_empty());
        assert_eq!(store.peek("a"), Some(10));

        assert_eq!(store.insert("c".into(), 3, TTL), vec!["a".to_string()]);
        assert_eq!(store.keys(), vec!["b", "c"]);
    }

    #[test]
    fn removed_keys_leave_no_gap_in_eviction() {
        let store = BoundedStore::new(2);
        store.insert("a".into(), 1, TTL);
        store.insert("b".into(), 2, TTL);
        assert!(store.remove("a"));

        assert!(store.insert("c".into(), 3, TTL).is_empty());
        assert_eq!(store.insert("d".into(), 4, TTL), vec!["b".to_string()]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reinserted_key_moves_to_the_back() {
        let store = BoundedStore::new(2);
        store.insert("a".into(), 1, TTL);
        store.insert("b".into(), 2, TTL);
        store.remove("a");
        store.insert("a".into(), 1, TTL);

        assert_eq!(store.insert("c".into(), 3, TTL), vec!["b".to_string()]);
        assert_eq!(store.keys(), vec!["a", "c"]);
    }

    #[test]
    fn order_queue_is_compacted() {
        let store = BoundedStore::new(2);
        for i in 0..20 {
            let key = format!("k{i}");
            store.insert(key.clone(), i, TTL);
            store.remove(&key);
        }
        assert!(store.order.lock().queue.len() <= 4);
        assert!(store.is_empty());
    }

    #[test]
    fn zero_max_size_holds_one_entry() {
        let store = BoundedStore::new(0);
        store.insert("a".into(), 1, TTL);
        store.insert("b".into(), 2, TTL);
        assert_eq!(store.max_size(), 1);
        assert_eq!(store.keys(), vec!["b"]);
    }

    #[test]
    fn clear_keeps_counters() {
        let store = BoundedStore::new(4);
        store.insert("a".into(), 1, TTL);
        store.get("a");
        store.get("b");
        store.clear();

        assert!(store.is_empty());
        assert!(store.keys().is_empty());
        assert_eq!((store.hits(), store.misses()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_removed_on_read() {
        let store = BoundedStore::new(4);
        store.insert("a".into(), 1, Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.peek("a"), None);
        assert_eq!(store.len(), 1, "peek does not remove");
        assert!(store.keys().is_empty());

        assert_eq!(store.get("a"), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.misses(), 1);
    }
}
