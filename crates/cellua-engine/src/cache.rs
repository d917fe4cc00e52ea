//! Sharded memoization of stateless transitions.
//!
//! A stateless rule's next state depends only on `(state, neighbors)`,
//! where the neighbor sequence is already in canonical symmetry order.
//! Keys are stored as one flat vector `[state, n0, n1, ..]` so lookups
//! can borrow a scratch slice without allocating.
//!
//! Each shard is an `IndexMap` behind its own mutex. Entries carry a
//! shard-local use stamp; when a shard is full, the least recently used
//! half is evicted in one pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use cellua_core::CellState;
use indexmap::IndexMap;

use crate::config::CacheConfig;

/// Counters describing cache effectiveness since the last clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Transitions currently stored.
    pub entries: usize,
}

#[derive(Debug)]
struct Entry {
    next: CellState,
    stamp: u64,
}

#[derive(Debug, Default)]
struct Shard {
    map: IndexMap<Vec<CellState>, Entry>,
    clock: u64,
}

impl Shard {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_half(&mut self) {
        let mut stamps: Vec<u64> = self.map.values().map(|e| e.stamp).collect();
        if stamps.is_empty() {
            return;
        }
        // Stamps are unique within a shard.
        let cut = (stamps.len() / 2).max(1);
        let (_, threshold, _) = stamps.select_nth_unstable(cut - 1);
        let threshold = *threshold;
        self.map.retain(|_, e| e.stamp > threshold);
    }
}

/// A bounded, sharded `(state, neighbors) -> next` table.
#[derive(Debug)]
pub struct TransitionCache {
    shards: Vec<Mutex<Shard>>,
    shard_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TransitionCache {
    /// Build an empty cache from a validated configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let shards = config.shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(Shard::default())).collect(),
            shard_capacity: (config.capacity / shards).max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: &[CellState]) -> &Mutex<Shard> {
        // FNV-1a; the shard count is a power of two.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for v in key {
            h ^= *v;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        &self.shards[(h as usize) & (self.shards.len() - 1)]
    }

    /// Look up the transition for `key` (`[state, neighbors..]`).
    pub fn lookup(&self, key: &[CellState]) -> Option<CellState> {
        let found = {
            let mut shard = match self.shard(key).lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let stamp = shard.tick();
            shard.map.get_mut(key).map(|entry| {
                entry.stamp = stamp;
                entry.next
            })
        };
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Record the transition for `key`.
    pub fn store(&self, key: &[CellState], next: CellState) {
        let mut shard = match self.shard(key).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if shard.map.len() >= self.shard_capacity && !shard.map.contains_key(key) {
            shard.evict_half();
        }
        let stamp = shard.tick();
        shard.map.insert(key.to_vec(), Entry { next, stamp });
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        for shard in &self.shards {
            let mut shard = match shard.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            shard.map.clear();
            shard.clock = 0;
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .shards
            .iter()
            .map(|s| match s.lock() {
                Ok(guard) => guard.map.len(),
                Err(poisoned) => poisoned.into_inner().map.len(),
            })
            .sum();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(capacity: usize, shards: usize) -> TransitionCache {
        TransitionCache::new(&CacheConfig {
            enabled: true,
            capacity,
            shards,
        })
    }

    #[test]
    fn miss_then_hit() {
        let cache = small(64, 4);
        assert_eq!(cache.lookup(&[0, 1, 1, 1]), None);
        cache.store(&[0, 1, 1, 1], 1);
        assert_eq!(cache.lookup(&[0, 1, 1, 1]), Some(1));
        assert_eq!(cache.lookup(&[1, 1, 1, 1]), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let cache = small(8, 1);
        for i in 0..100u64 {
            cache.store(&[i], i);
        }
        assert!(cache.stats().entries <= 8);
    }

    #[test]
    fn recently_used_entries_survive_eviction() {
        let cache = small(4, 1);
        for i in 0..4u64 {
            cache.store(&[i], i);
        }
        // Touch 0 so it is the most recently used.
        assert_eq!(cache.lookup(&[0]), Some(0));
        cache.store(&[99], 99);
        assert_eq!(cache.lookup(&[0]), Some(0));
        assert_eq!(cache.lookup(&[99]), Some(99));
        assert_eq!(cache.lookup(&[1]), None);
    }

    #[test]
    fn clear_resets_everything() {
        let cache = small(16, 2);
        cache.store(&[3, 4], 5);
        let _ = cache.lookup(&[3, 4]);
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
