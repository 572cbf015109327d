//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, byte accounting,
//! CAS tokens and TTL expiration.

use std::collections::HashMap;

use bytes::Bytes;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheItem, CacheStats, CapacityPolicy, LruTracker};

// == CAS Outcome ==
/// Result of a compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Tokens matched and the new value was written
    Stored,
    /// The key is live but was modified since the token was read
    Exists,
    /// The key is absent or expired
    Missing,
}

// == Evicted ==
/// An entry removed by the LRU sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    pub key: Bytes,
    pub size: u64,
    /// The entry had already expired when it was swept
    pub expired: bool,
}

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
///
/// The store is not synchronized itself; it is shared as
/// [`SharedStore`](crate::cache::SharedStore) and every method is one logical
/// operation under that lock.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<Bytes, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Byte ceiling and recovery threshold
    capacity: CapacityPolicy,
    /// Sum of `CacheEntry::size` over `entries`
    total_bytes: u64,
    /// Last CAS token issued
    last_cas: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity policy.
    pub fn new(capacity: CapacityPolicy) -> Self {
        let mut stats = CacheStats::new();
        stats.max_bytes = capacity.max_bytes;

        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats,
            capacity,
            total_bytes: 0,
            last_cas: 0,
        }
    }

    /// Creates a store without a byte ceiling.
    pub fn unbounded() -> Self {
        Self::new(CapacityPolicy::unbounded())
    }

    // == Put ==
    /// Stores a value unconditionally and returns its fresh CAS token.
    ///
    /// Overwrites replace value, flags, expiration, size and token, and move the
    /// key to the most recently used position. Capacity is not enforced here;
    /// the eviction worker does that off the request path.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The payload
    /// * `flags` - Opaque client flags
    /// * `ttl` - Expiration time in seconds (0 = never)
    pub fn put(&mut self, key: Bytes, value: Bytes, flags: u32, ttl: u64) -> u64 {
        let cas = self.next_cas();
        let entry = CacheEntry::new(value, flags, ttl, cas);

        self.total_bytes += entry.size();
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.total_bytes -= previous.size();
        }
        self.lru.touch(&key);
        self.sync_occupancy();

        cas
    }

    // == Get ==
    /// Retrieves a live entry and marks it most recently used.
    ///
    /// Expired entries are removed on the spot and counted as misses.
    pub fn get(&mut self, key: &[u8]) -> Option<CacheItem> {
        let now = current_timestamp_ms();

        let Some((stored_key, entry)) = self.entries.get_key_value(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired_at(now) {
            self.reclaim(key);
            self.stats.record_miss();
            return None;
        }

        let item = CacheItem::from_entry(stored_key, entry);
        self.lru.touch(&item.key);
        self.stats.record_hit();
        Some(item)
    }

    // == Compare And Swap ==
    /// Writes `value` only if the live entry still carries `token`.
    pub fn cas(&mut self, key: Bytes, value: Bytes, flags: u32, ttl: u64, token: u64) -> CasOutcome {
        let now = current_timestamp_ms();
        let current = self
            .entries
            .get(&key)
            .map(|entry| (entry.cas, entry.is_expired_at(now)));

        match current {
            None => {
                self.stats.record_cas_miss();
                CasOutcome::Missing
            }
            Some((_, true)) => {
                self.reclaim(&key);
                self.stats.record_cas_miss();
                CasOutcome::Missing
            }
            Some((cas, false)) if cas != token => {
                self.stats.record_cas_badval();
                CasOutcome::Exists
            }
            Some(_) => {
                self.put(key, value, flags, ttl);
                self.stats.record_cas_hit();
                CasOutcome::Stored
            }
        }
    }

    // == Remove ==
    /// Removes an entry whether live or expired. Returns false on a miss.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.detach(key).is_some()
    }

    // == Evict LRU ==
    /// Removes the least recently used entry.
    ///
    /// Expired victims free exactly their size like live ones, but count as
    /// reclaimed rather than evicted.
    pub fn evict_lru(&mut self) -> Option<Evicted> {
        let key = self.lru.pop_lru()?;
        let entry = self.entries.remove(&key)?;

        self.total_bytes -= entry.size();
        self.sync_occupancy();

        let expired = entry.is_expired();
        if expired {
            self.stats.record_reclaimed(1);
        } else {
            self.stats.record_eviction();
        }

        Some(Evicted {
            key,
            size: entry.size(),
            expired,
        })
    }

    // == Capacity ==
    /// True when the store is over its byte ceiling.
    pub fn needs_eviction(&self) -> bool {
        self.capacity.is_exceeded_by(self.total_bytes)
    }

    /// Occupancy a sweep starting now has to reach.
    pub fn sweep_target(&self) -> u64 {
        self.capacity.sweep_target(self.total_bytes)
    }

    pub fn capacity(&self) -> CapacityPolicy {
        self.capacity
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<Bytes> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.detach(key);
        }

        self.stats.record_reclaimed(expired_keys.len() as u64);
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys from least to most recently used.
    pub fn lru_order(&self) -> Vec<Bytes> {
        self.lru.iter_lru().cloned().collect()
    }

    // == Internals ==
    fn next_cas(&mut self) -> u64 {
        self.last_cas += 1;
        self.last_cas
    }

    fn detach(&mut self, key: &[u8]) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.total_bytes -= entry.size();
        self.sync_occupancy();
        Some(entry)
    }

    fn reclaim(&mut self, key: &[u8]) {
        if self.detach(key).is_some() {
            self.stats.record_reclaimed(1);
        }
    }

    fn sync_occupancy(&mut self) {
        self.stats.set_occupancy(self.entries.len(), self.total_bytes);
    }

    /// Panics if byte accounting or the tracker drifted from the map.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let summed: u64 = self.entries.values().map(CacheEntry::size).sum();
        assert_eq!(self.total_bytes, summed, "byte accounting drifted");
        assert_eq!(self.lru.len(), self.entries.len(), "tracker size drifted");
        for key in self.lru.iter_lru() {
            assert!(self.entries.contains_key(key), "tracker holds a dead key");
        }
        for key in self.entries.keys() {
            assert!(self.lru.contains(key), "entry missing from tracker");
        }
        assert_eq!(
            self.lru.peek_lru(),
            self.lru.iter_lru().next(),
            "tail disagrees with iteration order"
        );
    }
}
