//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and CAS outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of live entries removed by the LRU sweep
    pub evictions: u64,
    /// Number of expired entries removed (lazily, by a sweep or by the reaper)
    pub reclaimed: u64,
    /// CAS commands that stored a new value
    pub cas_hits: u64,
    /// CAS commands rejected because the token was stale
    pub cas_badval: u64,
    /// CAS commands against a missing or expired key
    pub cas_misses: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current number of bytes charged against capacity
    pub total_bytes: u64,
    /// Capacity ceiling in bytes (0 = unbounded)
    pub max_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_reclaimed(&mut self, count: u64) {
        self.reclaimed += count;
    }

    pub fn record_cas_hit(&mut self) {
        self.cas_hits += 1;
    }

    pub fn record_cas_badval(&mut self) {
        self.cas_badval += 1;
    }

    pub fn record_cas_miss(&mut self) {
        self.cas_misses += 1;
    }

    // == Update Occupancy ==
    /// Updates the entry and byte counts.
    pub fn set_occupancy(&mut self, entries: usize, bytes: u64) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}
