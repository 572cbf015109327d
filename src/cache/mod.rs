//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, CAS tokens and byte-bounded
//! LRU eviction.

mod capacity;
mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use capacity::CapacityPolicy;
pub use entry::{current_timestamp_ms, CacheEntry, CacheItem, RELATIVE_TTL_LIMIT_SECS};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, CasOutcome, Evicted};

/// The store as shared between connections and background tasks.
pub type SharedStore = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}
