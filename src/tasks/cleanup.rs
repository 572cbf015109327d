//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries, so memory
//! held by entries nobody reads again is returned without waiting for an LRU sweep.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task sleeps for the specified interval between runs and takes the
/// store's write lock for each run.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `reap_interval_secs` - Interval in seconds between runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::unbounded());
/// let reaper = spawn_cleanup_task(cache.clone(), 30);
/// // Later, during shutdown:
/// reaper.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedStore, reap_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(reap_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL reaper with interval of {} seconds",
            reap_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, total_bytes) = {
                let mut store = cache.write().await;
                let removed = store.cleanup_expired();
                (removed, store.total_bytes())
            };

            if removed > 0 {
                info!(removed, total_bytes, "TTL reaper removed expired entries");
            } else {
                debug!("TTL reaper: no expired entries found");
            }
        }
    })
}
