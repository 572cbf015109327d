//! LRU Eviction Worker
//!
//! Background task that shrinks the cache below its byte ceiling after writes.
//!
//! Writers never wait for eviction: they fire an [`EvictionSignal`] and return.
//! The worker wakes, checks the occupancy and, if the ceiling is exceeded,
//! evicts least recently used entries down to the sweep target, taking the
//! store lock once per victim so reads interleave with the sweep.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

// == Eviction Signal ==
/// Wakes the eviction worker.
///
/// Signals coalesce: any number of writes while the worker is busy produce a
/// single follow-up check.
#[derive(Debug, Clone, Default)]
pub struct EvictionSignal {
    notify: Arc<Notify>,
}

impl EvictionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a capacity check. Never blocks.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

// == Sweep Report ==
/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Live entries evicted
    pub evicted: usize,
    /// Already expired entries dropped along the way
    pub reclaimed: usize,
    /// Bytes freed in total
    pub freed_bytes: u64,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.evicted + self.reclaimed
    }
}

/// Spawns the eviction worker.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_eviction_worker(cache: SharedStore, signal: EvictionSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting LRU eviction worker");

        loop {
            signal.wait().await;

            let report = sweep(&cache).await;
            if report.removed() > 0 {
                let total_bytes = cache.read().await.total_bytes();
                info!(
                    evicted = report.evicted,
                    reclaimed = report.reclaimed,
                    freed_bytes = report.freed_bytes,
                    total_bytes,
                    "LRU sweep finished"
                );
            } else {
                debug!("LRU check: cache within capacity");
            }
        }
    })
}

// == Sweep ==
/// Evicts least recently used entries until the store reaches its sweep target.
///
/// The target is fixed when the sweep starts; the occupancy is re-read under
/// the lock before every victim, so concurrent writes and deletes are
/// accounted for and the sweep never removes more than it has to.
pub async fn sweep(cache: &SharedStore) -> SweepReport {
    let target = {
        let store = cache.read().await;
        if !store.needs_eviction() {
            return SweepReport::default();
        }

        info!(
            total_bytes = store.total_bytes(),
            max_bytes = store.capacity().max_bytes,
            target_bytes = store.sweep_target(),
            "Cache over capacity, evicting"
        );
        store.sweep_target()
    };

    let mut report = SweepReport::default();
    loop {
        let mut store = cache.write().await;
        if store.total_bytes() <= target {
            break;
        }

        let Some(victim) = store.evict_lru() else {
            break;
        };
        drop(store);

        debug!(key = %String::from_utf8_lossy(&victim.key), size = victim.size, expired = victim.expired, "evicted");
        if victim.expired {
            report.reclaimed += 1;
        } else {
            report.evicted += 1;
        }
        report.freed_bytes += victim.size;
    }

    report
}
