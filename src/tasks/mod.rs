//! Background Tasks Module
//!
//! Contains background tasks that run alongside the request path.
//!
//! # Tasks
//! - LRU eviction: shrinks the cache after writes push it over capacity
//! - TTL reaper: removes expired cache entries at configured intervals

mod cleanup;
mod eviction;

pub use cleanup::spawn_cleanup_task;
pub use eviction::{spawn_eviction_worker, sweep, EvictionSignal, SweepReport};
