//! Mini Memcached - A lightweight in-memory cache server
//!
//! Speaks the memcache text protocol (get, gets, set, cas, delete) over a
//! byte-bounded LRU store with TTL expiration, and serves metrics over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod protocol;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, CapacityPolicy, SharedStore};
pub use config::Config;
pub use dispatcher::CommandDispatcher;
pub use error::ProtocolError;
pub use tasks::{spawn_cleanup_task, spawn_eviction_worker};
