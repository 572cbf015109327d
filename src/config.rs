//! Configuration Module
//!
//! Handles loading server configuration from command-line flags, falling back
//! to environment variables and then to defaults.

use std::time::Duration;

use clap::Parser;

use crate::cache::CapacityPolicy;

/// Server configuration parameters.
///
/// Every value can be given as a flag or through the named environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "mini_memcached", version, about = "In-memory cache speaking the memcache text protocol")]
pub struct Config {
    /// Protocol listener port
    #[arg(long, env = "SERVER_PORT", default_value_t = 11211)]
    pub port: u16,

    /// Admin HTTP port (0 disables the admin API)
    #[arg(long, env = "ADMIN_PORT", default_value_t = 8080)]
    pub admin_port: u16,

    /// Byte ceiling for stored values (0 means unbounded)
    #[arg(
        long,
        visible_alias = "maxCacheBytes",
        env = "MAX_CACHE_BYTES",
        default_value_t = 0
    )]
    pub max_cache_bytes: u64,

    /// Share of the ceiling freed by each eviction sweep, in percent
    #[arg(
        long,
        visible_alias = "lruRecoverPct",
        env = "LRU_RECOVER_PCT",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub lru_recover_pct: Option<u8>,

    /// Seconds between expired-entry reaper passes (0 disables the reaper)
    #[arg(long, env = "REAP_INTERVAL", default_value_t = 30)]
    pub reap_interval: u64,

    /// Seconds a connection may sit without sending a command (0 disables)
    #[arg(long, env = "IDLE_TIMEOUT", default_value_t = 0)]
    pub idle_timeout: u64,
}

impl Config {
    /// Capacity policy for the store.
    pub fn capacity(&self) -> CapacityPolicy {
        if self.max_cache_bytes == 0 {
            CapacityPolicy::unbounded()
        } else {
            CapacityPolicy::new(self.max_cache_bytes, self.lru_recover_pct)
        }
    }

    /// Idle timeout, or None when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 11211,
            admin_port: 8080,
            max_cache_bytes: 0,
            lru_recover_pct: None,
            reap_interval: 30,
            idle_timeout: 0,
        }
    }
}
