//! Response models
//!
//! Protocol replies produced by the dispatcher, and the JSON bodies served by
//! the admin API.

use serde::Serialize;

use crate::cache::{CacheItem, CacheStats, CasOutcome};

// == Protocol Responses ==
/// Reply to a protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Retrieval result; `with_cas` selects the `gets` line format
    Values { items: Vec<CacheItem>, with_cas: bool },
    Stored,
    Exists,
    NotFound,
    Deleted,
}

impl From<CasOutcome> for Response {
    fn from(outcome: CasOutcome) -> Self {
        match outcome {
            CasOutcome::Stored => Response::Stored,
            CasOutcome::Exists => Response::Exists,
            CasOutcome::Missing => Response::NotFound,
        }
    }
}

// == Admin Responses ==
/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
