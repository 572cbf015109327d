//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use axum::{extract::State, Json};

use crate::cache::SharedStore;
use crate::models::{HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the same store the protocol connections use, so stats are live.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: SharedStore,
}

impl AppState {
    pub fn new(cache: SharedStore) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
