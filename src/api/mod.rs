//! API Module
//!
//! Admin HTTP API exposing cache metrics next to the protocol listener.
//!
//! # Endpoints
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
