//! Request and Response models
//!
//! Protocol commands and replies, plus the DTOs serialized by the admin API.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::Command;
pub use responses::{HealthResponse, Response, StatsResponse};
