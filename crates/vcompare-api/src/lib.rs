//! Axum HTTP server for video comparisons.
//!
//! This crate provides:
//! - Upload and local-sample comparison endpoints
//! - Output file serving with path traversal protection
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::{ApiConfig, CompareConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::ComparisonService;
pub use state::AppState;
