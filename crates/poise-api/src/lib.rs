//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /process-video`: sample frames from a video and score them
//! - Liveness/readiness probes
//! - Per-IP rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{AnalysisConfig, ApiConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
