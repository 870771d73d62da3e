//! Axum HTTP API server for the job board.
//!
//! This crate provides:
//! - Job listing, keyword search and slug lookup
//! - Per-user daily search quotas that fail open
//! - Profile storage
//! - Sharded XML sitemaps
//! - Page extraction and AI enrichment through external providers
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{JobQueryService, SearchUsageTracker, SitemapGenerator};
pub use state::AppState;
