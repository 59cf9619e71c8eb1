//! HTTP server layer
//!
//! Axum server with:
//! - CORS (permissive unless origins are configured)
//! - Request tracing and logging
//! - Per-client rate limiting
//! - Graceful shutdown
//! - JSON error responses

pub mod server;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

pub use server::{build_router, cors_layer, run_server, AppState, ServerConfig, ServerError};
pub use error::ApiError;
pub use rate_limit::{Decision, RateLimitConfig, RateLimiter};
