//! API metadata and health check endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::server::AppState;

/// API metadata response
#[derive(Serialize)]
pub struct InfoResponse {
    pub info: &'static str,
    pub version: &'static str,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
}

/// GET /
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        info: "Rust, axum and Postgres API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// Metadata and health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::http::rate_limit::RateLimiter;

    #[tokio::test]
    async fn health_returns_ok() {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(RateLimiter::default()),
        ));
        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "OK");
        assert!(body.uptime >= 0.0);
        assert!(body.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn info_reports_version() {
        let Json(body) = info().await;
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
