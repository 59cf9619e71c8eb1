//! Cross-cutting request handling: rate limiting, request log, panic and
//! 404 fallbacks.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::rate_limit::Decision;
use super::server::AppState;

/// Key used when the peer address is unknown (e.g. in-process requests)
const UNKNOWN_CLIENT: &str = "unknown";

fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

/// Refuse requests from clients over their quota with 429.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let key = client_key(&req);

    match state.limiter.check(&key) {
        Decision::Allowed => next.run(req).await,
        Decision::Limited { retry_after } => {
            tracing::warn!(client = %key, "rate limit exceeded");
            // Round up so clients never retry early
            let retry_after_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            ApiError::TooManyRequests { retry_after_secs }.into_response()
        }
    }
}

/// One log line per request.
pub async fn log_request(req: Request, next: Next) -> Response {
    tracing::info!(method = %req.method(), path = %req.uri().path(), "request");
    next.run(req).await
}

/// Response for a panicking handler.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "handler panicked");

    ApiError::Unhandled.into_response()
}

/// Fallback for unmatched routes and methods.
pub async fn handler_404() -> ApiError {
    ApiError::RouteNotFound
}
