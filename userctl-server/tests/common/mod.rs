#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use userctl_server::db::{DbError, MemoryUserStore, User, UserStore};
use userctl_server::http::{build_router, AppState, RateLimitConfig, RateLimiter};
use userctl_server::models::{Pagination, UserDraft, UserId};

/// Peer address attached to every request unless a test picks another one
pub const DEFAULT_PEER: [u8; 4] = [127, 0, 0, 1];

/// Router over a fresh in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig::default())
    }

    pub fn with_rate_limit(config: RateLimitConfig) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let router = app_with_store(store.clone(), config);
        Self { router, store }
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        send(&self.router, Method::GET, path, None, DEFAULT_PEER).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        send(&self.router, Method::POST, path, Some(body), DEFAULT_PEER).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        send(&self.router, Method::PUT, path, Some(body), DEFAULT_PEER).await
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        send(&self.router, Method::DELETE, path, None, DEFAULT_PEER).await
    }

    /// Create a user and return its id, asserting success.
    pub async fn create_user(&self, name: &str, email: &str) -> i64 {
        let (status, body) = self
            .post("/users", serde_json::json!({ "name": name, "email": email }))
            .await;
        assert_eq!(status, 201, "create failed: {body}");
        body["user"]["id"].as_i64().expect("id in create response")
    }
}

pub fn app_with_store(store: Arc<dyn UserStore>, config: RateLimitConfig) -> Router {
    let state = Arc::new(AppState::new(store, Arc::new(RateLimiter::new(config))));
    build_router(state, CorsLayer::permissive())
}

/// Send a request from `peer` and collect the JSON response.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    peer: [u8; 4],
) -> (u16, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(path)
        .extension(ConnectInfo(SocketAddr::from((peer, 40000))));

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(app, request).await
}

/// Send a prepared request and collect the JSON response.
pub async fn send_request(app: &Router, request: Request<Body>) -> (u16, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response is not valid JSON\nStatus: {status}\nError: {e}\nBody: {}",
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, value)
}

/// Store whose every call fails, for the 500 paths
pub struct BrokenStore;

fn broken() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserStore for BrokenStore {
    async fn count(&self, _: Option<&str>) -> Result<i64, DbError> {
        Err(broken())
    }

    async fn list(&self, _: Option<&str>, _: Pagination) -> Result<Vec<User>, DbError> {
        Err(broken())
    }

    async fn get(&self, _: UserId) -> Result<Option<User>, DbError> {
        Err(broken())
    }

    async fn email_taken(&self, _: &str, _: Option<UserId>) -> Result<bool, DbError> {
        Err(broken())
    }

    async fn insert(&self, _: &UserDraft) -> Result<User, DbError> {
        Err(broken())
    }

    async fn update(&self, _: UserId, _: &UserDraft) -> Result<Option<User>, DbError> {
        Err(broken())
    }

    async fn delete(&self, _: UserId) -> Result<u64, DbError> {
        Err(broken())
    }
}

/// Store that lets the email check pass but rejects writes as a unique
/// index would, simulating a lost check-then-write race.
pub struct RacingStore;

#[async_trait]
impl UserStore for RacingStore {
    async fn count(&self, _: Option<&str>) -> Result<i64, DbError> {
        Ok(0)
    }

    async fn list(&self, _: Option<&str>, _: Pagination) -> Result<Vec<User>, DbError> {
        Ok(Vec::new())
    }

    async fn get(&self, _: UserId) -> Result<Option<User>, DbError> {
        Ok(None)
    }

    async fn email_taken(&self, _: &str, _: Option<UserId>) -> Result<bool, DbError> {
        Ok(false)
    }

    async fn insert(&self, _: &UserDraft) -> Result<User, DbError> {
        Err(DbError::UniqueViolation)
    }

    async fn update(&self, _: UserId, _: &UserDraft) -> Result<Option<User>, DbError> {
        Err(DbError::UniqueViolation)
    }

    async fn delete(&self, _: UserId) -> Result<u64, DbError> {
        Ok(0)
    }
}
