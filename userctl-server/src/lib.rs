//! userctl-server: JSON CRUD API over a PostgreSQL `users` table
//!
//! Layers, leaf to root:
//! - [`models`]: validated input (name/email drafts, ids, pagination)
//! - [`db`]: the [`db::UserStore`] trait with PostgreSQL and in-memory stores
//! - [`http`]: axum router, extractors, middleware and handlers

pub mod db;
pub mod http;
pub mod models;

pub use db::{DbError, MemoryUserStore, PgUserStore, User, UserStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
