//! Database layer - connection pool and the users store
//!
//! Handlers reach the `users` table only through the [`UserStore`] trait.
//! Every statement is parameterized; writes that race past the email
//! pre-check surface as [`DbError::UniqueViolation`] when the schema has a
//! unique index.

pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
