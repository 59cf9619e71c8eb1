//! Store implementations for the users table
//!
//! - `PgUserStore`: sqlx against PostgreSQL
//! - `MemoryUserStore`: in-process, for tests and demos

pub mod users;
pub mod memory;

pub use users::{DbError, PgUserStore, User, UserStore};
pub use memory::MemoryUserStore;
