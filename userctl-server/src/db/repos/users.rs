//! User store
//!
//! Statements map one-to-one onto the API operations:
//! - list: COUNT then page fetch, both with the same optional ILIKE filter
//! - create/update: email pre-check, then the write with RETURNING
//! - delete: row count decides 404

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::models::{Pagination, UserDraft, UserId};

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("unique constraint violated")]
    UniqueViolation,
}

/// Access to the `users` table.
///
/// `search` is a case-insensitive substring matched against name OR email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Count rows matching the filter.
    async fn count(&self, search: Option<&str>) -> Result<i64, DbError>;

    /// Fetch one page of matching rows ordered by id.
    async fn list(&self, search: Option<&str>, page: Pagination) -> Result<Vec<User>, DbError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, DbError>;

    /// Whether another row already uses `email` (exact match).
    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> Result<bool, DbError>;

    async fn insert(&self, draft: &UserDraft) -> Result<User, DbError>;

    /// Overwrite name and email. `None` when no row has this id.
    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<Option<User>, DbError>;

    /// Delete by id, returning the number of rows removed.
    async fn delete(&self, id: UserId) -> Result<u64, DbError>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn like_pattern(search: &str) -> String {
    format!("%{}%", search)
}

fn map_write_error(err: sqlx::Error) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbError::UniqueViolation,
        _ => DbError::Sqlx(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn count(&self, search: Option<&str>) -> Result<i64, DbError> {
        let total = match search {
            Some(s) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM users WHERE name ILIKE $1 OR email ILIKE $1",
                )
                .bind(like_pattern(s))
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total)
    }

    async fn list(&self, search: Option<&str>, page: Pagination) -> Result<Vec<User>, DbError> {
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let rows = match search {
            Some(s) => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT id, name, email
                    FROM users
                    WHERE name ILIKE $1 OR email ILIKE $1
                    ORDER BY id ASC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(like_pattern(s))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(
                    "SELECT id, name, email FROM users ORDER BY id ASC LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> Result<bool, DbError> {
        let existing: Option<i32> = match excluding {
            Some(id) => {
                sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id != $2")
                    .bind(email)
                    .bind(id.get())
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(existing.is_some())
    }

    async fn insert(&self, draft: &UserDraft) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(draft.name())
        .bind(draft.email())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<Option<User>, DbError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = $1, email = $2 WHERE id = $3 RETURNING id, name, email",
        )
        .bind(draft.name())
        .bind(draft.email())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete(&self, id: UserId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
