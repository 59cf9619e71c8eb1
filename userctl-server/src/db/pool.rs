//! PostgreSQL pool for the users store
//!
//! Only the connection cap is configured; acquisition, idle handling and
//! reconnects are sqlx defaults. Connections open on first use, so the
//! server starts (and `/health` answers) while the database is down; user
//! routes fail with 500 until it is reachable.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connection cap when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Build a pool with the default connection cap.
///
/// Must be called from within a tokio runtime.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/api")?;
/// ```
pub fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS)
}

/// Build a pool without connecting. Only a malformed URL fails here.
pub fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy(database_url)?;

    tracing::debug!(max_connections, "database pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let err = create_pool("definitely not a url").unwrap_err();
        assert!(matches!(err, sqlx::Error::Configuration(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_database_does_not_block_startup() {
        // Nothing listens on port 1
        let pool = create_pool_with_options("postgres://user@127.0.0.1:1/api", 2).unwrap();
        assert_eq!(pool.size(), 0);
    }

    // DATABASE_URL=postgres://... cargo test -p userctl-server -- --ignored
    #[tokio::test]
    #[ignore = "requires database"]
    async fn users_table_is_reachable() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool_with_options(&url, 2).expect("pool creation failed");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .expect("users table missing");

        assert!(count >= 0);
    }
}
