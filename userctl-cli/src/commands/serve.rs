//! HTTP server command for the users API
//!
//! Resolves configuration from flags, environment and `.env`, opens the
//! PostgreSQL pool and runs the server until shutdown.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};

use userctl_server::db::pool::DEFAULT_MAX_CONNECTIONS;
use userctl_server::db::{create_pool_with_options, PgUserStore};
use userctl_server::http::{run_server, RateLimitConfig, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Interface to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to bind the HTTP server to
    #[arg(long, short = 'p', env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Full database URL (takes precedence over the DB_* parts)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(flatten)]
    pub db: DbParts,

    /// Maximum connections in the PostgreSQL pool
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Allowed CORS origin (repeatable; none = any origin)
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Requests allowed per client per window
    #[arg(
        long,
        env = "RATE_LIMIT_MAX",
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rate_limit_max: u32,

    /// Rate limit window length in seconds
    #[arg(
        long,
        env = "RATE_LIMIT_WINDOW_SECS",
        default_value_t = 900,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_window_secs: u64,
}

/// Connection parameters used when no database URL is given
#[derive(Args, Debug, Clone, Default)]
pub struct DbParts {
    /// Database user
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,
}

impl DbParts {
    /// Assemble a `postgres://` URL. `None` without a database name.
    pub fn to_url(&self) -> Option<String> {
        let name = self.db_name.as_deref()?;

        let credentials = match (&self.db_user, &self.db_password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, _) => String::new(),
        };

        Some(format!(
            "postgres://{}{}:{}/{}",
            credentials,
            self.db_host,
            self.db_port,
            urlencoding::encode(name)
        ))
    }
}

impl ServeArgs {
    fn database_url(&self) -> Result<String> {
        self.database_url
            .clone()
            .or_else(|| self.db.to_url())
            .context("No database configured. Set DATABASE_URL (or --database-url), or DB_NAME with optional DB_USER/DB_PASSWORD/DB_HOST/DB_PORT")
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            cors_origins: self
                .cors_origins
                .iter()
                .map(|o| o.trim().to_owned())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit: RateLimitConfig {
                max_requests: self.rate_limit_max,
                window: Duration::from_secs(self.rate_limit_window_secs),
                ..RateLimitConfig::default()
            },
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let database_url = args.database_url()?;
    let config = args.server_config();

    tracing::info!(
        max_connections = args.max_connections,
        rate_limit = config.rate_limit.max_requests,
        "Starting users API on {}",
        config.bind_addr
    );

    // Connections open lazily; only a malformed URL fails here
    let pool = create_pool_with_options(&database_url, args.max_connections)
        .context("Invalid database URL")?;

    // Run server (blocks until shutdown)
    run_server(Arc::new(PgUserStore::new(pool)), config)
        .await
        .context("Server error")?;

    Ok(())
}
