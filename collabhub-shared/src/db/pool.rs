//! Postgres pool used by [`PgStore`](crate::store::postgres::PgStore)
//!
//! Connections idle for ten minutes are closed and every connection is
//! recycled after half an hour, so a failover behind the same URL is
//! picked up without a restart.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    /// Defaults to 10; the sync job runs with 2
    pub max_connections: u32,

    /// How long a store call waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens the pool and fails fast when the server does not answer
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(&config.url)
        .await?;

    health_check(&pool).await?;
    info!(max_connections = config.max_connections, "Connected to Postgres");
    Ok(pool)
}

/// Liveness probe behind `Store::ping`
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        warn!(value = one, "Database answered the liveness probe with an unexpected value");
        return Err(sqlx::Error::Protocol(format!("SELECT 1 returned {one}")));
    }
    Ok(())
}

pub async fn close_pool(pool: PgPool) {
    pool.close().await;
    info!("Postgres pool closed");
}
