//! # CollabHub Identity Sync
//!
//! One-shot reconciliation of the local identity mirror against the
//! identity provider. Prints the run report as JSON and exits non-zero when
//! any item failed.
//!
//! ## Usage
//!
//! ```bash
//! IDENTITY_API_URL=https://api.clerk.com IDENTITY_API_KEY=sk_... \
//!     cargo run -p collabhub-api --bin collabhub-sync
//! ```

use std::sync::Arc;

use anyhow::Context;
use collabhub_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    store::postgres::PgStore,
    sync::{HttpIdentityProviderClient, Reconciler},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collabhub_sync=info,collabhub_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
    let api_url = std::env::var("IDENTITY_API_URL")
        .unwrap_or_else(|_| "https://api.clerk.com".to_string());
    let api_key = std::env::var("IDENTITY_API_KEY")
        .context("IDENTITY_API_KEY environment variable is required")?;

    let pool = create_pool(DatabaseConfig {
        url: database_url,
        max_connections: 2,
        ..Default::default()
    })
    .await?;

    let reconciler = Reconciler::new(
        Arc::new(HttpIdentityProviderClient::new(&api_url, &api_key)),
        Arc::new(PgStore::new(pool.clone())),
    );
    let report = reconciler.run().await;
    close_pool(pool).await;

    let report = report?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failures.is_empty() {
        anyhow::bail!("{} items failed to sync", report.failures.len());
    }
    Ok(())
}
