//! # CollabHub API Server
//!
//! Serves the identity-provider webhook endpoint and the project
//! collaboration API.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p collabhub-api
//! ```

use std::sync::Arc;

use collabhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use collabhub_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    storage::http::HttpBlobStorage,
    store::postgres::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "collabhub_api=debug,collabhub_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "CollabHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let blobs = Arc::new(HttpBlobStorage::new(config.storage.clone()));
    let address = config.bind_address();

    let app = build_router(AppState::new(config, store, blobs)?);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
