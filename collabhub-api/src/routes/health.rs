//! Liveness and dependency status
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "database": "connected",
//!   "webhooks": "enabled"
//! }
//! ```
//!
//! Always answers 200. An unreachable store downgrades the status to
//! `degraded`; a missing webhook secret is reported but does not.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Enabled,
    /// Every delivery is rejected until `WEBHOOK_SECRET` is set
    Disabled,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub database: StoreStatus,
    pub webhooks: WebhookStatus,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => StoreStatus::Connected,
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the store");
            StoreStatus::Disconnected
        }
    };

    let webhooks = if state.webhooks.accepts_deliveries() {
        WebhookStatus::Enabled
    } else {
        WebhookStatus::Disabled
    };

    Json(HealthResponse {
        status: match database {
            StoreStatus::Connected => ServiceStatus::Healthy,
            StoreStatus::Disconnected => ServiceStatus::Degraded,
        },
        version: collabhub_shared::VERSION.to_string(),
        database,
        webhooks,
    })
}
