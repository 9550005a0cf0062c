//! Identity-provider webhook receiver
//!
//! # Endpoint
//!
//! ```text
//! POST /webhooks/identity
//! svix-id: msg_...
//! svix-timestamp: 1700000000
//! svix-signature: v1,<base64>
//! ```
//!
//! Responses are plain text so the provider's delivery log stays readable:
//! `200 Webhook processed`, `400 Error occurred`, `404 Organization not
//! found`, `500 Error upserting user`, and so on. Any non-2xx makes the
//! provider redeliver later.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use collabhub_shared::webhook::{WebhookHeaders, WebhookOutcome, PROCESSED_MESSAGE};

use crate::app::AppState;

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let envelope = WebhookHeaders::from_lookup(|name| {
        headers.get(name).and_then(|value| value.to_str().ok())
    });

    match state.webhooks.process(&envelope, &body).await {
        Ok(WebhookOutcome::Applied(subject)) => {
            tracing::debug!(message_id = ?envelope.id, subject = %subject, "Webhook applied");
            (StatusCode::OK, PROCESSED_MESSAGE)
        }
        Ok(WebhookOutcome::Ignored(event_type)) => {
            tracing::debug!(message_id = ?envelope.id, event_type = %event_type, "Webhook ignored");
            (StatusCode::OK, PROCESSED_MESSAGE)
        }
        Err(err) => {
            let status =
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(message_id = ?envelope.id, error = %err, "Webhook processing failed");
            } else {
                tracing::warn!(message_id = ?envelope.id, error = %err, "Webhook rejected");
            }
            (status, err.response_text())
        }
    }
}
