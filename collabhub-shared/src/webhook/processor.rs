//! Applies verified identity-provider events to the local mirror
//!
//! Every handled event results in exactly one store write keyed on the
//! provider's identifiers, so redelivered and reordered events are safe:
//! a repeat overwrites with the same data, and an update that overtakes its
//! create simply inserts.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::event::{EventError, MembershipData, WebhookEvent};
use super::signature::{SignatureError, WebhookHeaders, WebhookVerifier};
use crate::directory::OrganizationDirectory;
use crate::error::ServiceError;
use crate::models::Organization;
use crate::store::{Store, StoreError};

/// Body returned for every successfully handled (or ignored) event
pub const PROCESSED_MESSAGE: &str = "Webhook processed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied(String),
    Ignored(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Store failure during {operation}: {source}")]
    Store {
        operation: &'static str,
        source: StoreError,
    },
}

impl WebhookError {
    /// HTTP status the provider should see
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::Signature(_) | WebhookError::Event(_) => 400,
            WebhookError::OrganizationNotFound => 404,
            WebhookError::Store { .. } => 500,
        }
    }

    /// Plain-text response body; never carries internal detail
    pub fn response_text(&self) -> &'static str {
        match self {
            WebhookError::Signature(SignatureError::MissingHeader(_)) => {
                "Error occurred -- no svix headers"
            }
            WebhookError::Signature(_) => "Error occurred",
            WebhookError::Event(EventError::MissingEmail) => "No email found",
            WebhookError::Event(EventError::MissingUserId) => "No user id found",
            WebhookError::Event(EventError::Malformed(_)) => "Malformed payload",
            WebhookError::OrganizationNotFound => "Organization not found",
            WebhookError::Store { operation, .. } => match *operation {
                "upsert user" => "Error upserting user",
                "upsert organization" => "Error upserting organization",
                "add org member" => "Error adding org member",
                "remove org member" => "Error removing org member",
                _ => "Error processing webhook",
            },
        }
    }
}

fn store_error(operation: &'static str) -> impl FnOnce(StoreError) -> WebhookError {
    move |source| WebhookError::Store { operation, source }
}

#[derive(Clone)]
pub struct WebhookEventProcessor {
    store: Arc<dyn Store>,
    directory: OrganizationDirectory,
    verifier: Option<WebhookVerifier>,
}

impl WebhookEventProcessor {
    /// Without a verifier every envelope is rejected
    pub fn new(store: Arc<dyn Store>, verifier: Option<WebhookVerifier>) -> Self {
        Self {
            directory: OrganizationDirectory::new(store.clone()),
            store,
            verifier,
        }
    }

    /// Whether a signing secret was supplied
    pub fn accepts_deliveries(&self) -> bool {
        self.verifier.is_some()
    }

    /// Verifies, parses and applies one envelope
    pub async fn process(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            error!("Rejecting webhook: no signing secret configured");
            SignatureError::MissingSecret
        })?;

        if let Err(err) = verifier.verify(headers, body) {
            warn!(error = %err, message_id = ?headers.id, "Webhook signature rejected");
            return Err(err.into());
        }

        let event = WebhookEvent::parse(body)?;
        debug!(message_id = ?headers.id, kind = event.kind(), "Webhook verified");

        self.apply(event).await
    }

    /// Applies an already verified event
    pub async fn apply(&self, event: WebhookEvent) -> Result<WebhookOutcome, WebhookError> {
        match event {
            WebhookEvent::UserUpserted(data) => {
                let user = data.into_upsert()?;
                let user = self
                    .store
                    .upsert_user(user)
                    .await
                    .map_err(store_error("upsert user"))?;

                info!(user_id = %user.id, "Mirrored user");
                Ok(WebhookOutcome::Applied(format!("user {}", user.id)))
            }

            WebhookEvent::OrganizationUpserted(data) => {
                let org = self
                    .store
                    .upsert_organization(data.into_upsert())
                    .await
                    .map_err(store_error("upsert organization"))?;

                info!(external_org_id = %org.external_org_id, org_id = %org.id, "Mirrored organization");
                Ok(WebhookOutcome::Applied(format!(
                    "organization {}",
                    org.external_org_id
                )))
            }

            WebhookEvent::MembershipCreated(data) => {
                let user_id = data.user_id()?.to_string();
                let org = self.organization(&data).await?;
                let role = data.role();

                self.store
                    .upsert_org_membership(org.id, &user_id, &role)
                    .await
                    .map_err(store_error("add org member"))?;

                info!(org_id = %org.id, user_id = %user_id, role = %role, "Mirrored org membership");
                Ok(WebhookOutcome::Applied(format!("membership {}", user_id)))
            }

            WebhookEvent::MembershipDeleted(data) => {
                let user_id = data.user_id()?.to_string();
                let org = self.organization(&data).await?;

                let removed = self
                    .store
                    .delete_org_membership(org.id, &user_id)
                    .await
                    .map_err(store_error("remove org member"))?;

                info!(org_id = %org.id, user_id = %user_id, removed, "Removed org membership");
                Ok(WebhookOutcome::Applied(format!("membership {}", user_id)))
            }

            WebhookEvent::Unhandled(event_type) => {
                debug!(event_type = %event_type, "Ignoring unhandled webhook event");
                Ok(WebhookOutcome::Ignored(event_type))
            }
        }
    }

    async fn organization(&self, data: &MembershipData) -> Result<Organization, WebhookError> {
        match self.directory.resolve(&data.organization.id).await {
            Ok(org) => Ok(org),
            Err(ServiceError::NotFound(_)) => {
                warn!(
                    external_org_id = %data.organization.id,
                    "Membership event for unknown organization"
                );
                Err(WebhookError::OrganizationNotFound)
            }
            Err(err) => Err(WebhookError::Store {
                operation: "resolve organization",
                source: StoreError::Backend(err.to_string()),
            }),
        }
    }
}
