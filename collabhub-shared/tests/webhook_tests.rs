//! Integration tests for identity-provider webhook processing
//!
//! Run with: cargo test --test webhook_tests

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use collabhub_shared::store::memory::MemoryStore;
use collabhub_shared::store::Store;
use collabhub_shared::webhook::{
    WebhookError, WebhookEventProcessor, WebhookHeaders, WebhookOutcome, WebhookVerifier,
};

// base64("test-webhook-signing-key")
const SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNpZ25pbmcta2V5";

struct Harness {
    store: Arc<MemoryStore>,
    processor: WebhookEventProcessor,
    signer: WebhookVerifier,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let signer = WebhookVerifier::new(SECRET).expect("valid secret");
        let processor = WebhookEventProcessor::new(store.clone(), Some(signer.clone()));
        Self {
            store,
            processor,
            signer,
        }
    }

    fn signed(&self, body: &[u8]) -> WebhookHeaders {
        let timestamp = Utc::now().timestamp();
        WebhookHeaders {
            id: Some("msg_2xyz".to_string()),
            timestamp: Some(timestamp.to_string()),
            signature: Some(self.signer.sign("msg_2xyz", timestamp, body)),
        }
    }

    async fn deliver(&self, event: Value) -> Result<WebhookOutcome, WebhookError> {
        let body = event.to_string();
        let headers = self.signed(body.as_bytes());
        self.processor.process(&headers, body.as_bytes()).await
    }
}

fn organization_created(id: &str, name: &str) -> Value {
    json!({
        "type": "organization.created",
        "data": {"id": id, "name": name, "slug": name.to_lowercase()}
    })
}

fn user_created(id: &str, email: &str) -> Value {
    json!({
        "type": "user.created",
        "data": {
            "id": id,
            "email_addresses": [{"id": "idn_1", "email_address": email}],
            "primary_email_address_id": "idn_1",
            "first_name": "Ada",
            "last_name": null,
            "image_url": ""
        }
    })
}

fn membership(event_type: &str, org: &str, user: &str) -> Value {
    json!({
        "type": event_type,
        "data": {
            "organization": {"id": org},
            "public_user_data": {"user_id": user},
            "role": "org:member"
        }
    })
}

#[tokio::test]
async fn test_user_upsert() {
    let h = Harness::new();
    h.deliver(user_created("u1", "ada@example.com")).await.unwrap();

    let user = h.store.find_user("u1").await.unwrap().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
    assert_eq!(user.avatar_url, None);
}

#[tokio::test]
async fn test_user_without_email_is_rejected() {
    let h = Harness::new();
    let err = h
        .deliver(json!({"type": "user.created", "data": {"id": "u1", "email_addresses": []}}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.response_text(), "No email found");
    assert!(h.store.find_user("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_organization_replay_is_idempotent() {
    let h = Harness::new();
    let event = organization_created("org_42", "Acme");

    h.deliver(event.clone()).await.unwrap();
    let first = h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .unwrap();

    h.deliver(event).await.unwrap();
    let second = h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, second.name);
    assert_eq!(first.slug, second.slug);
}

#[tokio::test]
async fn test_update_before_create_inserts() {
    let h = Harness::new();
    h.deliver(json!({
        "type": "organization.updated",
        "data": {"id": "org_7", "name": "Late Arrival"}
    }))
    .await
    .unwrap();

    let org = h
        .store
        .find_organization_by_external_id("org_7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(org.slug, "late-arrival");
}

#[tokio::test]
async fn test_membership_before_organization_then_redelivered() {
    let h = Harness::new();
    h.deliver(user_created("u1", "u1@example.com")).await.unwrap();

    let early = membership("organizationMembership.created", "org_42", "u1");
    let err = h.deliver(early.clone()).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.response_text(), "Organization not found");
    assert_eq!(h.store.org_membership_count().await, 0);

    h.deliver(organization_created("org_42", "acme")).await.unwrap();

    h.deliver(early.clone()).await.unwrap();
    h.deliver(early).await.unwrap();

    let org = h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .unwrap();
    let members = h.store.list_org_members(org.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].membership.user_id, "u1");
    assert_eq!(members[0].membership.role, "member");
}

#[tokio::test]
async fn test_deleting_absent_membership_is_noop() {
    let h = Harness::new();
    h.deliver(organization_created("org_42", "acme")).await.unwrap();

    let outcome = h
        .deliver(membership("organizationMembership.deleted", "org_42", "u_never"))
        .await
        .unwrap();
    assert!(matches!(outcome, WebhookOutcome::Applied(_)));
}

#[tokio::test]
async fn test_membership_delete_removes_row() {
    let h = Harness::new();
    h.deliver(user_created("u1", "u1@example.com")).await.unwrap();
    h.deliver(organization_created("org_42", "acme")).await.unwrap();
    h.deliver(membership("organizationMembership.created", "org_42", "u1"))
        .await
        .unwrap();
    assert_eq!(h.store.org_membership_count().await, 1);

    h.deliver(membership("organizationMembership.deleted", "org_42", "u1"))
        .await
        .unwrap();
    assert_eq!(h.store.org_membership_count().await, 0);
}

#[tokio::test]
async fn test_membership_delete_for_unknown_org_is_not_found() {
    let h = Harness::new();
    let err = h
        .deliver(membership("organizationMembership.deleted", "org_missing", "u1"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_membership_without_user_id_is_rejected() {
    let h = Harness::new();
    h.deliver(organization_created("org_42", "acme")).await.unwrap();

    let err = h
        .deliver(json!({
            "type": "organizationMembership.created",
            "data": {"organization": {"id": "org_42"}, "public_user_data": {}}
        }))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_unknown_event_type_is_accepted() {
    let h = Harness::new();
    let outcome = h
        .deliver(json!({"type": "session.ended", "data": {"id": "sess_1"}}))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored("session.ended".to_string()));
}

#[tokio::test]
async fn test_tampered_body_is_rejected_without_mutation() {
    let h = Harness::new();
    let body = organization_created("org_42", "acme").to_string();
    let headers = h.signed(body.as_bytes());
    let tampered = organization_created("org_42", "evil").to_string();

    let err = h
        .processor
        .process(&headers, tampered.as_bytes())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(matches!(err, WebhookError::Signature(_)));
    assert!(h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_extreme_timestamp_is_rejected() {
    let h = Harness::new();
    let body = organization_created("org_42", "acme").to_string();
    let headers = WebhookHeaders {
        id: Some("msg_2xyz".to_string()),
        timestamp: Some(i64::MIN.to_string()),
        signature: Some(h.signer.sign("msg_2xyz", i64::MIN, body.as_bytes())),
    };

    let err = h
        .processor
        .process(&headers, body.as_bytes())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.response_text(), "Error occurred");
    assert!(h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_headers_are_rejected() {
    let h = Harness::new();
    let body = organization_created("org_42", "acme").to_string();

    let err = h
        .processor
        .process(&WebhookHeaders::default(), body.as_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.response_text(), "Error occurred -- no svix headers");
}

#[tokio::test]
async fn test_missing_secret_fails_closed() {
    let h = Harness::new();
    let processor = WebhookEventProcessor::new(h.store.clone(), None);
    let body = organization_created("org_42", "acme").to_string();
    let headers = h.signed(body.as_bytes());

    let err = processor.process(&headers, body.as_bytes()).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(h
        .store
        .find_organization_by_external_id("org_42")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let h = Harness::new();
    h.store.fail_operation("upsert_organization").await;

    let err = h
        .deliver(organization_created("org_42", "acme"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.response_text(), "Error upserting organization");
}
