//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Router wired over the in-memory store and blob storage
//! - Seeded organization and users
//! - Caller token generation
//! - Signed webhook requests
//! - Request/response helpers

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{Duration, Utc};
use collabhub_api::app::{build_router, AppState};
use collabhub_api::config::{
    ApiConfig, Config, DatabaseConfig, IdentityConfig, IdentityKey, WebhookConfig,
};
use collabhub_shared::auth::identity::{issue_hs256, IdentityClaims};
use collabhub_shared::lifecycle::LifecycleConfig;
use collabhub_shared::models::{UpsertOrganization, UpsertUser};
use collabhub_shared::storage::http::StorageConfig;
use collabhub_shared::storage::memory::MemoryBlobStorage;
use collabhub_shared::store::memory::MemoryStore;
use collabhub_shared::store::Store;
use collabhub_shared::webhook::WebhookVerifier;
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNpZ25pbmcta2V5";

pub const ORG: &str = "org_42";
pub const OWNER: &str = "user_owner";
pub const MEMBER: &str = "user_member";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStorage>,
    pub state: AppState,
    pub app: axum::Router,
}

impl TestContext {
    /// Organization `org_42` with an owner and a member mirrored
    pub async fn new() -> Self {
        let ctx = Self::empty();

        let org = ctx
            .store
            .upsert_organization(UpsertOrganization {
                external_org_id: ORG.to_string(),
                name: "Acme".to_string(),
                slug: "acme".to_string(),
            })
            .await
            .expect("Failed to seed organization");

        for id in [OWNER, MEMBER] {
            ctx.store
                .upsert_user(UpsertUser {
                    id: id.to_string(),
                    email: format!("{}@example.com", id),
                    first_name: None,
                    last_name: None,
                    avatar_url: None,
                })
                .await
                .expect("Failed to seed user");
            ctx.store
                .upsert_org_membership(org.id, id, "member")
                .await
                .expect("Failed to seed org membership");
        }

        ctx
    }

    /// Nothing mirrored yet
    pub fn empty() -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStorage::new());
        let state = AppState::new(test_config(), store.clone(), blobs.clone())
            .expect("Failed to build app state");
        let app = build_router(state.clone());

        Self {
            store,
            blobs,
            state,
            app,
        }
    }

    /// Bearer header for a caller in `org_42`
    pub fn auth_header(&self, user_id: &str) -> String {
        bearer(IdentityClaims::new(user_id, Some(ORG), Duration::hours(1)))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    /// Authenticated JSON request
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        user_id: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", self.auth_header(user_id));

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    /// Webhook delivery signed with the test secret
    pub async fn webhook(&self, event: Value) -> Response<Body> {
        let body = event.to_string();
        let timestamp = Utc::now().timestamp();
        let signature = WebhookVerifier::new(WEBHOOK_SECRET)
            .unwrap()
            .sign("msg_test", timestamp, body.as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/identity")
            .header("content-type", "application/json")
            .header("svix-id", "msg_test")
            .header("svix-timestamp", timestamp.to_string())
            .header("svix-signature", signature)
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }
}

pub fn bearer(claims: IdentityClaims) -> String {
    format!("Bearer {}", issue_hs256(&claims, JWT_SECRET).unwrap())
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        webhook: WebhookConfig {
            secret: Some(WEBHOOK_SECRET.to_string()),
            tolerance_secs: 300,
        },
        identity: IdentityConfig {
            key: IdentityKey::Secret(JWT_SECRET.to_string()),
            issuer: None,
        },
        storage: StorageConfig {
            url: "http://localhost:54321".to_string(),
            service_key: "unused".to_string(),
            bucket: "project-documents".to_string(),
        },
        lifecycle: LifecycleConfig::default(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).into_owned()
}
