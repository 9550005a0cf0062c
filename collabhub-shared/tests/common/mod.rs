//! Test harness shared by the integration suites
//!
//! Wires a [`ResourceLifecycleManager`] over the in-memory store, blob
//! storage and a recording invalidator, with helpers that seed the mirrored
//! identity data the way the webhook path would.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use collabhub_shared::auth::CallerIdentity;
use collabhub_shared::invalidation::{InvalidationError, ViewInvalidator, ViewScope};
use collabhub_shared::lifecycle::{LifecycleConfig, ResourceLifecycleManager, UploadedFile};
use collabhub_shared::models::{Organization, UpsertOrganization, UpsertUser};
use collabhub_shared::storage::memory::MemoryBlobStorage;
use collabhub_shared::store::memory::MemoryStore;
use collabhub_shared::store::Store;

pub const ORG: &str = "org_42";
pub const OWNER: &str = "user_owner";
pub const MEMBER: &str = "user_member";
pub const OUTSIDER: &str = "user_outsider";

/// Remembers every scope it was asked to invalidate
#[derive(Default)]
pub struct RecordingInvalidator {
    scopes: Mutex<Vec<ViewScope>>,
}

impl RecordingInvalidator {
    pub async fn scopes(&self) -> Vec<ViewScope> {
        self.scopes.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.scopes.lock().await.clear();
    }
}

#[async_trait]
impl ViewInvalidator for RecordingInvalidator {
    async fn invalidate(&self, scope: ViewScope) -> Result<(), InvalidationError> {
        self.scopes.lock().await.push(scope);
        Ok(())
    }
}

/// Always fails; writes must still succeed
pub struct FailingInvalidator;

#[async_trait]
impl ViewInvalidator for FailingInvalidator {
    async fn invalidate(&self, _scope: ViewScope) -> Result<(), InvalidationError> {
        Err(InvalidationError("cache unreachable".to_string()))
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStorage>,
    pub invalidator: Arc<RecordingInvalidator>,
    pub manager: ResourceLifecycleManager,
    pub org: Organization,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(LifecycleConfig::default()).await
    }

    /// Organization `org_42` with owner, member and outsider users mirrored
    pub async fn with_config(config: LifecycleConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStorage::new());
        let invalidator = Arc::new(RecordingInvalidator::default());

        let org = store
            .upsert_organization(UpsertOrganization {
                external_org_id: ORG.to_string(),
                name: "Acme".to_string(),
                slug: "acme".to_string(),
            })
            .await
            .expect("Failed to seed organization");

        for id in [OWNER, MEMBER, OUTSIDER] {
            store
                .upsert_user(user(id))
                .await
                .expect("Failed to seed user");
            store
                .upsert_org_membership(org.id, id, "member")
                .await
                .expect("Failed to seed org membership");
        }

        let manager = ResourceLifecycleManager::new(
            store.clone(),
            blobs.clone(),
            invalidator.clone(),
            config,
        );

        Self {
            store,
            blobs,
            invalidator,
            manager,
            org,
        }
    }
}

pub fn user(id: &str) -> UpsertUser {
    UpsertUser {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        first_name: None,
        last_name: None,
        avatar_url: None,
    }
}

pub fn caller(user_id: &str) -> CallerIdentity {
    CallerIdentity::new(user_id, Some(ORG))
}

pub fn pdf(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.7 test document"),
    }
}
