//! Project, membership, document and note operations
//!
//! [`ResourceLifecycleManager`] is the single entry point for every
//! user-initiated change. Each operation follows the same order:
//!
//! 1. require a verified caller
//! 2. validate input
//! 3. resolve the tenant or load the resource (`NotFound` otherwise)
//! 4. ask the [`AuthorizationGuard`]
//! 5. write to the store (with compensation for multi-step writes)
//! 6. announce stale views
//!
//! Failures come back as [`ServiceError`]; nothing escapes an operation
//! half-applied.
//!
//! # Example
//!
//! ```no_run
//! use collabhub_shared::auth::CallerIdentity;
//! use collabhub_shared::invalidation::BroadcastInvalidator;
//! use collabhub_shared::lifecycle::{CreateProject, LifecycleConfig, ResourceLifecycleManager};
//! use collabhub_shared::storage::memory::MemoryBlobStorage;
//! use collabhub_shared::store::memory::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ResourceLifecycleManager::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBlobStorage::new()),
//!     Arc::new(BroadcastInvalidator::default()),
//!     LifecycleConfig::default(),
//! );
//!
//! let caller = CallerIdentity::new("user_2abc", Some("org_42"));
//! let project = manager
//!     .create_project(&caller, CreateProject::named("Website relaunch"))
//!     .await?;
//! println!("created {}", project.id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthorizationGuard, CallerIdentity, ProjectEditPolicy};
use crate::directory::OrganizationDirectory;
use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::{self, ViewInvalidator, ViewScope};
use crate::models::{Project, ProjectStatus};
use crate::storage::BlobStorage;
use crate::store::Store;

mod documents;
mod members;
mod notes;
mod projects;

/// Largest accepted upload by default (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Lifetime of document download links by default
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub max_upload_bytes: u64,

    /// Accepted MIME types; compared case-insensitively
    pub allowed_upload_types: Vec<String>,

    pub signed_url_ttl_secs: u64,

    pub edit_policy: ProjectEditPolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_upload_types: vec!["application/pdf".to_string()],
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            edit_policy: ProjectEditPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

impl CreateProject {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Full replacement of a project's editable fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,

    /// `active` when omitted
    pub status: Option<ProjectStatus>,

    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

impl UpdateProject {
    /// Renames the project and clears every optional field
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A file received from the caller, not yet stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct ResourceLifecycleManager {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStorage>,
    invalidator: Arc<dyn ViewInvalidator>,
    directory: OrganizationDirectory,
    guard: AuthorizationGuard,
    config: LifecycleConfig,
}

impl ResourceLifecycleManager {
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStorage>,
        invalidator: Arc<dyn ViewInvalidator>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            directory: OrganizationDirectory::new(store.clone()),
            guard: AuthorizationGuard::new(config.edit_policy),
            store,
            blobs,
            invalidator,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    async fn load_project(&self, id: Uuid) -> ServiceResult<Project> {
        self.store
            .find_project(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))
    }

    async fn announce(&self, scopes: &[ViewScope]) {
        invalidation::announce(self.invalidator.as_ref(), scopes).await;
    }
}

/// The caller's user id, rejecting blank identities
fn authenticated(caller: &CallerIdentity) -> ServiceResult<&str> {
    let user_id = caller.user_id.trim();
    if user_id.is_empty() {
        return Err(ServiceError::Authentication("Unauthorized".to_string()));
    }
    Ok(user_id)
}

/// Trimmed text, or a validation failure when blank
fn required(field: &'static str, value: &str, message: &str) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(field, message));
    }
    Ok(value.to_string())
}

/// Blank optional text is stored as `NULL`
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
