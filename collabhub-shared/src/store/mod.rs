//! Store capability
//!
//! Every component receives an `Arc<dyn Store>` at construction time instead
//! of building its own privileged client. Each method is one atomic store
//! operation; nothing here spans entities in a transaction, so multi-step
//! writes in the lifecycle manager carry their own compensation.
//!
//! # Implementations
//!
//! - [`postgres::PgStore`]: sqlx/PostgreSQL, used in production
//! - [`memory::MemoryStore`]: in-process, same uniqueness and cascade rules,
//!   used by tests and local development
//!
//! # Example
//!
//! ```no_run
//! use collabhub_shared::db::pool::{create_pool, DatabaseConfig};
//! use collabhub_shared::store::{postgres::PgStore, Store};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
//! store.ping().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Document, DocumentStatus, DocumentWithUploader, MembershipWithUser, NewDocument, NewNote,
    NewProject, Note, NoteWithAuthor, OrgMemberWithUser, OrgMembership, Organization, Project,
    ProjectChanges, ProjectDetail, ProjectMembership, ProjectWithOwner, UpsertOrganization,
    UpsertUser, User,
};

pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness constraint violated
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("Foreign key violated: {0}")]
    ForeignKey(String),

    /// Connection, protocol or any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Entity a violated foreign key points at, read from the
    /// `<table>_<column>_fkey` constraint name
    pub fn referenced_entity(&self) -> Option<&'static str> {
        let StoreError::ForeignKey(constraint) = self else {
            return None;
        };
        let column = constraint.strip_suffix("_fkey")?;

        if ["_user_id", "_owner_id", "_assigned_to", "_uploaded_by"]
            .iter()
            .any(|suffix| column.ends_with(suffix))
        {
            Some("User")
        } else if column.ends_with("_project_id") {
            Some("Project")
        } else if column.ends_with("_org_id") {
            Some("Organization")
        } else {
            None
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Inserts or overwrites a user keyed on the provider user id
    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User>;

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Inserts or overwrites an organization keyed on `external_org_id`
    async fn upsert_organization(&self, org: UpsertOrganization) -> StoreResult<Organization>;

    async fn find_organization_by_external_id(
        &self,
        external_org_id: &str,
    ) -> StoreResult<Option<Organization>>;

    /// Inserts or overwrites the `(org_id, user_id)` membership
    async fn upsert_org_membership(
        &self,
        org_id: Uuid,
        user_id: &str,
        role: &str,
    ) -> StoreResult<OrgMembership>;

    /// Returns whether a row was removed
    async fn delete_org_membership(&self, org_id: Uuid, user_id: &str) -> StoreResult<bool>;

    /// Newest first
    async fn list_org_members(&self, org_id: Uuid) -> StoreResult<Vec<OrgMemberWithUser>>;

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Project with owner and documents
    async fn find_project_detail(&self, id: Uuid) -> StoreResult<Option<ProjectDetail>>;

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>>;

    /// Deletes the project and cascades to memberships, documents and notes
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// Newest first
    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectWithOwner>>;

    /// Fails with [`StoreError::Conflict`] if the pair already exists
    async fn insert_project_member(
        &self,
        project_id: Uuid,
        user_id: &str,
    ) -> StoreResult<ProjectMembership>;

    async fn is_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool>;

    async fn delete_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool>;

    /// Newest first
    async fn list_project_members(&self, project_id: Uuid) -> StoreResult<Vec<MembershipWithUser>>;

    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document>;

    async fn find_document(&self, id: Uuid) -> StoreResult<Option<Document>>;

    async fn set_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> StoreResult<Option<Document>>;

    async fn delete_document(&self, id: Uuid) -> StoreResult<bool>;

    /// Newest first
    async fn list_documents(&self, project_id: Uuid) -> StoreResult<Vec<DocumentWithUploader>>;

    async fn insert_note(&self, note: NewNote) -> StoreResult<Note>;

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>>;

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool>;

    /// Newest first
    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<NoteWithAuthor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_entity_from_constraint() {
        let entity = |name: &str| StoreError::ForeignKey(name.to_string()).referenced_entity();

        assert_eq!(entity("project_members_user_id_fkey"), Some("User"));
        assert_eq!(entity("projects_assigned_to_fkey"), Some("User"));
        assert_eq!(entity("documents_uploaded_by_fkey"), Some("User"));
        assert_eq!(entity("project_notes_project_id_fkey"), Some("Project"));
        assert_eq!(entity("projects_org_id_fkey"), Some("Organization"));
        assert_eq!(entity("unknown"), None);
        assert_eq!(StoreError::Backend("down".to_string()).referenced_entity(), None);
    }
}
