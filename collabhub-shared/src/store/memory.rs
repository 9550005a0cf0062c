//! In-process store
//!
//! Mirrors the relational schema closely enough for behavioral tests and
//! local development: the same unique keys, foreign keys and cascades as the
//! SQL schema, and the same newest-first ordering on list queries.
//!
//! Individual operations can be made to fail with
//! [`MemoryStore::fail_operation`] to exercise compensation paths.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Document, DocumentStatus, DocumentWithUploader, MembershipWithUser, NewDocument, NewNote,
    NewProject, Note, NoteWithAuthor, OrgMemberWithUser, OrgMembership, Organization, Project,
    ProjectChanges, ProjectDetail, ProjectMembership, ProjectStatus, ProjectWithOwner,
    UpsertOrganization, UpsertUser, User, UserSummary,
};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    organizations: Vec<Organization>,
    org_members: Vec<OrgMembership>,
    projects: Vec<Project>,
    project_members: Vec<ProjectMembership>,
    documents: Vec<Document>,
    notes: Vec<Note>,
    failing: HashSet<&'static str>,
}

impl State {
    fn check(&self, operation: &'static str) -> StoreResult<()> {
        if self.failing.contains(operation) {
            return Err(StoreError::Backend(format!("injected failure in {}", operation)));
        }
        Ok(())
    }

    fn require_user(&self, id: &str, constraint: &str) -> StoreResult<()> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKey(constraint.to_string()))
        }
    }

    fn require_project(&self, id: Uuid, constraint: &str) -> StoreResult<()> {
        if self.projects.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKey(constraint.to_string()))
        }
    }

    fn summary(&self, user_id: &str) -> Option<UserSummary> {
        self.users.get(user_id).map(User::summary)
    }
}

/// Store held entirely in memory behind a tokio `RwLock`
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of the named trait method fail with a backend error
    pub async fn fail_operation(&self, operation: &'static str) {
        self.state.write().await.failing.insert(operation);
    }

    /// Clears all injected failures
    pub async fn clear_failures(&self) {
        self.state.write().await.failing.clear();
    }

    pub async fn org_membership_count(&self) -> usize {
        self.state.read().await.org_members.len()
    }

    pub async fn project_count(&self) -> usize {
        self.state.read().await.projects.len()
    }

    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.state.read().await.check("ping")
    }

    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        state.check("upsert_user")?;

        if state
            .users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id)
        {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let record = match state.users.get(&user.id) {
            Some(existing) => User {
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                avatar_url: user.avatar_url,
                updated_at: now,
                ..existing.clone()
            },
            None => User {
                id: user.id,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                avatar_url: user.avatar_url,
                created_at: now,
                updated_at: now,
            },
        };
        state.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        state.check("find_user")?;
        Ok(state.users.get(id).cloned())
    }

    async fn upsert_organization(&self, org: UpsertOrganization) -> StoreResult<Organization> {
        let mut state = self.state.write().await;
        state.check("upsert_organization")?;

        let now = Utc::now();
        if let Some(existing) = state
            .organizations
            .iter_mut()
            .find(|o| o.external_org_id == org.external_org_id)
        {
            existing.name = org.name;
            existing.slug = org.slug;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = Organization {
            id: Uuid::new_v4(),
            external_org_id: org.external_org_id,
            name: org.name,
            slug: org.slug,
            created_at: now,
            updated_at: now,
        };
        state.organizations.push(record.clone());
        Ok(record)
    }

    async fn find_organization_by_external_id(
        &self,
        external_org_id: &str,
    ) -> StoreResult<Option<Organization>> {
        let state = self.state.read().await;
        state.check("find_organization_by_external_id")?;
        Ok(state
            .organizations
            .iter()
            .find(|o| o.external_org_id == external_org_id)
            .cloned())
    }

    async fn upsert_org_membership(
        &self,
        org_id: Uuid,
        user_id: &str,
        role: &str,
    ) -> StoreResult<OrgMembership> {
        let mut state = self.state.write().await;
        state.check("upsert_org_membership")?;

        if !state.organizations.iter().any(|o| o.id == org_id) {
            return Err(StoreError::ForeignKey("org_members_org_id_fkey".to_string()));
        }
        state.require_user(user_id, "org_members_user_id_fkey")?;

        if let Some(existing) = state
            .org_members
            .iter_mut()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
        {
            existing.role = role.to_string();
            return Ok(existing.clone());
        }

        let record = OrgMembership {
            id: Uuid::new_v4(),
            org_id,
            user_id: user_id.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        state.org_members.push(record.clone());
        Ok(record)
    }

    async fn delete_org_membership(&self, org_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.check("delete_org_membership")?;

        let before = state.org_members.len();
        state
            .org_members
            .retain(|m| !(m.org_id == org_id && m.user_id == user_id));
        Ok(state.org_members.len() < before)
    }

    async fn list_org_members(&self, org_id: Uuid) -> StoreResult<Vec<OrgMemberWithUser>> {
        let state = self.state.read().await;
        state.check("list_org_members")?;

        Ok(state
            .org_members
            .iter()
            .rev()
            .filter(|m| m.org_id == org_id)
            .map(|m| OrgMemberWithUser {
                membership: m.clone(),
                user: state.summary(&m.user_id),
            })
            .collect())
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut state = self.state.write().await;
        state.check("insert_project")?;

        if !state.organizations.iter().any(|o| o.id == project.org_id) {
            return Err(StoreError::ForeignKey("projects_org_id_fkey".to_string()));
        }
        state.require_user(&project.owner_id, "projects_owner_id_fkey")?;
        if let Some(assignee) = &project.assigned_to {
            state.require_user(assignee, "projects_assigned_to_fkey")?;
        }

        let now = Utc::now();
        let record = Project {
            id: Uuid::new_v4(),
            org_id: project.org_id,
            name: project.name,
            description: project.description,
            status: ProjectStatus::Active,
            owner_id: project.owner_id,
            assigned_to: project.assigned_to,
            start_date: project.start_date,
            due_date: project.due_date,
            created_at: now,
            updated_at: now,
        };
        state.projects.push(record.clone());
        Ok(record)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;
        state.check("find_project")?;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_project_detail(&self, id: Uuid) -> StoreResult<Option<ProjectDetail>> {
        let state = self.state.read().await;
        state.check("find_project_detail")?;

        let Some(project) = state.projects.iter().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };
        let documents = state
            .documents
            .iter()
            .rev()
            .filter(|d| d.project_id == id)
            .cloned()
            .collect();

        Ok(Some(ProjectDetail {
            owner: state.summary(&project.owner_id),
            project,
            documents,
        }))
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;
        state.check("update_project")?;

        if let Some(assignee) = &changes.assigned_to {
            state.require_user(assignee, "projects_assigned_to_fkey")?;
        }

        let Some(project) = state.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.name = changes.name;
        project.description = changes.description;
        project.status = changes.status;
        project.start_date = changes.start_date;
        project.due_date = changes.due_date;
        project.assigned_to = changes.assigned_to;
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.check("delete_project")?;

        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Ok(false);
        }

        state.project_members.retain(|m| m.project_id != id);
        state.documents.retain(|d| d.project_id != id);
        state.notes.retain(|n| n.project_id != id);
        Ok(true)
    }

    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectWithOwner>> {
        let state = self.state.read().await;
        state.check("list_projects")?;

        Ok(state
            .projects
            .iter()
            .rev()
            .filter(|p| p.org_id == org_id)
            .map(|p| ProjectWithOwner {
                project: p.clone(),
                owner: state.summary(&p.owner_id),
            })
            .collect())
    }

    async fn insert_project_member(
        &self,
        project_id: Uuid,
        user_id: &str,
    ) -> StoreResult<ProjectMembership> {
        let mut state = self.state.write().await;
        state.check("insert_project_member")?;

        state.require_project(project_id, "project_members_project_id_fkey")?;
        state.require_user(user_id, "project_members_user_id_fkey")?;
        if state
            .project_members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict(
                "project_members_project_user_key".to_string(),
            ));
        }

        let record = ProjectMembership {
            id: Uuid::new_v4(),
            project_id,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        state.project_members.push(record.clone());
        Ok(record)
    }

    async fn is_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        state.check("is_project_member")?;
        Ok(state
            .project_members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id))
    }

    async fn delete_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.check("delete_project_member")?;

        let before = state.project_members.len();
        state
            .project_members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(state.project_members.len() < before)
    }

    async fn list_project_members(&self, project_id: Uuid) -> StoreResult<Vec<MembershipWithUser>> {
        let state = self.state.read().await;
        state.check("list_project_members")?;

        Ok(state
            .project_members
            .iter()
            .rev()
            .filter(|m| m.project_id == project_id)
            .map(|m| MembershipWithUser {
                membership: m.clone(),
                user: state.summary(&m.user_id),
            })
            .collect())
    }

    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document> {
        let mut state = self.state.write().await;
        state.check("insert_document")?;

        state.require_project(document.project_id, "documents_project_id_fkey")?;
        state.require_user(&document.uploaded_by, "documents_uploaded_by_fkey")?;

        let now = Utc::now();
        let record = Document {
            id: Uuid::new_v4(),
            project_id: document.project_id,
            name: document.name,
            file_path: document.file_path,
            file_size: document.file_size,
            file_type: document.file_type,
            status: DocumentStatus::Draft,
            uploaded_by: document.uploaded_by,
            created_at: now,
            updated_at: now,
        };
        state.documents.push(record.clone());
        Ok(record)
    }

    async fn find_document(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let state = self.state.read().await;
        state.check("find_document")?;
        Ok(state.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn set_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        state.check("set_document_status")?;

        let Some(document) = state.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        document.status = status;
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.check("delete_document")?;

        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        Ok(state.documents.len() < before)
    }

    async fn list_documents(&self, project_id: Uuid) -> StoreResult<Vec<DocumentWithUploader>> {
        let state = self.state.read().await;
        state.check("list_documents")?;

        Ok(state
            .documents
            .iter()
            .rev()
            .filter(|d| d.project_id == project_id)
            .map(|d| DocumentWithUploader {
                document: d.clone(),
                uploader: state.summary(&d.uploaded_by),
            })
            .collect())
    }

    async fn insert_note(&self, note: NewNote) -> StoreResult<Note> {
        let mut state = self.state.write().await;
        state.check("insert_note")?;

        state.require_project(note.project_id, "project_notes_project_id_fkey")?;
        state.require_user(&note.user_id, "project_notes_user_id_fkey")?;

        let now = Utc::now();
        let record = Note {
            id: Uuid::new_v4(),
            project_id: note.project_id,
            user_id: note.user_id,
            content: note.content,
            created_at: now,
            updated_at: now,
        };
        state.notes.push(record.clone());
        Ok(record)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let state = self.state.read().await;
        state.check("find_note")?;
        Ok(state.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.check("delete_note")?;

        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() < before)
    }

    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<NoteWithAuthor>> {
        let state = self.state.read().await;
        state.check("list_notes")?;

        Ok(state
            .notes
            .iter()
            .rev()
            .filter(|n| n.project_id == project_id)
            .map(|n| NoteWithAuthor {
                note: n.clone(),
                user: state.summary(&n.user_id),
            })
            .collect())
    }
}
