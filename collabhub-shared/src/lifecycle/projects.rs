use tracing::{error, info, warn};
use uuid::Uuid;

use super::{authenticated, optional, required, CreateProject, ResourceLifecycleManager, UpdateProject};
use crate::auth::CallerIdentity;
use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::ViewScope;
use crate::models::{NewProject, Project, ProjectChanges, ProjectDetail, ProjectWithOwner};
use crate::store::StoreError;

impl ResourceLifecycleManager {
    /// Creates a project owned by the caller in the caller's organization
    ///
    /// The owner, and the assignee when different, become members. If a
    /// membership cannot be written the project row is deleted again, so a
    /// project never exists without its owner's membership.
    pub async fn create_project(
        &self,
        caller: &CallerIdentity,
        input: CreateProject,
    ) -> ServiceResult<Project> {
        let caller_id = authenticated(caller)?;
        let name = required("name", &input.name, "Project name is required")?;
        let org = self.directory.resolve(caller.require_org()?).await?;

        let project = self
            .store
            .insert_project(NewProject {
                org_id: org.id,
                name,
                description: optional(input.description),
                owner_id: caller_id.to_string(),
                assigned_to: optional(input.assigned_to),
                start_date: input.start_date,
                due_date: input.due_date,
            })
            .await?;

        if let Err(err) = self.add_initial_members(&project).await {
            warn!(project_id = %project.id, error = %err, "Membership insert failed, removing project");
            if let Err(cleanup) = self.store.delete_project(project.id).await {
                error!(project_id = %project.id, error = %cleanup, "Failed to remove project after membership failure");
            }
            return Err(err);
        }

        info!(project_id = %project.id, org_id = %org.id, caller = %caller_id, "Project created");
        self.announce(&[ViewScope::ProjectList]).await;
        Ok(project)
    }

    async fn add_initial_members(&self, project: &Project) -> ServiceResult<()> {
        self.store
            .insert_project_member(project.id, &project.owner_id)
            .await?;

        if let Some(assignee) = project.assigned_to.as_deref() {
            if assignee != project.owner_id {
                self.store.insert_project_member(project.id, assignee).await?;
            }
        }
        Ok(())
    }

    /// Replaces the editable fields of a project
    ///
    /// Whether non-owners may edit depends on the configured edit policy. A
    /// new assignee is added as a member before the row is rewritten; that
    /// membership is withdrawn again if the rewrite fails.
    pub async fn update_project(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        input: UpdateProject,
    ) -> ServiceResult<Project> {
        let caller_id = authenticated(caller)?;
        let name = required("name", &input.name, "Project name is required")?;
        let project = self.load_project(project_id).await?;

        self.guard
            .can_update_project(caller_id, &project)
            .into_result()?;

        let assigned_to = optional(input.assigned_to);
        let added_assignee = match assigned_to.as_deref() {
            Some(assignee) => self.ensure_member(project_id, assignee).await?,
            None => None,
        };

        let result = self
            .store
            .update_project(
                project_id,
                ProjectChanges {
                    name,
                    description: optional(input.description),
                    status: input.status.unwrap_or_default(),
                    start_date: input.start_date,
                    due_date: input.due_date,
                    assigned_to,
                },
            )
            .await;

        let updated = match result {
            Ok(Some(updated)) => updated,
            failed => {
                if let Some(assignee) = added_assignee {
                    warn!(project_id = %project_id, assignee = %assignee, "Project update failed, withdrawing assignee membership");
                    if let Err(cleanup) = self.store.delete_project_member(project_id, &assignee).await {
                        error!(project_id = %project_id, error = %cleanup, "Failed to withdraw assignee membership");
                    }
                }
                return Err(match failed {
                    Err(err) => err.into(),
                    _ => ServiceError::not_found("Project"),
                });
            }
        };

        info!(project_id = %project_id, caller = %caller_id, "Project updated");
        self.announce(&[ViewScope::ProjectList, ViewScope::Project(project_id)])
            .await;
        Ok(updated)
    }

    /// Returns the user id when a membership was inserted by this call
    async fn ensure_member(&self, project_id: Uuid, user_id: &str) -> ServiceResult<Option<String>> {
        if self.store.is_project_member(project_id, user_id).await? {
            return Ok(None);
        }
        match self.store.insert_project_member(project_id, user_id).await {
            Ok(_) => Ok(Some(user_id.to_string())),
            Err(StoreError::Conflict(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a project and, by cascade, its members, documents and notes
    ///
    /// Document blobs are removed afterwards on a best-effort basis.
    pub async fn delete_project(&self, caller: &CallerIdentity, project_id: Uuid) -> ServiceResult<()> {
        let caller_id = authenticated(caller)?;
        let project = self.load_project(project_id).await?;

        self.guard
            .can_delete_project(caller_id, &project)
            .into_result()?;

        let blob_paths: Vec<String> = self
            .store
            .list_documents(project_id)
            .await?
            .into_iter()
            .map(|d| d.document.file_path)
            .collect();

        if !self.store.delete_project(project_id).await? {
            return Err(ServiceError::not_found("Project"));
        }

        for path in &blob_paths {
            if let Err(err) = self.blobs.delete(path).await {
                warn!(project_id = %project_id, path = %path, error = %err, "Failed to delete document blob");
            }
        }

        info!(project_id = %project_id, caller = %caller_id, documents = blob_paths.len(), "Project deleted");
        self.announce(&[ViewScope::ProjectList, ViewScope::Project(project_id)])
            .await;
        Ok(())
    }

    /// Projects of the caller's organization, newest first
    pub async fn list_projects(&self, caller: &CallerIdentity) -> ServiceResult<Vec<ProjectWithOwner>> {
        authenticated(caller)?;
        let org = self.directory.resolve(caller.require_org()?).await?;

        Ok(self.store.list_projects(org.id).await?)
    }

    pub async fn get_project(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
    ) -> ServiceResult<ProjectDetail> {
        authenticated(caller)?;

        self.store
            .find_project_detail(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))
    }
}
