use tracing::info;
use uuid::Uuid;

use super::{authenticated, required, ResourceLifecycleManager};
use crate::auth::CallerIdentity;
use crate::error::ServiceResult;
use crate::invalidation::ViewScope;
use crate::models::{MembershipWithUser, OrgMemberWithUser, ProjectMembership};

impl ResourceLifecycleManager {
    /// Owner only; adding an existing member is a conflict
    pub async fn add_project_member(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        user_id: &str,
    ) -> ServiceResult<ProjectMembership> {
        let caller_id = authenticated(caller)?;
        let user_id = required("user_id", user_id, "User ID is required")?;
        let project = self.load_project(project_id).await?;

        self.guard.can_add_member(caller_id, &project).into_result()?;

        let membership = self
            .store
            .insert_project_member(project_id, &user_id)
            .await?;

        info!(project_id = %project_id, user_id = %user_id, caller = %caller_id, "Project member added");
        self.announce(&[ViewScope::Project(project_id)]).await;
        Ok(membership)
    }

    /// Owner only; the owner's own membership cannot be removed
    pub async fn remove_project_member(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        user_id: &str,
    ) -> ServiceResult<()> {
        let caller_id = authenticated(caller)?;
        let user_id = required("user_id", user_id, "User ID is required")?;
        let project = self.load_project(project_id).await?;

        self.guard
            .can_remove_member(caller_id, &project, &user_id)
            .into_result()?;

        let removed = self
            .store
            .delete_project_member(project_id, &user_id)
            .await?;

        info!(project_id = %project_id, user_id = %user_id, removed, caller = %caller_id, "Project member removed");
        self.announce(&[ViewScope::Project(project_id)]).await;
        Ok(())
    }

    pub async fn list_project_members(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
    ) -> ServiceResult<Vec<MembershipWithUser>> {
        authenticated(caller)?;
        self.load_project(project_id).await?;

        Ok(self.store.list_project_members(project_id).await?)
    }

    /// Members of the caller's organization, as mirrored from the provider
    pub async fn list_org_members(
        &self,
        caller: &CallerIdentity,
    ) -> ServiceResult<Vec<OrgMemberWithUser>> {
        authenticated(caller)?;
        let org = self.directory.resolve(caller.require_org()?).await?;

        Ok(self.store.list_org_members(org.id).await?)
    }
}
