//! Membership endpoints
//!
//! # Endpoints
//!
//! - `GET    /v1/projects/:id/members`
//! - `POST   /v1/projects/:id/members` - Add a member (owner only)
//! - `DELETE /v1/projects/:id/members/:user_id` - Remove a member (owner only)
//! - `GET    /v1/org/members` - Mirrored roster of the caller's organization

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use collabhub_shared::{
    auth::CallerIdentity,
    models::{MembershipWithUser, OrgMemberWithUser, ProjectMembership},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
}

pub async fn list_project_members(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MembershipWithUser>>> {
    Ok(Json(
        state
            .lifecycle
            .list_project_members(&caller, project_id)
            .await?,
    ))
}

/// # Errors
///
/// - `403 Forbidden`: Caller does not own the project
/// - `409 Conflict`: Already a member
pub async fn add_project_member(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMembership>)> {
    req.validate()?;

    let membership = state
        .lifecycle
        .add_project_member(&caller, project_id, req.user_id.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// # Errors
///
/// - `403 Forbidden`: Caller does not own the project
/// - `422 Unprocessable Entity`: Target is the project owner
pub async fn remove_project_member(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((project_id, user_id)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .lifecycle
        .remove_project_member(&caller, project_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_org_members(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<Vec<OrgMemberWithUser>>> {
    Ok(Json(state.lifecycle.list_org_members(&caller).await?))
}
