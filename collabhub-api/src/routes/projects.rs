//! Project endpoints
//!
//! # Endpoints
//!
//! - `GET    /v1/projects` - Projects of the caller's organization
//! - `POST   /v1/projects` - Create a project owned by the caller
//! - `GET    /v1/projects/:id` - Project with owner and documents
//! - `PUT    /v1/projects/:id` - Replace editable fields
//! - `DELETE /v1/projects/:id` - Delete (owner only)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use collabhub_shared::{
    auth::CallerIdentity,
    lifecycle::{CreateProject, UpdateProject},
    models::{Project, ProjectDetail, ProjectStatus, ProjectWithOwner},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,

    /// Provider user id of the assignee; becomes a project member
    pub assigned_to: Option<String>,
}

/// Update project request
///
/// Every editable field is replaced; omitted optional fields are cleared.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<Vec<ProjectWithOwner>>> {
    Ok(Json(state.lifecycle.list_projects(&caller).await?))
}

/// Create a project
///
/// ```text
/// POST /v1/projects
/// Content-Type: application/json
///
/// {
///   "name": "Website relaunch",
///   "description": "Q3 marketing site",
///   "due_date": "2025-09-30",
///   "assigned_to": "user_2abc"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No active organization on the caller token
/// - `404 Not Found`: Organization not mirrored yet
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = state
        .lifecycle
        .create_project(
            &caller,
            CreateProject {
                name: req.name,
                description: req.description,
                start_date: req.start_date,
                due_date: req.due_date,
                assigned_to: req.assigned_to,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(state.lifecycle.get_project(&caller, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = state
        .lifecycle
        .update_project(
            &caller,
            id,
            UpdateProject {
                name: req.name,
                description: req.description,
                status: req.status,
                start_date: req.start_date,
                due_date: req.due_date,
                assigned_to: req.assigned_to,
            },
        )
        .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete_project(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
