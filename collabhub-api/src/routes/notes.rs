//! Project note endpoints
//!
//! - `GET    /v1/projects/:id/notes`
//! - `POST   /v1/projects/:id/notes`
//! - `DELETE /v1/projects/:id/notes/:note_id` - Author only

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use collabhub_shared::{
    auth::CallerIdentity,
    models::{Note, NoteWithAuthor},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, message = "Note content is required"))]
    pub content: String,
}

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NoteWithAuthor>>> {
    Ok(Json(state.lifecycle.list_notes(&caller, project_id).await?))
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    req.validate()?;

    let note = state
        .lifecycle
        .create_note(&caller, project_id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((project_id, note_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .lifecycle
        .delete_note(&caller, project_id, note_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
