//! Document endpoints
//!
//! # Endpoints
//!
//! - `GET    /v1/projects/:id/documents`
//! - `POST   /v1/projects/:id/documents` - Multipart upload, field `file`
//! - `PUT    /v1/documents/:id/status` - Set review status (project owner only)
//! - `DELETE /v1/documents/:id`
//! - `GET    /v1/documents/:id/download` - Time-limited download URL

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use collabhub_shared::{
    auth::CallerIdentity,
    lifecycle::UploadedFile,
    models::{Document, DocumentStatus, DocumentWithUploader},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DocumentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub url: String,
    pub expires_in: u64,
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DocumentWithUploader>>> {
    Ok(Json(
        state.lifecycle.list_documents(&caller, project_id).await?,
    ))
}

/// Upload a document
///
/// ```text
/// POST /v1/projects/:id/documents
/// Content-Type: multipart/form-data; boundary=...
///
/// file=<brief.pdf>
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing file, too large, or disallowed type
/// - `503 Service Unavailable`: Blob storage rejected the upload
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        upload = Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let file = upload.ok_or_else(|| ApiError::invalid(FILE_FIELD, "Project ID and file are required"))?;
    let document = state
        .lifecycle
        .create_document(&caller, project_id, file)
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document_status(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(document_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Document>> {
    Ok(Json(
        state
            .lifecycle
            .update_document_status(&caller, document_id, req.status)
            .await?,
    ))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(document_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete_document(&caller, document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_document(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(document_id): Path<Uuid>,
) -> ApiResult<Json<DownloadResponse>> {
    let url = state
        .lifecycle
        .document_download_url(&caller, document_id)
        .await?;

    Ok(Json(DownloadResponse {
        url,
        expires_in: state.lifecycle.config().signed_url_ttl_secs,
    }))
}
