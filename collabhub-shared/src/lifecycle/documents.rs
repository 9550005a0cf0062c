use tracing::{error, info, warn};
use uuid::Uuid;

use super::{authenticated, ResourceLifecycleManager, UploadedFile};
use crate::auth::CallerIdentity;
use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::ViewScope;
use crate::models::{Document, DocumentStatus, DocumentWithUploader, NewDocument};
use crate::storage::object_path;

impl ResourceLifecycleManager {
    /// Uploads the file, then records it
    ///
    /// The blob is written first; if the record cannot be inserted the blob
    /// is deleted before the error is returned.
    pub async fn create_document(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        file: UploadedFile,
    ) -> ServiceResult<Document> {
        let caller_id = authenticated(caller)?;
        self.validate_upload(&file)?;
        self.load_project(project_id).await?;

        let path = object_path(project_id, &file.file_name);
        let size = file.bytes.len() as i64;
        let stored_path = self
            .blobs
            .upload(&path, file.bytes, &file.content_type)
            .await?;

        let inserted = self
            .store
            .insert_document(NewDocument {
                project_id,
                name: file.file_name.trim().to_string(),
                file_path: stored_path.clone(),
                file_size: Some(size),
                file_type: Some(file.content_type),
                uploaded_by: caller_id.to_string(),
            })
            .await;

        let document = match inserted {
            Ok(document) => document,
            Err(err) => {
                warn!(project_id = %project_id, path = %stored_path, error = %err, "Document insert failed, removing blob");
                if let Err(cleanup) = self.blobs.delete(&stored_path).await {
                    error!(path = %stored_path, error = %cleanup, "Failed to remove orphaned blob");
                }
                return Err(err.into());
            }
        };

        info!(document_id = %document.id, project_id = %project_id, size, caller = %caller_id, "Document uploaded");
        self.announce(&[ViewScope::Project(project_id)]).await;
        Ok(document)
    }

    fn validate_upload(&self, file: &UploadedFile) -> ServiceResult<()> {
        if file.file_name.trim().is_empty() || file.bytes.is_empty() {
            return Err(ServiceError::validation("file", "Project ID and file are required"));
        }

        if file.bytes.len() as u64 > self.config.max_upload_bytes {
            return Err(ServiceError::validation(
                "file",
                format!(
                    "File exceeds the maximum size of {} bytes",
                    self.config.max_upload_bytes
                ),
            ));
        }

        let allowed = self
            .config
            .allowed_upload_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(file.content_type.trim()));
        if !allowed {
            return Err(ServiceError::validation(
                "file",
                format!("File type {} is not allowed", file.content_type),
            ));
        }

        Ok(())
    }

    /// Only the owner of the document's project may change its status
    pub async fn update_document_status(
        &self,
        caller: &CallerIdentity,
        document_id: Uuid,
        status: DocumentStatus,
    ) -> ServiceResult<Document> {
        let caller_id = authenticated(caller)?;
        let document = self.load_document(document_id).await?;
        let project = self.load_project(document.project_id).await?;

        self.guard
            .can_set_document_status(caller_id, &project)
            .into_result()?;

        let updated = self
            .store
            .set_document_status(document_id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document"))?;

        info!(document_id = %document_id, status = %status, caller = %caller_id, "Document status changed");
        self.announce(&[ViewScope::Project(updated.project_id)]).await;
        Ok(updated)
    }

    /// Deletes the blob (best effort), then the record
    pub async fn delete_document(&self, caller: &CallerIdentity, document_id: Uuid) -> ServiceResult<()> {
        let caller_id = authenticated(caller)?;
        let document = self.load_document(document_id).await?;

        if let Err(err) = self.blobs.delete(&document.file_path).await {
            warn!(document_id = %document_id, path = %document.file_path, error = %err, "Blob delete failed");
        }

        self.store.delete_document(document_id).await?;

        info!(document_id = %document_id, project_id = %document.project_id, caller = %caller_id, "Document deleted");
        self.announce(&[ViewScope::Project(document.project_id)]).await;
        Ok(())
    }

    pub async fn list_documents(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
    ) -> ServiceResult<Vec<DocumentWithUploader>> {
        authenticated(caller)?;
        self.load_project(project_id).await?;

        Ok(self.store.list_documents(project_id).await?)
    }

    /// Time-limited download link for a document's blob
    pub async fn document_download_url(
        &self,
        caller: &CallerIdentity,
        document_id: Uuid,
    ) -> ServiceResult<String> {
        authenticated(caller)?;
        let document = self.load_document(document_id).await?;

        Ok(self
            .blobs
            .signed_url(&document.file_path, self.config.signed_url_ttl_secs)
            .await?)
    }

    async fn load_document(&self, id: Uuid) -> ServiceResult<Document> {
        self.store
            .find_document(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document"))
    }
}
