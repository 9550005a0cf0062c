//! Typed failures returned by every public operation
//!
//! Each lifecycle operation recovers its failures at its own boundary and
//! returns one of these kinds; nothing is thrown past it. The HTTP layer maps
//! the kinds onto status codes and renders the message to the caller.

use crate::auth::guard::Action;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Result alias for lifecycle and directory operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No verified caller identity (or no active organization where one is required)
    #[error("Authentication required: {0}")]
    Authentication(String),

    /// Verified caller lacks permission for a specific action
    #[error("Not authorized to {action}: {reason}")]
    Authorization { action: Action, reason: String },

    /// Referenced organization, project, document or note does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Missing required field, empty content, protected owner membership
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Uniqueness violation on insert
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Blob upload/delete/sign failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(entity.to_string())
    }

    /// Whether the caller may succeed by retrying unchanged
    ///
    /// An organization or user that is not mirrored yet will usually appear
    /// once the provider's webhook has been processed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::NotFound(entity) if entity == "Organization" || entity == "User")
            || matches!(self, ServiceError::Storage(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        if let Some(entity) = err.referenced_entity() {
            return ServiceError::not_found(entity);
        }
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::ForeignKey(constraint) => {
                ServiceError::Store(format!("Missing referenced row: {}", constraint))
            }
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_message_names_action() {
        let err = ServiceError::Authorization {
            action: Action::DeleteProject,
            reason: "Only the project owner can delete the project".to_string(),
        };
        assert!(err.to_string().contains("delete project"));
    }

    #[test]
    fn test_organization_not_found_is_retryable() {
        assert!(ServiceError::not_found("Organization").is_retryable());
        assert!(!ServiceError::not_found("Project").is_retryable());
        assert_eq!(ServiceError::not_found("Project").to_string(), "Project not found");
    }

    #[test]
    fn test_missing_user_reference_is_retryable_not_found() {
        let err: ServiceError =
            StoreError::ForeignKey("project_members_user_id_fkey".to_string()).into();
        assert!(matches!(&err, ServiceError::NotFound(entity) if entity == "User"));
        assert!(err.is_retryable());

        let err: ServiceError = StoreError::ForeignKey("mystery".to_string()).into();
        assert!(matches!(err, ServiceError::Store(_)));
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: ServiceError = StoreError::Conflict("duplicate membership".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
