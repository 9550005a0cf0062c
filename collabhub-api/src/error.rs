//! Error handling for the API server
//!
//! This module provides a unified error type that maps to HTTP responses.
//! All handlers return `Result<T, ApiError>`; lifecycle failures convert
//! through `From<ServiceError>` so handlers can use `?` directly.
//!
//! # Example
//!
//! ```no_run
//! use collabhub_api::error::ApiResult;
//! use axum::Json;
//! use serde_json::json;
//!
//! async fn handler() -> ApiResult<Json<serde_json::Value>> {
//!     Ok(Json(json!({ "ok": true })))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collabhub_shared::auth::IdentityError;
use collabhub_shared::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - unreadable body or multipart stream
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate project membership
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503) - blob storage failures
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => {
                let message = match errors.as_slice() {
                    [single] => single.message.clone(),
                    _ => "Request validation failed".to_string(),
                };
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    message,
                    Some(errors),
                )
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "File storage is unavailable".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert lifecycle failures to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Authentication(msg) => ApiError::Unauthorized(msg),
            ServiceError::Authorization { reason, .. } => ApiError::Forbidden(reason),
            ServiceError::NotFound(entity) => ApiError::NotFound(format!("{} not found", entity)),
            ServiceError::Validation { field, message } => ApiError::invalid(field, message),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Storage(msg) => ApiError::ServiceUnavailable(msg),
            ServiceError::Store(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert identity token errors to API errors
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            IdentityError::InvalidIssuer => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            IdentityError::Key(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(err.to_string()),
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabhub_shared::auth::Action;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Project not found".to_string());
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (
                ServiceError::Authorization {
                    action: Action::DeleteProject,
                    reason: "Only project owner can delete the project".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (ServiceError::not_found("Project"), StatusCode::NOT_FOUND),
            (ServiceError::validation("name", "Project name is required"), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ServiceError::Storage("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail {
                field: "name".to_string(),
                message: "Name must be 1-200 characters".to_string(),
            },
            ValidationErrorDetail {
                field: "content".to_string(),
                message: "Content is required".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }
}
