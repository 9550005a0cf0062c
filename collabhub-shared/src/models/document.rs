//! Document model
//!
//! Each document record is paired 1:1 with a blob in external storage;
//! `file_path` is the opaque storage key.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE document_status AS ENUM ('draft', 'pending', 'approved', 'rejected');
//!
//! CREATE TABLE documents (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     name TEXT NOT NULL,
//!     file_path TEXT NOT NULL,
//!     file_size BIGINT,
//!     file_type TEXT,
//!     status document_status NOT NULL DEFAULT 'draft',
//!     uploaded_by TEXT NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::UserSummary;

/// Review status of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "pending" => Ok(DocumentStatus::Pending),
            "approved" => Ok(DocumentStatus::Approved),
            "rejected" => Ok(DocumentStatus::Rejected),
            other => Err(format!("unknown document status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,

    /// Original file name as uploaded
    pub name: String,

    /// Blob storage key
    pub file_path: String,

    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub status: DocumentStatus,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert once the blob has been uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub project_id: Uuid,
    pub name: String,
    pub file_path: String,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub uploaded_by: String,
}

/// Document joined with the uploader's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentWithUploader {
    #[serde(flatten)]
    pub document: Document,
    pub uploader: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_status_parse() {
        assert_eq!("approved".parse::<DocumentStatus>(), Ok(DocumentStatus::Approved));
        assert_eq!(DocumentStatus::default(), DocumentStatus::Draft);
        assert!("Approved".parse::<DocumentStatus>().is_err());
    }
}
