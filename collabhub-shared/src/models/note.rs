//! Project note model
//!
//! Notes are immutable once written; only their author may delete them.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE project_notes (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     user_id TEXT NOT NULL REFERENCES users(id),
//!     content TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,
    pub project_id: Uuid,

    /// Author
    pub user_id: String,

    /// Trimmed, never empty
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub project_id: Uuid,
    pub user_id: String,
    pub content: String,
}

/// Note joined with the author's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithAuthor {
    #[serde(flatten)]
    pub note: Note,
    pub user: Option<UserSummary>,
}
