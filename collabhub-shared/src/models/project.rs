//! Project and project membership models
//!
//! A project belongs to exactly one organization and has a single owner. The
//! owner, and the assignee when one is set, always have a row in
//! `project_members`; the lifecycle manager maintains that invariant.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE project_status AS ENUM ('active', 'completed', 'on_hold', 'cancelled');
//!
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     name TEXT NOT NULL,
//!     description TEXT,
//!     status project_status NOT NULL DEFAULT 'active',
//!     owner_id TEXT NOT NULL REFERENCES users(id),
//!     assigned_to TEXT REFERENCES users(id) ON DELETE SET NULL,
//!     start_date DATE,
//!     due_date DATE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE project_members (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (project_id, user_id)
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::document::Document;
use super::user::UserSummary;

/// Project status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "on_hold" => Ok(ProjectStatus::OnHold),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

/// Project owned by a single user within an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// Owning organization (internal id)
    pub org_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub status: ProjectStatus,

    /// User who created the project
    pub owner_id: String,

    /// Optional assignee; always also a project member
    pub assigned_to: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Row to insert when creating a project
///
/// Status is not part of the input: new projects always start `active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub assigned_to: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Full replacement of a project's mutable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectChanges {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

/// Project membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMembership {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Project joined with its owner's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
}

/// Project joined with its owner and documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub documents: Vec<Document>,
}

/// Project membership joined with the member's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWithUser {
    #[serde(flatten)]
    pub membership: ProjectMembership,
    pub user: Option<UserSummary>,
}
