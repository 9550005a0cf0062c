//! Organization (tenant) and organization membership models
//!
//! Both relations mirror the identity provider. `external_org_id` is the join
//! key every tenant-scoped lookup goes through; the internal `id` is a UUID
//! that never leaves this system.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     external_org_id TEXT NOT NULL UNIQUE,
//!     name TEXT NOT NULL,
//!     slug TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE org_members (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     role TEXT NOT NULL DEFAULT 'member',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (org_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Role assigned when the provider does not send one
pub const DEFAULT_ORG_ROLE: &str = "member";

/// Organization mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Internal organization id
    pub id: Uuid,

    /// Identity provider organization id (unique)
    pub external_org_id: String,

    pub name: String,

    pub slug: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for an idempotent organization upsert, keyed on `external_org_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOrganization {
    pub external_org_id: String,
    pub name: String,
    pub slug: String,
}

/// Organization membership mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrgMembership {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Organization membership joined with the member's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMemberWithUser {
    #[serde(flatten)]
    pub membership: OrgMembership,

    /// Member profile, absent if the user row has not been mirrored yet
    pub user: Option<UserSummary>,
}

/// Derives a URL slug from an organization name
///
/// Lower-cases the name and collapses whitespace runs into a single `-`.
///
/// # Example
///
/// ```
/// use collabhub_shared::models::organization::slugify;
///
/// assert_eq!(slugify("Acme  Corp"), "acme-corp");
/// ```
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalizes a provider role name
///
/// The provider namespaces roles (`org:admin`); the local store keeps the bare
/// name. Empty roles fall back to [`DEFAULT_ORG_ROLE`].
pub fn normalize_role(role: Option<&str>) -> String {
    match role.map(str::trim) {
        Some(role) if !role.is_empty() => role.strip_prefix("org:").unwrap_or(role).to_string(),
        _ => DEFAULT_ORG_ROLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme"), "acme");
        assert_eq!(slugify("  Acme \t Rocket   Works "), "acme-rocket-works");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_normalize_role() {
        assert_eq!(normalize_role(None), "member");
        assert_eq!(normalize_role(Some("")), "member");
        assert_eq!(normalize_role(Some("org:admin")), "admin");
        assert_eq!(normalize_role(Some("basic_member")), "basic_member");
    }
}
