//! User model
//!
//! Users are mirrored from the external identity provider and are only ever
//! written by the webhook processor (or the reconciliation job). The primary
//! key is the provider's own user id, so redelivered `user.*` events upsert the
//! same row.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id TEXT PRIMARY KEY,
//!     email TEXT NOT NULL UNIQUE,
//!     first_name TEXT,
//!     last_name TEXT,
//!     avatar_url TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Identity provider user id
    pub id: String,

    /// Primary email address (unique)
    pub email: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for an idempotent user upsert, keyed on `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertUser {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Public projection of a user joined onto other records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Builds the joined projection used by list queries
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

impl UserSummary {
    /// Human-readable name, falling back to the email address
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(first: Option<&str>, last: Option<&str>) -> UserSummary {
        UserSummary {
            id: "user_1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(summary(Some("Ada"), Some("Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(summary(Some("Ada"), None).display_name(), "Ada");
        assert_eq!(summary(None, None).display_name(), "ada@example.com");
    }
}
