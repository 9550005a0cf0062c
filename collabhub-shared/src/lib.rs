//! # CollabHub Shared Library
//!
//! Identity synchronization and authorization for the CollabHub
//! project-collaboration service, shared by the API server and the sync job.
//!
//! ## Module Organization
//!
//! - `models`: Records and joined result shapes
//! - `store`: Store capability (PostgreSQL and in-memory)
//! - `db`: Connection pool management
//! - `directory`: Tenant resolution from provider organization ids
//! - `webhook`: Signed identity-provider event processing
//! - `auth`: Caller identity and the authorization guard
//! - `lifecycle`: Project, membership, document and note operations
//! - `storage`: Blob storage capability for document files
//! - `invalidation`: Stale-view announcements after writes
//! - `sync`: Full reconciliation against the identity provider
//! - `error`: Typed operation failures

pub mod auth;
pub mod db;
pub mod directory;
pub mod error;
pub mod invalidation;
pub mod lifecycle;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;
pub mod webhook;

pub use error::{ServiceError, ServiceResult};

/// Current version of the CollabHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
