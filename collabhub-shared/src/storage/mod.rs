//! Blob storage capability for document files
//!
//! Documents keep only an opaque object key; the bytes live in an external
//! object store reached through [`BlobStorage`].
//!
//! # Implementations
//!
//! - [`http::HttpBlobStorage`]: Supabase-compatible storage REST API
//! - [`memory::MemoryBlobStorage`]: in-process map for tests
//!
//! # Object keys
//!
//! Keys are `{project_id}/{unix_millis}-{random}.{ext}`: namespaced by
//! project, and randomized so two uploads of `report.pdf` never collide.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

pub mod http;
pub mod memory;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Transport failure talking to the storage service
    #[error("Storage request failed: {0}")]
    Request(String),

    /// The service answered with an error status
    #[error("Storage service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` under `path` without overwriting; returns the stored path
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str)
        -> Result<String, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Time-limited download URL
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, StorageError>;
}

/// Builds a fresh object key for a file uploaded to a project
pub fn object_path(project_id: Uuid, file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    let stem = format!("{}/{}-{}", project_id, Utc::now().timestamp_millis(), suffix);
    match extension(file_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    (!ext.is_empty()).then_some(ext)
}
