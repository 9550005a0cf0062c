//! In-process blob storage for tests and local runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobStorage, StorageError};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryBlobStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Request("upload unavailable".to_string()));
        }

        let mut objects = self.objects.write().await;
        if objects.contains_key(path) {
            return Err(StorageError::Rejected {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }

        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Request("delete unavailable".to_string()));
        }

        // Removing an absent key succeeds, as the REST API does.
        self.objects.write().await.remove(path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, StorageError> {
        if !self.contains(path).await {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(format!("memory://{}?expires_in={}", path, ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let storage = MemoryBlobStorage::new();
        storage
            .upload("p/a.pdf", Bytes::from_static(b"one"), "application/pdf")
            .await
            .unwrap();

        let err = storage
            .upload("p/a.pdf", Bytes::from_static(b"two"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { status: 409, .. }));
        assert_eq!(storage.get("p/a.pdf").await.unwrap().bytes, Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn test_signed_url_requires_object() {
        let storage = MemoryBlobStorage::new();
        assert!(storage.signed_url("missing", 60).await.is_err());

        storage.upload("p/a.pdf", Bytes::new(), "application/pdf").await.unwrap();
        assert_eq!(
            storage.signed_url("p/a.pdf", 60).await.unwrap(),
            "memory://p/a.pdf?expires_in=60"
        );
    }
}
