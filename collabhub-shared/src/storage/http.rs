//! Storage REST client (Supabase Storage API)
//!
//! | Operation  | Request                                              |
//! |------------|------------------------------------------------------|
//! | upload     | `POST   {base}/storage/v1/object/{bucket}/{path}`      |
//! | delete     | `DELETE {base}/storage/v1/object/{bucket}` `{prefixes}` |
//! | signed url | `POST   {base}/storage/v1/object/sign/{bucket}/{path}` |
//!
//! All requests authenticate with the service key.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{BlobStorage, StorageError};

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Service base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Clone)]
pub struct HttpBlobStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl HttpBlobStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn base(&self) -> String {
        format!("{}/storage/v1", self.config.url.trim_end_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
    }

    async fn check(response: reqwest::Response, path: &str) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }

        warn!(status = status.as_u16(), path = %path, "Storage request rejected");
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn request_error(err: reqwest::Error) -> StorageError {
    StorageError::Request(err.to_string())
}

#[async_trait]
impl BlobStorage for HttpBlobStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/object/{}/{}", self.base(), self.config.bucket, path);
        debug!(path = %path, size = bytes.len(), "Uploading object");

        let response = self
            .authorized(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(request_error)?;

        Self::check(response, path).await?;
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = format!("{}/object/{}", self.base(), self.config.bucket);
        debug!(path = %path, "Deleting object");

        let response = self
            .authorized(self.client.delete(url))
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(request_error)?;

        Self::check(response, path).await?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, StorageError> {
        let url = format!("{}/object/sign/{}/{}", self.base(), self.config.bucket, path);

        let response = self
            .authorized(self.client.post(url))
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(request_error)?;

        let signed: SignedUrlResponse = Self::check(response, path)
            .await?
            .json()
            .await
            .map_err(request_error)?;

        Ok(format!("{}{}", self.base(), signed.signed_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let storage = HttpBlobStorage::new(StorageConfig {
            url: "https://storage.example.com/".to_string(),
            service_key: "key".to_string(),
            bucket: "project-documents".to_string(),
        });
        assert_eq!(storage.base(), "https://storage.example.com/storage/v1");
    }
}
