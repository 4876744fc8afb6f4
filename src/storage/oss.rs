//! Aliyun OSS object store
//!
//! Talks to OSS through its S3-compatible API. Objects are addressed by the
//! bucket's virtual-hosted public URL so the recognition service can fetch
//! them directly.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Local};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use uuid::Uuid;

use super::{RemoteObjectStore, StorageError};
use crate::config::OssConfig;

/// Provider domain appended to `<bucket>.<region>`
const PROVIDER_DOMAIN: &str = "aliyuncs.com";

/// Extension used when the caller supplies none
const DEFAULT_EXTENSION: &str = "wav";

/// OSS-backed [`RemoteObjectStore`]
pub struct OssObjectStore {
    inner: Arc<dyn ObjectStore>,
    host: String,
    category: String,
}

impl OssObjectStore {
    /// Build a store from configuration
    ///
    /// # Errors
    /// * `StorageError::NotConfigured` if bucket or region is missing or the
    ///   S3 client cannot be built
    pub fn from_config(config: &OssConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() || config.region.trim().is_empty() {
            return Err(StorageError::NotConfigured(
                "OSS_BUCKET and OSS_REGION must be set".to_string(),
            ));
        }

        let host = bucket_host(&config.bucket, &config.region);
        let store = AmazonS3Builder::new()
            .with_endpoint(format!("https://{}", host))
            .with_virtual_hosted_style_request(true)
            .with_region(&config.signing_region)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.access_key_secret)
            .build()
            .map_err(|e| StorageError::NotConfigured(e.to_string()))?;

        Ok(Self::with_backend(
            Arc::new(store),
            &config.bucket,
            &config.region,
            &config.audio_category,
        ))
    }

    /// Wrap an arbitrary backend (used by tests with an in-memory store)
    pub fn with_backend(
        inner: Arc<dyn ObjectStore>,
        bucket: &str,
        region: &str,
        category: &str,
    ) -> Self {
        Self {
            inner,
            host: bucket_host(bucket, region),
            category: category.to_string(),
        }
    }

    /// Public address for `key`
    pub fn public_address(&self, key: &str) -> String {
        format!("https://{}/{}", self.host, key)
    }

    /// Recover the object key from a public address
    ///
    /// Returns `None` when the address does not point into this bucket.
    pub fn key_from_address(&self, address: &str) -> Option<String> {
        let prefix = format!("https://{}/", self.host);
        address
            .trim()
            .strip_prefix(prefix.as_str())
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

fn bucket_host(bucket: &str, region: &str) -> String {
    format!("{}.{}.{}", bucket, region, PROVIDER_DOMAIN)
}

/// Build an object key: `<category>/<YYYYMMDD_HHMMSS>_<8-hex>.<ext>`
pub fn object_key(category: &str, extension: &str, now: DateTime<Local>) -> String {
    // Keys must survive path encoding unchanged so the address matches
    let extension = extension.trim().trim_start_matches('.');
    let extension = if !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        extension
    } else {
        DEFAULT_EXTENSION
    };
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}.{}",
        category,
        now.format("%Y%m%d_%H%M%S"),
        &suffix[..8],
        extension
    )
}

#[async_trait]
impl RemoteObjectStore for OssObjectStore {
    async fn store(&self, bytes: Bytes, extension: &str) -> Result<String, StorageError> {
        let key = object_key(&self.category, extension, Local::now());
        let size = bytes.len();

        self.inner
            .put(&StorePath::from(key.as_str()), PutPayload::from(bytes))
            .await
            .map_err(|e| StorageError::UploadFailed {
                key: key.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(key = %key, size = size, "Uploaded object");
        Ok(self.public_address(&key))
    }

    async fn delete(&self, address: &str) -> bool {
        let Some(key) = self.key_from_address(address) else {
            tracing::warn!(address = %address, "Refusing to delete address outside bucket");
            return false;
        };

        match self.inner.delete(&StorePath::from(key.as_str())).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Deleted object");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to delete object");
                false
            }
        }
    }
}
