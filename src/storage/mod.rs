//! Remote object storage
//!
//! Temporary home for uploaded audio. The recognition service reads the
//! object by its public address, so every store returns a URL rather than
//! a key.

pub mod error;
pub mod oss;

pub use error::StorageError;
pub use oss::OssObjectStore;

use async_trait::async_trait;
use bytes::Bytes;

/// Blob storage reachable by public address
#[async_trait]
pub trait RemoteObjectStore: Send + Sync {
    /// Upload `bytes` under a freshly generated key and return its public address
    async fn store(&self, bytes: Bytes, extension: &str) -> Result<String, StorageError>;

    /// Best-effort removal of the object behind `address`
    ///
    /// Returns `false` on any failure instead of an error: deletion is a
    /// cleanup side channel and must not mask the caller's own outcome.
    async fn delete(&self, address: &str) -> bool;
}
