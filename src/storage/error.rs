//! Storage-specific error types

use thiserror::Error;

/// Errors that can occur while uploading an object
#[derive(Error, Debug)]
pub enum StorageError {
    /// The object store client could not be built from configuration
    #[error("Object store is not configured: {0}")]
    NotConfigured(String),

    /// The upload was rejected or the transport failed
    #[error("Failed to upload object {key}: {message}")]
    UploadFailed {
        /// Key the object was being written to
        key: String,
        /// Underlying failure
        message: String,
    },
}
