//! Upload → recognize → cleanup saga
//!
//! The recognition service can only read audio from a public address, so
//! uploaded audio is parked in object storage for the duration of the
//! task. The parked object is transient: it is deleted exactly once,
//! whatever happens after the upload succeeded.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use super::compensation::{with_compensation, Compensation};
use super::polling::PollingOrchestrator;
use crate::dashscope::RecognitionError;
use crate::storage::{RemoteObjectStore, StorageError};

/// An object created by an operation that is responsible for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    /// Public address of the object
    pub address: String,
    /// Correlation id of the operation that created it
    pub owning_operation: Uuid,
}

/// Errors from the upload-and-recognize saga
#[derive(Error, Debug)]
pub enum UploadRecognizeError {
    /// Upload failed; nothing was created
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Recognition failed after the upload; the object was cleaned up
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

/// Uploads audio, recognizes it, and deletes the upload
pub struct UploadRecognizeCleanupSaga {
    store: Arc<dyn RemoteObjectStore>,
    orchestrator: PollingOrchestrator,
}

impl UploadRecognizeCleanupSaga {
    /// Compose a saga from a store and an orchestrator
    pub fn new(store: Arc<dyn RemoteObjectStore>, orchestrator: PollingOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Upload `bytes`, recognize them, and return the transcript
    ///
    /// The compensating delete is attempted before this returns, whether
    /// recognition succeeded or not; its own failure is logged and never
    /// replaces the recognition outcome.
    pub async fn recognize_uploaded_audio(
        &self,
        bytes: Bytes,
        extension: &str,
        credential: Option<&str>,
    ) -> Result<String, UploadRecognizeError> {
        let operation_id = Uuid::new_v4();
        let size = bytes.len();

        let address = self.store.store(bytes, extension).await?;
        let handle = ObjectHandle {
            address,
            owning_operation: operation_id,
        };

        tracing::info!(
            operation_id = %operation_id,
            address = %handle.address,
            size = size,
            "Uploaded transient audio for recognition"
        );

        let cleanup = self.cleanup_for(&handle);
        let outcome =
            with_compensation(cleanup, self.orchestrator.run(&handle.address, credential)).await;

        Ok(outcome?)
    }

    fn cleanup_for(&self, handle: &ObjectHandle) -> Compensation {
        let store = Arc::clone(&self.store);
        let handle = handle.clone();

        Compensation::new("delete-transient-audio", async move {
            if store.delete(&handle.address).await {
                tracing::debug!(
                    operation_id = %handle.owning_operation,
                    address = %handle.address,
                    "Deleted transient audio"
                );
            } else {
                tracing::warn!(
                    operation_id = %handle.owning_operation,
                    address = %handle.address,
                    "Failed to delete transient audio; object may be orphaned"
                );
            }
        })
    }
}
