//! Polling orchestrator
//!
//! Drives a recognition task from submission to a terminal state:
//!
//! ```text
//! SUBMITTED -> {PENDING, RUNNING}* -> SUCCEEDED -> fetch transcript
//!                                  -> FAILED    -> RemoteTaskFailed
//! (attempts exhausted)             -> PollingTimeout
//! ```
//!
//! Every iteration reads a fresh snapshot from the remote service; the
//! orchestrator never tracks status on its own.

use std::sync::Arc;
use std::time::Duration;

use crate::dashscope::{RecognitionError, RecognitionTaskClient, TaskStatus};

/// Message used when a failed task carries none
pub const DEFAULT_FAILURE_MESSAGE: &str = "Recognition task failed";

/// Bounds for the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Maximum number of status queries
    pub max_attempts: u32,
    /// Fixed delay between queries
    pub interval: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

/// Runs submit -> query* -> fetch against a [`RecognitionTaskClient`]
pub struct PollingOrchestrator {
    client: Arc<dyn RecognitionTaskClient>,
    policy: PollingPolicy,
}

impl PollingOrchestrator {
    /// Create an orchestrator over `client`
    pub fn new(client: Arc<dyn RecognitionTaskClient>, policy: PollingPolicy) -> Self {
        Self { client, policy }
    }

    /// The active polling bounds
    pub fn policy(&self) -> PollingPolicy {
        self.policy
    }

    /// Recognize the audio at `object_address` and return its transcript
    ///
    /// # Errors
    /// * Submission and query errors from the client, unchanged
    /// * `RecognitionError::RemoteTaskFailed` - the task reached FAILED
    /// * `RecognitionError::MissingResult` - SUCCEEDED without a result address
    /// * `RecognitionError::PollingTimeout` - no terminal state within `max_attempts`
    pub async fn run(
        &self,
        object_address: &str,
        credential: Option<&str>,
    ) -> Result<String, RecognitionError> {
        let task_id = self.client.submit(object_address, credential).await?;
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let snapshot = self.client.query(&task_id, credential).await?;

            tracing::debug!(
                task_id = %task_id,
                attempt = attempt,
                status = ?snapshot.status,
                "Polled recognition task"
            );

            match snapshot.status {
                TaskStatus::Succeeded => {
                    let Some(result_address) = snapshot.result_address else {
                        return Err(RecognitionError::MissingResult { task_id });
                    };
                    tracing::info!(task_id = %task_id, attempts = attempt, "Recognition task succeeded");
                    return self.client.fetch_transcript(&result_address).await;
                }
                TaskStatus::Failed => {
                    let message = snapshot
                        .failure_message
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                    tracing::warn!(task_id = %task_id, message = %message, "Recognition task failed");
                    return Err(RecognitionError::RemoteTaskFailed(message));
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::Unknown(_) => {}
            }

            // No point sleeping once the budget is spent
            if attempt < max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        tracing::warn!(
            task_id = %task_id,
            attempts = max_attempts,
            "Recognition task did not reach a terminal state"
        );
        Err(RecognitionError::PollingTimeout {
            task_id,
            attempts: max_attempts,
        })
    }
}
