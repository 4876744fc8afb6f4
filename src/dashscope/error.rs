//! DashScope-specific error types
//!
//! Errors raised by the completion and recognition clients, and by the
//! polling state machine that drives recognition tasks.

use thiserror::Error;

/// Errors that can occur while invoking the completion endpoint
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Neither the request nor the configuration carries an API key
    #[error("No usable API key: supply one with the request or set BAILIAN_API_KEY")]
    Auth,

    /// The call exceeded the completion ceiling
    #[error("Completion timed out after {0} seconds; retry later or simplify the request")]
    Timeout(u64),

    /// The endpoint answered with a non-success status
    #[error("Completion endpoint returned HTTP {status}: {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Remote-supplied message, or a generic fallback
        message: String,
    },

    /// Any other network fault, or a body that is not JSON
    #[error("Completion request failed: {0}")]
    Transport(String),
}

/// Errors that can occur while recognizing audio
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Neither the request nor the configuration carries an API key
    #[error("No usable API key: supply one with the request or set BAILIAN_API_KEY")]
    Auth,

    /// The remote service refused the submission
    #[error("Failed to submit recognition task: {0}")]
    Submission(String),

    /// Network fault while submitting
    #[error("Recognition request failed: {0}")]
    Transport(String),

    /// Submission exceeded the per-call timeout
    #[error("Recognition request timed out after {0} seconds")]
    Timeout(u64),

    /// A status query failed
    #[error("Failed to query recognition task: {0}")]
    Query(String),

    /// The transcript document could not be retrieved or parsed
    #[error("Failed to fetch transcript: {0}")]
    Fetch(String),

    /// The remote task reached FAILED
    #[error("Recognition task failed: {0}")]
    RemoteTaskFailed(String),

    /// The remote task reached SUCCEEDED without a result address
    #[error("Recognition task {task_id} succeeded but returned no transcript address")]
    MissingResult {
        /// Remote task identifier
        task_id: String,
    },

    /// Polling ran out of attempts before a terminal state
    #[error("Recognition task {task_id} did not finish within {attempts} status checks")]
    PollingTimeout {
        /// Remote task identifier
        task_id: String,
        /// Number of queries made
        attempts: u32,
    },
}
