//! Speech recognition task client
//!
//! The recognition API is asynchronous: a submission returns a task id,
//! the task is then queried until it reaches a terminal state, and the
//! transcript itself lives in a separate document whose address is
//! reported by the finished task.

use std::time::Duration;

use async_trait::async_trait;

use super::error::RecognitionError;
use super::types::{
    SubmitInput, SubmitParameters, SubmitRequest, SubmitResponse, TaskQueryResponse,
    TranscriptDocument,
};
use super::{remote_message, resolve_credential};
use crate::config::{DashScopeConfig, RecognitionConfig};

/// Status of a remote recognition task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued
    Pending,
    /// Processing
    Running,
    /// Finished with a result
    Succeeded,
    /// Finished with an error
    Failed,
    /// Any status string this client does not recognize (non-terminal)
    Unknown(String),
}

impl TaskStatus {
    /// Parse the remote status string
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("PENDING") => TaskStatus::Pending,
            Some("RUNNING") => TaskStatus::Running,
            Some("SUCCEEDED") => TaskStatus::Succeeded,
            Some("FAILED") => TaskStatus::Failed,
            other => TaskStatus::Unknown(other.unwrap_or_default().to_string()),
        }
    }
}

/// Snapshot of a remote recognition task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionTask {
    /// Remote task identifier
    pub task_id: String,
    /// Status at the time of the query
    pub status: TaskStatus,
    /// Transcript document address (set once succeeded)
    pub result_address: Option<String>,
    /// Remote failure message (set when failed)
    pub failure_message: Option<String>,
}

impl RecognitionTask {
    fn from_response(task_id: &str, response: TaskQueryResponse) -> Self {
        let output = response.output.unwrap_or_default();
        let first_result = output.results.and_then(|results| results.into_iter().next());

        let (result_address, result_message) = match first_result {
            Some(result) => (result.transcription_url, result.message),
            None => (None, None),
        };

        Self {
            task_id: task_id.to_string(),
            status: TaskStatus::parse(output.task_status.as_deref()),
            result_address: result_address.filter(|url| !url.trim().is_empty()),
            failure_message: result_message
                .or(output.message)
                .filter(|msg| !msg.trim().is_empty()),
        }
    }
}

/// Submits, queries and collects remote recognition tasks
#[async_trait]
pub trait RecognitionTaskClient: Send + Sync {
    /// Submit the audio at `object_address`; returns the task id
    async fn submit(
        &self,
        object_address: &str,
        credential: Option<&str>,
    ) -> Result<String, RecognitionError>;

    /// Fetch a fresh snapshot of `task_id`
    async fn query(
        &self,
        task_id: &str,
        credential: Option<&str>,
    ) -> Result<RecognitionTask, RecognitionError>;

    /// Retrieve the transcript document and join its segments with newlines
    async fn fetch_transcript(&self, result_address: &str) -> Result<String, RecognitionError>;
}

/// [`RecognitionTaskClient`] backed by the DashScope HTTP API
pub struct DashScopeRecognitionClient {
    http: reqwest::Client,
    base_url: String,
    default_api_key: String,
    model: String,
    language_hints: Vec<String>,
    timeout: Duration,
}

impl DashScopeRecognitionClient {
    /// Build a client from configuration, sharing `http` for connection pooling
    pub fn from_config(
        http: reqwest::Client,
        dashscope: &DashScopeConfig,
        recognition: &RecognitionConfig,
    ) -> Self {
        Self {
            http,
            base_url: dashscope.base_url.trim_end_matches('/').to_string(),
            default_api_key: dashscope.api_key.clone(),
            model: recognition.model.clone(),
            language_hints: recognition.language_hints.clone(),
            timeout: Duration::from_secs(recognition.request_timeout_secs),
        }
    }

    fn api_key(&self, credential: Option<&str>) -> Result<String, RecognitionError> {
        resolve_credential(credential, &self.default_api_key).ok_or(RecognitionError::Auth)
    }
}

#[async_trait]
impl RecognitionTaskClient for DashScopeRecognitionClient {
    async fn submit(
        &self,
        object_address: &str,
        credential: Option<&str>,
    ) -> Result<String, RecognitionError> {
        let api_key = self.api_key(credential)?;
        let url = format!("{}/services/audio/asr/transcription", self.base_url);
        let request_body = SubmitRequest {
            model: &self.model,
            input: SubmitInput {
                file_urls: vec![object_address],
            },
            parameters: SubmitParameters {
                language_hints: &self.language_hints,
            },
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .header("X-DashScope-Async", "enable")
            .header("X-DashScope-OssResourceResolve", "enable")
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::Timeout(self.timeout.as_secs())
                } else {
                    RecognitionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %body,
                "Recognition submission rejected"
            );
            return Err(RecognitionError::Submission(remote_message(&body).unwrap_or_else(
                || format!("remote service returned HTTP {}", status.as_u16()),
            )));
        }

        let parsed: SubmitResponse = serde_json::from_str(&body).map_err(|e| {
            RecognitionError::Submission(format!("unreadable response: {} - body: {}", e, body))
        })?;

        let task_id = parsed
            .output
            .and_then(|output| output.task_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                RecognitionError::Submission("response did not include a task id".to_string())
            })?;

        tracing::info!(task_id = %task_id, "Recognition task submitted");
        Ok(task_id)
    }

    async fn query(
        &self,
        task_id: &str,
        credential: Option<&str>,
    ) -> Result<RecognitionTask, RecognitionError> {
        let api_key = self.api_key(credential)?;
        let url = format!("{}/tasks/{}", self.base_url, task_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RecognitionError::Query(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Query(e.to_string()))?;

        if !status.is_success() {
            return Err(RecognitionError::Query(remote_message(&body).unwrap_or_else(
                || format!("remote service returned HTTP {}", status.as_u16()),
            )));
        }

        let parsed: TaskQueryResponse = serde_json::from_str(&body)
            .map_err(|e| RecognitionError::Query(format!("unreadable response: {}", e)))?;

        Ok(RecognitionTask::from_response(task_id, parsed))
    }

    async fn fetch_transcript(&self, result_address: &str) -> Result<String, RecognitionError> {
        let response = self
            .http
            .get(result_address)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RecognitionError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionError::Fetch(format!(
                "transcript document returned HTTP {}",
                status.as_u16()
            )));
        }

        let document: TranscriptDocument = response
            .json()
            .await
            .map_err(|e| RecognitionError::Fetch(e.to_string()))?;

        Ok(document
            .transcripts
            .into_iter()
            .map(|segment| segment.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
