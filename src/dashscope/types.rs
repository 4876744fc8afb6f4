//! DashScope API request and response types
//!
//! Structs that mirror the DashScope JSON formats. Response types are
//! deliberately lenient (`#[serde(default)]`, `Option`) because the remote
//! envelope shape is not contractually fixed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form parameter object forwarded to the remote endpoint
pub type Parameters = serde_json::Map<String, Value>;

/// Request body for the application completion endpoint
#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    /// Prompt wrapper
    pub input: CompletionInput<'a>,
    /// Generation parameters
    pub parameters: &'a Parameters,
    /// Debug options
    pub debug: &'a Parameters,
}

/// Prompt wrapper for completion requests
#[derive(Serialize, Debug)]
pub struct CompletionInput<'a> {
    /// The prompt text
    pub prompt: &'a str,
}

/// Raw completion response
///
/// Kept as an untyped document; use [`CompletionEnvelope::primary_text`] or
/// [`crate::dashscope::extract_text`] to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionEnvelope {
    /// The full response document
    pub raw: Value,
}

impl CompletionEnvelope {
    /// Wrap a response document
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Text payload, if one of the known field paths holds a string
    ///
    /// Checks `output.text` first, then top-level `text`.
    pub fn primary_text(&self) -> Option<&str> {
        self.raw
            .get("output")
            .and_then(|output| output.get("text"))
            .and_then(Value::as_str)
            .or_else(|| self.raw.get("text").and_then(Value::as_str))
    }
}

/// Request body for submitting a transcription task
#[derive(Serialize, Debug)]
pub struct SubmitRequest<'a> {
    /// Recognition model
    pub model: &'a str,
    /// Audio input
    pub input: SubmitInput<'a>,
    /// Recognition parameters
    pub parameters: SubmitParameters<'a>,
}

/// Audio input for a transcription task
#[derive(Serialize, Debug)]
pub struct SubmitInput<'a> {
    /// Publicly readable audio addresses
    pub file_urls: Vec<&'a str>,
}

/// Parameters for a transcription task
#[derive(Serialize, Debug)]
pub struct SubmitParameters<'a> {
    /// Expected languages
    pub language_hints: &'a [String],
}

/// Response to a task submission
#[derive(Deserialize, Debug, Default)]
pub struct SubmitResponse {
    /// Task output (absent on malformed responses)
    #[serde(default)]
    pub output: Option<SubmitOutput>,
}

/// Output section of a submission response
#[derive(Deserialize, Debug, Default)]
pub struct SubmitOutput {
    /// Identifier of the created task
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Response to a task status query
#[derive(Deserialize, Debug, Default)]
pub struct TaskQueryResponse {
    /// Task output
    #[serde(default)]
    pub output: Option<TaskOutput>,
}

/// Output section of a status query
#[derive(Deserialize, Debug, Default)]
pub struct TaskOutput {
    /// Status string, e.g. `PENDING` or `SUCCEEDED`
    #[serde(default)]
    pub task_status: Option<String>,
    /// Per-file results
    #[serde(default)]
    pub results: Option<Vec<TaskResult>>,
    /// Task-level message (present on some failures)
    #[serde(default)]
    pub message: Option<String>,
}

/// Result for one submitted file
#[derive(Deserialize, Debug, Default)]
pub struct TaskResult {
    /// Address of the transcript document (success)
    #[serde(default)]
    pub transcription_url: Option<String>,
    /// Failure message (failure)
    #[serde(default)]
    pub message: Option<String>,
}

/// Transcript document fetched from `transcription_url`
#[derive(Deserialize, Debug)]
pub struct TranscriptDocument {
    /// Transcript segments in remote order
    #[serde(default)]
    pub transcripts: Vec<TranscriptSegment>,
}

/// One transcript segment
#[derive(Deserialize, Debug)]
pub struct TranscriptSegment {
    /// Recognized text
    pub text: String,
}
