//! DashScope (Aliyun Bailian) clients
//!
//! Direct HTTP clients for the two remote services the backend orchestrates:
//! the application completion endpoint and the asynchronous speech
//! recognition task API. Both share one `reqwest::Client` handed in by the
//! caller (connection pooling), and both accept a per-request API key that
//! falls back to the configured default.

pub mod completion;
pub mod error;
pub mod recognition;
pub mod types;

pub use completion::{extract_text, CompletionInvoker, DashScopeCompletionClient};
pub use error::{CompletionError, RecognitionError};
pub use recognition::{DashScopeRecognitionClient, RecognitionTask, RecognitionTaskClient, TaskStatus};
pub use types::{CompletionEnvelope, Parameters};

/// Pick the credential for a call
///
/// A non-blank caller-supplied key wins; otherwise the configured fallback
/// is used if it is non-blank. `None` means no usable credential.
pub fn resolve_credential(supplied: Option<&str>, fallback: &str) -> Option<String> {
    supplied
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .or_else(|| Some(fallback.trim()).filter(|key| !key.is_empty()))
        .map(str::to_string)
}

/// Pull a human-readable message out of an error body
///
/// DashScope reports failures as `{"code": ..., "message": ...}`; some
/// gateways use `{"error": ...}` instead.
pub(crate) fn remote_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|field| value.get(*field).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}
