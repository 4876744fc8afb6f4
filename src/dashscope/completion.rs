//! Completion endpoint client
//!
//! Invokes a Bailian application's `completion` capability and returns the
//! raw response envelope. Text extraction is separate and never fails, so
//! callers decide what an empty payload means.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CompletionError;
use super::types::{CompletionEnvelope, CompletionInput, CompletionRequest, Parameters};
use super::{remote_message, resolve_credential};
use crate::config::DashScopeConfig;

/// Sends prompts to a remote generation endpoint
#[async_trait]
pub trait CompletionInvoker: Send + Sync {
    /// Invoke the endpoint with `prompt` and return its raw envelope
    ///
    /// # Errors
    /// * `CompletionError::Auth` - no usable credential
    /// * `CompletionError::Timeout` - the call exceeded the ceiling
    /// * `CompletionError::Remote` - non-success HTTP status
    /// * `CompletionError::Transport` - any other network fault
    async fn invoke(
        &self,
        prompt: &str,
        credential: Option<&str>,
        parameters: &Parameters,
        debug: &Parameters,
    ) -> Result<CompletionEnvelope, CompletionError>;
}

/// Best-effort text payload of a completion envelope
///
/// Returns `output.text`, else top-level `text`, else an empty string.
pub fn extract_text(envelope: &CompletionEnvelope) -> String {
    envelope.primary_text().unwrap_or_default().to_string()
}

/// [`CompletionInvoker`] backed by the DashScope HTTP API
pub struct DashScopeCompletionClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    default_api_key: String,
    timeout: Duration,
}

impl DashScopeCompletionClient {
    /// Build a client from configuration, sharing `http` for connection pooling
    pub fn from_config(http: reqwest::Client, config: &DashScopeConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            default_api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.completion_timeout_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/apps/{}/completion", self.base_url, self.app_id)
    }

    fn transport_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.timeout.as_secs())
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionInvoker for DashScopeCompletionClient {
    async fn invoke(
        &self,
        prompt: &str,
        credential: Option<&str>,
        parameters: &Parameters,
        debug: &Parameters,
    ) -> Result<CompletionEnvelope, CompletionError> {
        let api_key =
            resolve_credential(credential, &self.default_api_key).ok_or(CompletionError::Auth)?;

        let url = self.endpoint();
        let request_body = CompletionRequest {
            input: CompletionInput { prompt },
            parameters,
            debug,
        };

        tracing::debug!(
            url = %url,
            prompt_len = prompt.len(),
            parameter_count = parameters.len(),
            "Calling completion endpoint"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let status_code = status.as_u16();
            tracing::error!(
                status_code = status_code,
                error_body = %body,
                "Completion endpoint returned error status"
            );
            return Err(CompletionError::Remote {
                status: status_code,
                message: remote_message(&body)
                    .unwrap_or_else(|| "Completion endpoint call failed".to_string()),
            });
        }

        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            CompletionError::Transport(format!(
                "Failed to parse JSON response: {} - Response body: {}",
                e, body
            ))
        })?;

        tracing::debug!(response_len = body.len(), "Completion endpoint responded");
        Ok(CompletionEnvelope::new(raw))
    }
}
