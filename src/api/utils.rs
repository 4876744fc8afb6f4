//! API utility functions
//!
//! Request validation, bearer-token extraction, multipart audio parsing
//! and the overall deadline shared by the handlers.

use std::future::Future;
use std::time::Duration;

use axum::extract::Multipart;
use axum::http::{header, HeaderMap};
use bytes::Bytes;

use crate::error::AppError;

/// Maximum prompt length in characters
pub const MAX_PROMPT_LENGTH: usize = 10_000;

/// Extension used when an upload's filename has none
pub const DEFAULT_AUDIO_EXTENSION: &str = "wav";

/// Validate a prompt string
///
/// # Returns
/// * `Ok(())` - Prompt is valid
/// * `Err(AppError::InvalidRequest)` - Prompt is empty or too long
pub fn validate_prompt(prompt: &str) -> Result<(), AppError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(
            "Prompt cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_PROMPT_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "Prompt exceeds maximum length of {} characters",
            MAX_PROMPT_LENGTH
        )));
    }
    Ok(())
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Expected Authorization: Bearer <token>".to_string())
        })
}

/// Extension for an uploaded file: text after the last `.`, else `wav`
pub fn upload_extension(filename: Option<&str>) -> &str {
    filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_AUDIO_EXTENSION)
}

/// Audio upload parsed from a multipart form
#[derive(Debug)]
pub struct AudioForm {
    /// File contents
    pub bytes: Bytes,
    /// Extension derived from the filename
    pub extension: String,
    /// Optional caller-supplied API key
    pub api_key: Option<String>,
}

/// Read a `file` field and an optional `api_key` field
///
/// # Errors
/// * `AppError::InvalidRequest` - malformed form, missing or empty file
pub async fn read_audio_form(mut multipart: Multipart) -> Result<AudioForm, AppError> {
    let mut file: Option<(Bytes, String)> = None;
    let mut api_key: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::InvalidRequest(format!("Malformed multipart body: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let extension = upload_extension(field.file_name()).to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read uploaded file: {}", e))
                })?;
                file = Some((data, extension));
            }
            "api_key" => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read api_key field: {}", e))
                })?;
                if !text.trim().is_empty() {
                    api_key = Some(text);
                }
            }
            _ => {
                tracing::warn!("Unknown multipart field: {}", field_name);
            }
        }
    }

    let (bytes, extension) =
        file.ok_or_else(|| AppError::InvalidRequest("Missing file field".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("Uploaded file is empty".to_string()));
    }

    Ok(AudioForm {
        bytes,
        extension,
        api_key,
    })
}

/// Run `work` under an overall deadline
///
/// On expiry the work future is dropped, which also triggers any scoped
/// compensation it owns.
pub async fn with_deadline<T, F>(deadline: Duration, work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(deadline, work).await.map_err(|_| {
        AppError::Timeout(format!(
            "Request did not finish within {} seconds",
            deadline.as_secs()
        ))
    })?
}
