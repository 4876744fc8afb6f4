//! Speech recognition API handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::api::utils::{read_audio_form, with_deadline, AudioForm};
use crate::error::AppError;
use crate::state::AppState;

/// Recognize-from-address request
#[derive(Debug, Deserialize)]
pub struct RecognizeUrlRequest {
    /// Public address of audio already in object storage
    pub file_url: String,
    /// Caller-supplied API key (falls back to the configured key)
    pub api_key: Option<String>,
}

/// Recognition response
#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    /// Transcript, one segment per line
    pub text: String,
}

/// POST /api/asr/recognize-url - Recognize audio the caller already uploaded
///
/// The object belongs to the caller and is never deleted here.
pub async fn recognize_from_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecognizeUrlRequest>,
) -> Result<Json<RecognizeResponse>, AppError> {
    let file_url = request.file_url.trim();
    if file_url.is_empty() {
        return Err(AppError::InvalidRequest(
            "file_url cannot be empty".to_string(),
        ));
    }

    let orchestrator = state.polling_orchestrator();
    let text = with_deadline(state.recognition_ceiling(), async {
        Ok::<_, AppError>(orchestrator
            .run(file_url, request.api_key.as_deref())
            .await?)
    })
    .await?;

    Ok(Json(RecognizeResponse { text }))
}

/// POST /api/asr/recognize - Upload, recognize and clean up in one call
///
/// Multipart form with a `file` field and an optional `api_key` field. The
/// uploaded object is deleted before the response is sent, and also when
/// the request is abandoned or exceeds its deadline.
pub async fn recognize_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<RecognizeResponse>, AppError> {
    let AudioForm {
        bytes,
        extension,
        api_key,
    } = read_audio_form(multipart).await?;
    let saga = state.upload_recognize_saga()?;

    tracing::info!(
        size = bytes.len(),
        extension = %extension,
        "Recognizing uploaded audio"
    );

    let text = with_deadline(state.recognition_ceiling(), async move {
        Ok::<_, AppError>(saga
            .recognize_uploaded_audio(bytes, &extension, api_key.as_deref())
            .await?)
    })
    .await?;

    Ok(Json(RecognizeResponse { text }))
}
