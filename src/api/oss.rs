//! Object storage API handlers
//!
//! Objects uploaded here are handed to the caller, who is responsible for
//! deleting them.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::api::utils::read_audio_form;
use crate::error::AppError;
use crate::state::AppState;

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public address of the stored object
    pub file_url: String,
}

/// Delete request
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    /// Public address of the object to delete
    pub file_url: String,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether the object was deleted
    pub success: bool,
}

/// POST /api/oss/upload/audio - Store an audio file and return its address
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = read_audio_form(multipart).await?;
    let store = state.store()?;

    let file_url = store.store(form.bytes, &form.extension).await?;
    tracing::info!(address = %file_url, "Stored audio for caller");

    Ok(Json(UploadResponse { file_url }))
}

/// POST /api/oss/delete - Delete an object by address
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, AppError> {
    let store = state.store()?;
    let success = store.delete(request.file_url.trim()).await;

    Ok(Json(DeleteResponse { success }))
}
