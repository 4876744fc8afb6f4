//! API module
//!
//! Contains HTTP request handlers and the route table

pub mod ai;
pub mod asr;
pub mod oss;
pub mod utils;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

/// Largest accepted request body (audio uploads)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Routes under `/api` (health routes are added by the binary)
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/completion", post(ai::invoke_completion))
        .route("/api/ai/generate-plan", post(ai::generate_plan))
        .route("/api/asr/recognize-url", post(asr::recognize_from_url))
        .route("/api/asr/recognize", post(asr::recognize_audio))
        .route("/api/oss/upload/audio", post(oss::upload_audio))
        .route("/api/oss/delete", post(oss::delete_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
