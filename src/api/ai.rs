//! AI API handlers
//!
//! Raw completion passthrough and the generate-and-save plan flow.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::utils::{bearer_token, validate_prompt};
use crate::dashscope::{extract_text, Parameters};
use crate::error::AppError;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

/// Completion request
#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    /// Prompt text
    pub prompt: String,
    /// Caller-supplied API key (falls back to the configured key)
    pub api_key: Option<String>,
    /// Generation parameters, forwarded as-is
    pub parameters: Option<Parameters>,
    /// Debug options, forwarded as-is
    pub debug: Option<Parameters>,
    /// Also return the extracted text (parsed as JSON when possible)
    #[serde(default = "default_true")]
    pub extract_text: bool,
}

/// Completion response
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    /// Raw response envelope
    pub data: Value,
    /// Extracted text, or the JSON it contains
    pub text: Option<Value>,
}

/// Generate-plan request
#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    /// Description of the trip
    pub prompt: String,
    /// Caller-supplied API key (falls back to the configured key)
    pub api_key: Option<String>,
    /// Generation parameters, forwarded as-is
    pub parameters: Option<Parameters>,
}

/// Generate-plan response
#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    /// Id of the persisted plan
    pub plan_id: String,
}

/// POST /api/ai/completion - Invoke the completion endpoint
pub async fn invoke_completion(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, AppError> {
    validate_prompt(&request.prompt)?;

    let envelope = state
        .completion()
        .invoke(
            &request.prompt,
            request.api_key.as_deref(),
            &request.parameters.unwrap_or_default(),
            &request.debug.unwrap_or_default(),
        )
        .await?;

    let text = request.extract_text.then(|| {
        let text = extract_text(&envelope);
        serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text))
    });

    Ok(Json(CompletionResponse {
        data: envelope.raw,
        text,
    }))
}

/// POST /api/ai/generate-plan - Generate a plan and save it for the caller
///
/// Requires `Authorization: Bearer <token>`; the plan is owned by the user
/// the token resolves to.
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<Json<GeneratePlanResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let user = state.users().get_user(token).await?;
    validate_prompt(&request.prompt)?;

    let draft = state
        .plan_pipeline()
        .generate_plan(
            &request.prompt,
            request.api_key.as_deref(),
            &request.parameters.unwrap_or_default(),
        )
        .await?;

    let plan_id = state
        .plans()
        .create_plan(&draft, &user.id, &user.access_token)
        .await?;

    tracing::info!(
        plan_id = %plan_id,
        user_id = %user.id,
        username = %user.username,
        destination = %draft.destination,
        "Generated travel plan"
    );

    Ok(Json(GeneratePlanResponse { plan_id }))
}
