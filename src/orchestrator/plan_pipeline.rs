//! Plan generation pipeline
//!
//! Asks the completion endpoint for a travel plan, reads the JSON document
//! out of the response text and normalizes it into a [`GeneratedPlanDraft`]
//! that is always complete enough to persist.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dashscope::{extract_text, CompletionError, CompletionInvoker, Parameters};

/// Title used when the model supplies none
pub const DEFAULT_TITLE: &str = "Untitled Plan";

/// Destination used when the model supplies none
pub const DEFAULT_DESTINATION: &str = "Unknown Destination";

/// Days between today and the default start date
pub const START_DATE_OFFSET_DAYS: u64 = 3;

/// Errors from the plan generation pipeline
#[derive(Error, Debug)]
pub enum PlanError {
    /// The completion call itself failed
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// The generated text is not a JSON object
    #[error("AI response is not a valid plan document: {reason} (raw text: {raw})")]
    MalformedResponse {
        /// Parser error or shape problem
        reason: String,
        /// The text that failed to parse
        raw: String,
    },
}

/// A generated travel plan with every field populated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPlanDraft {
    /// Plan title
    pub title: String,
    /// Destination name
    pub destination: String,
    /// Trip length in days
    pub days: i64,
    /// Total budget
    pub budget: f64,
    /// Number of travelers
    pub travelers: i64,
    /// Traveler preferences in model order
    pub preferences: Vec<String>,
    /// Start date, `YYYY-MM-DD` when defaulted
    pub start_date: String,
    /// Free-text summary
    pub summary: String,
    /// The full parsed document, kept for auditing
    #[serde(rename = "ai_response")]
    pub raw_document: Value,
}

/// Completion → parse → normalize
pub struct PlanGenerationPipeline {
    invoker: Arc<dyn CompletionInvoker>,
}

impl PlanGenerationPipeline {
    /// Create a pipeline over `invoker`
    pub fn new(invoker: Arc<dyn CompletionInvoker>) -> Self {
        Self { invoker }
    }

    /// Generate a plan draft from `prompt`
    ///
    /// Completion errors propagate unchanged; there is no retry here.
    pub async fn generate_plan(
        &self,
        prompt: &str,
        credential: Option<&str>,
        parameters: &Parameters,
    ) -> Result<GeneratedPlanDraft, PlanError> {
        let envelope = self
            .invoker
            .invoke(prompt, credential, parameters, &Parameters::new())
            .await?;
        let text = extract_text(&envelope);

        tracing::debug!(text_len = text.len(), "Parsing generated plan");
        parse_plan_draft(&text, Local::now().date_naive())
    }
}

/// Parse `text` as a plan document and apply field defaults
///
/// `today` anchors the default start date.
pub fn parse_plan_draft(text: &str, today: NaiveDate) -> Result<GeneratedPlanDraft, PlanError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| PlanError::MalformedResponse {
            reason: e.to_string(),
            raw: text.to_string(),
        })?;

    let Some(fields) = document.as_object() else {
        return Err(PlanError::MalformedResponse {
            reason: "expected a JSON object".to_string(),
            raw: text.to_string(),
        });
    };

    let start_date = text_field(fields, "start_date").unwrap_or_else(|| {
        today
            .checked_add_days(Days::new(START_DATE_OFFSET_DAYS))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string()
    });

    Ok(GeneratedPlanDraft {
        title: text_field(fields, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        destination: text_field(fields, "destination")
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
        days: integer_field(fields, "days").unwrap_or(1),
        budget: number_field(fields, "budget").unwrap_or(0.0),
        travelers: integer_field(fields, "travelers").unwrap_or(1),
        preferences: list_field(fields, "preferences"),
        start_date,
        summary: text_field(fields, "summary").unwrap_or_default(),
        raw_document: document.clone(),
    })
}

/// Trimmed, non-empty string value
fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer_field(fields: &Map<String, Value>, name: &str) -> Option<i64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// A non-list is normalized to empty, not rejected
fn list_field(fields: &Map<String, Value>, name: &str) -> Vec<String> {
    match fields.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
