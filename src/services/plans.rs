//! Plan repository
//!
//! Inserts generated plans into the `travel_plans` table through the
//! Supabase REST interface. The caller's access token is forwarded so
//! row-level security sees the real owner.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::PersistenceError;
use super::supabase_message;
use crate::config::SupabaseConfig;
use crate::orchestrator::GeneratedPlanDraft;

/// Stores generated plans
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert `draft` owned by `owner_id` and return the new plan id
    async fn create_plan(
        &self,
        draft: &GeneratedPlanDraft,
        owner_id: &str,
        access_token: &str,
    ) -> Result<String, PersistenceError>;
}

/// Row shape of `travel_plans`
#[derive(Serialize)]
struct NewPlanRow<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    draft: &'a GeneratedPlanDraft,
}

/// [`PlanRepository`] backed by Supabase REST
pub struct SupabasePlanRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabasePlanRepository {
    /// Build a repository from configuration
    pub fn from_config(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.key.clone(),
        }
    }
}

/// Id of the first returned row; ids may be text or numeric
fn first_row_id(rows: &Value) -> Option<String> {
    match rows.as_array()?.first()?.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[async_trait]
impl PlanRepository for SupabasePlanRepository {
    async fn create_plan(
        &self,
        draft: &GeneratedPlanDraft,
        owner_id: &str,
        access_token: &str,
    ) -> Result<String, PersistenceError> {
        if self.base_url.is_empty() {
            return Err(PersistenceError::NotConfigured);
        }

        let url = format!("{}/rest/v1/travel_plans", self.base_url);
        let row = NewPlanRow {
            user_id: owner_id,
            draft,
        };

        tracing::debug!(
            owner_id = %owner_id,
            destination = %draft.destination,
            days = draft.days,
            "Creating travel plan"
        );

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .json(&row)
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %body,
                "Plan insert rejected"
            );
            return Err(PersistenceError::Rejected {
                status: status.as_u16(),
                message: supabase_message(&body).unwrap_or_else(|| "Insert failed".to_string()),
            });
        }

        let rows: Value = serde_json::from_str(&body)
            .map_err(|e| PersistenceError::Transport(format!("Failed to parse response: {}", e)))?;
        let plan_id = first_row_id(&rows).ok_or(PersistenceError::EmptyResponse)?;

        tracing::info!(plan_id = %plan_id, owner_id = %owner_id, "Travel plan created");
        Ok(plan_id)
    }
}
