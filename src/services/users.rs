//! User directory
//!
//! Resolves a bearer token to the user that owns it via the Supabase auth
//! API, then adds the display name from `user_profiles` when it can.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::DirectoryError;
use super::supabase_message;
use crate::config::SupabaseConfig;

/// The caller behind an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    /// User id (owner id for persisted rows)
    pub id: String,
    /// Email address, if the account has one
    pub email: Option<String>,
    /// Profile username, empty when unknown
    pub username: String,
    /// The token the user was resolved from
    #[serde(skip)]
    pub access_token: String,
}

/// Looks up users by access token
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve `access_token` to a user
    async fn get_user(&self, access_token: &str) -> Result<AuthenticatedUser, DirectoryError>;
}

#[derive(Deserialize)]
struct AuthUserResponse {
    id: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct ProfileRow {
    username: Option<String>,
}

/// [`UserDirectory`] backed by Supabase
pub struct SupabaseUserDirectory {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseUserDirectory {
    /// Build a directory from configuration
    pub fn from_config(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.key.clone(),
        }
    }

    /// Username from `user_profiles`, empty on any failure
    async fn username_for(&self, user_id: &str, access_token: &str) -> String {
        let url = format!("{}/rest/v1/user_profiles", self.base_url);
        let filter = format!("eq.{}", user_id);

        let result = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .query(&[("select", "username"), ("id", filter.as_str())])
            .send()
            .await;

        let rows: Vec<ProfileRow> = match result {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or_default()
            }
            Ok(response) => {
                tracing::debug!(
                    status_code = response.status().as_u16(),
                    "Profile lookup returned error status"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Profile lookup failed");
                Vec::new()
            }
        };

        rows.into_iter()
            .find_map(|row| row.username)
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    async fn get_user(&self, access_token: &str) -> Result<AuthenticatedUser, DirectoryError> {
        if self.base_url.is_empty() {
            return Err(DirectoryError::NotConfigured);
        }

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status_code = status.as_u16(), "Access token rejected");
            return Err(DirectoryError::InvalidToken(
                supabase_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }

        let user: AuthUserResponse = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::Transport(format!("Failed to parse user: {}", e)))?;
        let id = user
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DirectoryError::InvalidToken("No user for token".to_string()))?;

        let username = self.username_for(&id, access_token).await;

        Ok(AuthenticatedUser {
            id,
            email: user.email,
            username,
            access_token: access_token.to_string(),
        })
    }
}
