//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::orchestrator::polling::PollingPolicy;

/// Default DashScope API base URL
pub const DEFAULT_DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// DashScope (Bailian) completion configuration
    pub dashscope: DashScopeConfig,
    /// Speech recognition configuration
    pub recognition: RecognitionConfig,
    /// Object storage configuration
    pub oss: OssConfig,
    /// Supabase configuration (user lookup and plan persistence)
    pub supabase: SupabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
}

/// DashScope completion configuration
#[derive(Clone)]
pub struct DashScopeConfig {
    /// Fallback API key used when a request does not carry its own
    pub api_key: String,
    /// Application identifier for the completion endpoint
    pub app_id: String,
    /// API base URL (overridable for testing)
    pub base_url: String,
    /// Ceiling for a single completion call (in seconds)
    pub completion_timeout_secs: u64,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Recognition model name
    pub model: String,
    /// Language hints sent with every submission
    pub language_hints: Vec<String>,
    /// Timeout for each individual submit/query/fetch call (in seconds)
    pub request_timeout_secs: u64,
    /// Maximum number of status queries per task
    pub poll_max_attempts: u32,
    /// Fixed delay between status queries (in milliseconds)
    pub poll_interval_ms: u64,
    /// Caller-level ceiling for a whole upload-and-recognize request (in seconds)
    pub request_ceiling_secs: u64,
}

/// Object storage configuration
#[derive(Clone)]
pub struct OssConfig {
    /// Region identifier, e.g. `oss-cn-hangzhou`
    pub region: String,
    /// Region used for request signing
    pub signing_region: String,
    /// Access key id
    pub access_key_id: String,
    /// Access key secret
    pub access_key_secret: String,
    /// Bucket name
    pub bucket: String,
    /// Key prefix for uploaded audio
    pub audio_category: String,
}

/// Supabase configuration
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL
    pub url: String,
    /// Anonymous/service key sent as `apikey`
    pub key: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let region = env::var("OSS_REGION").unwrap_or_default();
        Self {
            server: ServerConfig {
                port: parse_env("PORT", 8000),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_origins: split_list(
                    &env::var("CORS_ORIGINS")
                        .unwrap_or_else(|_| "http://localhost:5173,http://localhost".to_string()),
                ),
            },
            dashscope: DashScopeConfig {
                api_key: env::var("BAILIAN_API_KEY").unwrap_or_default(),
                app_id: env::var("BAILIAN_APP_ID").unwrap_or_default(),
                base_url: env::var("DASHSCOPE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DASHSCOPE_BASE_URL.to_string()),
                completion_timeout_secs: parse_env("COMPLETION_TIMEOUT_SECS", 300),
            },
            recognition: RecognitionConfig {
                model: env::var("ASR_MODEL").unwrap_or_else(|_| "paraformer-v2".to_string()),
                language_hints: split_list(
                    &env::var("ASR_LANGUAGE_HINTS").unwrap_or_else(|_| "zh,en".to_string()),
                ),
                request_timeout_secs: parse_env("ASR_REQUEST_TIMEOUT_SECS", 30),
                poll_max_attempts: parse_env("ASR_POLL_MAX_ATTEMPTS", 60),
                poll_interval_ms: parse_env("ASR_POLL_INTERVAL_MS", 2000),
                request_ceiling_secs: parse_env("RECOGNITION_REQUEST_TIMEOUT_SECS", 180),
            },
            oss: OssConfig {
                signing_region: env::var("OSS_SIGNING_REGION").unwrap_or_else(|_| region.clone()),
                region,
                access_key_id: env::var("OSS_ACCESS_KEY_ID").unwrap_or_default(),
                access_key_secret: env::var("OSS_ACCESS_KEY_SECRET").unwrap_or_default(),
                bucket: env::var("OSS_BUCKET").unwrap_or_default(),
                audio_category: env::var("OSS_AUDIO_CATEGORY")
                    .unwrap_or_else(|_| "audio".to_string()),
            },
            supabase: SupabaseConfig {
                url: env::var("SUPABASE_URL").unwrap_or_default(),
                key: env::var("SUPABASE_KEY").unwrap_or_default(),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Polling policy derived from the recognition settings
    pub fn polling_policy(&self) -> PollingPolicy {
        PollingPolicy {
            max_attempts: self.recognition.poll_max_attempts,
            interval: Duration::from_millis(self.recognition.poll_interval_ms),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Secrets stay out of logs: `main` prints the loaded config at startup.
fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for DashScopeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashScopeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("app_id", &self.app_id)
            .field("base_url", &self.base_url)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for OssConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssConfig")
            .field("region", &self.region)
            .field("signing_region", &self.signing_region)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("access_key_secret", &redact(&self.access_key_secret))
            .field("bucket", &self.bucket)
            .field("audio_category", &self.audio_category)
            .finish()
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("key", &redact(&self.key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PORT",
        "CORS_ORIGINS",
        "BAILIAN_API_KEY",
        "COMPLETION_TIMEOUT_SECS",
        "ASR_POLL_MAX_ATTEMPTS",
        "ASR_POLL_INTERVAL_MS",
        "ASR_LANGUAGE_HINTS",
        "OSS_REGION",
        "OSS_SIGNING_REGION",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_match_documented_ceilings() {
        clear_vars();
        let config = Config::from_env();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.dashscope.completion_timeout_secs, 300);
        assert_eq!(config.dashscope.base_url, DEFAULT_DASHSCOPE_BASE_URL);
        assert_eq!(config.recognition.poll_max_attempts, 60);
        assert_eq!(config.recognition.poll_interval_ms, 2000);
        assert_eq!(config.recognition.language_hints, vec!["zh", "en"]);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173", "http://localhost"]
        );

        let policy = config.polling_policy();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.interval, Duration::from_secs(2));
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back_to_defaults() {
        clear_vars();
        env::set_var("PORT", "not-a-port");
        env::set_var("ASR_POLL_MAX_ATTEMPTS", "-3");
        env::set_var("ASR_POLL_INTERVAL_MS", "250");

        let config = Config::from_env();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.recognition.poll_max_attempts, 60);
        assert_eq!(config.recognition.poll_interval_ms, 250);

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_signing_region_defaults_to_region() {
        clear_vars();
        env::set_var("OSS_REGION", "oss-cn-hangzhou");

        let config = Config::from_env();
        assert_eq!(config.oss.signing_region, "oss-cn-hangzhou");

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_debug_output_redacts_secrets() {
        clear_vars();
        env::set_var("BAILIAN_API_KEY", "sk-super-secret");

        let config = Config::from_env();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-super-secret"));
        assert!(rendered.contains("<redacted>"));

        clear_vars();
    }
}
