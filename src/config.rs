//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::credentials::access_token::METADATA_BASE_URL;
use crate::credentials::secret_manager::SECRET_MANAGER_API_BASE_URL;
use crate::estimation::api_client::GEMINI_API_BASE_URL;
use crate::estimation::progress::DEFAULT_PROGRESS_INTERVAL;
use crate::storage::gcs::GCS_API_BASE_URL;
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Estimation configuration
    pub estimation: EstimationConfig,
    /// Secret retrieval configuration
    pub secrets: SecretsConfig,
    /// Storage configuration
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Model and prompt configuration, fixed for the life of the process
#[derive(Debug, Clone)]
pub struct EstimationConfig {
    /// Gemini model name
    pub model: String,
    /// Gemini API base URL
    pub gemini_api_base_url: String,
    /// Optional timeout on the Gemini call; `None` waits indefinitely
    pub gemini_timeout: Option<Duration>,
    /// Location of the system prompt
    pub system_prompt_path: String,
    /// Location of the user prompt template
    pub user_prompt_template_path: String,
    /// Interval between progress notices
    pub progress_interval: Duration,
}

/// Where the Gemini API key comes from
#[derive(Debug, Clone)]
pub struct SecretsConfig {
    /// GCP project holding the secret
    pub project_id: Option<String>,
    /// Secret id (also maps to an env var name, e.g. `GEMINI_API_KEY`)
    pub secret_id: String,
    /// Secret version
    pub version: String,
    /// Secret Manager API base URL
    pub api_base_url: String,
}

/// Remote storage endpoints
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Cloud Storage API base URL
    pub gcs_api_base_url: String,
    /// GCE metadata server, for access tokens
    pub metadata_base_url: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            estimation: EstimationConfig {
                model: env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string()),
                gemini_api_base_url: env::var("GEMINI_API_BASE_URL")
                    .unwrap_or_else(|_| GEMINI_API_BASE_URL.to_string()),
                gemini_timeout: env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .filter(|&t: &u64| t > 0)
                    .map(Duration::from_secs),
                system_prompt_path: env::var("SYSTEM_PROMPT_PATH")
                    .unwrap_or_else(|_| "prompts/system_prompt.txt".to_string()),
                user_prompt_template_path: env::var("USER_PROMPT_TEMPLATE_PATH")
                    .unwrap_or_else(|_| "prompts/user_prompt_template.txt".to_string()),
                progress_interval: env::var("PROGRESS_INTERVAL_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .filter(|&t: &u64| t > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            },
            secrets: SecretsConfig {
                project_id: env::var("GCP_PROJECT_ID").ok().filter(|p| !p.is_empty()),
                secret_id: env::var("GEMINI_SECRET_ID")
                    .unwrap_or_else(|_| "gemini_api_key".to_string()),
                version: env::var("GEMINI_SECRET_VERSION")
                    .unwrap_or_else(|_| "latest".to_string()),
                api_base_url: env::var("SECRET_MANAGER_API_BASE_URL")
                    .unwrap_or_else(|_| SECRET_MANAGER_API_BASE_URL.to_string()),
            },
            storage: StorageConfig {
                gcs_api_base_url: env::var("GCS_API_BASE_URL")
                    .unwrap_or_else(|_| GCS_API_BASE_URL.to_string()),
                metadata_base_url: env::var("GCE_METADATA_HOST")
                    .map(|host| format!("http://{}", host))
                    .unwrap_or_else(|_| METADATA_BASE_URL.to_string()),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "PORT",
        "GEMINI_MODEL",
        "GEMINI_TIMEOUT_SECS",
        "PROGRESS_INTERVAL_SECS",
        "GCP_PROJECT_ID",
        "GCE_METADATA_HOST",
        "SECRET_MANAGER_API_BASE_URL",
    ];

    #[test]
    #[serial]
    fn test_defaults() {
        for var in VARS {
            env::remove_var(var);
        }
        let config = Config::from_env();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server_addr(), format!("{}:8080", config.server.host));
        assert_eq!(config.estimation.model, "gemini-2.0-flash-exp");
        assert_eq!(config.estimation.gemini_timeout, None);
        assert_eq!(config.estimation.progress_interval, Duration::from_secs(5));
        assert_eq!(
            config.estimation.user_prompt_template_path,
            "prompts/user_prompt_template.txt"
        );
        assert_eq!(config.secrets.secret_id, "gemini_api_key");
        assert!(config.secrets.project_id.is_none());
        assert_eq!(config.secrets.api_base_url, SECRET_MANAGER_API_BASE_URL);
        assert_eq!(config.storage.metadata_base_url, METADATA_BASE_URL);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        env::set_var("PORT", "9090");
        env::set_var("GEMINI_TIMEOUT_SECS", "120");
        env::set_var("PROGRESS_INTERVAL_SECS", "0");
        env::set_var("GCP_PROJECT_ID", "demo-project");
        env::set_var("GCE_METADATA_HOST", "127.0.0.1:8888");

        let config = Config::from_env();
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.estimation.gemini_timeout,
            Some(Duration::from_secs(120))
        );
        // zero falls back to the default
        assert_eq!(config.estimation.progress_interval, Duration::from_secs(5));
        assert_eq!(config.secrets.project_id.as_deref(), Some("demo-project"));
        assert_eq!(config.storage.metadata_base_url, "http://127.0.0.1:8888");

        for var in VARS {
            env::remove_var(var);
        }
    }
}
