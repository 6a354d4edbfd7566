//! Credential retrieval
//!
//! Two concerns live here: the [`SecretProvider`] used once at startup to
//! obtain the Gemini API key, and the [`AccessTokenSource`] used by Cloud
//! Storage and Secret Manager requests.

pub mod access_token;
pub mod env;
pub mod secret_manager;

pub use access_token::{AccessTokenSource, MetadataTokenSource, StaticTokenSource};
pub use env::EnvSecretProvider;
pub use secret_manager::SecretManagerProvider;

use crate::config::Config;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while fetching secrets or access tokens
#[derive(Error, Debug)]
pub enum SecretError {
    /// No credential source is configured
    #[error("No credential source configured: {0}")]
    NotConfigured(String),

    /// The secret does not exist or is not set
    #[error("Secret '{0}' not found")]
    NotFound(String),

    /// The secret exists but is empty
    #[error("Secret '{0}' is empty")]
    Empty(String),

    /// The secret payload could not be decoded
    #[error("Invalid secret payload: {0}")]
    InvalidPayload(String),

    /// Secret Manager answered with a non-success status
    #[error("Secret Manager returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// HTTP failure talking to a token or secret endpoint
    #[error("Credential request failed: {0}")]
    Request(String),
}

/// Opaque source of named secrets
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the current value of `secret_id`
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Timeout applied to startup credential requests
const SECRET_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the provider selected by configuration
///
/// A key set directly in the environment wins; otherwise Secret Manager is
/// queried when a project is configured, authenticated with the runtime
/// service account.
pub fn provider_from_config(
    config: &Config,
    client: reqwest::Client,
) -> Result<Box<dyn SecretProvider>, SecretError> {
    let secrets = &config.secrets;
    if EnvSecretProvider::has(&secrets.secret_id) {
        return Ok(Box::new(EnvSecretProvider::new()));
    }

    match &secrets.project_id {
        Some(project) => {
            let tokens =
                access_token::from_env(client.clone(), &config.storage.metadata_base_url);
            Ok(Box::new(SecretManagerProvider::new(
                client,
                &secrets.api_base_url,
                project,
                &secrets.version,
                tokens,
            )))
        }
        None => Err(SecretError::NotConfigured(format!(
            "set {} or GCP_PROJECT_ID",
            EnvSecretProvider::var_name(&secrets.secret_id)
        ))),
    }
}

/// Fetch the Gemini API key using the configured provider
pub async fn load_api_key(config: &Config) -> Result<String, SecretError> {
    let client = reqwest::Client::builder()
        .timeout(SECRET_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SecretError::Request(e.to_string()))?;
    let provider = provider_from_config(config, client)?;
    let key = provider.fetch(&config.secrets.secret_id).await?;
    tracing::info!(secret_id = %config.secrets.secret_id, "Successfully retrieved secret");
    Ok(key)
}
