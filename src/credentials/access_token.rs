//! OAuth access tokens for Google Cloud APIs

use super::SecretError;
use async_trait::async_trait;
use serde::Deserialize;

/// Default GCE metadata server
pub const METADATA_BASE_URL: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Supplies bearer tokens for authenticated requests
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String, SecretError>;
}

/// A fixed token, e.g. from `GOOGLE_OAUTH_ACCESS_TOKEN`
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, SecretError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Tokens for the runtime service account, from the metadata server
pub struct MetadataTokenSource {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataTokenSource {
    /// Create a source that talks to `base_url`
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for MetadataTokenSource {
    async fn access_token(&self) -> Result<String, SecretError> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretError::Request(format!("metadata server unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SecretError::Request(format!(
                "metadata server returned status {}",
                status.as_u16()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| SecretError::Request(format!("invalid token response: {}", e)))?;
        Ok(token.access_token)
    }
}

/// Pick a token source: `GOOGLE_OAUTH_ACCESS_TOKEN` if set, else the metadata server
pub fn from_env(client: reqwest::Client, metadata_base_url: &str) -> Box<dyn AccessTokenSource> {
    match std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => {
            Box::new(StaticTokenSource::new(token.trim()))
        }
        _ => Box::new(MetadataTokenSource::new(client, metadata_base_url)),
    }
}
