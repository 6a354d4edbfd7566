//! Secret Manager access over its REST API

use super::{AccessTokenSource, SecretError, SecretProvider};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;

/// Default Secret Manager API endpoint
pub const SECRET_MANAGER_API_BASE_URL: &str = "https://secretmanager.googleapis.com";

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    /// Base64-encoded secret bytes
    data: String,
}

/// Fetches secret versions with `versions/{version}:access`
pub struct SecretManagerProvider {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    version: String,
    tokens: Box<dyn AccessTokenSource>,
}

impl SecretManagerProvider {
    /// Create a provider for `project_id`, reading `version` of each secret
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        version: impl Into<String>,
        tokens: Box<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            version: version.into(),
            tokens,
        }
    }

    fn url(&self, secret_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/secrets/{}/versions/{}:access",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            secret_id,
            self.version
        )
    }
}

/// Decode a `payload.data` field, trimming trailing newlines
fn decode_payload(secret_id: &str, data: &str) -> Result<String, SecretError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| SecretError::InvalidPayload(format!("'{}' is not base64: {}", secret_id, e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| SecretError::InvalidPayload(format!("'{}' is not UTF-8: {}", secret_id, e)))?;
    let text = text.trim_end_matches(['\r', '\n']);
    if text.is_empty() {
        return Err(SecretError::Empty(secret_id.to_string()));
    }
    Ok(text.to_string())
}

#[async_trait]
impl SecretProvider for SecretManagerProvider {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        let url = self.url(secret_id);
        tracing::debug!(
            secret_id = %secret_id,
            project_id = %self.project_id,
            version = %self.version,
            "Accessing secret version"
        );

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Request(format!("Secret Manager unreachable: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound(secret_id.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(
                secret_id = %secret_id,
                status_code = status.as_u16(),
                error_body = %body,
                "Failed to access secret"
            );
            return Err(SecretError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| SecretError::InvalidPayload(format!("invalid response: {}", e)))?;
        decode_payload(secret_id, &parsed.payload.data)
    }
}
