//! Environment-variable secrets

use super::{SecretError, SecretProvider};
use async_trait::async_trait;

/// Reads secrets from environment variables
///
/// A secret id maps to the upper-cased variable name, so `gemini_api_key`
/// is read from `GEMINI_API_KEY`.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    /// Create the provider
    pub fn new() -> Self {
        Self
    }

    /// Environment variable that holds `secret_id`
    pub fn var_name(secret_id: &str) -> String {
        secret_id.to_ascii_uppercase().replace(['-', '.'], "_")
    }

    /// True when the variable for `secret_id` is set and non-empty
    pub fn has(secret_id: &str) -> bool {
        std::env::var(Self::var_name(secret_id))
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        let value = std::env::var(Self::var_name(secret_id))
            .map_err(|_| SecretError::NotFound(secret_id.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(SecretError::Empty(secret_id.to_string()));
        }
        Ok(value.to_string())
    }
}
