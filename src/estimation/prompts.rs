//! Prompt loading
//!
//! Reads the system prompt and the user prompt template through the blob
//! store and renders the user prompt by literal substitution of
//! [`USER_SCRIPT_PLACEHOLDER`].

use crate::estimation::error::EstimationError;
use crate::estimation::types::{PromptPair, USER_SCRIPT_PLACEHOLDER};
use crate::storage::{BlobStore, StorageError};
use std::sync::Arc;

/// Render the user prompt
///
/// Returns `None` when the template has no placeholder. Substitution is a
/// single literal pass: placeholders occurring inside `script` are left as is.
pub fn render_user_prompt(template: &str, script: &str) -> Option<String> {
    if !template.contains(USER_SCRIPT_PLACEHOLDER) {
        return None;
    }
    Some(template.replace(USER_SCRIPT_PLACEHOLDER, script))
}

/// Loads prompt pairs from a blob store
pub struct PromptLoader {
    store: Arc<dyn BlobStore>,
}

impl PromptLoader {
    /// Create a loader reading through `store`
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Load both prompts and substitute `script` into the template
    ///
    /// # Errors
    /// * `EstimationError::MissingPrompt` - either blob is absent, unreadable or empty
    /// * `EstimationError::TemplateContract` - the template lacks the placeholder
    pub async fn load(
        &self,
        system_path: &str,
        template_path: &str,
        script: &str,
    ) -> Result<PromptPair, EstimationError> {
        let system_text = self.read_prompt(system_path).await?;
        let template = self.read_prompt(template_path).await?;

        let user_text =
            render_user_prompt(&template, script).ok_or_else(|| EstimationError::TemplateContract {
                path: template_path.to_string(),
            })?;

        tracing::debug!(
            system_len = system_text.len(),
            user_len = user_text.len(),
            "Prompts loaded"
        );

        Ok(PromptPair::new(system_text, user_text))
    }

    async fn read_prompt(&self, path: &str) -> Result<String, EstimationError> {
        let missing = |reason: String| EstimationError::MissingPrompt {
            path: path.to_string(),
            reason,
        };

        let text = self.store.read_text(path).await.map_err(|e| match e {
            StorageError::NotFound(_) => missing("not found".to_string()),
            other => missing(other.to_string()),
        })?;

        if text.trim().is_empty() {
            return Err(missing("prompt is empty".to_string()));
        }
        Ok(text)
    }
}
