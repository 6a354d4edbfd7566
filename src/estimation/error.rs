//! Estimation-specific error types
//!
//! [`GenerationError`] covers the model call; [`EstimationError`] is the
//! taxonomy the pipeline reports to its caller.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while calling the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The request could not be sent or the response body could not be read
    #[error("Failed to send HTTP request to Gemini API: {0}")]
    Transport(String),

    /// HTTP 429 from the provider
    #[error("Gemini API rate limit exceeded (HTTP {status}): {body}")]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Any other non-success HTTP status
    #[error("Gemini API returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response envelope was not valid JSON
    #[error("Failed to parse JSON response from Gemini API: {0}")]
    InvalidResponse(String),

    /// The prompt was blocked by the provider
    #[error("Gemini API blocked the prompt: {0}")]
    Blocked(String),

    /// The response had no candidates
    #[error("Gemini API response contains no candidates")]
    NoCandidates,

    /// No structured output came back, or it was an empty list
    #[error("Gemini API returned no estimation records")]
    EmptyGeneration,

    /// Structured output did not match the estimation schema
    #[error("Gemini output does not match the estimation schema: {0}")]
    SchemaMismatch(String),
}

/// Failure taxonomy of an estimation run
#[derive(Error, Debug)]
pub enum EstimationError {
    /// Missing credential, model or template configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed client input
    #[error("Invalid request: {0}")]
    RequestValidation(String),

    /// A prompt asset is absent or empty
    #[error("Prompt '{path}' is unavailable: {reason}")]
    MissingPrompt {
        /// Location of the prompt
        path: String,
        /// What went wrong
        reason: String,
    },

    /// The user template lacks the substitution placeholder
    #[error("User prompt template '{path}' does not contain the {{USER_SCRIPT}} placeholder")]
    TemplateContract {
        /// Location of the template
        path: String,
    },

    /// The model call failed or returned nothing usable
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The report could not be serialized
    #[error("Failed to serialize estimation: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The report could not be written; the computed estimation is lost
    #[error("Failed to persist estimation to {path}: {source}")]
    Persistence {
        /// Output location
        path: String,
        /// Underlying store error
        #[source]
        source: StorageError,
    },
}

impl EstimationError {
    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            EstimationError::Configuration(_) => "configuration",
            EstimationError::RequestValidation(_) => "request_validation",
            EstimationError::MissingPrompt { .. } => "missing_prompt",
            EstimationError::TemplateContract { .. } => "template_contract",
            EstimationError::Generation(GenerationError::EmptyGeneration) => "empty_generation",
            EstimationError::Generation(_) => "generation",
            EstimationError::Serialization(_) => "serialization",
            EstimationError::Persistence { .. } => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_contract_message_names_placeholder() {
        let err = EstimationError::TemplateContract {
            path: "prompts/user.txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "User prompt template 'prompts/user.txt' does not contain the {USER_SCRIPT} placeholder"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            EstimationError::from(GenerationError::EmptyGeneration).kind(),
            "empty_generation"
        );
        assert_eq!(
            EstimationError::from(GenerationError::NoCandidates).kind(),
            "generation"
        );
    }
}
