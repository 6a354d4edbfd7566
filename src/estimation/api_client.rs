//! Gemini API client
//!
//! Direct HTTP client for the `generateContent` endpoint with structured
//! (schema-constrained) JSON output.

use crate::estimation::error::GenerationError;
use crate::estimation::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, RequestContent,
};
use crate::estimation::types::{EstimationResult, PromptPair};
use async_trait::async_trait;

/// Default Generative Language API endpoint
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Output of one successful generation call
#[derive(Debug, Clone)]
pub struct Generation {
    /// Parsed, schema-conformant records
    pub records: EstimationResult,
    /// Raw text returned by the model, kept for debug logging
    pub raw_text: String,
}

/// A service that turns a prompt pair into estimation records
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Issue one generation call
    ///
    /// # Errors
    /// Returns `GenerationError` on transport or service failure, or when no
    /// non-empty structured result comes back.
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        prompts: &PromptPair,
        config: &GenerationConfig,
    ) -> Result<Generation, GenerationError>;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client using a shared `reqwest::Client` (connection pooling)
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the request body
    ///
    /// Gemini has no system role in `contents`, so both texts are sent as
    /// `user` turns, system instructions first.
    pub fn build_request(prompts: &PromptPair, config: &GenerationConfig) -> GeminiApiRequest {
        GeminiApiRequest {
            contents: vec![
                RequestContent::user(prompts.system_text()),
                RequestContent::user(prompts.user_text()),
            ],
            generation_config: config.clone(),
        }
    }
}

/// Extract and validate the structured output from a response body
pub fn parse_generation(response_body: &str) -> Result<Generation, GenerationError> {
    let parsed: GeminiApiResponse = serde_json::from_str(response_body).map_err(|e| {
        GenerationError::InvalidResponse(format!("{} - Response body: {}", e, response_body))
    })?;

    // Check for blocked prompt
    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
    {
        return Err(GenerationError::Blocked(reason.clone()));
    }

    let candidate = parsed
        .candidates
        .first()
        .ok_or(GenerationError::NoCandidates)?;

    let raw_text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if raw_text.trim().is_empty() {
        tracing::warn!(
            finish_reason = ?candidate.finish_reason,
            "Gemini API response carried no text"
        );
        return Err(GenerationError::EmptyGeneration);
    }

    let records: EstimationResult = serde_json::from_str(&raw_text)
        .map_err(|e| GenerationError::SchemaMismatch(e.to_string()))?;
    if records.is_empty() {
        return Err(GenerationError::EmptyGeneration);
    }

    Ok(Generation { records, raw_text })
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        prompts: &PromptPair,
        config: &GenerationConfig,
    ) -> Result<Generation, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model_id);
        let request_body = Self::build_request(prompts, config);

        tracing::debug!(
            url = %url,
            model = %model_id,
            system_len = prompts.system_text().len(),
            user_len = prompts.user_text().len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        // Check HTTP status
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %body,
                "Gemini API returned error status"
            );

            if status_code == 429 {
                return Err(GenerationError::RateLimited {
                    status: status_code,
                    body,
                });
            }
            return Err(GenerationError::Status {
                status: status_code,
                body,
            });
        }

        let response_body = response.text().await.map_err(|e| {
            GenerationError::Transport(format!("Failed to read response body: {}", e))
        })?;

        let generation = parse_generation(&response_body)?;

        tracing::debug!(
            records = generation.records.len(),
            response_len = generation.raw_text.len(),
            "Successfully received response from Gemini API"
        );

        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::test_support::{gemini_body, sample_record};
    use mockito::{Matcher, Server};
    use serial_test::serial;

    const MODEL: &str = "gemini-2.0-flash-exp";
    const PATH: &str = "/models/gemini-2.0-flash-exp:generateContent";

    fn prompts() -> PromptPair {
        PromptPair::new(
            "You estimate training resources.".to_string(),
            "Script: model X 7B params".to_string(),
        )
    }

    async fn call(base_url: &str) -> Result<Generation, GenerationError> {
        GeminiClient::new(reqwest::Client::new(), base_url)
            .generate("test-key", MODEL, &prompts(), &GenerationConfig::default())
            .await
    }

    #[test]
    fn test_build_request_shape() {
        let body = serde_json::to_value(GeminiClient::build_request(
            &prompts(),
            &GenerationConfig::default(),
        ))
        .unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "You estimate training resources.");
        assert_eq!(contents[1]["role"], "user");
        assert_eq!(contents[1]["parts"][0]["text"], "Script: model X 7B params");
        assert_eq!(body["generationConfig"]["topK"], 20);
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {
                    "topK": 20,
                    "maxOutputTokens": 4096,
                    "responseMimeType": "application/json"
                }
            })))
            .with_status(200)
            .with_body(gemini_body(&[sample_record()]))
            .create_async()
            .await;

        let generation = call(&server.url()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(generation.records, vec![sample_record()]);
        assert!(generation.raw_text.contains("\"parameters\""));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_empty_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(gemini_body(&[]))
            .create_async()
            .await;

        let err = call(&server.url()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyGeneration));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_no_candidates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = call(&server.url()).await.unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_blocked_prompt() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let err = call(&server.url()).await.unwrap_err();
        assert!(
            err.to_string().contains("blocked the prompt"),
            "Error message should contain 'blocked the prompt', got: {}",
            err
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_rate_limit() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(429)
            .with_body(r#"{"error": "Rate limit exceeded"}"#)
            .create_async()
            .await;

        let err = call(&server.url()).await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited { status: 429, .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let err = call(&server.url()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 500, .. }));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_generation("This is not JSON").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_parse_schema_mismatch() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"architecture\": \"CNN\"}]"}], "role": "model"}
            }]
        })
        .to_string();
        let err = parse_generation(&body).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaMismatch(_)));
    }

    #[test]
    fn test_parse_missing_content() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let err = parse_generation(body).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyGeneration));
    }

    #[test]
    fn test_parse_joins_text_parts() {
        let records = serde_json::to_string(&vec![sample_record()]).unwrap();
        let (head, tail) = records.split_at(records.len() / 2);
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": head}, {"text": tail}], "role": "model"}
            }]
        })
        .to_string();

        let generation = parse_generation(&body).unwrap();
        assert_eq!(generation.records, vec![sample_record()]);
    }
}
