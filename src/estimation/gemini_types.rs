//! Gemini API request and response types
//!
//! Structs that mirror the `generateContent` JSON format. Field names are
//! camelCase on the wire; response fields also accept snake_case.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Top-level Gemini API response
#[derive(Deserialize, Debug)]
pub struct GeminiApiResponse {
    /// List of candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Optional feedback about the prompt (e.g., if it was blocked)
    #[serde(default, rename = "promptFeedback", alias = "prompt_feedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate response from the model
#[derive(Deserialize, Debug)]
pub struct Candidate {
    /// The content of this candidate; absent when generation was cut off
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating (if applicable)
    #[serde(default, rename = "finishReason", alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

/// Content structure containing parts of the response
#[derive(Deserialize, Debug)]
pub struct Content {
    /// List of content parts (typically one text part)
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part of content
#[derive(Deserialize, Debug)]
pub struct Part {
    /// The text content of this part
    #[serde(default)]
    pub text: Option<String>,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug)]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default, rename = "blockReason", alias = "block_reason")]
    pub block_reason: Option<String>,
}

/// Request structure for the Gemini API
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// Conversation turns to send
    pub contents: Vec<RequestContent>,
    /// Generation parameters
    pub generation_config: GenerationConfig,
}

/// One conversation turn
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// Author role; Gemini only knows `user` and `model`
    pub role: String,
    /// List of content parts
    pub parts: Vec<RequestPart>,
}

impl RequestContent {
    /// A single-part turn from the caller
    pub fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![RequestPart {
                text: text.to_string(),
            }],
        }
    }
}

/// A single text part
#[derive(Serialize, Debug)]
pub struct RequestPart {
    /// The text content
    pub text: String,
}

/// Generation configuration for requests
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// MIME type to force for response (e.g., "application/json")
    pub response_mime_type: String,
    /// Structured-output schema
    pub response_schema: Value,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.7,
            top_k: 20,
            max_output_tokens: 4096,
            response_mime_type: "application/json".to_string(),
            response_schema: estimation_schema(),
        }
    }
}

/// Schema constraining the output to an array of estimation records
///
/// Every scalar is declared `STRING`; `propertyOrdering` keeps the model's
/// output in record field order.
pub fn estimation_schema() -> Value {
    use crate::estimation::types::EstimationRecord;

    let mut properties = serde_json::Map::new();
    for field in EstimationRecord::FIELDS {
        let schema = if field == "optimization_recommendations" {
            json!({ "type": "ARRAY", "items": { "type": "STRING" } })
        } else {
            json!({ "type": "STRING" })
        };
        properties.insert(field.to_string(), schema);
    }

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": EstimationRecord::FIELDS,
            "propertyOrdering": EstimationRecord::FIELDS,
        }
    })
}
