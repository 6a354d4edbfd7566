//! Estimation domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder in the user prompt template replaced by the script content
pub const USER_SCRIPT_PLACEHOLDER: &str = "{USER_SCRIPT}";

/// Generation provider
///
/// Only Gemini is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini over the Generative Language API
    Gemini,
}

impl Provider {
    /// Wire name of the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One estimation run, built per HTTP call
#[derive(Clone)]
pub struct EstimationRequest {
    /// Provider to call; `None` is rejected during validation
    pub provider: Option<Provider>,
    /// Content of the training script (or extracted parameters)
    pub script_content: String,
    /// Where the report is written
    pub output_path: String,
    /// Log the raw model response
    pub debug: bool,
    /// Gemini API key
    pub api_key: String,
    /// Model identifier, e.g. `gemini-2.0-flash-exp`
    pub model_id: String,
    /// Location of the system prompt
    pub system_prompt_path: String,
    /// Location of the user prompt template
    pub user_prompt_template_path: String,
}

impl fmt::Debug for EstimationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimationRequest")
            .field("provider", &self.provider)
            .field("script_len", &self.script_content.len())
            .field("output_path", &self.output_path)
            .field("debug", &self.debug)
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("system_prompt_path", &self.system_prompt_path)
            .field("user_prompt_template_path", &self.user_prompt_template_path)
            .finish()
    }
}

/// System instructions plus the rendered user prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    system_text: String,
    user_text: String,
}

impl PromptPair {
    /// Build a pair from already rendered texts
    pub fn new(system_text: String, user_text: String) -> Self {
        Self {
            system_text,
            user_text,
        }
    }

    /// System instructions
    pub fn system_text(&self) -> &str {
        &self.system_text
    }

    /// User prompt with the script substituted
    pub fn user_text(&self) -> &str {
        &self.user_text
    }
}

/// One resource estimate returned by the model
///
/// Every scalar is a free-form string, numeric quantities included; downstream
/// consumers read the report with this exact shape. Field order here is the
/// order written to the persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationRecord {
    /// Model architecture summary
    pub architecture: String,
    /// Parameter count
    pub parameters: String,
    /// Layer count
    pub layers: String,
    /// Recommended accelerator
    pub recommended_gpu: String,
    /// Accelerator memory requirement
    pub vram_required: String,
    /// CPU core sizing
    pub cpu_cores: String,
    /// Host memory sizing
    pub ram: String,
    /// Training duration estimate
    pub estimated_duration: String,
    /// Cost estimate in USD
    pub estimated_cost_usd: String,
    /// Cloud provider the cost refers to
    pub cloud_provider: String,
    /// Energy estimate in kWh
    pub estimated_kwh: String,
    /// Carbon estimate in kg CO2
    pub carbon_emission_kg: String,
    /// Free-text optimization suggestions
    pub optimization_recommendations: Vec<String>,
    /// Confidence label
    pub confidence_level: String,
}

impl EstimationRecord {
    /// String-valued fields, in schema order
    pub const STRING_FIELDS: [&'static str; 13] = [
        "architecture",
        "parameters",
        "layers",
        "recommended_gpu",
        "vram_required",
        "cpu_cores",
        "ram",
        "estimated_duration",
        "estimated_cost_usd",
        "cloud_provider",
        "estimated_kwh",
        "carbon_emission_kg",
        "confidence_level",
    ];

    /// Every field, in schema order
    pub const FIELDS: [&'static str; 14] = [
        "architecture",
        "parameters",
        "layers",
        "recommended_gpu",
        "vram_required",
        "cpu_cores",
        "ram",
        "estimated_duration",
        "estimated_cost_usd",
        "cloud_provider",
        "estimated_kwh",
        "carbon_emission_kg",
        "optimization_recommendations",
        "confidence_level",
    ];

    fn string_values(&self) -> [&str; 13] {
        [
            &self.architecture,
            &self.parameters,
            &self.layers,
            &self.recommended_gpu,
            &self.vram_required,
            &self.cpu_cores,
            &self.ram,
            &self.estimated_duration,
            &self.estimated_cost_usd,
            &self.cloud_provider,
            &self.estimated_kwh,
            &self.carbon_emission_kg,
            &self.confidence_level,
        ]
    }

    /// True when every string field and every recommendation is blank
    pub fn is_blank(&self) -> bool {
        self.string_values().iter().all(|v| v.trim().is_empty())
            && self
                .optimization_recommendations
                .iter()
                .all(|r| r.trim().is_empty())
    }

    /// Names of string fields left blank by the model
    pub fn blank_fields(&self) -> Vec<&'static str> {
        Self::STRING_FIELDS
            .iter()
            .zip(self.string_values())
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Ordered records, persisted verbatim
pub type EstimationResult = Vec<EstimationRecord>;
