//! Estimation module
//!
//! The estimation pipeline: prompt loading, the Gemini call with progress
//! reporting, result validation and persistence.

pub mod api_client;
pub mod error;
pub mod gemini_types;
pub mod materializer;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod types;

pub use api_client::{GeminiClient, Generation, GenerationService};
pub use error::{EstimationError, GenerationError};
pub use pipeline::{EstimationOutcome, EstimationPipeline, Stage};
pub use types::{EstimationRecord, EstimationRequest, EstimationResult, PromptPair, Provider};
