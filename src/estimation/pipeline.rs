//! Estimation orchestration
//!
//! Runs one estimation through a linear sequence of stages:
//!
//! `Init -> ValidateRequest -> LoadPrompts -> Invoke -> ValidateResult -> Persist -> Done`
//!
//! Any stage may end the run in `Failed`. [`EstimationPipeline::run`] never
//! returns an error: every failure becomes an [`EstimationOutcome`] carrying the
//! stage that failed and its cause.

use crate::estimation::api_client::{Generation, GenerationService};
use crate::estimation::error::{EstimationError, GenerationError};
use crate::estimation::gemini_types::GenerationConfig;
use crate::estimation::materializer::{self, ResultMaterializer};
use crate::estimation::progress::{
    LogSink, ProgressReporter, ProgressSink, DEFAULT_PROGRESS_INTERVAL,
};
use crate::estimation::prompts::PromptLoader;
use crate::estimation::types::{EstimationRequest, PromptPair};
use crate::storage::{BlobLocation, BlobStore};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing has run yet
    Init,
    /// Checking the request before any I/O
    ValidateRequest,
    /// Reading prompt templates
    LoadPrompts,
    /// Waiting on the model
    Invoke,
    /// Checking the structured output
    ValidateResult,
    /// Writing the report
    Persist,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ValidateRequest => "validate_request",
            Stage::LoadPrompts => "load_prompts",
            Stage::Invoke => "invoke",
            Stage::ValidateResult => "validate_result",
            Stage::Persist => "persist",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct EstimationOutcome {
    /// Terminal stage, `Done` or `Failed`
    pub stage: Stage,
    /// Stage that was running when the failure happened
    pub failed_at: Option<Stage>,
    /// Cause of the failure
    pub error: Option<EstimationError>,
    /// Number of records written on success
    pub records: usize,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl EstimationOutcome {
    fn done(records: usize, elapsed: Duration) -> Self {
        Self {
            stage: Stage::Done,
            failed_at: None,
            error: None,
            records,
            elapsed,
        }
    }

    fn failed(at: Stage, error: EstimationError, elapsed: Duration) -> Self {
        Self {
            stage: Stage::Failed,
            failed_at: Some(at),
            error: Some(error),
            records: 0,
            elapsed,
        }
    }

    /// True when the report was written
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Human-readable cause of a failure
    pub fn cause(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

/// Check a request before any storage or network access
///
/// # Errors
/// * `EstimationError::Configuration` - missing API key, model or template paths
/// * `EstimationError::RequestValidation` - missing provider, script or output path,
///   or an output path that does not address a concrete object
pub fn validate_request(request: &EstimationRequest) -> Result<(), EstimationError> {
    if request.provider.is_none() {
        return Err(EstimationError::RequestValidation(
            "provider is required (only 'gemini' is supported)".to_string(),
        ));
    }
    if request.api_key.trim().is_empty() {
        return Err(EstimationError::Configuration(
            "Missing API key for Gemini".to_string(),
        ));
    }
    if request.model_id.trim().is_empty() {
        return Err(EstimationError::Configuration(
            "Gemini model is not configured".to_string(),
        ));
    }
    if request.system_prompt_path.trim().is_empty()
        || request.user_prompt_template_path.trim().is_empty()
    {
        return Err(EstimationError::Configuration(
            "Prompt template locations are not configured".to_string(),
        ));
    }
    if request.script_content.trim().is_empty() {
        return Err(EstimationError::RequestValidation(
            "script content is empty".to_string(),
        ));
    }
    if request.output_path.trim().is_empty() {
        return Err(EstimationError::RequestValidation(
            "output_path is required".to_string(),
        ));
    }
    BlobLocation::parse_object(&request.output_path)
        .map_err(|e| EstimationError::RequestValidation(e.to_string()))?;
    Ok(())
}

/// Sequences prompt loading, generation and persistence
pub struct EstimationPipeline {
    store: Arc<dyn BlobStore>,
    generator: Arc<dyn GenerationService>,
    generation_config: GenerationConfig,
    progress_interval: Duration,
    progress_sink: Arc<dyn ProgressSink>,
}

impl EstimationPipeline {
    /// Create a pipeline with default generation parameters and log progress
    pub fn new(store: Arc<dyn BlobStore>, generator: Arc<dyn GenerationService>) -> Self {
        Self {
            store,
            generator,
            generation_config: GenerationConfig::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_sink: Arc::new(LogSink),
        }
    }

    /// Override progress reporting
    pub fn with_progress(mut self, interval: Duration, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_interval = interval;
        self.progress_sink = sink;
        self
    }

    /// Run one estimation to completion
    pub async fn run(&self, request: EstimationRequest) -> EstimationOutcome {
        let started = Instant::now();
        let mut stage = Stage::Init;

        match self.execute(&request, &mut stage).await {
            Ok(records) => {
                tracing::info!(
                    output_path = %request.output_path,
                    records = records,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Estimation completed"
                );
                EstimationOutcome::done(records, started.elapsed())
            }
            Err(error) => {
                tracing::error!(
                    stage = %stage,
                    kind = error.kind(),
                    error = %error,
                    "Gemini estimation failed"
                );
                EstimationOutcome::failed(stage, error, started.elapsed())
            }
        }
    }

    async fn execute(
        &self,
        request: &EstimationRequest,
        stage: &mut Stage,
    ) -> Result<usize, EstimationError> {
        enter(stage, Stage::ValidateRequest);
        validate_request(request)?;
        if !self.store.supports(&request.output_path) {
            return Err(EstimationError::RequestValidation(format!(
                "no storage backend can write to {}",
                request.output_path
            )));
        }

        enter(stage, Stage::LoadPrompts);
        let prompts = PromptLoader::new(self.store.clone())
            .load(
                &request.system_prompt_path,
                &request.user_prompt_template_path,
                &request.script_content,
            )
            .await?;

        enter(stage, Stage::Invoke);
        let generation = self.invoke(request, prompts).await?;
        if request.debug {
            tracing::info!(raw_response = %generation.raw_text, "Debug - raw Gemini response");
        }

        enter(stage, Stage::ValidateResult);
        materializer::validate(&generation.records)?;

        enter(stage, Stage::Persist);
        ResultMaterializer::new(self.store.clone())
            .persist(&generation.records, &request.output_path)
            .await?;

        enter(stage, Stage::Done);
        Ok(generation.records.len())
    }

    /// Call the model with the progress reporter running
    ///
    /// The reporter is stopped before the result, success or error, is
    /// looked at.
    async fn invoke(
        &self,
        request: &EstimationRequest,
        prompts: PromptPair,
    ) -> Result<Generation, GenerationError> {
        tracing::info!(model = %request.model_id, "Waiting for a response from Gemini...");

        let mut reporter =
            ProgressReporter::start(self.progress_interval, self.progress_sink.clone());
        let result = self
            .generator
            .generate(
                &request.api_key,
                &request.model_id,
                &prompts,
                &self.generation_config,
            )
            .await;
        reporter.stop().await;

        let generation = result?;
        tracing::info!(records = generation.records.len(), "Received response from Gemini");
        Ok(generation)
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "Estimation stage");
    *stage = next;
}
