//! Estimation API handlers
//!
//! `POST /estimate` validates the request, reads the training parameters,
//! runs the estimation pipeline and reports the outcome. `GET /` and
//! `GET /health` describe the service.

use crate::error::AppError;
use crate::estimation::{EstimationRequest, Provider};
use crate::state::AppState;
use crate::storage::BlobLocation;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "ml-training-estimation";

/// Body of `POST /estimate`
#[derive(Deserialize, Debug, Default)]
pub struct EstimateRequest {
    /// Location of the training parameters / script
    pub params_path: Option<String>,
    /// Where the report is written
    pub output_path: Option<String>,
    /// Log the raw model response
    #[serde(default)]
    pub debug: bool,
}

/// Successful `POST /estimate` response
#[derive(Serialize, Debug)]
pub struct EstimateResponse {
    /// Always "success"
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Where the report was written
    pub output_path: String,
}

/// `GET /health` response
#[derive(Serialize, Debug)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}

/// Well-formed JSON with wrongly typed fields gets its own message
fn reject_body(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected estimate body");
    match rejection {
        JsonRejection::JsonDataError(e) => {
            AppError::BadRequest(format!("Invalid request body: {}", e.body_text()))
        }
        _ => AppError::BadRequest("No JSON data provided".to_string()),
    }
}

/// POST /estimate - Run one estimation
///
/// # Flow
/// 1. Validate `params_path` and `output_path` (no I/O yet)
/// 2. Check the API key was loaded at startup
/// 3. Read the parameters through the blob store
/// 4. Run the estimation pipeline
///
/// # Returns
/// * `Ok(Json<EstimateResponse>)` - Report written to `output_path`
/// * `Err(AppError)` - 400 for client errors, 404 for missing parameters,
///   500 for configuration or estimation failures
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, AppError> {
    let Json(body) = payload.map_err(reject_body)?;

    let params_path = required(body.params_path, "params_path")?;
    let output_path = required(body.output_path, "output_path")?;
    BlobLocation::parse_object(&output_path)
        .map_err(|e| AppError::BadRequest(format!("Invalid output_path: {}", e)))?;
    if !state.store.supports(&output_path) {
        return Err(AppError::BadRequest(format!(
            "Invalid output_path: no storage backend for {}",
            output_path
        )));
    }

    let api_key = state
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            AppError::Configuration("GEMINI_API_KEY not configured in Secret Manager".to_string())
        })?;

    let script_content = state
        .store
        .read_text(&params_path)
        .await
        .map_err(|source| AppError::ParamsUnavailable {
            path: params_path.clone(),
            source,
        })?;

    tracing::info!(
        params_path = %params_path,
        output_path = %output_path,
        debug = body.debug,
        params_len = script_content.len(),
        "Starting estimation"
    );

    let estimation = &state.config.estimation;
    let request = EstimationRequest {
        provider: Some(Provider::Gemini),
        script_content,
        output_path: output_path.clone(),
        debug: body.debug,
        api_key,
        model_id: estimation.model.clone(),
        system_prompt_path: estimation.system_prompt_path.clone(),
        user_prompt_template_path: estimation.user_prompt_template_path.clone(),
    };

    let outcome = state.pipeline.run(request).await;
    if !outcome.is_success() {
        return Err(AppError::from(outcome));
    }

    Ok(Json(EstimateResponse {
        status: "success".to_string(),
        message: "Estimation completed successfully".to_string(),
        output_path,
    }))
}

/// GET /health - Health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET / - API description
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "ML Training Resource Estimation API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "GET - Health check",
            "/estimate": "POST - Run estimation",
            "/": "GET - API documentation"
        },
        "usage": {
            "method": "POST",
            "url": "/estimate",
            "body": {
                "params_path": "Path to parameters file (gs://bucket/path or local path)",
                "output_path": "Output path (gs://bucket/path)",
                "debug": "Optional debug flag"
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(
            required(Some(" gs://b/p.txt ".to_string()), "params_path").unwrap(),
            "gs://b/p.txt"
        );
        let err = required(Some("   ".to_string()), "params_path").unwrap_err();
        assert_eq!(err.to_string(), "params_path is required");
        assert!(required(None, "output_path").is_err());
    }

    #[test]
    fn test_request_debug_defaults_to_false() {
        let body: EstimateRequest =
            serde_json::from_str(r#"{"params_path": "p", "output_path": "gs://b/o"}"#).unwrap();
        assert!(!body.debug);
    }
}
