//! Error types and error handling for the HTTP layer
//!
//! [`AppError`] converts to an HTTP response with a consistent
//! `{"status": "error", "message": ...}` body.

use crate::estimation::{EstimationError, EstimationOutcome};
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or incomplete client input
    #[error("{0}")]
    BadRequest(String),

    /// Server-side configuration is missing
    #[error("{0}")]
    Configuration(String),

    /// The parameters blob could not be read
    #[error("Failed to read {path}: {source}")]
    ParamsUnavailable {
        /// Location given by the client
        path: String,
        /// Underlying store error
        #[source]
        source: StorageError,
    },

    /// The estimation pipeline ended in failure
    #[error("Estimation failed: {0}")]
    EstimationFailed(#[source] EstimationError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ParamsUnavailable { source, .. } => match source {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::InvalidLocation { .. } | StorageError::UnsupportedScheme(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::EstimationFailed(cause) => match cause {
                EstimationError::RequestValidation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EstimationOutcome> for AppError {
    fn from(outcome: EstimationOutcome) -> Self {
        match outcome.error {
            Some(error) => AppError::EstimationFailed(error),
            None => AppError::Internal(anyhow::anyhow!(
                "estimation ended in stage {} without a cause",
                outcome.stage
            )),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
