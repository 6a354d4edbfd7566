//! API module
//!
//! Contains HTTP request handlers and the route table

pub mod estimate;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the route table
///
/// Middleware (tracing, CORS, request ids) is layered on by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(estimate::root))
        .route("/health", get(estimate::health_check))
        .route("/estimate", post(estimate::estimate))
        .with_state(state)
}
