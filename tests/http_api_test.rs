//! HTTP API tests
//!
//! Drive the router with `tower::ServiceExt::oneshot`, backed by in-memory
//! storage and a scripted generator.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use training_estimator::api;
use training_estimator::config::Config;
use training_estimator::estimation::gemini_types::GenerationConfig;
use training_estimator::estimation::{
    EstimationPipeline, EstimationRecord, Generation, GenerationError, GenerationService,
    PromptPair,
};
use training_estimator::state::AppState;
use training_estimator::storage::{BlobRouter, MemoryBlobStore};

struct FixedGenerator(Vec<EstimationRecord>);

#[async_trait]
impl GenerationService for FixedGenerator {
    async fn generate(
        &self,
        _api_key: &str,
        _model_id: &str,
        _prompts: &PromptPair,
        _config: &GenerationConfig,
    ) -> Result<Generation, GenerationError> {
        if self.0.is_empty() {
            return Err(GenerationError::EmptyGeneration);
        }
        Ok(Generation {
            raw_text: serde_json::to_string(&self.0).unwrap(),
            records: self.0.clone(),
        })
    }
}

fn record() -> EstimationRecord {
    EstimationRecord {
        architecture: "ResNet-50".to_string(),
        parameters: "25.6M".to_string(),
        layers: "50".to_string(),
        recommended_gpu: "4x V100".to_string(),
        vram_required: "64 GB".to_string(),
        cpu_cores: "32".to_string(),
        ram: "128 GB".to_string(),
        estimated_duration: "2 days".to_string(),
        estimated_cost_usd: "480".to_string(),
        cloud_provider: "GCP".to_string(),
        estimated_kwh: "150".to_string(),
        carbon_emission_kg: "55".to_string(),
        optimization_recommendations: vec!["Use mixed precision".to_string()],
        confidence_level: "medium".to_string(),
    }
}

struct TestApp {
    router: Router,
    remote: Arc<MemoryBlobStore>,
}

async fn app(api_key: Option<&str>, records: Vec<EstimationRecord>) -> TestApp {
    let config = Config::from_env();

    let local = Arc::new(MemoryBlobStore::new());
    local
        .insert(&config.estimation.system_prompt_path, "You estimate training resources.")
        .await;
    local
        .insert(&config.estimation.user_prompt_template_path, "Job:\n{USER_SCRIPT}")
        .await;
    local.insert("params/resnet.txt", "train resnet50 on imagenet").await;

    let remote = Arc::new(MemoryBlobStore::new());
    let store = Arc::new(BlobRouter::new(local).with_scheme("gs", remote.clone()));
    let pipeline = EstimationPipeline::new(store.clone(), Arc::new(FixedGenerator(records)));
    let state = AppState::new(config, store, pipeline, api_key.map(str::to_string));

    TestApp {
        router: api::router(Arc::new(state)),
        remote,
    }
}

async fn post_estimate(router: Router, body: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/estimate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let app = app(Some("key"), vec![record()]).await;
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ml-training-estimation");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let app = app(Some("key"), vec![record()]).await;
    let response = app
        .router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["endpoints"]["/estimate"].is_string());
}

#[tokio::test]
async fn test_estimate_success() {
    let app = app(Some("key"), vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "gs://reports/resnet.json"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "message": "Estimation completed successfully",
            "output_path": "gs://reports/resnet.json"
        })
    );
    let written = app.remote.get("gs://reports/resnet.json").await.unwrap();
    let parsed: Vec<EstimationRecord> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, vec![record()]);
}

#[tokio::test]
async fn test_estimate_request_errors() {
    let cases = [
        ("not json", "No JSON data provided"),
        (r#"{"output_path": "gs://reports/o.json"}"#, "params_path is required"),
        (r#"{"params_path": "params/resnet.txt"}"#, "output_path is required"),
    ];

    for (body, message) in cases {
        let app = app(Some("key"), vec![record()]).await;
        let (status, response) = post_estimate(app.router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(response["status"], "error");
        assert_eq!(response["message"], message);
    }
}

#[tokio::test]
async fn test_estimate_wrong_field_type() {
    let app = app(Some("key"), vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "gs://reports/o.json", "debug": "yes"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid request body:"), "{}", message);
    assert!(message.contains("debug"), "{}", message);
}

#[tokio::test]
async fn test_estimate_rejects_unregistered_scheme() {
    let app = app(Some("key"), vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "s3://reports/o.json"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("no storage backend"));
    assert!(app.remote.is_empty().await);
}

#[tokio::test]
async fn test_estimate_rejects_output_without_object() {
    let app = app(Some("key"), vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "gs://reports"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid output_path"));
    assert!(app.remote.is_empty().await);
}

#[tokio::test]
async fn test_estimate_without_api_key() {
    let app = app(None, vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "gs://reports/o.json"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "GEMINI_API_KEY not configured in Secret Manager");
}

#[tokio::test]
async fn test_estimate_missing_params() {
    let app = app(Some("key"), vec![record()]).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/missing.txt", "output_path": "gs://reports/o.json"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("params/missing.txt"));
}

#[tokio::test]
async fn test_estimate_generation_failure() {
    let app = app(Some("key"), Vec::new()).await;
    let (status, body) = post_estimate(
        app.router,
        r#"{"params_path": "params/resnet.txt", "output_path": "gs://reports/o.json", "debug": true}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Estimation failed:"));
    assert!(app.remote.is_empty().await);
}
