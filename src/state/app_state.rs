// Application state
// Holds the configuration, the routed blob store, the pipeline and the API key

use crate::config::Config;
use crate::credentials::access_token;
use crate::estimation::progress::LogSink;
use crate::estimation::{EstimationPipeline, GeminiClient};
use crate::storage::{BlobRouter, BlobStore, GcsBlobStore, LocalBlobStore};
use std::sync::Arc;

/// State shared by all handlers
///
/// Built once at startup; nothing in it changes while the server runs.
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    /// Blob store used to read request parameters
    pub store: Arc<dyn BlobStore>,
    /// Estimation pipeline
    pub pipeline: EstimationPipeline,
    /// Gemini API key, `None` when the credential provider failed at startup
    pub api_key: Option<String>,
}

impl AppState {
    /// Create the state
    pub fn new(
        config: Config,
        store: Arc<dyn BlobStore>,
        pipeline: EstimationPipeline,
        api_key: Option<String>,
    ) -> Self {
        Self {
            config,
            store,
            pipeline,
            api_key,
        }
    }

    /// Wire the production backends from configuration
    ///
    /// Local paths go to the filesystem and `gs://` locations to Cloud
    /// Storage. The configured Gemini timeout applies to model calls only.
    pub fn from_config(config: Config, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let storage_client = reqwest::Client::new();
        let tokens = access_token::from_env(
            storage_client.clone(),
            &config.storage.metadata_base_url,
        );
        let gcs = GcsBlobStore::new(storage_client, &config.storage.gcs_api_base_url, tokens);
        let store: Arc<dyn BlobStore> = Arc::new(
            BlobRouter::new(Arc::new(LocalBlobStore::new())).with_scheme("gs", Arc::new(gcs)),
        );

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.estimation.gemini_timeout {
            builder = builder.timeout(timeout);
        }
        let generator = Arc::new(GeminiClient::new(
            builder.build()?,
            &config.estimation.gemini_api_base_url,
        ));
        let pipeline = EstimationPipeline::new(store.clone(), generator)
            .with_progress(config.estimation.progress_interval, Arc::new(LogSink));

        Ok(Self::new(config, store, pipeline, api_key))
    }

    /// True when an API key is available
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
