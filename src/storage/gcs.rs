//! Google Cloud Storage backend
//!
//! Uses the JSON API media endpoints directly over `reqwest`:
//! downloads via `GET /storage/v1/b/{bucket}/o/{object}?alt=media`,
//! uploads via `POST /upload/storage/v1/b/{bucket}/o?uploadType=media&name={object}`.

use super::{BlobLocation, BlobStore, StorageError};
use crate::credentials::AccessTokenSource;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};

/// Default Cloud Storage API endpoint
pub const GCS_API_BASE_URL: &str = "https://storage.googleapis.com";

/// Blob store over Cloud Storage buckets
pub struct GcsBlobStore {
    client: reqwest::Client,
    base_url: String,
    tokens: Box<dyn AccessTokenSource>,
}

impl GcsBlobStore {
    /// Create a store using a shared HTTP client
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Box<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    fn split(location: &str) -> Result<(String, String), StorageError> {
        match BlobLocation::parse_object(location)? {
            BlobLocation::Object { bucket, object, .. } => Ok((bucket, object)),
            BlobLocation::Local(_) => Err(StorageError::InvalidLocation {
                location: location.to_string(),
                reason: "not an object location".to_string(),
            }),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StorageError::Request(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Request("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, StorageError> {
        self.tokens
            .access_token()
            .await
            .map_err(|e| StorageError::Auth(e.to_string()))
    }

    async fn check(
        response: reqwest::Response,
        location: &str,
    ) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(location.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(
                status_code = status.as_u16(),
                location = %location,
                error_body = %body,
                "Cloud Storage returned error status"
            );
            return Err(StorageError::Status {
                status: status.as_u16(),
                location: location.to_string(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn read_text(&self, location: &str) -> Result<String, StorageError> {
        let (bucket, object) = Self::split(location)?;
        let mut url = self.url(&["storage", "v1", "b", &bucket, "o", &object])?;
        url.query_pairs_mut().append_pair("alt", "media");

        tracing::debug!(bucket = %bucket, object = %object, "Reading from Cloud Storage");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let response = Self::check(response, location).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| StorageError::InvalidEncoding(location.to_string()))?;

        tracing::debug!(
            chars = content.chars().count(),
            "Read object from Cloud Storage"
        );
        Ok(content)
    }

    async fn write_text(
        &self,
        location: &str,
        content: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let (bucket, object) = Self::split(location)?;
        let mut url = self.url(&["upload", "storage", "v1", "b", &bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &object);

        tracing::info!(
            bucket = %bucket,
            object = %object,
            content_size = content.len(),
            "Writing to Cloud Storage"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.bearer().await?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Self::check(response, location).await?;

        tracing::info!(bucket = %bucket, object = %object, "Wrote object to Cloud Storage");
        Ok(())
    }

    fn supports(&self, location: &str) -> bool {
        Self::split(location).is_ok()
    }
}
