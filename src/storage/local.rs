//! Local filesystem backend

use super::{BlobLocation, BlobStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Blob store over the local filesystem
///
/// Relative paths resolve against the process working directory.
#[derive(Debug, Default, Clone)]
pub struct LocalBlobStore;

impl LocalBlobStore {
    /// Create a local store
    pub fn new() -> Self {
        Self
    }

    fn resolve(location: &str) -> Result<PathBuf, StorageError> {
        match BlobLocation::parse(location)? {
            BlobLocation::Local(path) => Ok(path),
            BlobLocation::Object { .. } => Err(StorageError::InvalidLocation {
                location: location.to_string(),
                reason: "not a local path".to_string(),
            }),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn read_text(&self, location: &str) -> Result<String, StorageError> {
        let path = Self::resolve(location)?;
        tracing::debug!(path = %path.display(), "Reading local blob");

        let content = fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
            ErrorKind::InvalidData => StorageError::InvalidEncoding(location.to_string()),
            _ => StorageError::Io {
                location: location.to_string(),
                source: e,
            },
        })?;

        tracing::debug!(
            path = %path.display(),
            chars = content.chars().count(),
            "Read local blob"
        );
        Ok(content)
    }

    async fn write_text(
        &self,
        location: &str,
        content: &str,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = Self::resolve(location)?;
        let io_err = |source| StorageError::Io {
            location: location.to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fs::write(&path, content).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote local blob");
        Ok(())
    }

    fn supports(&self, location: &str) -> bool {
        Self::resolve(location).is_ok()
    }
}
