//! In-process blob store

use super::{BlobStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Blob store backed by a map, keyed by the trimmed location string
///
/// Used by tests and local smoke runs; contents live only as long as the store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob
    pub async fn insert(&self, location: &str, content: impl Into<String>) {
        self.blobs
            .write()
            .await
            .insert(location.trim().to_string(), content.into());
    }

    /// Fetch a blob without going through the trait
    pub async fn get(&self, location: &str) -> Option<String> {
        self.blobs.read().await.get(location.trim()).cloned()
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read_text(&self, location: &str) -> Result<String, StorageError> {
        self.get(location)
            .await
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    async fn write_text(
        &self,
        location: &str,
        content: &str,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.insert(location, content).await;
        Ok(())
    }
}
