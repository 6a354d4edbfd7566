//! Scheme-based backend dispatch

use super::{BlobLocation, BlobStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes each location to the backend registered for its scheme
///
/// Local locations always go to the local backend. Remote locations go to the
/// backend registered for their scheme, or fail with
/// [`StorageError::UnsupportedScheme`].
#[derive(Clone)]
pub struct BlobRouter {
    local: Arc<dyn BlobStore>,
    remotes: HashMap<String, Arc<dyn BlobStore>>,
}

impl BlobRouter {
    /// Create a router with only a local backend
    pub fn new(local: Arc<dyn BlobStore>) -> Self {
        Self {
            local,
            remotes: HashMap::new(),
        }
    }

    /// Register a backend for a remote scheme (e.g. `gs`)
    pub fn with_scheme(mut self, scheme: &str, store: Arc<dyn BlobStore>) -> Self {
        self.remotes.insert(scheme.to_ascii_lowercase(), store);
        self
    }

    fn backend_for(&self, location: &str) -> Result<&Arc<dyn BlobStore>, StorageError> {
        match BlobLocation::parse(location)? {
            BlobLocation::Local(_) => Ok(&self.local),
            BlobLocation::Object { scheme, .. } => self
                .remotes
                .get(&scheme)
                .ok_or(StorageError::UnsupportedScheme(scheme)),
        }
    }
}

#[async_trait]
impl BlobStore for BlobRouter {
    async fn read_text(&self, location: &str) -> Result<String, StorageError> {
        self.backend_for(location)?.read_text(location).await
    }

    async fn write_text(
        &self,
        location: &str,
        content: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.backend_for(location)?
            .write_text(location, content, content_type)
            .await
    }

    fn supports(&self, location: &str) -> bool {
        self.backend_for(location)
            .map(|backend| backend.supports(location))
            .unwrap_or(false)
    }
}
