//! Result validation and persistence

use crate::estimation::error::{EstimationError, GenerationError};
use crate::estimation::types::EstimationResult;
use crate::storage::{BlobStore, JSON_CONTENT_TYPE};
use serde::Serialize;
use std::sync::Arc;

/// Check a parsed result before it is written
///
/// An empty list, or a record with every field blank, is a failed generation
/// rather than a successful empty report.
pub fn validate(result: &EstimationResult) -> Result<(), GenerationError> {
    if result.is_empty() {
        return Err(GenerationError::EmptyGeneration);
    }
    if let Some(index) = result.iter().position(|r| r.is_blank()) {
        return Err(GenerationError::SchemaMismatch(format!(
            "record {} has no populated fields",
            index
        )));
    }
    for (index, record) in result.iter().enumerate() {
        let blank = record.blank_fields();
        if !blank.is_empty() {
            tracing::warn!(record = index, fields = ?blank, "Estimation record has blank fields");
        }
    }
    Ok(())
}

/// Serialize a result as a 4-space indented JSON array
///
/// Fields keep record order and non-ASCII text is written as UTF-8.
pub fn render(result: &EstimationResult) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    result.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| {
        serde_json::Error::io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Writes estimation reports through a blob store
pub struct ResultMaterializer {
    store: Arc<dyn BlobStore>,
}

impl ResultMaterializer {
    /// Create a materializer writing through `store`
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Serialize and write `result` to `output_path`
    ///
    /// No retry on failure: the result is dropped with the error.
    pub async fn persist(
        &self,
        result: &EstimationResult,
        output_path: &str,
    ) -> Result<(), EstimationError> {
        let content = render(result)?;

        self.store
            .write_text(output_path, &content, JSON_CONTENT_TYPE)
            .await
            .map_err(|source| EstimationError::Persistence {
                path: output_path.to_string(),
                source,
            })?;

        tracing::info!(
            output_path = %output_path,
            records = result.len(),
            bytes = content.len(),
            "Output saved"
        );
        Ok(())
    }
}
