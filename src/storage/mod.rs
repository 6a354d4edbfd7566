//! Blob storage
//!
//! Text read/write over local files and remote object stores. A location is a
//! plain string; its scheme decides which backend serves it:
//!
//! - `local:<path>`, `file://<path>` or a bare path - local filesystem
//! - `<scheme>://<bucket>/<object>` - a remote object (e.g. `gs://bucket/out.json`)
//!
//! Core code only sees the [`BlobStore`] trait. Backends are selected once at the
//! boundary through [`BlobRouter`].

pub mod gcs;
pub mod local;
pub mod memory;
pub mod router;

pub use gcs::GcsBlobStore;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use router::BlobRouter;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Content type used for JSON artifacts
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors raised by blob store backends
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing is stored at the location
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The location string could not be parsed
    #[error("Invalid blob location '{location}': {reason}")]
    InvalidLocation {
        /// The raw location
        location: String,
        /// Why it was rejected
        reason: String,
    },

    /// No backend is registered for the location's scheme
    #[error("No storage backend registered for scheme '{0}'")]
    UnsupportedScheme(String),

    /// Local filesystem failure
    #[error("I/O error on {location}: {source}")]
    Io {
        /// The location being accessed
        location: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored content is not valid UTF-8 text
    #[error("Blob at {0} is not valid UTF-8 text")]
    InvalidEncoding(String),

    /// Remote request could not be sent or its body could not be read
    #[error("Storage request failed: {0}")]
    Request(String),

    /// Remote backend answered with a non-success status
    #[error("Storage backend returned status {status} for {location}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The location being accessed
        location: String,
        /// Response body, for diagnostics
        body: String,
    },

    /// No usable credentials for the remote backend
    #[error("Storage authentication failed: {0}")]
    Auth(String),
}

/// A parsed blob location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobLocation {
    /// A path on the local filesystem
    Local(PathBuf),
    /// An object in a remote bucket
    Object {
        /// URI scheme, lower-cased (`gs`, `s3`, ...)
        scheme: String,
        /// Bucket / container name
        bucket: String,
        /// Object name inside the bucket
        object: String,
    },
}

impl BlobLocation {
    /// Parse a location string
    ///
    /// Remote locations must name both a bucket and an object:
    /// `gs://bucket` is rejected because it does not address a concrete object.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| StorageError::InvalidLocation {
            location: raw.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("location is empty"));
        }

        if let Some(path) = trimmed
            .strip_prefix("file://")
            .or_else(|| trimmed.strip_prefix("local:"))
        {
            if path.is_empty() {
                return Err(invalid("no file path"));
            }
            return Ok(BlobLocation::Local(PathBuf::from(path)));
        }

        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Ok(BlobLocation::Local(PathBuf::from(trimmed)));
        };

        let valid_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(invalid("malformed scheme"));
        }

        let (bucket, object) = match rest.split_once('/') {
            Some((bucket, object)) => (bucket, object.trim_start_matches('/')),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(invalid("no bucket name"));
        }
        if object.is_empty() {
            return Err(invalid(&format!(
                "no object name, expected format: {}://bucket/path/file.json",
                scheme
            )));
        }

        Ok(BlobLocation::Object {
            scheme: scheme.to_ascii_lowercase(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }

    /// Parse a location that must be a remote object
    pub fn parse_object(raw: &str) -> Result<Self, StorageError> {
        match Self::parse(raw)? {
            location @ BlobLocation::Object { .. } => Ok(location),
            BlobLocation::Local(_) => Err(StorageError::InvalidLocation {
                location: raw.to_string(),
                reason: "expected an object location such as gs://bucket/path/file.json"
                    .to_string(),
            }),
        }
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobLocation::Local(path) => write!(f, "{}", path.display()),
            BlobLocation::Object {
                scheme,
                bucket,
                object,
            } => write!(f, "{}://{}/{}", scheme, bucket, object),
        }
    }
}

/// Uniform text blob storage
///
/// Locations are passed as raw strings; each backend parses what it needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob at `location` as UTF-8 text
    async fn read_text(&self, location: &str) -> Result<String, StorageError>;

    /// Write `content` to `location`, replacing any existing blob
    async fn write_text(
        &self,
        location: &str,
        content: &str,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// True when this store can serve `location`
    ///
    /// Checked before any I/O so unservable locations are rejected early.
    fn supports(&self, location: &str) -> bool {
        BlobLocation::parse(location).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_forms() {
        assert_eq!(
            BlobLocation::parse("prompts/system_prompt.txt").unwrap(),
            BlobLocation::Local(PathBuf::from("prompts/system_prompt.txt"))
        );
        assert_eq!(
            BlobLocation::parse("local:script.txt").unwrap(),
            BlobLocation::Local(PathBuf::from("script.txt"))
        );
        assert_eq!(
            BlobLocation::parse("file:///tmp/a.txt").unwrap(),
            BlobLocation::Local(PathBuf::from("/tmp/a.txt"))
        );
    }

    #[test]
    fn test_parse_object() {
        let location = BlobLocation::parse("GS://bucket/dir//out.json").unwrap();
        assert_eq!(
            location,
            BlobLocation::Object {
                scheme: "gs".to_string(),
                bucket: "bucket".to_string(),
                object: "dir//out.json".to_string(),
            }
        );
        assert_eq!(location.to_string(), "gs://bucket/dir//out.json");
    }

    #[test]
    fn test_parse_rejects_incomplete_objects() {
        for raw in ["store://bucket", "store://bucket/", "gs:///out.json", "://b/o", ""] {
            let err = BlobLocation::parse(raw).unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidLocation { .. }),
                "expected InvalidLocation for {:?}, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_missing_object_name_message() {
        let err = BlobLocation::parse("store://bucket").unwrap_err();
        assert!(err.to_string().contains("no object name"));
    }

    #[test]
    fn test_parse_object_rejects_local_paths() {
        assert!(BlobLocation::parse_object("out.json").is_err());
        assert!(BlobLocation::parse_object("store://bucket/out.json").is_ok());
    }
}
