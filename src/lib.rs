//! ML Training Resource Estimation Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod estimation;
/// Application state management
///
/// Holds the configuration, the blob store, the pipeline and the API key.
pub mod state;
pub mod storage;
