//! Storage backend implementations and the backend registry.
//!
//! Backends are selected at runtime from a configuration token. The
//! registry is the single place a token is resolved to a constructor;
//! an unrecognized token is a fatal configuration error raised at
//! construction, distinguishable from every runtime failure.

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryStorage;
pub use sqlite::SqliteStorage;

use std::sync::Arc;

use thiserror::Error;

use carestore_core::api::HealthcareApi;
use carestore_core::storage::Storage;

use crate::config::Config;

/// Registry token for the in-memory backend.
pub const MEMORY_BACKEND: &str = "memory";
/// Registry token for the SQLite backend.
pub const SQLITE_BACKEND: &str = "sqlite";

/// Errors raised while resolving and constructing a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unknown storage backend '{0}'")]
    UnknownBackend(String),
    #[error("Failed to initialize storage backend: {0}")]
    Init(String),
}

/// Resolves the configured token to a constructed backend.
pub async fn create_backend(config: &Config) -> Result<Arc<dyn Storage>, BackendError> {
    match config.backend.as_str() {
        MEMORY_BACKEND => Ok(Arc::new(InMemoryStorage::new())),
        SQLITE_BACKEND => {
            let storage = SqliteStorage::new(&config.sqlite_path)
                .await
                .map_err(|e| BackendError::Init(e.to_string()))?;
            Ok(Arc::new(storage))
        }
        other => Err(BackendError::UnknownBackend(other.to_string())),
    }
}

/// Builds an API client over the configured backend.
pub async fn connect(config: &Config) -> Result<HealthcareApi, BackendError> {
    Ok(HealthcareApi::new(create_backend(config).await?))
}
