//! SQLite error mapping.
//!
//! Engine errors never escape the `Storage` trait: the repository
//! downgrades them to an absent/false/empty result and logs the reason.
//! `StoreError` is the internal currency between the closures running on
//! the connection and the trait boundary where that downgrade happens; it
//! also surfaces from construction, where a failure is a configuration
//! error rather than a runtime condition.

use thiserror::Error;

/// Failure inside the SQLite backend, before normalization.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
}

/// Maps a `tokio_rusqlite` call error to a `StoreError`.
pub(crate) fn map_call_error(err: tokio_rusqlite::Error) -> StoreError {
    match err {
        tokio_rusqlite::Error::Rusqlite(e) => StoreError::Query(e.to_string()),
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            StoreError::Connection("Connection closed unexpectedly".to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}
