use std::env;

use crate::storage;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry token naming the storage backend (default: "sqlite")
    pub backend: String,
    /// Path to the SQLite database file (default: "carestore.db")
    pub sqlite_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CARESTORE_BACKEND` - storage backend token, `"sqlite"` or
    ///   `"memory"` (default: "sqlite")
    /// - `CARESTORE_SQLITE_PATH` - SQLite database path (default:
    ///   "carestore.db")
    pub fn from_env() -> Self {
        Self {
            backend: env::var("CARESTORE_BACKEND")
                .unwrap_or_else(|_| storage::SQLITE_BACKEND.to_string()),
            sqlite_path: env::var("CARESTORE_SQLITE_PATH")
                .unwrap_or_else(|_| "carestore.db".to_string()),
        }
    }

    /// Configuration for the in-memory backend.
    pub fn memory() -> Self {
        Self {
            backend: storage::MEMORY_BACKEND.to_string(),
            sqlite_path: "carestore.db".to_string(),
        }
    }

    /// Configuration for the SQLite backend at `path`.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            backend: storage::SQLITE_BACKEND.to_string(),
            sqlite_path: path.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
