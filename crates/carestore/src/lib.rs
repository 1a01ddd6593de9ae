//! Storage backends for the carestore healthcare data API.
//!
//! The backend-agnostic pieces (records, lookup grammar, the `Storage`
//! trait and the `HealthcareApi` client) live in `carestore_core`; this
//! crate provides the concrete backends — SQLite and in-memory — plus the
//! registry that turns a configuration token into a running backend.
//!
//! ```no_run
//! # async fn example() -> Result<(), carestore::BackendError> {
//! let api = carestore::connect(&carestore::Config::memory()).await?;
//! let joes = api.patients().filter([("name__like", "Jo")]).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod storage;

pub use config::Config;
pub use storage::{connect, create_backend, BackendError, InMemoryStorage, SqliteStorage};
