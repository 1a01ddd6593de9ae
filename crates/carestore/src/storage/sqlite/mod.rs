//! SQLite storage backend.

mod conversions;
mod error;
mod query;
mod repository;
mod schema;

pub use error::StoreError;
pub use repository::SqliteStorage;
