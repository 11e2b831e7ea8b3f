//! SQLite bootstrap for the durable document slot table.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing `SqliteDocumentStore`.
//! - Apply the slot-table schema migrations in deterministic order.
//!
//! # Invariants
//! - Table schema version is tracked via `PRAGMA user_version`.
//! - This is the storage-table schema only; the document's own `__version`
//!   is owned by `crate::migrate`.

use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
