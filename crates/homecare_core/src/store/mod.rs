//! Durable store adapters for the single home-care document.
//!
//! # Responsibility
//! - Read and write the whole document in one persistence slot.
//! - Seed a well-defined empty document when the slot is absent.
//!
//! # Invariants
//! - `save` replaces the whole document; readers never observe a partial write.
//! - Absence is a valid initial state, never an error.
//! - Adapters hold no business rules; validation lives in `crate::repo`.

use crate::db::DbError;
use crate::migrate::CURRENT_SCHEMA_VERSION;
use crate::model::database::{seed_document, Database};
use serde_json::Value;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::{DocumentBackup, SqliteDocumentStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("storage medium unavailable: {0}")]
    Unavailable(String),
    #[error("stored payload is not valid JSON: {0}")]
    CorruptPayload(#[source] serde_json::Error),
    #[error("document could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One persistence slot holding the raw document.
pub trait DocumentStore {
    /// Returns the stored document, or `None` when the slot is empty.
    fn load(&self) -> StoreResult<Option<Value>>;

    /// Replaces the stored document atomically.
    fn save(&self, document: &Value) -> StoreResult<()>;

    /// Keeps a copy of a document about to be replaced by a migrated one.
    fn backup(&self, _document: &Value, _version: u32) -> StoreResult<()> {
        Ok(())
    }

    /// Pushes buffered state to the medium. Called on shutdown.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Empty document at the current schema version.
pub fn ensure_initialized() -> Value {
    seed_document(CURRENT_SCHEMA_VERSION)
}

/// Returns the stored raw document, seeding an empty one when absent.
///
/// Seeding does not write; the first mutation persists it.
pub fn read_db<S: DocumentStore + ?Sized>(store: &S) -> StoreResult<Value> {
    match store.load()? {
        Some(document) => Ok(document),
        None => Ok(ensure_initialized()),
    }
}

/// Serializes and persists the full document.
pub fn write_db<S: DocumentStore + ?Sized>(store: &S, db: &Database) -> StoreResult<()> {
    let document = db.to_value().map_err(StoreError::Serialize)?;
    store.save(&document)
}
