//! SQLite-backed document store.
//!
//! # Responsibility
//! - Keep one JSON payload per slot in `document_slots`.
//! - Keep pre-migration payloads in `document_backups`.
//!
//! # Invariants
//! - `save` runs in one `IMMEDIATE` transaction; the slot row is replaced whole.
//! - Payload text is always a serialized JSON object.

use super::{DocumentStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::database::VERSION_KEY;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Metadata for one stored backup row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBackup {
    pub doc_version: u32,
    pub created_at: i64,
}

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    slot: String,
}

impl SqliteDocumentStore {
    /// Opens (or creates) a SQLite file and binds the store to `slot`.
    pub fn open(path: impl AsRef<Path>, slot: impl Into<String>) -> StoreResult<Self> {
        let conn = open_db(path)?;
        Ok(Self::from_connection(conn, slot))
    }

    pub fn open_in_memory(slot: impl Into<String>) -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(conn, slot))
    }

    fn from_connection(conn: Connection, slot: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Lists backups for this slot, oldest first.
    pub fn list_backups(&self) -> StoreResult<Vec<DocumentBackup>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT doc_version, created_at
             FROM document_backups
             WHERE slot = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([self.slot.as_str()])?;
        let mut backups = Vec::new();
        while let Some(row) = rows.next()? {
            backups.push(DocumentBackup {
                doc_version: row.get("doc_version")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(backups)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn load(&self) -> StoreResult<Option<Value>> {
        let conn = self.conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM document_slots WHERE slot = ?1;",
                [self.slot.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|err| {
                error!(
                    "event=store_load module=store status=error slot={} error_code=corrupt_payload",
                    self.slot
                );
                StoreError::CorruptPayload(err)
            }),
            None => Ok(None),
        }
    }

    fn save(&self, document: &Value) -> StoreResult<()> {
        let started_at = Instant::now();
        let payload = serde_json::to_string(document).map_err(StoreError::Serialize)?;
        let version = stored_version(document);

        let mut conn = self.conn()?;
        let result = (|| -> StoreResult<()> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO document_slots (slot, payload, doc_version, updated_at)
                 VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(slot) DO UPDATE SET
                    payload = excluded.payload,
                    doc_version = excluded.doc_version,
                    updated_at = excluded.updated_at;",
                params![self.slot.as_str(), payload, version],
            )?;
            tx.commit()?;
            Ok(())
        })();

        match &result {
            Ok(()) => info!(
                "event=store_write module=store status=ok slot={} doc_version={} bytes={} duration_ms={}",
                self.slot,
                version,
                payload.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_write module=store status=error slot={} duration_ms={} error={}",
                self.slot,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn backup(&self, document: &Value, version: u32) -> StoreResult<()> {
        let payload = serde_json::to_string(document).map_err(StoreError::Serialize)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO document_backups (slot, doc_version, payload)
             VALUES (?1, ?2, ?3);",
            params![self.slot.as_str(), version, payload],
        )?;
        info!(
            "event=store_backup module=store status=ok slot={} doc_version={}",
            self.slot, version
        );
        Ok(())
    }
}

fn stored_version(document: &Value) -> i64 {
    document
        .get(VERSION_KEY)
        .and_then(Value::as_i64)
        .unwrap_or(0)
}
