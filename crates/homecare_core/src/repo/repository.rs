//! Repository core: the read-migrate-validate-write cycle.
//!
//! # Responsibility
//! - Own the injected `DocumentStore` for the application's lifetime.
//! - Run every mutation as one serialized read-modify-write.
//!
//! # Invariants
//! - Mutations hold `write_lock` from read to write; no lost updates in-process.
//! - A failed operation performs no `save` at all.
//! - Readers never write, even when they had to migrate in memory.

use crate::migrate::{document_version, upgrade, CURRENT_SCHEMA_VERSION};
use crate::model::database::Database;
use crate::repo::error::{RepoError, RepoResult};
use crate::store::{read_db, write_db, DocumentStore, StoreError};
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Outcome of a mutation closure: the value to return, and whether to persist.
pub(crate) struct Change<T> {
    value: T,
    dirty: bool,
}

impl<T> Change<T> {
    pub(crate) fn write(value: T) -> Self {
        Self { value, dirty: true }
    }

    pub(crate) fn unchanged(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }
}

/// Summary of `Repository::migrate_in_place`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<u32>,
    /// The slot was empty and a fresh document was written.
    pub seeded: bool,
}

/// Sole mutation and query boundary over the home-care document.
pub struct Repository<S: DocumentStore> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Schema version of the stored document, before any migration.
    pub fn schema_version(&self) -> RepoResult<u32> {
        let raw = read_db(&self.store)?;
        Ok(document_version(&raw)?)
    }

    /// Upgrades the stored document once at application start.
    ///
    /// # Side effects
    /// - Seeds the slot when it is empty.
    /// - Backs up the previous payload before writing an upgraded one.
    pub fn migrate_in_place(&self) -> RepoResult<MigrationReport> {
        let _guard = self.lock()?;
        let started_at = Instant::now();

        let Some(raw) = self.store.load()? else {
            write_db(&self.store, &Database::empty(CURRENT_SCHEMA_VERSION))?;
            info!(
                "event=doc_migrate module=repo status=ok seeded=true to_version={}",
                CURRENT_SCHEMA_VERSION
            );
            return Ok(MigrationReport {
                from_version: CURRENT_SCHEMA_VERSION,
                to_version: CURRENT_SCHEMA_VERSION,
                applied: Vec::new(),
                seeded: true,
            });
        };

        let from_version = document_version(&raw)?;
        let previous = (from_version < CURRENT_SCHEMA_VERSION).then(|| raw.clone());
        let upgraded = upgrade(raw)?;
        let db = decode(upgraded.document)?;

        if let Some(previous) = previous {
            self.store.backup(&previous, from_version)?;
            write_db(&self.store, &db)?;
        }

        info!(
            "event=doc_migrate module=repo status=ok seeded=false from_version={} to_version={} steps={} duration_ms={}",
            from_version,
            db.version,
            upgraded.applied.len(),
            started_at.elapsed().as_millis()
        );
        Ok(MigrationReport {
            from_version,
            to_version: db.version,
            applied: upgraded.applied,
            seeded: false,
        })
    }

    /// Flushes the store and hands it back.
    pub fn shutdown(self) -> RepoResult<S> {
        self.store.flush()?;
        info!("event=repo_shutdown module=repo status=ok");
        Ok(self.store)
    }

    /// Current document, migrated in memory. Never writes.
    pub(crate) fn snapshot(&self) -> RepoResult<Database> {
        let raw = read_db(&self.store)?;
        decode(upgrade(raw)?.document)
    }

    /// Runs `apply` against the current document and persists the result.
    pub(crate) fn mutate<T>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut Database) -> RepoResult<Change<T>>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|_guard| self.mutate_locked(apply));

        match &result {
            Ok((_, written)) => info!(
                "event=repo_write module=repo status=ok op={} written={} duration_ms={}",
                op,
                written,
                started_at.elapsed().as_millis()
            ),
            Err(err) if err.kind().is_user_correctable() => warn!(
                "event=repo_write module=repo status=rejected op={} error_kind={} duration_ms={}",
                op,
                err.kind().as_str(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=repo_write module=repo status=error op={} error_kind={} duration_ms={} error={}",
                op,
                err.kind().as_str(),
                started_at.elapsed().as_millis(),
                err
            ),
        }

        result.map(|(value, _)| value)
    }

    fn mutate_locked<T>(
        &self,
        apply: impl FnOnce(&mut Database) -> RepoResult<Change<T>>,
    ) -> RepoResult<(T, bool)> {
        let raw = read_db(&self.store)?;
        let from_version = document_version(&raw)?;
        let previous = (from_version < CURRENT_SCHEMA_VERSION).then(|| raw.clone());
        let mut db = decode(upgrade(raw)?.document)?;

        let change = apply(&mut db)?;
        if !change.dirty {
            return Ok((change.value, false));
        }

        if let Some(previous) = previous.filter(has_entities) {
            self.store.backup(&previous, from_version)?;
        }
        write_db(&self.store, &db)?;
        Ok((change.value, true))
    }

    fn lock(&self) -> RepoResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            RepoError::StorageUnavailable(StoreError::Unavailable(
                "repository write lock poisoned".to_string(),
            ))
        })
    }
}

fn decode(document: Value) -> RepoResult<Database> {
    let db =
        Database::from_value(document).map_err(|err| RepoError::InvalidData(err.to_string()))?;
    let unreadable = db.unreadable_count();
    if unreadable > 0 {
        warn!(
            "event=doc_decode module=repo status=degraded unreadable_records={}",
            unreadable
        );
    }
    Ok(db)
}

// Seeded documents carry nothing worth backing up.
fn has_entities(document: &Value) -> bool {
    document.as_object().is_some_and(|root| {
        root.values()
            .filter_map(Value::as_array)
            .any(|items| !items.is_empty())
    })
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
