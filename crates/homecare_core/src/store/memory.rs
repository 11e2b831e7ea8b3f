//! In-process document store.
//!
//! Used by tests and by embedders that persist elsewhere. Counts writes and
//! can simulate an unavailable medium.

use super::{DocumentStore, StoreError, StoreResult};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    slot: Mutex<Option<Value>>,
    backups: Mutex<Vec<(u32, Value)>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a raw document, e.g. a legacy schema.
    pub fn with_document(document: Value) -> Self {
        Self {
            slot: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Makes every subsequent load/save fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current stored document, bypassing the availability switch.
    pub fn snapshot(&self) -> Option<Value> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Backed-up documents as `(version, document)`, oldest first.
    pub fn backups(&self) -> Vec<(u32, Value)> {
        self.backups
            .lock()
            .map(|backups| backups.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }

    fn slot(&self) -> StoreResult<MutexGuard<'_, Option<Value>>> {
        self.slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory slot lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self) -> StoreResult<Option<Value>> {
        self.check_available()?;
        Ok(self.slot()?.clone())
    }

    fn save(&self, document: &Value) -> StoreResult<()> {
        self.check_available()?;
        *self.slot()? = Some(document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backup(&self, document: &Value, version: u32) -> StoreResult<()> {
        self.check_available()?;
        self.backups
            .lock()
            .map_err(|_| StoreError::Unavailable("memory backup lock poisoned".to_string()))?
            .push((version, document.clone()));
        Ok(())
    }
}
