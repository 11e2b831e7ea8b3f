//! Root persisted document.
//!
//! # Invariants
//! - `__version` is present on every stored document and never decreases.
//! - Collections keep insertion order; nothing sorts them on write.
//! - A record this build cannot decode is kept verbatim in place and written
//!   back unchanged; it never fails the whole document.

use crate::model::assessment::Assessment;
use crate::model::patient::{Patient, PatientId};
use crate::model::record::{ContactAttempt, FileRef, Note, Task};
use crate::model::role::RoleBinding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level key holding the schema version.
pub const VERSION_KEY: &str = "__version";

/// Every entity collection, in document order.
pub const COLLECTIONS: [&str; 7] = [
    "patients",
    "notes",
    "assessments",
    "contacts",
    "tasks",
    "files",
    "rolesDirectory",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry<T> {
    Known(T),
    Unreadable(Value),
}

/// Ordered entity collection tolerant of records it cannot decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded records in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Known(value) => Some(value),
            Entry::Unreadable(_) => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            Entry::Known(value) => Some(value),
            Entry::Unreadable(_) => None,
        })
    }

    pub fn push(&mut self, value: T) {
        self.entries.push(Entry::Known(value));
    }

    /// Number of decoded records.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records kept verbatim because they did not decode.
    pub fn unreadable(&self) -> usize {
        self.entries.len() - self.len()
    }

    /// Decoded records, dropping the undecodable ones.
    pub fn into_vec(self) -> Vec<T> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Known(value) => Some(value),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Entry::Known).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(rename = "__version")]
    pub version: u32,
    #[serde(default)]
    pub patients: Collection<Patient>,
    #[serde(default)]
    pub notes: Collection<Note>,
    #[serde(default)]
    pub assessments: Collection<Assessment>,
    #[serde(default)]
    pub contacts: Collection<ContactAttempt>,
    #[serde(default)]
    pub tasks: Collection<Task>,
    #[serde(default)]
    pub files: Collection<FileRef>,
    #[serde(default)]
    pub roles_directory: Collection<RoleBinding>,
    /// Top-level keys this build does not know about; preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Database {
    /// Empty document at `version`.
    pub fn empty(version: u32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.iter().find(|patient| &patient.id == id)
    }

    pub fn has_patient(&self, id: &PatientId) -> bool {
        self.patient(id).is_some()
    }

    pub fn role_binding(&self, name: &str) -> Option<&RoleBinding> {
        self.roles_directory
            .iter()
            .find(|binding| binding.matches(name))
    }

    /// Records across every collection that were kept verbatim.
    pub fn unreadable_count(&self) -> usize {
        self.patients.unreadable()
            + self.notes.unreadable()
            + self.assessments.unreadable()
            + self.contacts.unreadable()
            + self.tasks.unreadable()
            + self.files.unreadable()
            + self.roles_directory.unreadable()
    }
}

/// Raw seeded document: `version` plus every collection as an empty array.
pub fn seed_document(version: u32) -> Value {
    let mut root = Map::new();
    root.insert(VERSION_KEY.to_string(), Value::from(version));
    for collection in COLLECTIONS {
        root.insert(collection.to_string(), Value::Array(Vec::new()));
    }
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::{seed_document, Database, COLLECTIONS};
    use serde_json::json;

    #[test]
    fn seed_decodes_to_empty_database() {
        let db = Database::from_value(seed_document(4)).unwrap();
        assert_eq!(db, Database::empty(4));
    }

    #[test]
    fn empty_database_serializes_every_collection() {
        let value = Database::empty(4).to_value().unwrap();
        assert_eq!(value["__version"], 4);
        for collection in COLLECTIONS {
            assert!(value[collection].is_array(), "missing {collection}");
        }
    }

    #[test]
    fn undecodable_records_are_kept_in_place() {
        let stored = json!({
            "__version": 4,
            "patients": [
                {"id": "p1", "name": "A", "mrn": "M1"},
                {"id": "p2", "fullName": "no name field"},
                {"id": "p3", "name": "C", "mrn": "M3"}
            ],
            "rolesDirectory": [{"name": "Ali", "role": "pharmacist"}]
        });
        let db = Database::from_value(stored.clone()).unwrap();
        assert_eq!(db.patients.len(), 2);
        assert_eq!(db.patients.unreadable(), 1);
        assert!(db.roles_directory.is_empty());
        assert_eq!(db.unreadable_count(), 2);

        let written = db.to_value().unwrap();
        assert_eq!(written["patients"][1], stored["patients"][1]);
        assert_eq!(written["patients"][2]["id"], "p3");
        assert_eq!(written["rolesDirectory"], stored["rolesDirectory"]);
    }
}
