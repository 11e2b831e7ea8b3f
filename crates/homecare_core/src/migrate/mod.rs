//! Document schema migrator.
//!
//! # Responsibility
//! - Register document upgrade steps in strictly increasing order.
//! - Bring a raw stored document up to `CURRENT_SCHEMA_VERSION`.
//!
//! # Invariants
//! - Each step is a pure `N-1 -> N` transform that only adds structure.
//! - Steps never remove entities or fields.
//! - A document newer than this build is rejected, never guessed at.

use crate::model::database::VERSION_KEY;
use serde_json::{Map, Value};
use thiserror::Error;

/// Latest document schema version known by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 4;

pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("document schema version {doc_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        doc_version: u32,
        latest_supported: u32,
    },
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    upgrade: fn(&mut Map<String, Value>),
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        upgrade: add_core_collections,
    },
    Migration {
        version: 2,
        upgrade: add_clinical_collections,
    },
    Migration {
        version: 3,
        upgrade: add_task_and_file_collections,
    },
    Migration {
        version: 4,
        upgrade: add_roles_directory,
    },
];

/// Result of running the migration chain on one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Upgrade {
    pub document: Value,
    pub from_version: u32,
    /// Target versions of the steps that ran, in order.
    pub applied: Vec<u32>,
}

impl Upgrade {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Reads `__version` without migrating. A missing key means version 0.
pub fn document_version(document: &Value) -> MigrationResult<u32> {
    let root = document
        .as_object()
        .ok_or_else(|| MigrationError::MalformedDocument("root is not an object".to_string()))?;
    match root.get(VERSION_KEY) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| {
                MigrationError::MalformedDocument(format!("`{VERSION_KEY}` is not a version: {value}"))
            }),
    }
}

/// Applies every pending step to `document`.
///
/// An already-current document comes back unchanged with no applied steps.
pub fn upgrade(document: Value) -> MigrationResult<Upgrade> {
    let from_version = document_version(&document)?;
    let latest = CURRENT_SCHEMA_VERSION;

    if from_version > latest {
        return Err(MigrationError::UnsupportedSchemaVersion {
            doc_version: from_version,
            latest_supported: latest,
        });
    }

    if from_version == latest {
        return Ok(Upgrade {
            document,
            from_version,
            applied: Vec::new(),
        });
    }

    let Value::Object(mut root) = document else {
        return Err(MigrationError::MalformedDocument(
            "root is not an object".to_string(),
        ));
    };

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if migration.version <= from_version {
            continue;
        }
        (migration.upgrade)(&mut root);
        root.insert(VERSION_KEY.to_string(), Value::from(migration.version));
        applied.push(migration.version);
    }

    Ok(Upgrade {
        document: Value::Object(root),
        from_version,
        applied,
    })
}

fn add_core_collections(root: &mut Map<String, Value>) {
    ensure_array(root, "patients");
    ensure_array(root, "notes");
}

fn add_clinical_collections(root: &mut Map<String, Value>) {
    ensure_array(root, "assessments");
    ensure_array(root, "contacts");
    for patient in entities_mut(root, "patients") {
        if patient.contains_key("phones") {
            continue;
        }
        let phones = match patient.get("phone").and_then(Value::as_str).map(str::trim) {
            Some(phone) if !phone.is_empty() => vec![Value::from(phone)],
            _ => Vec::new(),
        };
        patient.insert("phones".to_string(), Value::Array(phones));
    }
}

fn add_task_and_file_collections(root: &mut Map<String, Value>) {
    ensure_array(root, "tasks");
    ensure_array(root, "files");
}

fn add_roles_directory(root: &mut Map<String, Value>) {
    ensure_array(root, "rolesDirectory");
    for note in entities_mut(root, "notes") {
        note.entry("type")
            .or_insert_with(|| Value::from("general"));
    }
}

// A collection holding a non-array value is kept as-is; decoding reports it.
fn ensure_array(root: &mut Map<String, Value>, key: &str) {
    match root.get(key) {
        None | Some(Value::Null) => {
            root.insert(key.to_string(), Value::Array(Vec::new()));
        }
        Some(_) => {}
    }
}

fn entities_mut<'a>(
    root: &'a mut Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    root.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|items| items.iter_mut())
        .filter_map(Value::as_object_mut)
}
