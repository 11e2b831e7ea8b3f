//! Core data layer for the home-care patient-management application.
//! This crate is the single source of truth for stored-document invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{open_store, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use migrate::{upgrade, MigrationError, Upgrade, CURRENT_SCHEMA_VERSION};
pub use model::assessment::{
    Assessment, AssessmentForm, AssessmentInput, Mobility, NurseForm, PhysicianForm,
    PhysiotherapyForm, SocialWorkForm, Vitals,
};
pub use model::database::{Collection, Database};
pub use model::id::EntityId;
pub use model::patient::{Patient, PatientId, PatientInput};
pub use model::record::{
    ContactAttempt, ContactInput, ContactOutcome, FileInput, FileRef, Note, NoteInput, NoteKind,
    RecordId, Task, TaskInput, TaskStatus,
};
pub use model::role::{Role, RoleBinding};
pub use model::validation::ValidationError;
pub use repo::{ErrorKind, MigrationReport, RepoError, RepoResult, Repository, RoleUpsert};
pub use store::{
    read_db, write_db, DocumentStore, MemoryDocumentStore, SqliteDocumentStore, StoreError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
