//! Repository layer: the only mutation boundary over the home-care document.
//!
//! # Responsibility
//! - Expose one operation per entity-action pair.
//! - Run each mutation as read -> migrate -> validate -> write.
//!
//! # Invariants
//! - Validation and conflict errors abort before any write.
//! - Store and schema errors propagate unmodified.

pub mod error;
mod patients;
mod records;
mod repository;
mod roles;

pub use error::{ErrorKind, RepoError, RepoResult};
pub use repository::{MigrationReport, Repository};
pub use roles::RoleUpsert;
