//! Home-care domain model.
//!
//! # Responsibility
//! - Define the persisted document and every entity stored in it.
//! - Validate caller input before the repository persists it.
//!
//! # Invariants
//! - Every entity carries a stable `EntityId`; new ones are UUID v4.
//! - Unknown stored fields survive a load/save round trip via `extra`.

pub mod assessment;
pub mod database;
pub mod id;
pub mod patient;
pub mod record;
pub mod role;
pub mod validation;
