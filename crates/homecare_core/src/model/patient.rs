//! Patient record.
//!
//! # Invariants
//! - `id` is generated once by the repository and never reassigned.
//! - `name` and `mrn` are non-empty after trimming.
//! - `phones` holds trimmed, pattern-checked numbers only.

use crate::model::validation::{normalize_phones, phone_digits, require_text, ValidationResult};
use crate::model::id::EntityId;
use serde::{Deserialize, Serialize};

pub type PatientId = EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    /// Medical record number issued by the hospital.
    pub mrn: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    /// Fields written by other builds or legacy schemas; preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Caller-supplied patient fields for create/update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInput {
    pub name: String,
    pub mrn: String,
    pub phones: Vec<String>,
}

impl PatientInput {
    pub fn new(name: impl Into<String>, mrn: impl Into<String>, phones: Vec<String>) -> Self {
        Self {
            name: name.into(),
            mrn: mrn.into(),
            phones,
        }
    }

    /// Returns trimmed `(name, mrn, phones)` or the first violated rule.
    pub fn validate(&self) -> ValidationResult<(String, String, Vec<String>)> {
        let name = require_text("patient", "name", &self.name)?;
        let mrn = require_text("patient", "mrn", &self.mrn)?;
        let phones = normalize_phones(&self.phones)?;
        Ok((name, mrn, phones))
    }
}

impl Patient {
    /// Builds a new patient record from validated input.
    pub fn create(id: PatientId, input: &PatientInput, now_ms: i64) -> ValidationResult<Self> {
        let (name, mrn, phones) = input.validate()?;
        Ok(Self::from_parts(id, (name, mrn, phones), now_ms))
    }

    /// Builds a patient from fields already returned by `PatientInput::validate`.
    pub fn from_parts(
        id: PatientId,
        (name, mrn, phones): (String, String, Vec<String>),
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            name,
            mrn,
            phones,
            created_at: now_ms,
            updated_at: now_ms,
            extra: serde_json::Map::new(),
        }
    }

    /// Replaces editable fields with validated values, keeping identity and
    /// creation time.
    pub fn apply(&mut self, (name, mrn, phones): (String, String, Vec<String>), now_ms: i64) {
        self.name = name;
        self.mrn = mrn;
        self.phones = phones;
        self.updated_at = now_ms;
    }

    /// Case-insensitive match on name/MRN, digits-only match on phones.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if self.name.to_lowercase().contains(&needle) || self.mrn.to_lowercase().contains(&needle)
        {
            return true;
        }
        let digits = phone_digits(&needle);
        !digits.is_empty()
            && self
                .phones
                .iter()
                .any(|phone| phone_digits(phone).contains(&digits))
    }
}
