//! Professional roles and the staff role directory.
//!
//! # Invariants
//! - One staff name maps to at most one `Role`.
//! - Name matching is trim + case-insensitive; the stored spelling is the
//!   first one written.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Home-care profession. Drives which assessment form a staff member files.
///
/// Written as the canonical label; read through `FromStr`, so labels stored
/// by older builds (`"doctor"`, Arabic titles) still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    Physician,
    Nurse,
    Physiotherapist,
    SocialWorker,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Physician,
        Role::Nurse,
        Role::Physiotherapist,
        Role::SocialWorker,
    ];

    /// Stable label used in the persisted document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physician => "Physician",
            Self::Nurse => "Nurse",
            Self::Physiotherapist => "Physiotherapist",
            Self::SocialWorker => "SocialWorker",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "physician" | "doctor" | "طبيب" => Ok(Self::Physician),
            "nurse" | "ممرض" | "ممرضة" => Ok(Self::Nurse),
            "physiotherapist" | "physio" | "pt" | "أخصائي علاج طبيعي" => {
                Ok(Self::Physiotherapist)
            }
            "socialworker" | "social_worker" | "social worker" | "أخصائي اجتماعي" => {
                Ok(Self::SocialWorker)
            }
            _ => Err(ValidationError::UnknownRole(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One entry of the role directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub bound_at: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RoleBinding {
    /// Returns whether this binding belongs to `name` under directory matching rules.
    pub fn matches(&self, name: &str) -> bool {
        same_staff_name(&self.name, name)
    }
}

/// Directory name comparison: trimmed, case-insensitive.
pub fn same_staff_name(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}
