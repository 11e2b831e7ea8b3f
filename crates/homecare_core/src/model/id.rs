//! Stable entity identifiers.
//!
//! # Invariants
//! - New ids are UUID v4 strings.
//! - Stored ids are never rewritten; any non-empty string or integer id
//!   written by an older build decodes as-is.

use crate::model::validation::ValidationError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Fresh random id for a new record.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "entity",
                field: "id",
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

struct EntityIdVisitor;

impl Visitor<'_> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-empty string or integer id")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<EntityId, E> {
        if value.trim().is_empty() {
            return Err(E::invalid_value(de::Unexpected::Str(value), &self));
        }
        Ok(EntityId(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<EntityId, E> {
        Ok(EntityId(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<EntityId, E> {
        Ok(EntityId(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::EntityId;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn generated_ids_are_uuids() {
        let id = EntityId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, EntityId::generate());
    }

    #[test]
    fn decodes_legacy_string_and_numeric_ids() {
        let id: EntityId = serde_json::from_value(json!("p_1700000000000")).unwrap();
        assert_eq!(id.as_str(), "p_1700000000000");

        let id: EntityId = serde_json::from_value(json!(1700000000000u64)).unwrap();
        assert_eq!(id.as_str(), "1700000000000");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("1700000000000"));
    }

    #[test]
    fn rejects_blank_ids() {
        assert!(serde_json::from_value::<EntityId>(json!("  ")).is_err());
        assert!(serde_json::from_value::<EntityId>(json!(null)).is_err());
        assert!(" ".parse::<EntityId>().is_err());
        assert_eq!("abc".parse::<EntityId>().unwrap().as_str(), "abc");
    }
}
