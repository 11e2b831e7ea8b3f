//! Field-level validation shared by every entity input.
//!
//! # Invariants
//! - Validation never touches storage; it runs before any write.
//! - Error messages carry field names and ids only, never clinical text.

use crate::model::id::EntityId;
use crate::model::role::Role;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{3,19}$").expect("valid phone regex"));

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Caller-fixable input error. Operations fail with this before any write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{entity}.{field} is required")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("invalid phone number `{0}`")]
    InvalidPhone(String),
    #[error("unknown patient: {0}")]
    UnknownPatient(EntityId),
    #[error("{field} value {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("invalid blood pressure `{0}`; expected SYS/DIA")]
    InvalidBloodPressure(String),
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    #[error("author `{author}` is bound to {bound}; cannot file a {form} assessment")]
    AuthorRoleMismatch {
        author: String,
        bound: Role,
        form: Role,
    },
}

/// Trims `value` and rejects it when nothing remains.
pub fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value, mapping blank input to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Validates one phone number and returns its trimmed form.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let trimmed = phone.trim();
    if !PHONE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidPhone(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trims every phone, drops blank entries and validates the rest.
pub fn normalize_phones(phones: &[String]) -> ValidationResult<Vec<String>> {
    phones
        .iter()
        .filter(|phone| !phone.trim().is_empty())
        .map(|phone| validate_phone(phone))
        .collect()
}

/// Checks an optional numeric field against an inclusive range. NaN is
/// outside every range.
pub fn check_range<T>(field: &'static str, value: Option<T>, min: T, max: T) -> ValidationResult<()>
where
    T: PartialOrd + Copy + Into<f64>,
{
    match value {
        Some(value) if !(min..=max).contains(&value) => Err(ValidationError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }),
        _ => Ok(()),
    }
}

/// Keeps digits only, used for phone matching.
pub fn phone_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
