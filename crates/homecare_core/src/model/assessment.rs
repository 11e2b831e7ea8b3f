//! Role-specific clinical assessment forms.
//!
//! # Responsibility
//! - Define one closed form shape per profession.
//! - Validate clinical ranges before a form reaches storage.
//!
//! # Invariants
//! - `form` is tagged by `role`; unknown tags fail to decode.
//! - A bound author may only file forms matching their bound role.
//! - Free-form assessments from older builds have no `form`; their payload
//!   stays in `extra` untouched.

use crate::model::patient::PatientId;
use crate::model::record::RecordId;
use crate::model::role::Role;
use crate::model::validation::{
    check_range, optional_text, require_text, ValidationError, ValidationResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BLOOD_PRESSURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2,3})/(\d{2,3})$").expect("valid blood pressure regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// `SYS/DIA` in mmHg, e.g. `120/80`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<u8>,
}

impl Vitals {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(bp) = self.blood_pressure.as_deref() {
            let bp = bp.trim();
            let valid = BLOOD_PRESSURE_RE
                .captures(bp)
                .and_then(|caps| {
                    let systolic: u16 = caps.get(1)?.as_str().parse().ok()?;
                    let diastolic: u16 = caps.get(2)?.as_str().parse().ok()?;
                    Some(systolic > diastolic)
                })
                .unwrap_or(false);
            if !valid {
                return Err(ValidationError::InvalidBloodPressure(bp.to_string()));
            }
        }
        check_range("pulse", self.pulse, 20, 250)?;
        check_range("temperatureC", self.temperature_c, 30.0, 45.0)?;
        check_range("spo2", self.spo2, 50, 100)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mobility {
    Independent,
    Assisted,
    Wheelchair,
    Bedbound,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicianForm {
    pub diagnosis: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vitals>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseForm {
    pub vitals: Vitals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wound_care: Option<String>,
    /// Pressure-ulcer risk, 6 (highest risk) to 23.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub braden_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysiotherapyForm {
    pub mobility: Mobility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_score: Option<u8>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialWorkForm {
    pub living_situation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver: Option<String>,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum AssessmentForm {
    Physician(PhysicianForm),
    Nurse(NurseForm),
    Physiotherapist(PhysiotherapyForm),
    SocialWorker(SocialWorkForm),
}

impl AssessmentForm {
    pub fn role(&self) -> Role {
        match self {
            Self::Physician(_) => Role::Physician,
            Self::Nurse(_) => Role::Nurse,
            Self::Physiotherapist(_) => Role::Physiotherapist,
            Self::SocialWorker(_) => Role::SocialWorker,
        }
    }

    /// Validates and trims the form in place.
    pub fn normalize(&mut self) -> ValidationResult<()> {
        match self {
            Self::Physician(form) => {
                form.diagnosis = require_text("physicianForm", "diagnosis", &form.diagnosis)?;
                form.plan = form.plan.trim().to_string();
                form.medications = clean_list(&form.medications);
                if let Some(vitals) = &form.vitals {
                    vitals.validate()?;
                }
                if form.vitals.as_ref().is_some_and(Vitals::is_empty) {
                    form.vitals = None;
                }
            }
            Self::Nurse(form) => {
                if form.vitals.is_empty() {
                    return Err(ValidationError::EmptyField {
                        entity: "nurseForm",
                        field: "vitals",
                    });
                }
                form.vitals.validate()?;
                check_range("bradenScore", form.braden_score, 6, 23)?;
                form.wound_care = optional_text(form.wound_care.take());
                form.notes = optional_text(form.notes.take());
            }
            Self::Physiotherapist(form) => {
                check_range("painScore", form.pain_score, 0, 10)?;
                form.goals = clean_list(&form.goals);
                form.plan = optional_text(form.plan.take());
            }
            Self::SocialWorker(form) => {
                form.living_situation = require_text(
                    "socialWorkForm",
                    "livingSituation",
                    &form.living_situation,
                )?;
                form.caregiver = optional_text(form.caregiver.take());
                form.needs = clean_list(&form.needs);
                form.notes = optional_text(form.notes.take());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: RecordId,
    pub patient_id: PatientId,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: i64,
    /// `None` only for legacy free-form records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<AssessmentForm>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Assessment {
    /// Role of the filed form; `None` for legacy free-form records.
    pub fn role(&self) -> Option<Role> {
        self.form.as_ref().map(AssessmentForm::role)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentInput {
    pub patient_id: PatientId,
    pub author: String,
    pub form: AssessmentForm,
}

impl AssessmentInput {
    /// Validates author and form. `bound_role` is the author's directory role, if any.
    pub fn into_assessment(
        self,
        id: RecordId,
        bound_role: Option<Role>,
        now_ms: i64,
    ) -> ValidationResult<Assessment> {
        let author = require_text("assessment", "author", &self.author)?;
        let mut form = self.form;
        if let Some(bound) = bound_role {
            if bound != form.role() {
                return Err(ValidationError::AuthorRoleMismatch {
                    author,
                    bound,
                    form: form.role(),
                });
            }
        }
        form.normalize()?;
        Ok(Assessment {
            id,
            patient_id: self.patient_id,
            author,
            created_at: now_ms,
            form: Some(form),
            extra: serde_json::Map::new(),
        })
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
