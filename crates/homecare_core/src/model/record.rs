//! Patient-scoped records: notes, contact attempts, tasks and file references.
//!
//! These are append-only in normal operation. Task completion is the one
//! in-place update.

use crate::model::id::EntityId;
use crate::model::patient::PatientId;
use crate::model::validation::{optional_text, require_text, validate_phone, ValidationResult};
use serde::{Deserialize, Serialize};

pub type RecordId = EntityId;

type Extra = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    General,
    /// Written during or right after a home visit.
    Visit,
    /// Summary of a phone follow-up.
    Phone,
    /// Shift or staff handover.
    Handover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInput {
    pub patient_id: PatientId,
    pub text: String,
    pub kind: NoteKind,
    pub author: Option<String>,
}

impl NoteInput {
    pub fn new(patient_id: PatientId, kind: NoteKind, text: impl Into<String>) -> Self {
        Self {
            patient_id,
            text: text.into(),
            kind,
            author: None,
        }
    }

    pub fn into_note(self, id: RecordId, now_ms: i64) -> ValidationResult<Note> {
        Ok(Note {
            id,
            patient_id: self.patient_id,
            text: require_text("note", "text", &self.text)?,
            kind: self.kind,
            author: optional_text(self.author),
            created_at: now_ms,
            extra: Extra::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactOutcome {
    Answered,
    NoAnswer,
    Busy,
    WrongNumber,
    Unreachable,
}

impl ContactOutcome {
    /// Whether the attempt reached the patient or their family.
    pub fn is_reached(self) -> bool {
        matches!(self, Self::Answered)
    }
}

/// One logged call attempt to a patient or caregiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAttempt {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub phone: String,
    pub outcome: ContactOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub attempted_by: String,
    #[serde(default)]
    pub attempted_at: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInput {
    pub patient_id: PatientId,
    pub phone: String,
    pub outcome: ContactOutcome,
    pub note: Option<String>,
    pub attempted_by: String,
}

impl ContactInput {
    pub fn into_contact(self, id: RecordId, now_ms: i64) -> ValidationResult<ContactAttempt> {
        Ok(ContactAttempt {
            id,
            patient_id: self.patient_id,
            phone: validate_phone(&self.phone)?,
            outcome: self.outcome,
            note: optional_text(self.note),
            attempted_by: require_text("contact", "attemptedBy", &self.attempted_by)?,
            attempted_at: now_ms,
            extra: Extra::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub title: String,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Task {
    /// Marks the task done. Returns `false` when it already was.
    pub fn complete(&mut self, now_ms: i64) -> bool {
        if self.status == TaskStatus::Done {
            return false;
        }
        self.status = TaskStatus::Done;
        self.completed_at = Some(now_ms);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub patient_id: PatientId,
    pub title: String,
    pub due_at: Option<i64>,
    pub assignee: Option<String>,
}

impl TaskInput {
    pub fn into_task(self, id: RecordId, now_ms: i64) -> ValidationResult<Task> {
        Ok(Task {
            id,
            patient_id: self.patient_id,
            title: require_text("task", "title", &self.title)?,
            due_at: self.due_at,
            assignee: optional_text(self.assignee),
            status: TaskStatus::Open,
            created_at: now_ms,
            completed_at: None,
            extra: Extra::new(),
        })
    }
}

/// Reference to an attachment stored outside the document (scan, photo, PDF).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
    pub uri: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    pub patient_id: PatientId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uri: String,
}

impl FileInput {
    pub fn into_file(self, id: RecordId, now_ms: i64) -> ValidationResult<FileRef> {
        let mime_type = match self.mime_type.trim() {
            "" => "application/octet-stream".to_string(),
            other => other.to_string(),
        };
        Ok(FileRef {
            id,
            patient_id: self.patient_id,
            name: require_text("file", "name", &self.name)?,
            mime_type,
            size_bytes: self.size_bytes,
            uri: require_text("file", "uri", &self.uri)?,
            created_at: now_ms,
            extra: Extra::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileInput, NoteInput, NoteKind, Task, TaskInput, TaskStatus};
    use crate::model::id::EntityId;

    #[test]
    fn note_kind_serializes_as_type_field() {
        let note = NoteInput::new(EntityId::generate(), NoteKind::Visit, "wound dressed")
            .into_note(EntityId::generate(), 1)
            .unwrap();
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "visit");
        assert!(value.get("author").is_none());
    }

    #[test]
    fn complete_is_idempotent() {
        let mut task: Task = TaskInput {
            patient_id: EntityId::generate(),
            title: "Deliver walker".to_string(),
            due_at: None,
            assignee: None,
        }
        .into_task(EntityId::generate(), 1)
        .unwrap();

        assert!(task.complete(5));
        assert!(!task.complete(9));
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(5));
    }

    #[test]
    fn file_defaults_blank_mime_type() {
        let file = FileInput {
            patient_id: EntityId::generate(),
            name: "discharge.pdf".to_string(),
            mime_type: " ".to_string(),
            size_bytes: 10,
            uri: "files/discharge.pdf".to_string(),
        }
        .into_file(EntityId::generate(), 1)
        .unwrap();
        assert_eq!(file.mime_type, "application/octet-stream");
    }
}
