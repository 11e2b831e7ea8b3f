//! Patient-scoped record operations: notes, assessments, contacts, tasks, files.
//!
//! Every write checks that the referenced patient exists before appending.

use crate::model::assessment::{Assessment, AssessmentInput};
use crate::model::database::{Collection, Database};
use crate::model::id::EntityId;
use crate::model::patient::PatientId;
use crate::model::record::{
    ContactAttempt, ContactInput, FileInput, FileRef, Note, NoteInput, RecordId, Task, TaskInput,
};
use crate::model::validation::ValidationError;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::{now_epoch_ms, Change, Repository};
use crate::store::DocumentStore;

impl<S: DocumentStore> Repository<S> {
    pub fn add_note(&self, input: NoteInput) -> RepoResult<Note> {
        let note = input.into_note(EntityId::generate(), now_epoch_ms())?;
        self.mutate("add_note", move |db| {
            ensure_patient(db, &note.patient_id)?;
            db.notes.push(note.clone());
            Ok(Change::write(note))
        })
    }

    pub fn list_notes(&self, patient_id: &PatientId) -> RepoResult<Vec<Note>> {
        Ok(for_patient(self.snapshot()?.notes, patient_id, |note| &note.patient_id))
    }

    /// Files a role-specific assessment.
    ///
    /// # Errors
    /// - `Validation` for out-of-range clinical values, an unknown patient, or
    ///   an author whose directory role differs from the form's role.
    pub fn add_assessment(&self, input: AssessmentInput) -> RepoResult<Assessment> {
        self.mutate("add_assessment", move |db| {
            ensure_patient(db, &input.patient_id)?;
            let bound_role = db.role_binding(&input.author).map(|binding| binding.role);
            let assessment =
                input.into_assessment(EntityId::generate(), bound_role, now_epoch_ms())?;
            db.assessments.push(assessment.clone());
            Ok(Change::write(assessment))
        })
    }

    /// Includes legacy free-form assessments, which have no `form`.
    pub fn list_assessments(&self, patient_id: &PatientId) -> RepoResult<Vec<Assessment>> {
        Ok(for_patient(
            self.snapshot()?.assessments,
            patient_id,
            |assessment| &assessment.patient_id,
        ))
    }

    pub fn add_contact_attempt(&self, input: ContactInput) -> RepoResult<ContactAttempt> {
        let contact = input.into_contact(EntityId::generate(), now_epoch_ms())?;
        self.mutate("add_contact_attempt", move |db| {
            ensure_patient(db, &contact.patient_id)?;
            db.contacts.push(contact.clone());
            Ok(Change::write(contact))
        })
    }

    pub fn list_contacts(&self, patient_id: &PatientId) -> RepoResult<Vec<ContactAttempt>> {
        Ok(for_patient(
            self.snapshot()?.contacts,
            patient_id,
            |contact| &contact.patient_id,
        ))
    }

    pub fn add_task(&self, input: TaskInput) -> RepoResult<Task> {
        let task = input.into_task(EntityId::generate(), now_epoch_ms())?;
        self.mutate("add_task", move |db| {
            ensure_patient(db, &task.patient_id)?;
            db.tasks.push(task.clone());
            Ok(Change::write(task))
        })
    }

    /// Marks a task done. Completing an already-done task writes nothing.
    pub fn complete_task(&self, task_id: &RecordId) -> RepoResult<Task> {
        self.mutate("complete_task", move |db| {
            let task = db
                .tasks
                .iter_mut()
                .find(|task| &task.id == task_id)
                .ok_or_else(|| RepoError::NotFound(task_id.clone()))?;
            if task.complete(now_epoch_ms()) {
                Ok(Change::write(task.clone()))
            } else {
                Ok(Change::unchanged(task.clone()))
            }
        })
    }

    /// Tasks for one patient, or every task when `patient_id` is `None`.
    pub fn list_tasks(&self, patient_id: Option<&PatientId>) -> RepoResult<Vec<Task>> {
        let tasks = self.snapshot()?.tasks;
        Ok(match patient_id {
            Some(patient_id) => for_patient(tasks, patient_id, |task| &task.patient_id),
            None => tasks.into_vec(),
        })
    }

    pub fn add_file(&self, input: FileInput) -> RepoResult<FileRef> {
        let file = input.into_file(EntityId::generate(), now_epoch_ms())?;
        self.mutate("add_file", move |db| {
            ensure_patient(db, &file.patient_id)?;
            db.files.push(file.clone());
            Ok(Change::write(file))
        })
    }

    pub fn list_files(&self, patient_id: &PatientId) -> RepoResult<Vec<FileRef>> {
        Ok(for_patient(self.snapshot()?.files, patient_id, |file| &file.patient_id))
    }
}

fn ensure_patient(db: &Database, patient_id: &PatientId) -> RepoResult<()> {
    if db.has_patient(patient_id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownPatient(patient_id.clone()).into())
    }
}

fn for_patient<T>(
    records: Collection<T>,
    patient_id: &PatientId,
    owner: impl Fn(&T) -> &PatientId,
) -> Vec<T> {
    records
        .into_vec()
        .into_iter()
        .filter(|record| owner(record) == patient_id)
        .collect()
}
