//! Patient operations.

use crate::model::id::EntityId;
use crate::model::patient::{Patient, PatientId, PatientInput};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::{now_epoch_ms, Change, Repository};
use crate::store::DocumentStore;

impl<S: DocumentStore> Repository<S> {
    /// All patients in insertion order.
    pub fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        Ok(self.snapshot()?.patients.into_vec())
    }

    pub fn get_patient(&self, id: &PatientId) -> RepoResult<Option<Patient>> {
        Ok(self.snapshot()?.patient(id).cloned())
    }

    /// Patients whose name, MRN or phone matches `query`. Blank lists all.
    pub fn search_patients(&self, query: &str) -> RepoResult<Vec<Patient>> {
        Ok(self
            .snapshot()?
            .patients
            .into_vec()
            .into_iter()
            .filter(|patient| patient.matches_query(query))
            .collect())
    }

    /// Stores a new patient and returns it with its generated id.
    ///
    /// # Errors
    /// - `Validation` when `name` or `mrn` is blank or a phone is malformed.
    pub fn add_patient(&self, input: PatientInput) -> RepoResult<Patient> {
        let patient = Patient::create(EntityId::generate(), &input, now_epoch_ms())?;
        self.mutate("add_patient", move |db| {
            db.patients.push(patient.clone());
            Ok(Change::write(patient))
        })
    }

    /// Replaces a patient's editable fields. `id` and `createdAt` are kept.
    ///
    /// # Errors
    /// - `Validation` before the write lock is taken.
    /// - `NotFound` when no patient has `id`.
    pub fn update_patient(&self, id: &PatientId, input: PatientInput) -> RepoResult<Patient> {
        let fields = input.validate()?;
        self.mutate("update_patient", move |db| {
            let patient = db
                .patients
                .iter_mut()
                .find(|patient| &patient.id == id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            patient.apply(fields, now_epoch_ms());
            Ok(Change::write(patient.clone()))
        })
    }
}
