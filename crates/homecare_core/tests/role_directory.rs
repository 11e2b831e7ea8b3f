use homecare_core::{
    AssessmentForm, AssessmentInput, ErrorKind, MemoryDocumentStore, PatientInput, PhysicianForm,
    RepoError, Repository, Role, RoleUpsert, SqliteDocumentStore, ValidationError,
};

fn repo() -> Repository<MemoryDocumentStore> {
    Repository::new(MemoryDocumentStore::new())
}

#[test]
fn same_role_twice_is_idempotent() {
    let repo = repo();

    assert_eq!(
        repo.upsert_role("Dr. Saad", Role::Physician).unwrap(),
        RoleUpsert::Created
    );
    let after_first = repo.list_roles().unwrap();
    assert_eq!(
        repo.upsert_role("Dr. Saad", Role::Physician).unwrap(),
        RoleUpsert::Unchanged
    );

    assert_eq!(repo.list_roles().unwrap(), after_first);
    assert_eq!(repo.store().write_count(), 1);
}

#[test]
fn rebinding_to_a_different_role_conflicts() {
    let repo = repo();
    repo.upsert_role("Dr. Saad", Role::Physician).unwrap();

    let err = repo.upsert_role("Dr. Saad", Role::Nurse).unwrap_err();

    assert!(err.to_string().contains("Dr. Saad"));
    assert!(matches!(
        err,
        RepoError::RoleConflict {
            existing: Role::Physician,
            requested: Role::Nurse,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::RoleConflict);
    assert_eq!(repo.role_of("Dr. Saad").unwrap(), Some(Role::Physician));
    assert_eq!(repo.store().write_count(), 1);
}

#[test]
fn conflict_holds_for_every_pair_of_distinct_roles() {
    for first in Role::ALL {
        for second in Role::ALL {
            if first == second {
                continue;
            }
            let repo = repo();
            repo.upsert_role("Staff", first).unwrap();
            assert!(repo.upsert_role("Staff", second).is_err());
            assert_eq!(repo.role_of("Staff").unwrap(), Some(first));
        }
    }
}

#[test]
fn names_match_trimmed_and_case_insensitive() {
    let repo = repo();
    repo.upsert_role("Nurse Amal", Role::Nurse).unwrap();

    assert_eq!(
        repo.upsert_role("  nurse amal ", Role::Nurse).unwrap(),
        RoleUpsert::Unchanged
    );
    assert!(repo.upsert_role("NURSE AMAL", Role::SocialWorker).is_err());

    let roles = repo.list_roles().unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "Nurse Amal");
}

#[test]
fn labels_are_parsed_before_binding() {
    let repo = repo();
    assert_eq!(
        repo.upsert_role_label("Dr. Saad", "Physician").unwrap(),
        RoleUpsert::Created
    );
    assert_eq!(
        repo.upsert_role_label("Dr. Saad", "doctor").unwrap(),
        RoleUpsert::Unchanged
    );

    let err = repo.upsert_role_label("Dr. Saad", "Pharmacist").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownRole(_))
    ));
    let err = repo.upsert_role_label("   ", "Nurse").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField { .. })
    ));
    assert_eq!(repo.store().write_count(), 1);
}

#[test]
fn bound_author_cannot_file_another_roles_form() {
    let repo = repo();
    let patient = repo
        .add_patient(PatientInput::new("Patient", "M-1", Vec::new()))
        .unwrap();
    repo.upsert_role("Nurse Amal", Role::Nurse).unwrap();
    let writes_before = repo.store().write_count();

    let err = repo
        .add_assessment(AssessmentInput {
            patient_id: patient.id,
            author: "Nurse Amal".to_string(),
            form: AssessmentForm::Physician(PhysicianForm {
                diagnosis: "CHF".to_string(),
                ..PhysicianForm::default()
            }),
        })
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::AuthorRoleMismatch {
            bound: Role::Nurse,
            form: Role::Physician,
            ..
        })
    ));
    assert_eq!(repo.store().write_count(), writes_before);
}

#[test]
fn directory_persists_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roles.db");
    {
        let repo = Repository::new(SqliteDocumentStore::open(&path, "homecare-db").unwrap());
        repo.upsert_role("Dr. Saad", Role::Physician).unwrap();
    }

    let repo = Repository::new(SqliteDocumentStore::open(&path, "homecare-db").unwrap());
    assert!(repo.upsert_role("Dr. Saad", Role::Nurse).is_err());
    assert_eq!(repo.role_of("dr. saad").unwrap(), Some(Role::Physician));
}
