use homecare_core::db::migrations::latest_version;
use homecare_core::db::{open_db, open_db_in_memory, DbError};
use homecare_core::{
    DocumentStore, PatientInput, RepoError, Repository, SqliteDocumentStore, StoreError,
    CURRENT_SCHEMA_VERSION,
};
use rusqlite::Connection;
use serde_json::json;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "document_slots");
    assert_table_exists(&conn, "document_backups");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homecare.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "document_slots");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let store_err = SqliteDocumentStore::open(&path, "homecare-db")
        .err()
        .expect("store open should fail");
    let repo_err: RepoError = store_err.into();
    assert!(matches!(
        repo_err,
        RepoError::UnsupportedStorageVersion { db_version: 999, .. }
    ));
    assert!(!repo_err.kind().is_user_correctable());
}

#[test]
fn bootstrap_sets_busy_timeout_only() {
    let conn = open_db_in_memory().unwrap();

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(busy_timeout, 5000);
    assert_eq!(foreign_keys, 0);
}

#[test]
fn document_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homecare.db");

    let patient_id = {
        let repo = Repository::new(SqliteDocumentStore::open(&path, "homecare-db").unwrap());
        let patient = repo
            .add_patient(PatientInput::new(
                "Test Patient",
                "TEST-001",
                vec!["0501234567".to_string()],
            ))
            .unwrap();
        repo.shutdown().unwrap();
        patient.id
    };

    let repo = Repository::new(SqliteDocumentStore::open(&path, "homecare-db").unwrap());
    let patients = repo.list_patients().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].id, patient_id);
    assert_eq!(patients[0].mrn, "TEST-001");
    assert_eq!(repo.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn stored_row_tracks_document_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homecare.db");
    let store = SqliteDocumentStore::open(&path, "homecare-db").unwrap();
    store
        .save(&json!({"__version": CURRENT_SCHEMA_VERSION, "patients": []}))
        .unwrap();

    let conn = Connection::open(&path).unwrap();
    let version: i64 = conn
        .query_row(
            "SELECT doc_version FROM document_slots WHERE slot = 'homecare-db';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(version, i64::from(CURRENT_SCHEMA_VERSION));
}

#[test]
fn corrupt_payload_is_reported_not_masked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homecare.db");
    let store = SqliteDocumentStore::open(&path, "homecare-db").unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO document_slots (slot, payload, doc_version) VALUES ('homecare-db', '{not json', 4);",
        [],
    )
    .unwrap();

    assert!(matches!(store.load(), Err(StoreError::CorruptPayload(_))));
    let repo = Repository::new(store);
    assert!(matches!(repo.list_patients(), Err(RepoError::InvalidData(_))));
}

#[test]
fn legacy_upgrade_writes_a_backup_row() {
    let store = SqliteDocumentStore::open_in_memory("homecare-db").unwrap();
    store
        .save(&json!({
            "__version": 2,
            "patients": [{"id": "5f0c6b8e-8d55-4d57-9a4b-2a8f1f0e3a01", "name": "A", "mrn": "M", "phones": []}],
            "notes": [],
            "assessments": [],
            "contacts": []
        }))
        .unwrap();
    let repo = Repository::new(store);

    repo.upsert_role("Nurse Amal", homecare_core::Role::Nurse)
        .unwrap();

    let backups = repo.store().list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].doc_version, 2);
    assert_eq!(repo.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    assert_eq!(repo.list_patients().unwrap().len(), 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
