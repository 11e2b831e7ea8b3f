//! Repository error taxonomy.

use crate::db::DbError;
use crate::migrate::MigrationError;
use crate::model::id::EntityId;
use crate::model::role::Role;
use crate::model::validation::ValidationError;
use crate::store::StoreError;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("role conflict: `{name}` is already bound to {existing}; refusing to rebind to {requested}")]
    RoleConflict {
        name: String,
        existing: Role,
        requested: Role,
    },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
    #[error("document schema version {doc_version} is newer than supported {latest_supported}; the application must be updated")]
    UnsupportedSchemaVersion {
        doc_version: u32,
        latest_supported: u32,
    },
    /// The SQLite file's table layout (`PRAGMA user_version`) is newer than
    /// this build, independent of the document's `__version`.
    #[error("storage schema version {db_version} is newer than supported {latest_supported}; the application must be updated")]
    UnsupportedStorageVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("invalid persisted document: {0}")]
    InvalidData(String),
    #[error("record not found: {0}")]
    NotFound(EntityId),
}

/// Coarse classification for callers deciding how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    RoleConflict,
    NotFound,
    StorageUnavailable,
    UnsupportedSchemaVersion,
    InvalidData,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::RoleConflict => "role_conflict",
            Self::NotFound => "not_found",
            Self::StorageUnavailable => "storage_unavailable",
            Self::UnsupportedSchemaVersion => "unsupported_schema_version",
            Self::InvalidData => "invalid_data",
        }
    }

    /// `true` for inline, user-fixable form errors; `false` for blocking notices.
    pub fn is_user_correctable(self) -> bool {
        matches!(self, Self::Validation | Self::RoleConflict | Self::NotFound)
    }
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::RoleConflict { .. } => ErrorKind::RoleConflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::UnsupportedSchemaVersion { .. } | Self::UnsupportedStorageVersion { .. } => {
                ErrorKind::UnsupportedSchemaVersion
            }
            Self::InvalidData(_) => ErrorKind::InvalidData,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::CorruptPayload(err) => Self::InvalidData(err.to_string()),
            StoreError::Serialize(err) => Self::InvalidData(err.to_string()),
            StoreError::Db(DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            }) => Self::UnsupportedStorageVersion {
                db_version,
                latest_supported,
            },
            other => Self::StorageUnavailable(other),
        }
    }
}

impl From<MigrationError> for RepoError {
    fn from(value: MigrationError) -> Self {
        match value {
            MigrationError::UnsupportedSchemaVersion {
                doc_version,
                latest_supported,
            } => Self::UnsupportedSchemaVersion {
                doc_version,
                latest_supported,
            },
            MigrationError::MalformedDocument(message) => Self::InvalidData(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RepoError};
    use crate::db::DbError;
    use crate::migrate::MigrationError;
    use crate::model::role::Role;
    use crate::store::StoreError;

    #[test]
    fn role_conflict_message_names_the_staff_member() {
        let err = RepoError::RoleConflict {
            name: "Dr. Saad".to_string(),
            existing: Role::Physician,
            requested: Role::Nurse,
        };
        let message = err.to_string();
        assert!(message.contains("Dr. Saad"));
        assert!(message.contains("Physician"));
        assert!(err.kind().is_user_correctable());
    }

    #[test]
    fn storage_and_schema_errors_are_blocking() {
        let storage: RepoError = StoreError::Unavailable("quota".to_string()).into();
        assert_eq!(storage.kind(), ErrorKind::StorageUnavailable);
        assert!(!storage.kind().is_user_correctable());

        let schema: RepoError = MigrationError::UnsupportedSchemaVersion {
            doc_version: 9,
            latest_supported: 4,
        }
        .into();
        assert_eq!(schema.kind(), ErrorKind::UnsupportedSchemaVersion);
        assert!(!schema.kind().is_user_correctable());
    }

    #[test]
    fn newer_sqlite_layout_is_not_reported_as_document_version() {
        let err: RepoError = StoreError::Db(DbError::UnsupportedSchemaVersion {
            db_version: 7,
            latest_supported: 2,
        })
        .into();
        assert!(matches!(
            err,
            RepoError::UnsupportedStorageVersion {
                db_version: 7,
                latest_supported: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::UnsupportedSchemaVersion);
        assert!(err.to_string().contains("storage schema version 7"));
    }
}
