//! Store-level error taxonomy.
//!
//! # Responsibility
//! - Surface validation, reference and authorization failures as distinct
//!   categories at every operation boundary.
//! - Translate SQLite constraint failures into those categories so raw
//!   storage errors never leak for constraint violations.
//!
//! # Invariants
//! - CHECK / NOT NULL failures map to `Validation`.
//! - FOREIGN KEY failures map to `Reference`.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ffi;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity kind named in reference/not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    GenerationSession,
    Flashcard,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::GenerationSession => "generation session",
            Self::Flashcard => "flashcard",
        }
    }
}

/// Why the access policy rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("anonymous principals cannot access the store")]
    Anonymous,
    #[error("principal does not own this {}", .entity.as_str())]
    NotOwner { entity: EntityKind },
}

/// Dangling or missing foreign reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("referenced {} {id} does not exist", .entity.as_str())]
    Missing { entity: EntityKind, id: Uuid },
    /// Storage-level FOREIGN KEY failure where the offending id is unknown.
    #[error("foreign key constraint violated: {0}")]
    Constraint(String),
}

/// Error returned by every public store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("{} not found: {id}", .entity.as_str())]
    NotFound { entity: EntityKind, id: Uuid },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(DbError),
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn missing_reference(entity: EntityKind, id: Uuid) -> Self {
        Self::Reference(ReferenceError::Missing { entity, id })
    }

    /// Stable short code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Reference(_) => "reference",
            Self::Authorization(_) => "authorization",
            Self::NotFound { .. } => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db",
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        translate_sqlite_error(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(format!("proposals json: {value}"))
    }
}

fn translate_sqlite_error(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let detail = message
                .clone()
                .unwrap_or_else(|| "constraint failed".to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return StoreError::Validation(ValidationError::Constraint(detail));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::Reference(ReferenceError::Constraint(detail));
                }
                _ => {}
            }
        }
    }
    StoreError::Db(DbError::Sqlite(err))
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationError, EntityKind, ReferenceError, StoreError};
    use crate::model::ValidationError;
    use rusqlite::Connection;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY);
             CREATE TABLE child (
                id TEXT PRIMARY KEY,
                parent_id TEXT REFERENCES parent(id),
                body TEXT NOT NULL CHECK (length(body) <= 3)
             );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn check_violation_maps_to_validation() {
        let conn = scratch();
        let err = conn
            .execute("INSERT INTO child (id, body) VALUES ('a', 'toolong');", [])
            .unwrap_err();
        assert!(matches!(
            StoreError::from(err),
            StoreError::Validation(ValidationError::Constraint(_))
        ));
    }

    #[test]
    fn not_null_violation_maps_to_validation() {
        let conn = scratch();
        let err = conn
            .execute("INSERT INTO child (id, body) VALUES ('a', NULL);", [])
            .unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Validation(_)));
    }

    #[test]
    fn foreign_key_violation_maps_to_reference() {
        let conn = scratch();
        let err = conn
            .execute(
                "INSERT INTO child (id, parent_id, body) VALUES ('a', 'missing', 'ok');",
                [],
            )
            .unwrap_err();
        assert!(matches!(
            StoreError::from(err),
            StoreError::Reference(ReferenceError::Constraint(_))
        ));
    }

    #[test]
    fn primary_key_violation_stays_a_db_error() {
        let conn = scratch();
        conn.execute("INSERT INTO parent (id) VALUES ('p');", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO parent (id) VALUES ('p');", [])
            .unwrap_err();
        let err = StoreError::from(err);
        assert_eq!(err.code(), "db");
    }

    #[test]
    fn authorization_messages_name_the_entity() {
        let err = StoreError::from(AuthorizationError::NotOwner {
            entity: EntityKind::Flashcard,
        });
        assert_eq!(err.to_string(), "principal does not own this flashcard");
    }
}
