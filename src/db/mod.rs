pub mod connection;
pub mod repository;
pub mod sqlite;

pub use connection::*;
pub use repository::*;
pub use sqlite::*;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("Cannot open database {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database connection unavailable")]
    ConnectionUnavailable,

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: i64 },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Schema bootstrap failed: {0}")]
    SchemaFailed(String),
}

impl DatabaseError {
    pub fn not_found(entity_type: &str, id: i64) -> Self {
        DatabaseError::NotFound {
            entity_type: entity_type.into(),
            id,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DatabaseError::ConstraintViolation(_))
    }
}

/// Constraint failures (foreign key, NOT NULL, CHECK) get their own variant so
/// callers can tell "refused by the schema" apart from other statement errors.
impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            if err.code == ErrorCode::ConstraintViolation {
                return DatabaseError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| err.to_string()),
                );
            }
        }
        DatabaseError::Sqlite(e)
    }
}
