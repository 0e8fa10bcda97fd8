//! Classification of SQLx failures into the cases handlers react to.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// No row for the given identifier
    #[error("Entity not found")]
    NotFound,

    /// A `UNIQUE` constraint rejected the write
    #[error("Unique constraint violation: {message}")]
    UniqueViolation { message: String },

    /// A `REFERENCES` constraint rejected the write
    #[error("Foreign key constraint violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A `CHECK` constraint rejected the write
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Anything else: I/O, pool exhaustion, malformed SQL
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db_err) = &err else {
            return match err {
                sqlx::Error::RowNotFound => DbError::NotFound,
                other => DbError::Other(other.into()),
            };
        };

        // SQLite reports neither constraint nor table names, only the message
        // (e.g. "UNIQUE constraint failed: users.email").
        let message = db_err.message().to_string();
        if db_err.is_unique_violation() {
            DbError::UniqueViolation { message }
        } else if db_err.is_foreign_key_violation() {
            DbError::ForeignKeyViolation { message }
        } else if db_err.is_check_violation() {
            DbError::CheckViolation { message }
        } else {
            DbError::Other(err.into())
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
