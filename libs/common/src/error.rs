//! Custom error types for the common library
//!
//! This module defines the storage-level error types shared by the API
//! service and the ingredient loader.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

impl DatabaseError {
    /// Name of the constraint the failed statement violated, if any
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DatabaseError::Query(SqlxError::Database(db)) => db.constraint(),
            _ => None,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error raised while hashing or verifying a password
#[derive(Error, Debug)]
#[error("Password hashing error: {0}")]
pub struct PasswordError(pub String);
