//! Error types for the persistence layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // PostgreSQL unique violation
                Some("23505") => StoreError::Conflict("Resource already exists".to_string()),
                // PostgreSQL foreign key violation
                Some("23503") => {
                    StoreError::Conflict("Resource is referenced by other records".to_string())
                }
                _ => StoreError::Database(db_err.to_string()),
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
