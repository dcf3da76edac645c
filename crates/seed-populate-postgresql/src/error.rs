//! Error types for the PostgreSQL backend.

use seed_core::BackendKind;
use seed_populate::PopulateError;
use thiserror::Error;

/// Errors that can occur during PostgreSQL population.
#[derive(Error, Debug)]
pub enum PostgreSQLPopulatorError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<PostgreSQLPopulatorError> for PopulateError {
    fn from(error: PostgreSQLPopulatorError) -> Self {
        PopulateError::backend(BackendKind::PostgreSQL, error)
    }
}
