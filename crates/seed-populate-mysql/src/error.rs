//! Error types for the MySQL backend.

use seed_core::BackendKind;
use seed_populate::PopulateError;
use thiserror::Error;

/// Errors that can occur during MySQL population.
#[derive(Error, Debug)]
pub enum MySQLPopulatorError {
    /// MySQL connection or query error.
    #[error("MySQL error: {0}")]
    MySQL(#[from] mysql_async::Error),

    /// Invalid connection URL.
    #[error("Invalid MySQL connection URL: {0}")]
    Url(#[from] mysql_async::UrlError),
}

impl From<MySQLPopulatorError> for PopulateError {
    fn from(error: MySQLPopulatorError) -> Self {
        PopulateError::backend(BackendKind::MySQL, error)
    }
}
