//! Error types shared by all backends.

use seed_core::BackendKind;
use thiserror::Error;

/// Errors that can occur while writing records to a backend.
#[derive(Error, Debug)]
pub enum PopulateError {
    /// Database driver error, boxed by the backend that raised it.
    #[error("{kind} error: {source}")]
    Backend {
        kind: BackendKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Table was never created.
    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    /// Update or delete on a table without a primary key.
    #[error("Table '{table}' has no primary key; cannot {operation} records")]
    MissingPrimaryKey {
        table: String,
        operation: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PopulateError {
    pub fn backend(
        kind: BackendKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            kind,
            source: source.into(),
        }
    }
}
