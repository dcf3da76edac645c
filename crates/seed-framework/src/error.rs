//! Error types for the seeding framework.

use seed_core::SchemaError;
use seed_generator::{GeneratorError, ResolveError};
use seed_populate::PopulateError;
use thiserror::Error;

/// Errors that can end a seeding run.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Dependency resolution error.
    #[error("Dependency error: {0}")]
    Resolve(#[from] ResolveError),

    /// Record generation error.
    #[error("Generation error: {0}")]
    Generator(#[from] GeneratorError),

    /// Backend error.
    #[error("Population error: {0}")]
    Populate(#[from] PopulateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record dump serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run file parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
