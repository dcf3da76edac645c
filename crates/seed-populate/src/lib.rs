//! Common types and utilities for schema-seeder populators.
//!
//! This crate provides the [`Backend`] capability every storage backend
//! implements, the shared CLI arguments and error type, and an in-process
//! [`MemoryBackend`] used for dry runs and tests.

pub mod args;
pub mod backend;
pub mod error;
pub mod memory;

pub use args::CommonSeedArgs;
pub use backend::{chunk_size, require_primary_key, Backend, DEFAULT_BATCH_SIZE};
pub use error::PopulateError;
pub use memory::{BackendOperation, MemoryBackend};
