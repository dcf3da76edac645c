//! schema-seeder: fill relational databases with synthetic,
//! referentially-consistent data described by a YAML schema.
//!
//! The binary is a thin layer over the workspace crates:
//!
//! - `seed-core` - schema, values and table layout
//! - `seed-generator` - normalization, dependency leveling, record generation
//! - `seed-populate*` - the backends (PostgreSQL, MySQL, in-memory)
//! - `seed-framework` - the [`seed_framework::Seeder`] orchestrator

pub mod logging;
pub mod run;

pub use logging::mask_connection_password;
pub use run::{apply_args, connect_backend, run_seed};
