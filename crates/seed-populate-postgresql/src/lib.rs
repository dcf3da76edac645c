//! PostgreSQL backend for schema-seeder.
//!
//! Tables are created from [`seed_core::TableDefinition`]s with foreign keys,
//! primary keys and unique constraints. Records are written with multi-row
//! `INSERT` statements whose parameters are bound as text and cast to each
//! column's type, so every [`seed_core::Value`] variant maps the same way.

pub mod ddl;
pub mod error;
pub mod insert;
pub mod populator;

pub use ddl::PostgreSQLDdl;
pub use error::PostgreSQLPopulatorError;
pub use populator::PostgreSQLBackend;
