//! Core types for the schema-seeder framework.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace:
//!
//! - [`Schema`] / [`Entity`] / [`Field`] - the declarative entity graph
//! - [`Value`] / [`Record`] - generated values and records
//! - [`RecordFilter`] - structural predicates used when sampling records
//! - [`ColumnType`] / [`TableDefinition`] - backend-neutral table layout
//!
//! # Architecture
//!
//! ```text
//! seed-core (this crate)
//!    │
//!    ├─── seed-generator            (normalizes, resolves and generates records)
//!    │
//!    ├─── seed-populate             (backend capability trait)
//!    ├─── seed-populate-postgresql  (renders ColumnType as PostgreSQL DDL)
//!    └─── seed-populate-mysql       (renders ColumnType as MySQL DDL)
//! ```
//!
//! # Example
//!
//! ```rust
//! use seed_core::Schema;
//!
//! let schema = Schema::from_yaml(r#"
//! User:
//!   fields:
//!     id:
//!       type: sequence
//!     name:
//!       type: [name.firstName, space, name.lastName]
//!   constraints:
//!     primaryKey: [id]
//!   count: 3
//! "#).unwrap();
//!
//! assert!(schema.get_entity("User").is_some());
//! ```

pub mod filter;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use filter::{Condition, Operators, RecordFilter};
pub use schema::{
    Constraints, CountRange, Entity, Field, FieldType, OnDelete, ReferenceField, ReferenceType,
    ScalarField, Schema, SchemaError, UniqueConstraint,
};
pub use types::{
    map_field_type, BackendKind, ColumnDefinition, ColumnType, ForeignKey, TableDefinition, ToDdl,
};
pub use values::{Record, Value};
