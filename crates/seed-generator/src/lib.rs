//! Relationship-aware record generation for schema-seeder.
//!
//! This crate turns a [`seed_core::Schema`] into records:
//!
//! 1. [`normalize`] adds a junction entity for every to-many relation.
//! 2. [`resolve`] groups the normalized entities into dependency levels, or
//!    fails on a cycle.
//! 3. [`DataGenerator`] produces records one at a time, resolving scalar
//!    fields through the [`Synthesizer`] and relations through the per-entity
//!    [`RecordStore`]s it owns.
//!
//! # Architecture
//!
//! ```text
//! Schema (YAML)
//!      │
//!      ▼
//!  normalize ──► Schema + junction entities
//!      │
//!      ▼
//!   resolve ──► [DependencyLevel, ...]
//!      │
//!      ▼
//! ┌──────────────────────┐
//! │    DataGenerator     │
//! │                      │
//! │  - Synthesizer       │
//! │  - StoreRegistry     │
//! │  - rng (StdRng)      │
//! └──────────┬───────────┘
//!            │ generate(entity, prefill)
//!            ▼
//!    Record { field: Value, ... }
//! ```
//!
//! # Example
//!
//! ```rust
//! use seed_core::{Record, Schema};
//! use seed_generator::{normalize, resolve, DataGenerator};
//!
//! let schema = Schema::from_yaml(r#"
//! User:
//!   fields:
//!     id:
//!       type: sequence
//!     email:
//!       type: internet.email
//!   constraints:
//!     primaryKey: [id]
//!   count: 3
//! "#).unwrap();
//!
//! let normalized = normalize(&schema);
//! let levels = resolve(&normalized).unwrap();
//! assert_eq!(levels.len(), 1);
//!
//! let mut generator = DataGenerator::new(normalized, Some(42)).unwrap();
//! let user = generator.generate("User", Record::new()).unwrap();
//! println!("Generated record: {:?}", user);
//! ```
//!
//! # Field types
//!
//! - `sequence` - per-entity counter starting at 1
//! - `space` - a single space, for composite types
//! - `name.*`, `internet.*`, `address.*`, `phone.*`, `company.*`, `lorem.*`,
//!   `commerce.*`, `finance.*` - fake text
//! - `random.number`, `random.float`, `random.boolean`, `internet.port` - numbers
//! - `date.past`, `date.future`, `date.recent`, `date.soon`, `date.between` -
//!   timestamps relative to the generator's base time
//! - `random.uuid` - UUID v4

pub mod generator;
pub mod generators;
pub mod normalize;
pub mod resolve;
pub mod store;

pub use generator::{updatable_fields, DataGenerator, GeneratorError, MAX_GENERATION_DEPTH};
pub use generators::Synthesizer;
pub use normalize::{junction_field, junction_name, normalize};
pub use resolve::{dependencies, resolve, DependencyLevel, QueuedEntity, ResolveError};
pub use store::{RecordStore, StoreRegistry};
