//! Seeding orchestration for schema-seeder.
//!
//! Ties the workspace together: a [`SeedConfig`] names the schema and the
//! run parameters, a [`Seeder`] normalizes and levels the schema, creates
//! the tables on a [`seed_populate::Backend`] and runs the passes.
//!
//! 1. creating-schema: tables created level by level
//! 2. seeding-initial: `iterations` passes of exactly `count` records per entity
//! 3. seeding-continuous: `continuousIterations + 1` paced passes of a few
//!    records each, some of which are later updated or deleted
//!
//! # Example
//!
//! ```ignore
//! use seed_framework::{SeedConfig, SeedMode, Seeder};
//! use seed_populate::MemoryBackend;
//! use std::sync::Arc;
//!
//! let config = SeedConfig::from_file("seed.yaml")?;
//! let mut seeder = Seeder::new(config, Arc::new(MemoryBackend::new()))?;
//! let metrics = seeder.start(SeedMode::Continuous).await?;
//! println!("{}", metrics.summary());
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use config::{ConnectionConfig, SeedConfig};
pub use error::SeedError;
pub use metrics::SeedMetrics;
pub use pipeline::{Mutation, SeedMode, SeedPhase, Seeder};
