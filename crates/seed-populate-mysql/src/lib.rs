//! MySQL backend for schema-seeder.

pub mod ddl;
pub mod error;
pub mod insert;
pub mod populator;

pub use ddl::MySQLDdl;
pub use error::MySQLPopulatorError;
pub use populator::MySQLBackend;
