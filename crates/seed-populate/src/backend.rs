//! Storage backend capability.

use crate::error::PopulateError;
use async_trait::async_trait;
use seed_core::{BackendKind, Record, TableDefinition};

/// Default number of records per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A storage backend the seeder writes to.
///
/// All methods take `&self` so the tables of one dependency level can be
/// created and filled concurrently; implementations serialize access to
/// their connection internally.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Create a table from its layout.
    async fn create_table(&self, table: &TableDefinition) -> Result<(), PopulateError>;

    /// Drop a table if it exists.
    async fn drop_table(&self, table: &str) -> Result<(), PopulateError>;

    /// Insert records, returning how many were written.
    async fn batch_insert(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError>;

    /// Rewrite the value columns of records matched by primary key.
    async fn update_records(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError>;

    /// Delete records matched by primary key.
    async fn delete_records(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError>;
}

/// Records per statement so that `columns * records` stays within
/// `max_params` bind parameters. Always at least 1.
pub fn chunk_size(batch_size: usize, columns: usize, max_params: usize) -> usize {
    let by_params = max_params / columns.max(1);
    batch_size.min(by_params).max(1)
}

/// Fail with [`PopulateError::MissingPrimaryKey`] when the table has no key.
pub fn require_primary_key<'a>(
    table: &'a TableDefinition,
    operation: &'static str,
) -> Result<&'a [String], PopulateError> {
    if table.primary_key.is_empty() {
        return Err(PopulateError::MissingPrimaryKey {
            table: table.name.clone(),
            operation,
        });
    }
    Ok(&table.primary_key)
}
