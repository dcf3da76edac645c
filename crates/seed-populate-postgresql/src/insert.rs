//! Batched INSERT / UPDATE / DELETE logic for PostgreSQL population.

use crate::ddl::{quote_ident, PostgreSQLDdl};
use crate::error::PostgreSQLPopulatorError;
use seed_core::{ColumnDefinition, Record, TableDefinition, ToDdl};
use seed_populate::chunk_size;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::debug;

/// PostgreSQL bind parameter limit per statement.
pub const MAX_PARAMS: usize = 65_535;

/// `$n` placeholder bound as text and cast to the column's type.
fn placeholder(ddl: &PostgreSQLDdl, index: usize, column: &ColumnDefinition) -> String {
    format!("${index}::TEXT::{}", ddl.to_ddl(&column.column_type))
}

/// Text parameters of `records`, column-major within each record.
fn text_params<'a>(
    columns: impl Iterator<Item = &'a ColumnDefinition> + Clone,
    records: &[Record],
) -> Vec<Option<String>> {
    records
        .iter()
        .flat_map(|record| {
            columns
                .clone()
                .map(move |column| record.value_or_null(&column.name).to_sql_text())
        })
        .collect()
}

fn param_refs(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// Generate a multi-row INSERT statement for `rows` records.
pub fn insert_statement(ddl: &PostgreSQLDdl, table: &TableDefinition, rows: usize) -> String {
    let mut param_idx = 1;
    let placeholders: Vec<String> = (0..rows)
        .map(|_| {
            let row: Vec<String> = table
                .columns
                .iter()
                .map(|column| {
                    let p = placeholder(ddl, param_idx, column);
                    param_idx += 1;
                    p
                })
                .collect();
            format!("({})", row.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        ddl.table_ref(&table.name),
        table
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders.join(", ")
    )
}

/// Generate the WHERE clause matching a primary key, numbering from `start`.
fn key_condition(ddl: &PostgreSQLDdl, table: &TableDefinition, start: usize) -> String {
    table
        .primary_key
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let cast = table
                .get_column(key)
                .map(|column| placeholder(ddl, start + i, column))
                .unwrap_or_else(|| format!("${}", start + i));
            format!("{} = {}", quote_ident(key), cast)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Generate an UPDATE statement setting every value column by primary key.
pub fn update_statement(ddl: &PostgreSQLDdl, table: &TableDefinition) -> String {
    let assignments: Vec<String> = table
        .value_columns()
        .enumerate()
        .map(|(i, column)| {
            format!(
                "{} = {}",
                quote_ident(&column.name),
                placeholder(ddl, i + 1, column)
            )
        })
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {}",
        ddl.table_ref(&table.name),
        assignments.join(", "),
        key_condition(ddl, table, assignments.len() + 1)
    )
}

/// Generate a DELETE statement by primary key.
pub fn delete_statement(ddl: &PostgreSQLDdl, table: &TableDefinition) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        ddl.table_ref(&table.name),
        key_condition(ddl, table, 1)
    )
}

fn key_columns(table: &TableDefinition) -> Vec<ColumnDefinition> {
    table
        .primary_key
        .iter()
        .filter_map(|key| table.get_column(key).cloned())
        .collect()
}

/// Insert records in chunks that respect the parameter limit.
pub async fn insert_batch(
    client: &Client,
    ddl: &PostgreSQLDdl,
    table: &TableDefinition,
    records: &[Record],
    batch_size: usize,
) -> Result<u64, PostgreSQLPopulatorError> {
    if records.is_empty() || table.columns.is_empty() {
        return Ok(0);
    }

    let chunk = chunk_size(batch_size, table.columns.len(), MAX_PARAMS);
    let mut inserted = 0u64;

    for batch in records.chunks(chunk) {
        let sql = insert_statement(ddl, table, batch.len());
        let params = text_params(table.columns.iter(), batch);
        inserted += client.execute(&sql, &param_refs(&params)).await?;
        debug!("Inserted {} rows into {}", batch.len(), table.name);
    }

    Ok(inserted)
}

/// Update records by primary key inside one transaction.
pub async fn update_batch(
    client: &mut Client,
    ddl: &PostgreSQLDdl,
    table: &TableDefinition,
    records: &[Record],
) -> Result<u64, PostgreSQLPopulatorError> {
    if records.is_empty() || table.value_columns().next().is_none() {
        return Ok(0);
    }

    let values: Vec<&ColumnDefinition> = table.value_columns().collect();
    let keys = key_columns(table);
    let transaction = client.transaction().await?;
    let statement = transaction.prepare(&update_statement(ddl, table)).await?;

    let mut updated = 0u64;
    for record in records {
        let mut params = text_params(values.iter().copied(), std::slice::from_ref(record));
        params.extend(text_params(keys.iter(), std::slice::from_ref(record)));
        updated += transaction.execute(&statement, &param_refs(&params)).await?;
    }

    transaction.commit().await?;
    Ok(updated)
}

/// Delete records by primary key inside one transaction.
pub async fn delete_batch(
    client: &mut Client,
    ddl: &PostgreSQLDdl,
    table: &TableDefinition,
    records: &[Record],
) -> Result<u64, PostgreSQLPopulatorError> {
    if records.is_empty() {
        return Ok(0);
    }

    let keys = key_columns(table);
    let transaction = client.transaction().await?;
    let statement = transaction.prepare(&delete_statement(ddl, table)).await?;

    let mut deleted = 0u64;
    for record in records {
        let params = text_params(keys.iter(), std::slice::from_ref(record));
        deleted += transaction.execute(&statement, &param_refs(&params)).await?;
    }

    transaction.commit().await?;
    Ok(deleted)
}
