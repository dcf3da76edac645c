//! Batched INSERT / UPDATE / DELETE logic for MySQL population.

use crate::ddl::quote_ident;
use crate::error::MySQLPopulatorError;
use mysql_async::{prelude::*, Conn, Params, Value as MySQLValue};
use seed_core::{ColumnDefinition, Record, TableDefinition, Value};
use seed_populate::chunk_size;
use tracing::debug;

/// MySQL prepared statement placeholder limit.
pub const MAX_PARAMS: usize = 65_535;

/// Convert a generated value into a MySQL parameter.
pub fn to_mysql_value(value: &Value) -> MySQLValue {
    match value {
        Value::Null => MySQLValue::NULL,
        Value::Bool(b) => MySQLValue::Int(i64::from(*b)),
        Value::Int(i) => MySQLValue::Int(*i),
        Value::Float(f) => MySQLValue::Double(*f),
        Value::Text(s) => MySQLValue::Bytes(s.as_bytes().to_vec()),
        Value::Timestamp(ts) => {
            MySQLValue::Bytes(ts.format("%Y-%m-%d %H:%M:%S").to_string().into_bytes())
        }
    }
}

fn params_for<'a>(
    columns: impl Iterator<Item = &'a ColumnDefinition> + Clone,
    records: &[Record],
) -> Vec<MySQLValue> {
    records
        .iter()
        .flat_map(|record| {
            columns
                .clone()
                .map(move |column| to_mysql_value(&record.value_or_null(&column.name)))
        })
        .collect()
}

/// Generate a multi-row INSERT statement for `rows` records.
pub fn insert_statement(table: &TableDefinition, rows: usize) -> String {
    let col_placeholders: Vec<&str> = table.columns.iter().map(|_| "?").collect();
    let row_template = format!("({})", col_placeholders.join(", "));
    let rows_template: Vec<&str> = (0..rows).map(|_| row_template.as_str()).collect();

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(&table.name),
        table
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", "),
        rows_template.join(", ")
    )
}

fn key_condition(table: &TableDefinition) -> String {
    table
        .primary_key
        .iter()
        .map(|key| format!("{} = ?", quote_ident(key)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Generate an UPDATE statement setting every value column by primary key.
pub fn update_statement(table: &TableDefinition) -> String {
    let assignments: Vec<String> = table
        .value_columns()
        .map(|column| format!("{} = ?", quote_ident(&column.name)))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(&table.name),
        assignments.join(", "),
        key_condition(table)
    )
}

/// Generate a DELETE statement by primary key.
pub fn delete_statement(table: &TableDefinition) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        quote_ident(&table.name),
        key_condition(table)
    )
}

fn key_columns(table: &TableDefinition) -> Vec<ColumnDefinition> {
    table
        .primary_key
        .iter()
        .filter_map(|key| table.get_column(key).cloned())
        .collect()
}

/// Insert records in chunks that respect the placeholder limit.
pub async fn insert_batch(
    conn: &mut Conn,
    table: &TableDefinition,
    records: &[Record],
    batch_size: usize,
) -> Result<u64, MySQLPopulatorError> {
    if records.is_empty() || table.columns.is_empty() {
        return Ok(0);
    }

    let chunk = chunk_size(batch_size, table.columns.len(), MAX_PARAMS);
    let mut inserted = 0u64;

    for batch in records.chunks(chunk) {
        let sql = insert_statement(table, batch.len());
        let params = params_for(table.columns.iter(), batch);
        conn.exec_drop(&sql, Params::Positional(params)).await?;
        inserted += conn.affected_rows();
        debug!("Inserted {} rows into {}", batch.len(), table.name);
    }

    Ok(inserted)
}

/// Update records by primary key inside one transaction.
pub async fn update_batch(
    conn: &mut Conn,
    table: &TableDefinition,
    records: &[Record],
) -> Result<u64, MySQLPopulatorError> {
    if records.is_empty() || table.value_columns().next().is_none() {
        return Ok(0);
    }

    let values: Vec<&ColumnDefinition> = table.value_columns().collect();
    let keys = key_columns(table);
    let sql = update_statement(table);

    let mut transaction = conn.start_transaction(Default::default()).await?;
    let mut updated = 0u64;
    for record in records {
        let mut params = params_for(values.iter().copied(), std::slice::from_ref(record));
        params.extend(params_for(keys.iter(), std::slice::from_ref(record)));
        transaction.exec_drop(&sql, Params::Positional(params)).await?;
        updated += transaction.affected_rows();
    }
    transaction.commit().await?;

    Ok(updated)
}

/// Delete records by primary key inside one transaction.
pub async fn delete_batch(
    conn: &mut Conn,
    table: &TableDefinition,
    records: &[Record],
) -> Result<u64, MySQLPopulatorError> {
    if records.is_empty() {
        return Ok(0);
    }

    let keys = key_columns(table);
    let sql = delete_statement(table);

    let mut transaction = conn.start_transaction(Default::default()).await?;
    let mut deleted = 0u64;
    for record in records {
        let params = params_for(keys.iter(), std::slice::from_ref(record));
        transaction.exec_drop(&sql, Params::Positional(params)).await?;
        deleted += transaction.affected_rows();
    }
    transaction.commit().await?;

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seed_core::ColumnType;

    fn users() -> TableDefinition {
        TableDefinition {
            name: "users".to_string(),
            columns: vec![
                ColumnDefinition::new("id", ColumnType::Integer),
                ColumnDefinition::new("email", ColumnType::varchar(256)),
                ColumnDefinition::new("joined", ColumnType::TimestampTz),
            ],
            primary_key: vec!["id".to_string()],
            unique: Vec::new(),
        }
    }

    #[test]
    fn test_insert_statement() {
        assert_eq!(
            insert_statement(&users(), 2),
            "INSERT INTO `users` (`id`, `email`, `joined`) VALUES (?, ?, ?), (?, ?, ?)"
        );
    }

    #[test]
    fn test_update_and_delete_statements() {
        assert_eq!(
            update_statement(&users()),
            "UPDATE `users` SET `email` = ?, `joined` = ? WHERE `id` = ?"
        );
        assert_eq!(delete_statement(&users()), "DELETE FROM `users` WHERE `id` = ?");
    }

    #[test]
    fn test_value_conversion() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();

        assert_eq!(to_mysql_value(&Value::Null), MySQLValue::NULL);
        assert_eq!(to_mysql_value(&Value::Bool(true)), MySQLValue::Int(1));
        assert_eq!(to_mysql_value(&Value::Float(1.5)), MySQLValue::Double(1.5));
        assert_eq!(
            to_mysql_value(&Value::Timestamp(ts)),
            MySQLValue::Bytes(b"2024-03-04 05:06:07".to_vec())
        );
    }

    #[test]
    fn test_params_follow_column_order() {
        let record = Record::new().with("email", "a@b.c").with("id", 3i64);
        let params = params_for(users().columns.iter(), &[record]);

        assert_eq!(
            params,
            vec![
                MySQLValue::Int(3),
                MySQLValue::Bytes(b"a@b.c".to_vec()),
                MySQLValue::NULL
            ]
        );
    }
}
