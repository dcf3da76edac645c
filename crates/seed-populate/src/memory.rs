//! In-process backend.
//!
//! Keeps every table in memory and logs each operation. Deletes follow the
//! declared `onDelete` policy of referencing tables, so the contents stay
//! consistent the way a database's would.

use crate::backend::{require_primary_key, Backend};
use crate::error::PopulateError;
use async_trait::async_trait;
use indexmap::IndexMap;
use seed_core::{BackendKind, OnDelete, Record, TableDefinition, Value};
use tokio::sync::Mutex;
use tracing::debug;

/// One call made against a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOperation {
    CreateTable(String),
    DropTable(String),
    Insert { table: String, records: usize },
    Update { table: String, records: usize },
    Delete { table: String, records: usize },
}

#[derive(Debug)]
struct MemoryTable {
    definition: TableDefinition,
    rows: Vec<Record>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: IndexMap<String, MemoryTable>,
    operations: Vec<BackendOperation>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently held by `table`.
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Tables in creation order.
    pub async fn table_names(&self) -> Vec<String> {
        self.state.lock().await.tables.keys().cloned().collect()
    }

    /// Every operation made so far, in call order.
    pub async fn operations(&self) -> Vec<BackendOperation> {
        self.state.lock().await.operations.clone()
    }
}

/// Only the columns the table declares, in table order.
fn project(definition: &TableDefinition, record: &Record) -> Record {
    definition
        .columns
        .iter()
        .map(|c| (c.name.clone(), record.value_or_null(&c.name)))
        .collect()
}

impl MemoryState {
    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable, PopulateError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| PopulateError::TableNotFound(name.to_string()))
    }

    /// Remove rows matching `keys` from `table`, then apply the delete
    /// policy of every table referencing it.
    fn delete_cascading(&mut self, table: &str, keys: Vec<Vec<(String, Value)>>) -> usize {
        let mut pending = vec![(table.to_string(), keys)];
        let mut deleted_from_root = None;

        while let Some((table, keys)) = pending.pop() {
            let Some(target) = self.tables.get_mut(&table) else {
                continue;
            };
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut target.rows)
                .into_iter()
                .partition(|row| keys.iter().any(|key| row.matches_key(key)));
            target.rows = kept;
            deleted_from_root.get_or_insert(removed.len());
            if removed.is_empty() {
                continue;
            }

            for (name, referencing) in self.tables.iter_mut() {
                for column in &referencing.definition.columns {
                    let Some(fk) = &column.references else {
                        continue;
                    };
                    if fk.entity != table {
                        continue;
                    }
                    let gone: Vec<Value> = removed.iter().map(|r| r.value_or_null(&fk.field)).collect();
                    let hit = |row: &Record| {
                        let value = row.value_or_null(&column.name);
                        gone.iter().any(|g| g.loosely_equals(&value))
                    };
                    match fk.on_delete {
                        Some(OnDelete::Cascade) => {
                            let keys: Vec<_> = referencing
                                .rows
                                .iter()
                                .filter(|row| hit(row))
                                .map(|row| {
                                    row.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
                                })
                                .collect();
                            if !keys.is_empty() {
                                debug!("Cascading delete of {} rows in {}", keys.len(), name);
                                pending.push((name.clone(), keys));
                            }
                        }
                        Some(OnDelete::SetNull) => {
                            for row in referencing.rows.iter_mut().filter(|row| hit(row)) {
                                row.insert(column.name.clone(), Value::Null);
                            }
                        }
                        None => {}
                    }
                }
            }
        }

        deleted_from_root.unwrap_or(0)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn create_table(&self, table: &TableDefinition) -> Result<(), PopulateError> {
        let mut state = self.state.lock().await;
        debug!("Creating in-memory table: {}", table.name);
        state.tables.entry(table.name.clone()).or_insert(MemoryTable {
            definition: table.clone(),
            rows: Vec::new(),
        });
        state
            .operations
            .push(BackendOperation::CreateTable(table.name.clone()));
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), PopulateError> {
        let mut state = self.state.lock().await;
        state.tables.shift_remove(table);
        state
            .operations
            .push(BackendOperation::DropTable(table.to_string()));
        Ok(())
    }

    async fn batch_insert(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError> {
        let mut state = self.state.lock().await;
        let target = state.table_mut(&table.name)?;
        target
            .rows
            .extend(records.iter().map(|record| project(table, record)));
        state.operations.push(BackendOperation::Insert {
            table: table.name.clone(),
            records: records.len(),
        });
        Ok(records.len() as u64)
    }

    async fn update_records(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError> {
        let primary_key = require_primary_key(table, "update")?;
        let mut state = self.state.lock().await;
        let target = state.table_mut(&table.name)?;

        let mut updated = 0u64;
        for record in records {
            let key = record.key_values(primary_key);
            for row in target.rows.iter_mut().filter(|row| row.matches_key(&key)) {
                for column in table.value_columns() {
                    row.insert(column.name.clone(), record.value_or_null(&column.name));
                }
                updated += 1;
            }
        }

        state.operations.push(BackendOperation::Update {
            table: table.name.clone(),
            records: records.len(),
        });
        Ok(updated)
    }

    async fn delete_records(
        &self,
        table: &TableDefinition,
        records: &[Record],
    ) -> Result<u64, PopulateError> {
        let primary_key = require_primary_key(table, "delete")?;
        let mut state = self.state.lock().await;
        state.table_mut(&table.name)?;

        let keys = records.iter().map(|r| r.key_values(primary_key)).collect();
        let deleted = state.delete_cascading(&table.name, keys);

        state.operations.push(BackendOperation::Delete {
            table: table.name.clone(),
            records: records.len(),
        });
        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::{ColumnDefinition, ColumnType, ForeignKey};

    fn users() -> TableDefinition {
        TableDefinition {
            name: "User".to_string(),
            columns: vec![
                ColumnDefinition::new("id", ColumnType::Integer),
                ColumnDefinition::new("name", ColumnType::default()),
            ],
            primary_key: vec!["id".to_string()],
            unique: Vec::new(),
        }
    }

    fn posts(on_delete: Option<OnDelete>) -> TableDefinition {
        let mut author = ColumnDefinition::new("author", ColumnType::Integer);
        author.references = Some(ForeignKey {
            entity: "User".to_string(),
            field: "id".to_string(),
            on_delete,
        });
        TableDefinition {
            name: "Post".to_string(),
            columns: vec![ColumnDefinition::new("id", ColumnType::Integer), author],
            primary_key: vec!["id".to_string()],
            unique: Vec::new(),
        }
    }

    fn user(id: i64, name: &str) -> Record {
        Record::new().with("id", id).with("name", name)
    }

    #[tokio::test]
    async fn test_insert_requires_table() {
        let backend = MemoryBackend::new();
        let result = backend.batch_insert(&users(), &[user(1, "a")]).await;
        assert!(matches!(result, Err(PopulateError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_projects_columns() {
        let backend = MemoryBackend::new();
        backend.create_table(&users()).await.unwrap();

        let record = user(1, "ada").with("tags", "ignored");
        assert_eq!(backend.batch_insert(&users(), &[record]).await.unwrap(), 1);

        let rows = backend.rows("User").await;
        assert_eq!(rows, vec![user(1, "ada")]);
    }

    #[tokio::test]
    async fn test_update_by_primary_key() {
        let backend = MemoryBackend::new();
        backend.create_table(&users()).await.unwrap();
        backend
            .batch_insert(&users(), &[user(1, "ada"), user(2, "bob")])
            .await
            .unwrap();

        let updated = backend
            .update_records(&users(), &[user(2, "grace")])
            .await
            .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(backend.rows("User").await, vec![user(1, "ada"), user(2, "grace")]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let backend = MemoryBackend::new();
        backend.create_table(&users()).await.unwrap();
        backend.create_table(&posts(Some(OnDelete::Cascade))).await.unwrap();
        backend
            .batch_insert(&users(), &[user(1, "ada"), user(2, "bob")])
            .await
            .unwrap();
        backend
            .batch_insert(
                &posts(None),
                &[
                    Record::new().with("id", 10i64).with("author", 1i64),
                    Record::new().with("id", 11i64).with("author", 2i64),
                ],
            )
            .await
            .unwrap();

        let deleted = backend.delete_records(&users(), &[user(1, "ada")]).await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(backend.rows("User").await, vec![user(2, "bob")]);
        let remaining = backend.rows("Post").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].get("id"), Some(&Value::Int(11)));
    }

    #[tokio::test]
    async fn test_delete_sets_null() {
        let backend = MemoryBackend::new();
        backend.create_table(&users()).await.unwrap();
        backend.create_table(&posts(Some(OnDelete::SetNull))).await.unwrap();
        backend.batch_insert(&users(), &[user(1, "ada")]).await.unwrap();
        backend
            .batch_insert(
                &posts(None),
                &[Record::new().with("id", 10i64).with("author", 1i64)],
            )
            .await
            .unwrap();

        backend.delete_records(&users(), &[user(1, "ada")]).await.unwrap();

        let rows = backend.rows("Post").await;
        assert_eq!(rows[0].get("author"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_operation_log() {
        let backend = MemoryBackend::new();
        backend.create_table(&users()).await.unwrap();
        backend.batch_insert(&users(), &[user(1, "a")]).await.unwrap();
        backend.drop_table("User").await.unwrap();

        assert_eq!(
            backend.operations().await,
            vec![
                BackendOperation::CreateTable("User".to_string()),
                BackendOperation::Insert {
                    table: "User".to_string(),
                    records: 1
                },
                BackendOperation::DropTable("User".to_string()),
            ]
        );
        assert!(backend.table_names().await.is_empty());
    }
}
