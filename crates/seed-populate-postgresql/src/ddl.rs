//! PostgreSQL DDL rendering.

use seed_core::{ColumnType, TableDefinition, ToDdl};

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders table layouts as PostgreSQL DDL, optionally inside a schema.
#[derive(Debug, Clone, Default)]
pub struct PostgreSQLDdl {
    schema_name: Option<String>,
}

impl PostgreSQLDdl {
    pub fn new(schema_name: Option<String>) -> Self {
        Self { schema_name }
    }

    /// Schema-qualified, quoted table name.
    pub fn table_ref(&self, table: &str) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
            None => quote_ident(table),
        }
    }

    /// Generate DROP TABLE statement.
    pub fn to_drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", self.table_ref(table))
    }

    /// Generate CREATE SCHEMA statement, when a schema is configured.
    pub fn to_create_schema(&self) -> Option<String> {
        self.schema_name
            .as_ref()
            .map(|schema| format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
    }
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ToDdl for PostgreSQLDdl {
    fn to_ddl(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Real => "REAL".to_string(),
            ColumnType::Money => "MONEY".to_string(),
            ColumnType::VarChar { length } => format!("VARCHAR({length})"),
            ColumnType::TimestampTz => "TIMESTAMPTZ".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }

    fn to_create_table(&self, table: &TableDefinition) -> String {
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let null_clause = if column.nullable { "NULL" } else { "NOT NULL" };
                let mut def = format!(
                    "  {} {} {}",
                    quote_ident(&column.name),
                    self.to_ddl(&column.column_type),
                    null_clause
                );
                if let Some(fk) = &column.references {
                    def.push_str(&format!(
                        " REFERENCES {} ({})",
                        self.table_ref(&fk.entity),
                        quote_ident(&fk.field)
                    ));
                    if let Some(on_delete) = fk.on_delete {
                        def.push_str(&format!(" ON DELETE {}", on_delete.as_sql()));
                    }
                }
                def
            })
            .collect();

        if !table.primary_key.is_empty() {
            defs.push(format!("  PRIMARY KEY ({})", column_list(&table.primary_key)));
        }
        for unique in &table.unique {
            defs.push(format!("  UNIQUE ({})", column_list(unique)));
        }

        format!(
            "CREATE TABLE {} (\n{}\n);",
            self.table_ref(&table.name),
            defs.join(",\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::{ColumnDefinition, ForeignKey, OnDelete};

    fn posts() -> TableDefinition {
        let mut author = ColumnDefinition::new("author", ColumnType::Integer);
        author.references = Some(ForeignKey {
            entity: "User".to_string(),
            field: "id".to_string(),
            on_delete: Some(OnDelete::SetNull),
        });
        author.nullable = true;

        TableDefinition {
            name: "Post".to_string(),
            columns: vec![
                ColumnDefinition::new("id", ColumnType::Integer),
                ColumnDefinition::new("slug", ColumnType::varchar(256)),
                ColumnDefinition::new("price", ColumnType::Money),
                ColumnDefinition::new("published", ColumnType::TimestampTz),
                author,
            ],
            primary_key: vec!["id".to_string()],
            unique: vec![vec!["slug".to_string()]],
        }
    }

    #[test]
    fn test_column_types() {
        let ddl = PostgreSQLDdl::default();
        assert_eq!(ddl.to_ddl(&ColumnType::Integer), "INTEGER");
        assert_eq!(ddl.to_ddl(&ColumnType::Real), "REAL");
        assert_eq!(ddl.to_ddl(&ColumnType::Money), "MONEY");
        assert_eq!(ddl.to_ddl(&ColumnType::varchar(512)), "VARCHAR(512)");
        assert_eq!(ddl.to_ddl(&ColumnType::TimestampTz), "TIMESTAMPTZ");
        assert_eq!(ddl.to_ddl(&ColumnType::Boolean), "BOOLEAN");
    }

    #[test]
    fn test_create_table() {
        let sql = PostgreSQLDdl::default().to_create_table(&posts());

        assert!(sql.starts_with("CREATE TABLE \"Post\" (\n"));
        assert!(sql.contains("  \"id\" INTEGER NOT NULL"));
        assert!(sql.contains("  \"price\" MONEY NOT NULL"));
        assert!(sql.contains(
            "  \"author\" INTEGER NULL REFERENCES \"User\" (\"id\") ON DELETE SET NULL"
        ));
        assert!(sql.contains("  PRIMARY KEY (\"id\")"));
        assert!(sql.contains("  UNIQUE (\"slug\")"));
        assert!(sql.ends_with("\n);"));
    }

    #[test]
    fn test_schema_qualified_names() {
        let ddl = PostgreSQLDdl::new(Some("seed".to_string()));
        let sql = ddl.to_create_table(&posts());

        assert!(sql.starts_with("CREATE TABLE \"seed\".\"Post\""));
        assert!(sql.contains("REFERENCES \"seed\".\"User\""));
        assert_eq!(
            ddl.to_drop_table("Post"),
            "DROP TABLE IF EXISTS \"seed\".\"Post\" CASCADE"
        );
        assert_eq!(
            ddl.to_create_schema().as_deref(),
            Some("CREATE SCHEMA IF NOT EXISTS \"seed\"")
        );
        assert!(PostgreSQLDdl::default().to_create_schema().is_none());
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
