//! MySQL DDL rendering.

use seed_core::{ColumnType, TableDefinition, ToDdl};

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders table layouts as MySQL DDL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySQLDdl;

impl MySQLDdl {
    /// Generate DROP TABLE statement.
    pub fn to_drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(table))
    }
}

impl ToDdl for MySQLDdl {
    fn to_ddl(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Integer => "INT".to_string(),
            ColumnType::Real => "REAL".to_string(),
            // MySQL has no MONEY type
            ColumnType::Money => "DECIMAL(12,2)".to_string(),
            ColumnType::VarChar { length } => format!("VARCHAR({length})"),
            ColumnType::TimestampTz => "TIMESTAMP".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }

    fn to_create_table(&self, table: &TableDefinition) -> String {
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let null_clause = if column.nullable { "NULL" } else { "NOT NULL" };
                format!(
                    "  {} {} {}",
                    quote_ident(&column.name),
                    self.to_ddl(&column.column_type),
                    null_clause
                )
            })
            .collect();

        if !table.primary_key.is_empty() {
            defs.push(format!("  PRIMARY KEY ({})", column_list(&table.primary_key)));
        }
        for unique in &table.unique {
            defs.push(format!("  UNIQUE ({})", column_list(unique)));
        }
        for column in &table.columns {
            let Some(fk) = &column.references else {
                continue;
            };
            let mut def = format!(
                "  FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(&column.name),
                quote_ident(&fk.entity),
                quote_ident(&fk.field)
            );
            if let Some(on_delete) = fk.on_delete {
                def.push_str(&format!(" ON DELETE {}", on_delete.as_sql()));
            }
            defs.push(def);
        }

        format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_ident(&table.name),
            defs.join(",\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::{ColumnDefinition, ForeignKey, OnDelete};

    #[test]
    fn test_column_types() {
        let ddl = MySQLDdl;
        assert_eq!(ddl.to_ddl(&ColumnType::Integer), "INT");
        assert_eq!(ddl.to_ddl(&ColumnType::Money), "DECIMAL(12,2)");
        assert_eq!(ddl.to_ddl(&ColumnType::TimestampTz), "TIMESTAMP");
        assert_eq!(ddl.to_ddl(&ColumnType::varchar(256)), "VARCHAR(256)");
    }

    #[test]
    fn test_create_table() {
        let mut tag = ColumnDefinition::new("Tag_id", ColumnType::Integer);
        tag.references = Some(ForeignKey {
            entity: "Tag".to_string(),
            field: "id".to_string(),
            on_delete: Some(OnDelete::Cascade),
        });
        let table = TableDefinition {
            name: "Tag_Order".to_string(),
            columns: vec![tag],
            primary_key: Vec::new(),
            unique: Vec::new(),
        };

        let sql = MySQLDdl.to_create_table(&table);

        assert!(sql.starts_with("CREATE TABLE `Tag_Order` (\n"));
        assert!(sql.contains("  `Tag_id` INT NOT NULL"));
        assert!(sql.contains(
            "  FOREIGN KEY (`Tag_id`) REFERENCES `Tag` (`id`) ON DELETE CASCADE"
        ));
        assert!(!sql.contains("PRIMARY KEY"));
    }

    #[test]
    fn test_generate_drop_table() {
        assert_eq!(MySQLDdl.to_drop_table("users"), "DROP TABLE IF EXISTS `users`");
    }
}
