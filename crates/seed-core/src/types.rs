//! Backend-neutral column types and table layout.
//!
//! The core never writes DDL itself. It decides which fields need a column,
//! which logical [`ColumnType`] each one maps to and which foreign keys and
//! key constraints exist; every backend renders that through its own
//! [`ToDdl`] implementation.

use crate::schema::{Entity, Field, OnDelete, Schema, SchemaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical column type of a generated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer
    Integer,
    /// Single precision float
    Real,
    /// Currency amount
    Money,
    /// Variable-length string
    VarChar { length: u16 },
    /// Timestamp with time zone
    TimestampTz,
    /// Boolean
    Boolean,
}

impl ColumnType {
    /// Create a VarChar type with the given length.
    pub fn varchar(length: u16) -> Self {
        Self::VarChar { length }
    }
}

impl Default for ColumnType {
    /// Generic string type used for unrecognized field types.
    fn default() -> Self {
        Self::VarChar { length: 256 }
    }
}

/// Map a synthesizer type name to its logical column type.
///
/// Unrecognized names fall back to [`ColumnType::default`].
pub fn map_field_type(type_name: &str) -> ColumnType {
    match type_name {
        "sequence" | "random.number" | "datatype.number" | "internet.port" => ColumnType::Integer,
        "random.float" | "datatype.float" => ColumnType::Real,
        "commerce.price" | "finance.amount" => ColumnType::Money,
        "commerce.productDescription" | "lorem.paragraph" => ColumnType::varchar(512),
        "date.past" | "date.future" | "date.between" | "date.recent" | "date.soon" => {
            ColumnType::TimestampTz
        }
        "random.boolean" | "datatype.boolean" => ColumnType::Boolean,
        _ => ColumnType::default(),
    }
}

/// Storage backend selected by the `client` configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackendKind {
    PostgreSQL,
    MySQL,
    /// In-process backend (dry runs and tests)
    Memory,
}

impl FromStr for BackendKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSQL),
            "mysql" | "mysql2" => Ok(Self::MySQL),
            "memory" => Ok(Self::Memory),
            _ => Err(SchemaError::UnsupportedBackend(s.to_string())),
        }
    }
}

impl TryFrom<String> for BackendKind {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackendKind> for String {
    fn from(kind: BackendKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostgreSQL => write!(f, "postgres"),
            Self::MySQL => write!(f, "mysql"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Foreign key carried by a to-one reference column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub entity: String,
    pub field: String,
    pub on_delete: Option<OnDelete>,
}

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            references: None,
        }
    }
}

/// Table layout handed to a backend's `create_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub unique: Vec<Vec<String>>,
}

impl TableDefinition {
    /// Build the table layout of `entity_name`.
    ///
    /// To-many reference fields have no column. To-one references become
    /// foreign keys; they are nullable when they point back at their own
    /// entity (the first record has nothing to point at) or when the delete
    /// policy nulls them.
    pub fn from_entity(schema: &Schema, entity_name: &str) -> Result<Self, SchemaError> {
        let entity = schema.entity(entity_name)?;
        let mut columns = Vec::with_capacity(entity.fields.len());

        for (field_name, field) in &entity.fields {
            let Some(column_type) = schema.column_type(entity_name, field_name)? else {
                continue;
            };
            let mut column = ColumnDefinition::new(field_name.clone(), column_type);
            if let Field::Reference(reference) = field {
                column.nullable = reference.entity == entity_name
                    || reference.on_delete == Some(OnDelete::SetNull);
                column.references = Some(ForeignKey {
                    entity: reference.entity.clone(),
                    field: reference.field.clone(),
                    on_delete: reference.on_delete,
                });
            }
            columns.push(column);
        }

        Ok(Self {
            name: entity_name.to_string(),
            columns,
            primary_key: entity.primary_key().to_vec(),
            unique: unique_columns(entity),
        })
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns that are neither part of the primary key nor foreign keys.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns
            .iter()
            .filter(|c| c.references.is_none() && !self.primary_key.contains(&c.name))
    }
}

fn unique_columns(entity: &Entity) -> Vec<Vec<String>> {
    entity
        .unique()
        .iter()
        .map(|u| u.columns().to_vec())
        .collect()
}

/// Trait for rendering table layouts as backend DDL.
pub trait ToDdl {
    /// Render a column type.
    fn to_ddl(&self, column_type: &ColumnType) -> String;

    /// Render a complete CREATE TABLE statement.
    fn to_create_table(&self, table: &TableDefinition) -> String;
}
