//! Schema definitions for the schema-seeder framework.
//!
//! A schema is a map of entity name to [`Entity`]. Each entity declares its
//! fields, optional key constraints and how many records to generate per
//! iteration. Fields are either scalar (resolved by the value synthesizer) or
//! references to another entity.
//!
//! ## YAML shape
//!
//! ```yaml
//! Order:
//!   fields:
//!     id:
//!       type: sequence
//!     tags:
//!       type: reference
//!       referenceType: belongsToMany
//!       entity: Tag
//!       field: id
//!       count: { min: 1, max: 3 }
//!   constraints:
//!     primaryKey: [id]
//!   count: 10
//! ```

use crate::filter::RecordFilter;
use crate::types::{map_field_type, ColumnType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Entity not found in schema
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Field not found in an entity
    #[error("Field '{field}' not found in entity '{entity}'")]
    FieldNotFound { entity: String, field: String },

    /// Reference field pointing at an entity or field the schema lacks
    #[error("Field '{entity}.{field}' references unknown target '{target}'")]
    UnknownReference {
        entity: String,
        field: String,
        target: String,
    },

    /// Backend client string not recognized by the column type mapper
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),
}

// ============================================================================
// Field Types
// ============================================================================

/// The `type` of a field: one type name, or several whose generated values
/// are concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    /// A single type name (`sequence`, `name.firstName`, ...)
    Single(String),
    /// An ordered list of type names concatenated into one string
    Composite(Vec<String>),
}

impl FieldType {
    /// Type name used by reference fields.
    pub const REFERENCE: &'static str = "reference";

    /// Create a single-name field type.
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// The marker type carried by reference fields.
    pub fn reference() -> Self {
        Self::Single(Self::REFERENCE.to_string())
    }

    /// All type names, in concatenation order.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Composite(names) => names,
        }
    }

    /// Whether this type is made of more than one part.
    pub fn is_composite(&self) -> bool {
        self.names().len() > 1
    }
}

impl Default for FieldType {
    fn default() -> Self {
        Self::reference()
    }
}

/// Relationship kind of a reference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceType {
    /// Owner creates a fresh target record and stores its key
    HasOne,
    /// Owner stores the key of an existing target record
    BelongsToOne,
    /// Owner creates fresh target records linked through a junction entity
    HasMany,
    /// Owner links existing target records through a junction entity
    BelongsToMany,
}

impl ReferenceType {
    /// `hasMany` / `belongsToMany`: the relation lives in a junction entity.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }
}

/// Foreign key action when the referenced record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDelete {
    #[serde(rename = "cascade")]
    Cascade,
    #[serde(rename = "null")]
    SetNull,
}

impl OnDelete {
    /// SQL spelling of the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

fn default_count_min() -> u32 {
    0
}

fn default_count_max() -> u32 {
    1
}

/// Inclusive range of related records to create for to-many references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    #[serde(default = "default_count_min")]
    pub min: u32,
    #[serde(default = "default_count_max")]
    pub max: u32,
}

impl CountRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Bounds ordered low to high.
    pub fn bounds(&self) -> (u32, u32) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self::new(default_count_min(), default_count_max())
    }
}

/// A plain field resolved by the value synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// A field whose value derives from records of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceField {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    pub reference_type: ReferenceType,

    /// Target entity name
    pub entity: String,

    /// Target field name
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<OnDelete>,

    /// Predicate applied when sampling existing target records
    #[serde(
        rename = "where",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub filter: Option<RecordFilter>,
}

impl ReferenceField {
    /// Create a reference field with no count range, delete policy or filter.
    pub fn new(
        reference_type: ReferenceType,
        entity: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            field_type: FieldType::reference(),
            reference_type,
            entity: entity.into(),
            field: field.into(),
            count: None,
            on_delete: None,
            filter: None,
        }
    }

    pub fn with_count(mut self, min: u32, max: u32) -> Self {
        self.count = Some(CountRange::new(min, max));
        self
    }

    pub fn with_on_delete(mut self, on_delete: Option<OnDelete>) -> Self {
        self.on_delete = on_delete;
        self
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Count range, defaulting to `[0, 1]`.
    pub fn count_range(&self) -> CountRange {
        self.count.unwrap_or_default()
    }
}

/// A named attribute of an entity.
///
/// Deserialization tries the reference shape first, so any field carrying
/// `referenceType`, `entity` and `field` is a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Reference(ReferenceField),
    Scalar(ScalarField),
}

impl Field {
    /// Create a scalar field with a single type name.
    pub fn scalar(type_name: impl Into<String>) -> Self {
        Self::Scalar(ScalarField {
            field_type: FieldType::single(type_name),
        })
    }

    /// Create a scalar field whose parts are concatenated.
    pub fn composite<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Scalar(ScalarField {
            field_type: FieldType::Composite(type_names.into_iter().map(Into::into).collect()),
        })
    }

    pub fn field_type(&self) -> &FieldType {
        match self {
            Self::Reference(reference) => &reference.field_type,
            Self::Scalar(scalar) => &scalar.field_type,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceField> {
        match self {
            Self::Reference(reference) => Some(reference),
            Self::Scalar(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Merge `other` over `self`: reference attributes present in `other`
    /// win, absent ones keep the existing value. Mismatched shapes are
    /// replaced outright.
    pub fn merge(&mut self, other: &Field) {
        match (&mut *self, other) {
            (Self::Reference(existing), Self::Reference(incoming)) => {
                existing.field_type = incoming.field_type.clone();
                existing.reference_type = incoming.reference_type;
                existing.entity = incoming.entity.clone();
                existing.field = incoming.field.clone();
                if incoming.count.is_some() {
                    existing.count = incoming.count;
                }
                if incoming.on_delete.is_some() {
                    existing.on_delete = incoming.on_delete;
                }
                if incoming.filter.is_some() {
                    existing.filter = incoming.filter.clone();
                }
            }
            _ => *self = other.clone(),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A unique constraint over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniqueConstraint {
    Column(String),
    Columns(Vec<String>),
}

impl UniqueConstraint {
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Column(column) => std::slice::from_ref(column),
            Self::Columns(columns) => columns,
        }
    }
}

/// Key constraints of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<UniqueConstraint>,
}

impl Constraints {
    /// Union `other` into `self`, skipping entries already present.
    pub fn merge(&mut self, other: &Constraints) {
        for key in &other.primary_key {
            if !self.primary_key.contains(key) {
                self.primary_key.push(key.clone());
            }
        }
        for unique in &other.unique {
            if !self.unique.contains(unique) {
                self.unique.push(unique.clone());
            }
        }
    }
}

/// A named collection definition (a table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub fields: IndexMap<String, Field>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,

    /// Records to generate per iteration; unset means the entity is only
    /// created as a side effect of another entity's relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn with_primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints
            .get_or_insert_with(Constraints::default)
            .primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unique(mut self, unique: UniqueConstraint) -> Self {
        self.constraints
            .get_or_insert_with(Constraints::default)
            .unique
            .push(unique);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Primary key field names, empty when none is declared.
    pub fn primary_key(&self) -> &[String] {
        self.constraints
            .as_ref()
            .map(|c| c.primary_key.as_slice())
            .unwrap_or(&[])
    }

    /// Unique constraints, empty when none are declared.
    pub fn unique(&self) -> &[UniqueConstraint] {
        self.constraints
            .as_ref()
            .map(|c| c.unique.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the field takes part in a primary-key or unique constraint.
    pub fn is_unique_field(&self, name: &str) -> bool {
        self.primary_key().iter().any(|k| k == name)
            || self
                .unique()
                .iter()
                .any(|u| u.columns().iter().any(|c| c == name))
    }

    /// Records per iteration (0 when unset).
    pub fn record_count(&self) -> u64 {
        self.count.unwrap_or(0)
    }

    /// Iterate over the reference fields of this entity.
    pub fn reference_fields(&self) -> impl Iterator<Item = (&String, &ReferenceField)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_reference().map(|r| (name, r)))
    }

    /// Deep-merge `other` into this entity.
    pub fn merge(&mut self, other: &Entity) {
        for (name, field) in &other.fields {
            match self.fields.get_mut(name) {
                Some(existing) => existing.merge(field),
                None => {
                    self.fields.insert(name.clone(), field.clone());
                }
            }
        }
        if let Some(constraints) = &other.constraints {
            self.constraints
                .get_or_insert_with(Constraints::default)
                .merge(constraints);
        }
        if other.count.is_some() {
            self.count = other.count;
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Map of entity name to entity definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entities: IndexMap<String, Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema from a YAML entity map.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a schema from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn with_entity(mut self, name: impl Into<String>, entity: Entity) -> Self {
        self.insert(name, entity);
        self
    }

    /// Insert or replace an entity.
    pub fn insert(&mut self, name: impl Into<String>, entity: Entity) {
        self.entities.insert(name.into(), entity);
    }

    /// Deep-merge an entity into the one stored under `name`, creating it
    /// when absent.
    pub fn merge_entity(&mut self, name: &str, entity: &Entity) {
        match self.entities.get_mut(name) {
            Some(existing) => existing.merge(entity),
            None => {
                self.entities.insert(name.to_string(), entity.clone());
            }
        }
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Get an entity or fail with [`SchemaError::EntityNotFound`].
    pub fn entity(&self, name: &str) -> Result<&Entity, SchemaError> {
        self.get_entity(name)
            .ok_or_else(|| SchemaError::EntityNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&String, &Entity)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check that every reference targets an existing entity and field.
    pub fn validate_references(&self) -> Result<(), SchemaError> {
        for (entity_name, entity) in &self.entities {
            for (field_name, reference) in entity.reference_fields() {
                let target = self.get_entity(&reference.entity).ok_or_else(|| {
                    SchemaError::UnknownReference {
                        entity: entity_name.clone(),
                        field: field_name.clone(),
                        target: reference.entity.clone(),
                    }
                })?;
                if target.get_field(&reference.field).is_none() {
                    return Err(SchemaError::UnknownReference {
                        entity: entity_name.clone(),
                        field: field_name.clone(),
                        target: format!("{}.{}", reference.entity, reference.field),
                    });
                }
            }
        }
        Ok(())
    }

    /// Logical column type of a field.
    ///
    /// Reference fields take the type of the field they point at; to-many
    /// references have no column and yield `None`.
    pub fn column_type(&self, entity: &str, field: &str) -> Result<Option<ColumnType>, SchemaError> {
        let mut entity_name = entity;
        let mut field_name = field;
        // One hop per entity is enough for any chain that terminates.
        for _ in 0..=self.entities.len() {
            let current = self.entity(entity_name)?;
            let current_field =
                current
                    .get_field(field_name)
                    .ok_or_else(|| SchemaError::FieldNotFound {
                        entity: entity_name.to_string(),
                        field: field_name.to_string(),
                    })?;
            match current_field {
                Field::Scalar(scalar) => {
                    return Ok(Some(match &scalar.field_type {
                        FieldType::Single(name) => map_field_type(name),
                        FieldType::Composite(_) => ColumnType::default(),
                    }))
                }
                Field::Reference(reference) if reference.reference_type.is_to_many() => {
                    return Ok(None)
                }
                Field::Reference(reference) => {
                    entity_name = &reference.entity;
                    field_name = &reference.field;
                }
            }
        }
        Ok(Some(ColumnType::default()))
    }
}

impl FromIterator<(String, Entity)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, Entity)>>(iter: T) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_SCHEMA: &str = r#"
Tag:
  fields:
    id:
      type: sequence
    label:
      type: lorem.word
  constraints:
    primaryKey: [id]
    unique: [label]
  count: 5
Order:
  fields:
    id:
      type: sequence
    customer:
      type: [name.firstName, space, name.lastName]
    tags:
      type: reference
      referenceType: belongsToMany
      entity: Tag
      field: id
      count:
        min: 1
        max: 3
      onDelete: cascade
    status:
      type: reference
      referenceType: belongsToOne
      entity: Tag
      field: id
      where:
        label: urgent
  constraints:
    primaryKey: [id]
  count: 10
"#;

    #[test]
    fn test_parse_schema() {
        let schema = Schema::from_yaml(ORDER_SCHEMA).unwrap();

        assert_eq!(schema.entity_names(), vec!["Tag", "Order"]);

        let order = schema.get_entity("Order").unwrap();
        assert_eq!(order.record_count(), 10);
        assert_eq!(order.primary_key(), &["id".to_string()]);

        let customer = order.get_field("customer").unwrap();
        assert!(customer.field_type().is_composite());
        assert_eq!(customer.field_type().names().len(), 3);

        let tags = order.get_field("tags").unwrap().as_reference().unwrap();
        assert_eq!(tags.reference_type, ReferenceType::BelongsToMany);
        assert_eq!(tags.entity, "Tag");
        assert_eq!(tags.count_range(), CountRange::new(1, 3));
        assert_eq!(tags.on_delete, Some(OnDelete::Cascade));

        let status = order.get_field("status").unwrap().as_reference().unwrap();
        assert!(status.filter.is_some());
    }

    #[test]
    fn test_scalar_field_is_not_reference() {
        let schema = Schema::from_yaml(ORDER_SCHEMA).unwrap();
        let tag = schema.get_entity("Tag").unwrap();
        assert!(!tag.get_field("label").unwrap().is_reference());
        assert!(tag.is_unique_field("label"));
        assert!(tag.is_unique_field("id"));
    }

    #[test]
    fn test_count_range_defaults_and_swap() {
        let range: CountRange = serde_yaml::from_str("min: 4").unwrap();
        assert_eq!(range.bounds(), (1, 4));

        let range = CountRange::default();
        assert_eq!(range.bounds(), (0, 1));
    }

    #[test]
    fn test_entity_merge_unions_fields_and_constraints() {
        let mut left = Entity::new()
            .with_field("id", Field::scalar("sequence"))
            .with_primary_key(["id"]);
        let right = Entity::new()
            .with_field("name", Field::scalar("name.firstName"))
            .with_primary_key(["id"])
            .with_count(4);

        left.merge(&right);

        assert_eq!(left.fields.len(), 2);
        assert_eq!(left.primary_key(), &["id".to_string()]);
        assert_eq!(left.count, Some(4));
    }

    #[test]
    fn test_column_type_follows_references() {
        let schema = Schema::from_yaml(ORDER_SCHEMA).unwrap();

        assert_eq!(
            schema.column_type("Order", "status").unwrap(),
            Some(ColumnType::Integer)
        );
        assert_eq!(schema.column_type("Order", "tags").unwrap(), None);
        assert_eq!(
            schema.column_type("Order", "customer").unwrap(),
            Some(ColumnType::VarChar { length: 256 })
        );
        assert!(matches!(
            schema.column_type("Order", "missing"),
            Err(SchemaError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_references() {
        let schema = Schema::from_yaml(ORDER_SCHEMA).unwrap();
        assert!(schema.validate_references().is_ok());

        let broken = Schema::new().with_entity(
            "Order",
            Entity::new().with_field(
                "owner",
                Field::Reference(ReferenceField::new(
                    ReferenceType::BelongsToOne,
                    "User",
                    "id",
                )),
            ),
        );
        assert!(matches!(
            broken.validate_references(),
            Err(SchemaError::UnknownReference { .. })
        ));
    }
}
