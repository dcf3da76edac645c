//! Relationship-aware record generator.

use crate::generators::token::generate_token;
use crate::generators::{Synthesizer, SEQUENCE, SPACE};
use crate::normalize::{junction_field, junction_name};
use crate::store::{RecordStore, StoreRegistry};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seed_core::{
    map_field_type, ColumnType, Entity, Field, FieldType, Record, ReferenceField, ReferenceType,
    Schema, SchemaError, Value,
};
use std::sync::Arc;
use tracing::debug;

/// Maximum nesting of generation calls through hasOne / hasMany fan-out.
pub const MAX_GENERATION_DEPTH: usize = 32;

/// Error type for record generation.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Entity not found in the schema
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Field type the synthesizer does not know
    #[error("Unknown field type '{type_name}' for field '{entity}.{field}'")]
    UnknownFieldType {
        entity: String,
        field: String,
        type_name: String,
    },

    /// Related-record fan-out nested too deeply (mutually recursive relations)
    #[error("Generation of '{entity}' nested deeper than {limit} levels")]
    RecursionLimit { entity: String, limit: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Record generator over a normalized schema.
///
/// Owns one [`RecordStore`] per entity and a single RNG; every random draw
/// (field values, relation counts, sampling) comes from that RNG, so a
/// seeded generator is fully reproducible.
pub struct DataGenerator {
    schema: Schema,
    entities: IndexMap<String, Arc<Entity>>,
    stores: StoreRegistry,
    synthesizer: Synthesizer,
    rng: StdRng,
    seed: Option<u64>,
    depth: usize,
}

impl DataGenerator {
    /// Create a generator for a normalized schema.
    ///
    /// Fails when a reference targets a missing entity or field, or when a
    /// scalar field uses a type name the synthesizer does not know.
    pub fn new(schema: Schema, seed: Option<u64>) -> Result<Self, GeneratorError> {
        schema.validate_references()?;

        let synthesizer = Synthesizer::default();
        for (entity_name, entity) in schema.entities() {
            for (field_name, field) in &entity.fields {
                let Field::Scalar(scalar) = field else {
                    continue;
                };
                if let Some(unknown) = scalar
                    .field_type
                    .names()
                    .iter()
                    .find(|name| !synthesizer.supports(name))
                {
                    return Err(GeneratorError::UnknownFieldType {
                        entity: entity_name.clone(),
                        field: field_name.clone(),
                        type_name: unknown.clone(),
                    });
                }
            }
        }

        let entities = schema
            .entities()
            .map(|(name, entity)| (name.clone(), Arc::new(entity.clone())))
            .collect();
        let stores = StoreRegistry::new(schema.entity_names());
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            schema,
            entities,
            stores,
            synthesizer,
            rng,
            seed,
            depth: 0,
        })
    }

    /// Anchor relative date generators at `base_time`.
    pub fn with_base_time(mut self, base_time: DateTime<Utc>) -> Self {
        self.synthesizer.set_base_time(base_time);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    /// The generator's RNG, shared with callers that make run-level draws.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn store(&self, entity: &str) -> Option<&RecordStore> {
        self.stores.get(entity)
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// Records generated for `entity` in the current iteration.
    pub fn records(&self, entity: &str) -> &[Record] {
        self.stores.get(entity).map(RecordStore::records).unwrap_or(&[])
    }

    /// Draw a random record of `entity`, `None` when its store is empty.
    pub fn random_record(&mut self, entity: &str) -> Option<&Record> {
        self.stores.get(entity)?.random_record(None, &mut self.rng)
    }

    /// Clear every store. Sequence counters keep counting.
    pub fn reset_records(&mut self) {
        self.stores.reset_records();
    }

    /// Logical column type of a field; `None` for to-many references.
    pub fn field_column_type(
        &self,
        entity: &str,
        field: &str,
    ) -> Result<Option<ColumnType>, GeneratorError> {
        Ok(self.schema.column_type(entity, field)?)
    }

    /// Generate one record of `entity` and append it to the entity's store.
    ///
    /// Fields present in `prefill` are kept as given. Scalar fields are
    /// resolved first, then to-one references, then to-many references, so
    /// key values are in place before junction records copy them.
    pub fn generate(&mut self, entity: &str, prefill: Record) -> Result<Record, GeneratorError> {
        let definition = self
            .entities
            .get(entity)
            .cloned()
            .ok_or_else(|| GeneratorError::EntityNotFound(entity.to_string()))?;

        if self.depth >= MAX_GENERATION_DEPTH {
            return Err(GeneratorError::RecursionLimit {
                entity: entity.to_string(),
                limit: MAX_GENERATION_DEPTH,
            });
        }

        self.depth += 1;
        let result = self.build_record(entity, &definition, prefill);
        self.depth -= 1;

        let record = result?;
        self.store_mut(entity)?.push(record.clone());
        Ok(record)
    }

    /// Regenerate the updatable fields of an existing record.
    ///
    /// Scalar fields outside the primary key that are not sequences get
    /// fresh values; keys and references are kept. The store is untouched.
    pub fn refresh_record(&mut self, entity: &str, record: &Record) -> Result<Record, GeneratorError> {
        let definition = self
            .entities
            .get(entity)
            .cloned()
            .ok_or_else(|| GeneratorError::EntityNotFound(entity.to_string()))?;

        let mut refreshed = record.clone();
        for field_name in updatable_fields(&definition) {
            if let Some(Field::Scalar(scalar)) = definition.get_field(&field_name) {
                let value = self.scalar_value(entity, &definition, &field_name, &scalar.field_type)?;
                refreshed.insert(field_name, value);
            }
        }
        Ok(refreshed)
    }

    fn build_record(
        &mut self,
        entity: &str,
        definition: &Entity,
        prefill: Record,
    ) -> Result<Record, GeneratorError> {
        let mut record = prefill;

        for (name, field) in &definition.fields {
            if record.contains_key(name) {
                continue;
            }
            if let Field::Scalar(scalar) = field {
                let value = self.scalar_value(entity, definition, name, &scalar.field_type)?;
                record.insert(name.clone(), value);
            }
        }

        for (name, reference) in definition.reference_fields() {
            if record.contains_key(name) || reference.reference_type.is_to_many() {
                continue;
            }
            let value = self.to_one_value(reference)?;
            record.insert(name.clone(), value);
        }

        for (name, reference) in definition.reference_fields() {
            if record.contains_key(name) || !reference.reference_type.is_to_many() {
                continue;
            }
            self.link_many(entity, definition, name, reference, &record)?;
        }

        Ok(record)
    }

    fn to_one_value(&mut self, reference: &ReferenceField) -> Result<Value, GeneratorError> {
        match reference.reference_type {
            ReferenceType::HasOne => {
                let target = self.generate(&reference.entity, Record::new())?;
                Ok(target.value_or_null(&reference.field))
            }
            _ => {
                let store = self
                    .stores
                    .get(&reference.entity)
                    .ok_or_else(|| GeneratorError::EntityNotFound(reference.entity.clone()))?;
                Ok(store
                    .random_record(reference.filter.as_ref(), &mut self.rng)
                    .map(|target| target.value_or_null(&reference.field))
                    .unwrap_or(Value::Null))
            }
        }
    }

    /// Create the junction records of one to-many field.
    fn link_many(
        &mut self,
        owner: &str,
        definition: &Entity,
        field_name: &str,
        reference: &ReferenceField,
        record: &Record,
    ) -> Result<(), GeneratorError> {
        if reference.entity == owner {
            debug!(
                "Skipping self-referencing to-many field {}.{}",
                owner, field_name
            );
            return Ok(());
        }

        let (min, max) = reference.count_range().bounds();
        let amount = self.rng.gen_range(min..=max) as usize;

        let targets: Vec<Record> = if reference.reference_type == ReferenceType::HasMany {
            (0..amount)
                .map(|_| self.generate(&reference.entity, Record::new()))
                .collect::<Result<_, _>>()?
        } else {
            let store = self
                .stores
                .get(&reference.entity)
                .ok_or_else(|| GeneratorError::EntityNotFound(reference.entity.clone()))?;
            store
                .sample_distinct(reference.filter.as_ref(), amount, &mut self.rng)
                .into_iter()
                .cloned()
                .collect()
        };

        let junction = junction_name(&reference.entity, owner);
        let target_key = junction_field(&reference.entity, &reference.field);
        for target in targets {
            let mut prefill =
                Record::new().with(target_key.clone(), target.value_or_null(&reference.field));
            for key in definition.primary_key() {
                prefill.insert(junction_field(owner, key), record.value_or_null(key));
            }
            self.generate(&junction, prefill)?;
        }
        Ok(())
    }

    fn scalar_value(
        &mut self,
        entity: &str,
        definition: &Entity,
        field: &str,
        field_type: &FieldType,
    ) -> Result<Value, GeneratorError> {
        let unique = definition.is_unique_field(field);
        let mut parts = Vec::with_capacity(field_type.names().len());
        for type_name in field_type.names() {
            parts.push(self.type_value(entity, field, type_name, unique)?);
        }

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Value::Text(parts.iter().map(ToString::to_string).collect()))
        }
    }

    fn type_value(
        &mut self,
        entity: &str,
        field: &str,
        type_name: &str,
        unique: bool,
    ) -> Result<Value, GeneratorError> {
        match type_name {
            SEQUENCE => Ok(Value::Int(self.store_mut(entity)?.next_sequence(field))),
            SPACE => Ok(Value::Text(" ".to_string())),
            _ => {
                let value = self
                    .synthesizer
                    .generate(type_name, &mut self.rng)
                    .ok_or_else(|| GeneratorError::UnknownFieldType {
                        entity: entity.to_string(),
                        field: field.to_string(),
                        type_name: type_name.to_string(),
                    })?;
                // Only text columns take the token; a prefixed price would no
                // longer parse as MONEY.
                let text_column = matches!(map_field_type(type_name), ColumnType::VarChar { .. });
                Ok(match value {
                    Value::Text(text) if unique && text_column => {
                        Value::Text(format!("{}{text}", generate_token(&mut self.rng)))
                    }
                    other => other,
                })
            }
        }
    }

    fn store_mut(&mut self, entity: &str) -> Result<&mut RecordStore, GeneratorError> {
        self.stores
            .get_mut(entity)
            .ok_or_else(|| GeneratorError::EntityNotFound(entity.to_string()))
    }
}

/// Scalar fields an update may rewrite: outside the primary key and not
/// sequence-typed.
pub fn updatable_fields(entity: &Entity) -> Vec<String> {
    entity
        .fields
        .iter()
        .filter(|(name, field)| {
            !field.is_reference()
                && !entity.primary_key().contains(name)
                && !field.field_type().names().iter().any(|t| t == SEQUENCE)
        })
        .map(|(name, _)| name.clone())
        .collect()
}

impl std::fmt::Debug for DataGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataGenerator")
            .field("entities", &self.schema.entity_names())
            .field("seed", &self.seed)
            .field("records", &self.stores.total_records())
            .finish()
    }
}
