//! Schema normalization: junction entity synthesis.
//!
//! Every `hasMany` / `belongsToMany` field on `E` pointing at `R` (with
//! `R != E`) is backed by a junction entity `R_E` holding one foreign key to
//! `R` and one per primary-key component of `E`. Junction names depend only
//! on the pair and merging is a structural union, so normalizing twice gives
//! the same schema.

use seed_core::{Entity, Field, OnDelete, ReferenceField, ReferenceType, Schema};
use tracing::debug;

/// Name of the junction entity linking `owner` to `target`.
pub fn junction_name(target: &str, owner: &str) -> String {
    format!("{target}_{owner}")
}

/// Junction field holding a key of `entity`.
pub fn junction_field(entity: &str, field: &str) -> String {
    format!("{entity}_{field}")
}

/// Expand `schema` with the junction entities of its to-many relations.
pub fn normalize(schema: &Schema) -> Schema {
    let mut normalized = Schema::new();

    for (name, entity) in schema.entities() {
        normalized.merge_entity(name, entity);

        for (field_name, reference) in entity.reference_fields() {
            if !reference.reference_type.is_to_many() || reference.entity == *name {
                continue;
            }
            let junction = junction_entity(name, entity, reference);
            let junction_name = junction_name(&reference.entity, name);
            debug!(
                "Field {}.{} -> junction entity {}",
                name, field_name, junction_name
            );
            normalized.merge_entity(&junction_name, &junction);
        }
    }

    normalized
}

fn junction_entity(owner: &str, owner_entity: &Entity, reference: &ReferenceField) -> Entity {
    let mut junction = Entity::new().with_field(
        junction_field(&reference.entity, &reference.field),
        foreign_key(&reference.entity, &reference.field, reference.on_delete),
    );
    for key in owner_entity.primary_key() {
        junction = junction.with_field(
            junction_field(owner, key),
            foreign_key(owner, key, reference.on_delete),
        );
    }
    junction
}

fn foreign_key(entity: &str, field: &str, on_delete: Option<OnDelete>) -> Field {
    Field::Reference(
        ReferenceField::new(ReferenceType::BelongsToOne, entity, field).with_on_delete(on_delete),
    )
}
