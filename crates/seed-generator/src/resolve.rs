//! Dependency leveling.
//!
//! Entities are grouped into levels so that every entity comes after the
//! entities its records must be able to reference. Within a level there is
//! no ordering requirement; backends may create and fill those tables
//! concurrently.

use seed_core::{Entity, ReferenceType, Schema};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No entity could be placed in a pass while some remained
    #[error("Cyclic dependency between entities: {}", remaining.join(", "))]
    Cycle { remaining: Vec<String> },
}

/// One entity placed in the dependency queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEntity {
    pub name: String,
    pub entity: Entity,
}

/// A group of mutually independent entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyLevel {
    pub entities: Vec<QueuedEntity>,
}

impl DependencyLevel {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Names of the entities `name` must be placed after.
///
/// Belongs edges to other entities of the schema count; a belongs edge to
/// the entity itself does not, or self-referencing tables could never be
/// placed. Every `hasOne` target counts, including the entity itself.
pub fn dependencies(schema: &Schema, name: &str, entity: &Entity) -> BTreeSet<String> {
    entity
        .reference_fields()
        .filter(|(_, reference)| match reference.reference_type {
            ReferenceType::BelongsToOne | ReferenceType::BelongsToMany => {
                reference.entity != name && schema.contains(&reference.entity)
            }
            ReferenceType::HasOne => true,
            ReferenceType::HasMany => false,
        })
        .map(|(_, reference)| reference.entity.clone())
        .collect()
}

/// Compute the leveled dependency queue of a normalized schema.
pub fn resolve(schema: &Schema) -> Result<Vec<DependencyLevel>, ResolveError> {
    let mut pending: Vec<(&String, &Entity, BTreeSet<String>)> = schema
        .entities()
        .map(|(name, entity)| (name, entity, dependencies(schema, name, entity)))
        .collect();
    let mut placed: BTreeSet<String> = BTreeSet::new();
    let mut levels = Vec::new();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(_, _, deps)| deps.is_subset(&placed));

        if ready.is_empty() {
            return Err(ResolveError::Cycle {
                remaining: blocked.into_iter().map(|(name, _, _)| name.clone()).collect(),
            });
        }

        let level = DependencyLevel {
            entities: ready
                .into_iter()
                .map(|(name, entity, _)| QueuedEntity {
                    name: name.clone(),
                    entity: entity.clone(),
                })
                .collect(),
        };
        debug!(
            "Dependency level {}: {}",
            levels.len(),
            level.names().collect::<Vec<_>>().join(", ")
        );
        placed.extend(level.names().map(str::to_string));
        levels.push(level);
        pending = blocked;
    }

    Ok(levels)
}
