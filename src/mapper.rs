//! Row-to-entity mapping and persistable field extraction.
//!
//! Loading goes through [`entity_from_row`], which constructs the entity
//! and seals its original snapshot to the freshly-loaded values in one
//! step. Writing goes through [`to_persistable_fields`], which walks the
//! descriptor table and resolves each column by the getter conventions:
//! plain getters as-is, boolean getters coerced to integer 0/1. The
//! identity field and relation-backed fields never appear in the
//! persistable set.

use crate::engine::Row;
use crate::entity::{Entity, FieldAccess, ID_COLUMN};
use crate::error::EntityError;
use crate::value::key_string;
use sea_query::Value;
use std::collections::BTreeMap;

/// Map raw rows to entities, sealing each entity's snapshot.
pub fn to_entities<E: Entity>(rows: Vec<Row>) -> Result<Vec<E>, EntityError> {
    rows.iter().map(entity_from_row).collect()
}

/// Construct one entity from a raw row with its snapshot sealed.
pub fn entity_from_row<E: Entity>(row: &Row) -> Result<E, EntityError> {
    let mut entity = E::from_row(row)?;
    seal_snapshot(&mut entity);
    Ok(entity)
}

/// Replace the entity's original snapshot with its current field values.
///
/// Called after load and after every successful create/update; the
/// snapshot is always replaced wholesale, never merged.
pub fn seal_snapshot<E: Entity>(entity: &mut E) {
    let mut snapshot = to_persistable_fields(entity);
    snapshot.insert(ID_COLUMN.to_string(), Value::BigInt(entity.id()));
    entity.set_original_snapshot(snapshot);
}

/// Resolve the entity's persistable columns to their current values.
///
/// Skips the identity field; relation-backed fields are not part of the
/// descriptor's field table and are therefore never included.
pub fn to_persistable_fields<E: Entity>(entity: &E) -> Row {
    let mut fields = Row::new();
    for field in E::descriptor().fields {
        let value = match field.access {
            FieldAccess::Identity => continue,
            FieldAccess::Value(get) => get(entity),
            FieldAccess::Flag(get) => Value::Int(Some(i32::from(get(entity)))),
        };
        fields.insert(field.column.to_string(), value);
    }
    fields
}

/// Key a collection of entities by one column's canonical value rendering.
///
/// Later entities win on key collisions.
pub fn key_by<E: Entity>(entities: impl IntoIterator<Item = E>, column: &str) -> BTreeMap<String, E> {
    let descriptor = E::descriptor();
    let mut keyed = BTreeMap::new();
    for entity in entities {
        if let Some(value) = descriptor.value_of(&entity, column) {
            keyed.insert(key_string(&value), entity);
        }
    }
    keyed
}
