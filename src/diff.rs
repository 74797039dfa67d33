//! Dirty-field diffing.
//!
//! [`update_set`] computes the minimal column set for an UPDATE by
//! comparing an entity's current values against its original snapshot.
//! Comparison happens on canonical value forms (integer widths unified,
//! boolean-getter fields as 0/1); there is no loose cross-kind equality.
//! An empty result means nothing changed, which callers treat as a
//! successful no-op.
//!
//! [`override_set`] is the other diff baseline, used by merge: it keeps the
//! overrides that differ from the entity's *current* field values, not from
//! the snapshot. The two baselines are intentionally distinct.

use crate::engine::Row;
use crate::entity::{Entity, FieldAccess, ID_COLUMN};
use crate::value::values_equal;
use sea_query::Value;

/// Columns whose current value differs from the original snapshot.
///
/// Iterates the snapshot's field names; for each, the current value is
/// resolved through the descriptor's getter conventions and included only
/// on a canonical mismatch. The identity field is always excluded.
pub fn update_set<E: Entity>(entity: &E) -> Row {
    let descriptor = E::descriptor();
    let mut changed = Row::new();
    for (column, old_value) in entity.original_snapshot() {
        if column == ID_COLUMN {
            continue;
        }
        let Some(field) = descriptor.field(column) else {
            // snapshot key with no descriptor backing it; nothing to read
            continue;
        };
        let current = match field.access {
            FieldAccess::Identity => continue,
            FieldAccess::Value(get) => get(entity),
            FieldAccess::Flag(get) => Value::Int(Some(i32::from(get(entity)))),
        };
        if !values_equal(&current, old_value) {
            changed.insert(column.clone(), current);
        }
    }
    changed
}

/// Overrides that differ from the current field values.
///
/// A key absent from `current` counts as a change. Returns the surviving
/// subset; empty means the merge is a no-op.
pub fn override_set(current: &Row, overrides: &Row) -> Row {
    overrides
        .iter()
        .filter(|(column, value)| {
            current
                .get(*column)
                .map_or(true, |existing| !values_equal(existing, value))
        })
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect()
}
