//! Create/update/merge/delete against the write connection.
//!
//! The manager owns no connections of its own: every operation goes through
//! the entity's repository and its fixed write connection. Updates persist
//! only the dirty field set computed by the diff engine; an empty diff is a
//! successful no-op, not an error.
//!
//! Write failures surface as [`EntityError::Persistence`]. In redacting
//! mode the caller-visible message is generic while the full engine error
//! is logged; raw engine error text is never leaked to callers
//! unconditionally.
//!
//! No multi-statement atomicity is provided: two writers that load the
//! same snapshot and diff-update concurrently can lose an update. That is
//! an explicit limitation of the diff-then-update scheme.

use crate::diff;
use crate::engine::{EngineError, Row};
use crate::entity::{Entity, ID_COLUMN};
use crate::error::EntityError;
use crate::filter::{apply_filters, Filters};
use crate::mapper;
use crate::repository::Repository;
use sea_query::Value;

/// Facade for entity persistence
///
/// Stateless apart from the redaction switch; one instance may serve every
/// entity type and be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct EntityManager {
    redact_errors: bool,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redact engine detail from persistence errors surfaced to callers
    /// (full detail is still logged). Matches production deployments where
    /// driver messages must not reach API clients.
    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    fn persistence(&self, operation: &str, err: EngineError) -> EntityError {
        log::error!("{operation} failed: {err}");
        if self.redact_errors {
            EntityError::Persistence(format!("can't {operation} entity"))
        } else {
            EntityError::Persistence(format!("can't {operation} entity: {err}"))
        }
    }

    fn require_id<E: Entity>(entity: &E) -> Result<i64, EntityError> {
        entity.id().ok_or(EntityError::MissingIdentity {
            entity: E::descriptor().entity,
        })
    }

    /// Insert a fresh entity.
    ///
    /// With `instant_fetch` the insert returns the generated identity; it
    /// is written back and the snapshot is sealed, so the returned entity
    /// is immediately diffable. Without it a plain insert runs and the
    /// entity is returned unchanged.
    pub fn add<E: Entity>(
        &self,
        repository: &Repository<E>,
        mut entity: E,
        instant_fetch: bool,
    ) -> Result<E, EntityError> {
        let fields = mapper::to_persistable_fields(&entity);
        let query = repository.write_query();
        if instant_fetch {
            let id = query
                .insert_get_id(&fields, ID_COLUMN)
                .map_err(|e| self.persistence("create", e))?;
            entity.set_id(id);
            mapper::seal_snapshot(&mut entity);
        } else {
            query
                .insert(&fields)
                .map_err(|e| self.persistence("create", e))?;
        }
        Ok(entity)
    }

    /// Persist the entity's dirty fields.
    ///
    /// Returns `Ok(true)` when rows were updated or when nothing changed
    /// ("nothing to do" is success); `Ok(false)` when the UPDATE matched no
    /// row. On an applied update the snapshot is replaced wholesale.
    pub fn save<E: Entity>(
        &self,
        repository: &Repository<E>,
        entity: &mut E,
    ) -> Result<bool, EntityError> {
        let changes = diff::update_set(entity);
        if changes.is_empty() {
            return Ok(true);
        }
        let id = Self::require_id(entity)?;
        let affected = repository
            .write_query()
            .where_eq(ID_COLUMN, Value::BigInt(Some(id)))
            .update(&changes)
            .map_err(|e| self.persistence("update", e))?;
        if affected > 0 {
            mapper::seal_snapshot(entity);
        }
        Ok(affected > 0)
    }

    /// Apply a set of column overrides on top of the entity's current
    /// state.
    ///
    /// Only overrides that differ from the entity's *current* field values
    /// survive (this baseline is the current state, not the load-time
    /// snapshot). If none survive, nothing is written and `Ok(None)` is
    /// returned. Otherwise the survivors are persisted and a new entity is
    /// built from the merged field set, snapshot sealed. Identity
    /// overrides are ignored.
    pub fn merge<E: Entity>(
        &self,
        repository: &Repository<E>,
        entity: &E,
        overrides: &Row,
    ) -> Result<Option<E>, EntityError> {
        let current = mapper::to_persistable_fields(entity);
        let mut survivors = diff::override_set(&current, overrides);
        survivors.remove(ID_COLUMN);
        if survivors.is_empty() {
            return Ok(None);
        }

        let id = Self::require_id(entity)?;
        repository
            .write_query()
            .where_eq(ID_COLUMN, Value::BigInt(Some(id)))
            .update(&survivors)
            .map_err(|e| self.persistence("update", e))?;

        let mut merged = current;
        merged.extend(survivors);
        merged.insert(ID_COLUMN.to_string(), Value::BigInt(Some(id)));
        Ok(Some(mapper::entity_from_row(&merged)?))
    }

    /// Delete the entity's row. Returns whether a row was deleted.
    pub fn delete<E: Entity>(
        &self,
        repository: &Repository<E>,
        entity: &E,
    ) -> Result<bool, EntityError> {
        let id = Self::require_id(entity)?;
        let affected = repository
            .write_query()
            .where_eq(ID_COLUMN, Value::BigInt(Some(id)))
            .delete()
            .map_err(|e| self.persistence("delete", e))?;
        Ok(affected > 0)
    }

    /// Delete a batch of entities by identity in one statement.
    ///
    /// Entities without an identity are skipped; an empty batch is a
    /// successful no-op.
    pub fn mass_delete<E: Entity>(
        &self,
        repository: &Repository<E>,
        entities: &[E],
    ) -> Result<bool, EntityError> {
        let ids: Vec<Value> = entities
            .iter()
            .filter_map(Entity::id)
            .map(|id| Value::BigInt(Some(id)))
            .collect();
        if ids.is_empty() {
            return Ok(true);
        }
        let affected = repository
            .write_query()
            .where_in(ID_COLUMN, ids)
            .delete()
            .map_err(|e| self.persistence("delete", e))?;
        Ok(affected > 0)
    }

    /// Bulk-update every row matching the filters with the given columns.
    /// Returns the number of affected rows.
    pub fn mass_update<E: Entity>(
        &self,
        repository: &Repository<E>,
        filters: &Filters,
        new_data: &Row,
    ) -> Result<u64, EntityError> {
        let query = apply_filters(repository.write_query(), filters)?;
        query
            .update(new_data)
            .map_err(|e| self.persistence("update", e))
    }
}
