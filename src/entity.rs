//! Entity trait and per-type field descriptor tables.
//!
//! The source of truth for what an entity persists is an explicit,
//! statically-built descriptor table: one [`FieldDescriptor`] per column
//! with the internal field name, the wire-form column name, and how to read
//! the current value off an entity instance (plain getter, boolean getter
//! normalized to 0/1, or the identity field). Relation-backed fields are
//! configured separately and are never persisted columns.
//!
//! An entity also carries its `original snapshot`: the column-to-value
//! mapping as last known persisted. The snapshot is sealed at load time and
//! replaced wholesale after a successful create or update; the diff engine
//! is its only other reader.

use crate::engine::Row;
use crate::error::EntityError;
use crate::relation::RelationLoader;
use sea_query::Value;
use std::fmt;

/// Name of the identity column on every mapped table.
pub const ID_COLUMN: &str = "id";

/// Column-to-value mapping of an entity's last-known-persisted state.
pub type Snapshot = Row;

/// How a field's current value is read off an entity instance
pub enum FieldAccess<E> {
    /// The identity field; excluded from persistable field sets and diffs
    Identity,
    /// Plain getter convention
    Value(fn(&E) -> Value),
    /// Boolean getter convention; persisted and compared as integer 0/1
    Flag(fn(&E) -> bool),
}

/// One persisted field of an entity type
pub struct FieldDescriptor<E> {
    /// Internal identifier form, e.g. `createdAt`
    pub name: &'static str,
    /// Wire form / column name, e.g. `created_at`
    pub column: &'static str,
    pub access: FieldAccess<E>,
}

/// Static description of an entity type: its fields and relations
pub struct EntityDescriptor<E: 'static> {
    /// Type name, used in diagnostics
    pub entity: &'static str,
    pub fields: &'static [FieldDescriptor<E>],
    pub relations: &'static [&'static dyn RelationLoader<E>],
}

impl<E: Entity> EntityDescriptor<E> {
    /// Look up a field by wire-form column name or internal field name.
    ///
    /// A wire-form key that matches no column directly is translated to
    /// its internal form and retried, so `created_at` finds a field
    /// declared as `createdAt` even if the column spelling differs.
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor<E>> {
        self.fields
            .iter()
            .find(|f| f.column == key || f.name == key)
            .or_else(|| {
                let internal = crate::naming::internal_form(key);
                self.fields.iter().find(|f| f.name == internal)
            })
    }

    /// Resolve the current value of a column on an entity instance.
    ///
    /// Boolean-getter fields come back as integer 0/1; the identity field
    /// comes back as a (possibly null) `BigInt`. Returns `None` when no
    /// field descriptor matches the column.
    pub fn value_of(&self, entity: &E, column: &str) -> Option<Value> {
        self.field(column).map(|f| match f.access {
            FieldAccess::Identity => Value::BigInt(entity.id()),
            FieldAccess::Value(get) => get(entity),
            FieldAccess::Flag(get) => Value::Int(Some(i32::from(get(entity)))),
        })
    }

    /// Look up a relation loader by relation name.
    pub fn relation(&self, name: &str) -> Option<&'static dyn RelationLoader<E>> {
        self.relations.iter().copied().find(|r| r.name() == name)
    }
}

/// A typed record representing one persisted row plus a snapshot of its
/// last-known-persisted field values.
///
/// Implementations are plain structs; the descriptor table replaces the
/// runtime reflection the getter/setter convention would otherwise need.
///
/// # Example
///
/// ```no_run
/// use entable::{Entity, EntityDescriptor, FieldAccess, FieldDescriptor, Row, Snapshot};
/// use sea_query::Value;
///
/// #[derive(Clone, Debug, Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: String,
///     original: Snapshot,
/// }
///
/// fn tag_label(t: &Tag) -> Value {
///     Value::String(Some(t.label.clone()))
/// }
///
/// static TAG_FIELDS: [FieldDescriptor<Tag>; 2] = [
///     FieldDescriptor { name: "id", column: "id", access: FieldAccess::Identity },
///     FieldDescriptor { name: "label", column: "label", access: FieldAccess::Value(tag_label) },
/// ];
///
/// static TAG_DESCRIPTOR: EntityDescriptor<Tag> = EntityDescriptor {
///     entity: "Tag",
///     fields: &TAG_FIELDS,
///     relations: &[],
/// };
///
/// impl Entity for Tag {
///     fn descriptor() -> &'static EntityDescriptor<Self> { &TAG_DESCRIPTOR }
///     fn from_row(row: &Row) -> Result<Self, entable::EntityError> {
///         Ok(Tag {
///             id: entable::value::get_i64(row, "id"),
///             label: entable::value::get_string(row, "label").unwrap_or_default(),
///             original: Snapshot::new(),
///         })
///     }
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: i64) { self.id = Some(id); }
///     fn original_snapshot(&self) -> &Snapshot { &self.original }
///     fn set_original_snapshot(&mut self, snapshot: Snapshot) { self.original = snapshot; }
/// }
/// ```
pub trait Entity: Clone + Send + fmt::Debug + Sized + 'static {
    /// The static field/relation table for this type.
    fn descriptor() -> &'static EntityDescriptor<Self>;

    /// Construct an instance from a raw row. The snapshot is sealed by the
    /// mapper after construction; implementations leave it empty.
    fn from_row(row: &Row) -> Result<Self, EntityError>;

    /// Identity value; `None` until persisted.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    fn original_snapshot(&self) -> &Snapshot;

    fn set_original_snapshot(&mut self, snapshot: Snapshot);
}

#[cfg(test)]
mod tests {
    use crate::entity::{Entity, FieldAccess, ID_COLUMN};
    use crate::tests_cfg::{user, User};
    use sea_query::Value;

    #[test]
    fn test_field_lookup_by_column() {
        let desc = User::descriptor();
        assert!(desc.field("name").is_some());
        assert!(desc.field("is_active").is_some());
        // internal-form spelling resolves to the same field
        assert_eq!(
            desc.field("isActive").map(|f| f.column),
            Some("is_active")
        );
        assert!(desc.field("posts").is_none());
        assert!(desc.field("nope").is_none());
    }

    #[test]
    fn test_value_of_resolves_by_convention() {
        let u = user(Some(3), "ann", 30, true);
        let desc = User::descriptor();

        assert_eq!(desc.value_of(&u, "name"), Some(Value::String(Some("ann".to_string()))));
        // boolean getter comes back as 0/1
        assert_eq!(desc.value_of(&u, "is_active"), Some(Value::Int(Some(1))));
        assert_eq!(desc.value_of(&u, ID_COLUMN), Some(Value::BigInt(Some(3))));
        assert_eq!(desc.value_of(&u, "unknown"), None);
    }

    #[test]
    fn test_identity_field_is_marked() {
        let desc = User::descriptor();
        let id_field = desc.field(ID_COLUMN).unwrap();
        assert!(matches!(id_field.access, FieldAccess::Identity));
    }

    #[test]
    fn test_relation_lookup_by_name() {
        let desc = User::descriptor();
        assert!(desc.relation("posts").is_some());
        assert!(desc.relation("profile").is_some());
        assert!(desc.relation("missing").is_none());
    }
}
