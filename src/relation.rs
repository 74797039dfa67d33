//! Batched relation resolution.
//!
//! Attaching a relation to a batch of parents costs exactly one additional
//! query, independent of parent count: the distinct local-key values are
//! collected across the batch, the child repository is queried once with
//! `foreign_key IN (keys)`, and the resulting children are grouped by
//! foreign-key value and assigned to their parents. Parents with no match
//! receive the relation's default (`[]` for a to-many, `None` for a
//! to-one); that is a normal outcome, never an error.

use crate::engine::Row;
use crate::entity::Entity;
use crate::error::EntityError;
use crate::mapper;
use crate::repository::Registry;
use crate::value::{is_null, key_string};
use std::collections::{BTreeMap, BTreeSet};

/// Relation cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    One,
    Many,
}

enum Assign<P, C> {
    One(fn(&mut P, Option<C>)),
    Many(fn(&mut P, Vec<C>)),
}

/// Configuration tying a parent entity type to a child repository:
/// cardinality, key pair, and the typed setter that writes the loaded
/// children into the parent.
///
/// Defined as statics on the parent's descriptor table:
///
/// ```no_run
/// # use entable::{RelationDef, RelationLoader};
/// # #[derive(Clone, Debug)] struct User { posts: Vec<Post> }
/// # #[derive(Clone, Debug)] struct Post;
/// fn set_user_posts(user: &mut User, posts: Vec<Post>) {
///     user.posts = posts;
/// }
///
/// static USER_POSTS: RelationDef<User, Post> =
///     RelationDef::many("posts", "id", "user_id", set_user_posts);
/// ```
pub struct RelationDef<P, C> {
    name: &'static str,
    /// Column on the parent whose value is matched
    local_key: &'static str,
    /// Column on the child holding the parent's key
    foreign_key: &'static str,
    assign: Assign<P, C>,
}

impl<P, C> RelationDef<P, C> {
    /// A one-to-one relation; the first matched child (or `None`) is
    /// assigned.
    pub const fn one(
        name: &'static str,
        local_key: &'static str,
        foreign_key: &'static str,
        set: fn(&mut P, Option<C>),
    ) -> Self {
        Self {
            name,
            local_key,
            foreign_key,
            assign: Assign::One(set),
        }
    }

    /// A one-to-many relation; every matched child (or `[]`) is assigned.
    pub const fn many(
        name: &'static str,
        local_key: &'static str,
        foreign_key: &'static str,
        set: fn(&mut P, Vec<C>),
    ) -> Self {
        Self {
            name,
            local_key,
            foreign_key,
            assign: Assign::Many(set),
        }
    }
}

/// Object-safe loader interface so one parent descriptor can hold
/// relations to heterogeneous child types.
pub trait RelationLoader<P>: Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> RelationKind;

    /// Load and assign this relation for every parent in the batch.
    fn attach(&self, parents: &mut [P], registry: &Registry) -> Result<(), EntityError>;
}

impl<P: Entity, C: Entity> RelationLoader<P> for RelationDef<P, C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> RelationKind {
        match self.assign {
            Assign::One(_) => RelationKind::One,
            Assign::Many(_) => RelationKind::Many,
        }
    }

    fn attach(&self, parents: &mut [P], registry: &Registry) -> Result<(), EntityError> {
        if parents.is_empty() {
            return Ok(());
        }

        let descriptor = P::descriptor();

        // Distinct, non-null local key values across the batch. A parent
        // with no usable key keeps the relation default.
        let mut seen = BTreeSet::new();
        let mut keys = Vec::new();
        for parent in parents.iter() {
            if let Some(value) = descriptor.value_of(parent, self.local_key) {
                if !is_null(&value) && seen.insert(key_string(&value)) {
                    keys.push(value);
                }
            }
        }

        let rows: Vec<Row> = if keys.is_empty() {
            Vec::new()
        } else {
            let children = registry.repository::<C>()?;
            children
                .query()
                .where_in(self.foreign_key, keys)
                .get()?
        };

        // Group child rows by foreign key before mapping, so the grouping
        // key comes from the raw wire value.
        let mut groups: BTreeMap<String, Vec<C>> = BTreeMap::new();
        for row in &rows {
            let Some(fk) = row.get(self.foreign_key) else {
                continue;
            };
            if is_null(fk) {
                continue;
            }
            let child: C = mapper::entity_from_row(row)?;
            groups.entry(key_string(fk)).or_default().push(child);
        }

        for parent in parents.iter_mut() {
            let matched = descriptor
                .value_of(parent, self.local_key)
                .filter(|v| !is_null(v))
                .and_then(|v| groups.get(&key_string(&v)).cloned());
            match self.assign {
                Assign::Many(set) => set(parent, matched.unwrap_or_default()),
                Assign::One(set) => set(parent, matched.and_then(|c| c.into_iter().next())),
            }
        }

        Ok(())
    }
}

/// Attach each named relation to the batch, one query per relation.
///
/// An unconfigured relation name fails with
/// [`EntityError::MissingRelation`] at the point of request.
pub fn attach_relations<P: Entity>(
    parents: &mut [P],
    relations: &[&str],
    registry: &Registry,
) -> Result<(), EntityError> {
    for name in relations {
        let loader =
            P::descriptor()
                .relation(name)
                .ok_or_else(|| EntityError::MissingRelation {
                    entity: P::descriptor().entity,
                    relation: (*name).to_string(),
                })?;
        loader.attach(parents, registry)?;
    }
    Ok(())
}
