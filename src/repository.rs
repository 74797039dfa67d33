//! Per-entity-type repository facade and the repository registry.
//!
//! A [`Repository`] ties an entity type to its table name and to two fixed
//! logical connection names (one for reads, one for writes; they may be
//! identical). Read operations are pure compositions over the injected
//! engine, so concurrent callers may share one instance freely.
//!
//! The [`Registry`] is the capability relation loading uses to find the
//! repository of a child entity type. Hosts register instances explicitly;
//! there is no implicit discovery.

use crate::engine::QueryEngine;
use crate::entity::{Entity, ID_COLUMN};
use crate::error::EntityError;
use crate::filter::{apply_filters, Filters, Sorting};
use crate::mapper;
use crate::pagination::{distinct_row_count, window, Page};
use crate::query::TableQuery;
use crate::relation::attach_relations;
use sea_query::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Default logical connection name for both reads and writes.
pub const DEFAULT_CONNECTION: &str = "default";

/// Repository for one entity type: table name, connection names, engine
///
/// # Example
///
/// ```no_run
/// use entable::{Filters, Repository, Sorting};
/// # use std::sync::Arc;
/// # #[derive(Clone, Debug)] struct User;
/// # impl entable::Entity for User {
/// #     fn descriptor() -> &'static entable::EntityDescriptor<Self> { todo!() }
/// #     fn from_row(_: &entable::Row) -> Result<Self, entable::EntityError> { todo!() }
/// #     fn id(&self) -> Option<i64> { None }
/// #     fn set_id(&mut self, _: i64) {}
/// #     fn original_snapshot(&self) -> &entable::Snapshot { todo!() }
/// #     fn set_original_snapshot(&mut self, _: entable::Snapshot) {}
/// # }
/// # let engine: Arc<dyn entable::QueryEngine> = todo!();
/// let users: Repository<User> = Repository::new(engine, "users")
///     .with_connections("replica", "primary");
///
/// let admins = users.find_one_by(
///     &Filters::new().eq("role", "admin"),
///     &Sorting::new().desc("created_at"),
/// )?;
/// # Ok::<(), entable::EntityError>(())
/// ```
pub struct Repository<E: Entity> {
    table: String,
    read_connection: String,
    write_connection: String,
    engine: Arc<dyn QueryEngine>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &self.table)
            .field("read_connection", &self.read_connection)
            .field("write_connection", &self.write_connection)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            read_connection: self.read_connection.clone(),
            write_connection: self.write_connection.clone(),
            engine: Arc::clone(&self.engine),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    /// Create a repository over `table` using [`DEFAULT_CONNECTION`] for
    /// both reads and writes.
    pub fn new(engine: Arc<dyn QueryEngine>, table: &str) -> Self {
        Self {
            table: table.to_string(),
            read_connection: DEFAULT_CONNECTION.to_string(),
            write_connection: DEFAULT_CONNECTION.to_string(),
            engine,
            _entity: PhantomData,
        }
    }

    /// Fix the read and write connection names. A repository's connection
    /// selection is static, not a per-call parameter.
    pub fn with_connections(mut self, read: &str, write: &str) -> Self {
        self.read_connection = read.to_string();
        self.write_connection = write.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn read_connection(&self) -> &str {
        &self.read_connection
    }

    pub fn write_connection(&self) -> &str {
        &self.write_connection
    }

    /// A fresh query builder on the read connection. Advanced callers
    /// prebuild joins here and hand the query to
    /// [`Repository::paginated_query`].
    pub fn query(&self) -> TableQuery<'_> {
        TableQuery::new(&*self.engine, &self.read_connection, &self.table)
    }

    pub(crate) fn write_query(&self) -> TableQuery<'_> {
        TableQuery::new(&*self.engine, &self.write_connection, &self.table)
    }

    /// Fetch one entity by identity.
    pub fn find(&self, id: i64) -> Result<Option<E>, EntityError> {
        let row = self
            .query()
            .where_eq(ID_COLUMN, Value::BigInt(Some(id)))
            .first()?;
        row.map(|r| mapper::entity_from_row(&r)).transpose()
    }

    /// Fetch the first entity matching the filters, in sort order.
    pub fn find_one_by(
        &self,
        filters: &Filters,
        sorting: &Sorting,
    ) -> Result<Option<E>, EntityError> {
        let mut query = apply_filters(self.query(), filters)?;
        for (field, order) in sorting.iter() {
            query = query.order_by(field, order.clone());
        }
        let row = query.first()?;
        row.map(|r| mapper::entity_from_row(&r)).transpose()
    }

    /// Fetch every entity matching the filters, in sort order, optionally
    /// limited, with the named relations attached.
    ///
    /// `limit == 0` means no limit.
    pub fn find_by(
        &self,
        filters: &Filters,
        sorting: &Sorting,
        limit: u64,
        relations: &[&str],
        registry: &Registry,
    ) -> Result<Vec<E>, EntityError> {
        let mut query = apply_filters(self.query(), filters)?;
        for (field, order) in sorting.iter() {
            query = query.order_by(field, order.clone());
        }
        if limit > 0 {
            query = query.take(limit);
        }
        let mut entities = mapper::to_entities(query.get()?)?;
        attach_relations(&mut entities, relations, registry)?;
        Ok(entities)
    }

    /// Fetch every entity in the table.
    pub fn all(&self) -> Result<Vec<E>, EntityError> {
        mapper::to_entities(self.query().get()?)
    }

    /// Count entities matching the filters.
    pub fn count_by(&self, filters: &Filters) -> Result<u64, EntityError> {
        Ok(apply_filters(self.query(), filters)?.count()?)
    }

    /// Count for pagination: projects only the identity column into the
    /// count subquery so full rows are never materialized.
    pub fn count_for_pagination(&self, filters: &Filters) -> Result<u64, EntityError> {
        Ok(apply_filters(self.query().select_column(ID_COLUMN), filters)?.count()?)
    }

    /// The rows of one page window, mapped and with relations attached.
    ///
    /// `page` is 1-based; `page == 0` is a caller error (the offset is
    /// undefined). `page_size == 0` disables windowing.
    pub fn take_portion(
        &self,
        filters: &Filters,
        sorting: &Sorting,
        page: u64,
        page_size: u64,
        relations: &[&str],
        registry: &Registry,
    ) -> Result<Vec<E>, EntityError> {
        let mut query = apply_filters(self.query(), filters)?;
        for (field, order) in sorting.iter() {
            query = query.order_by(field, order.clone());
        }
        if page_size > 0 {
            let (offset, limit) = window(page, page_size);
            query = query.take(limit).skip(offset);
        }
        let mut entities = mapper::to_entities(query.get()?)?;
        attach_relations(&mut entities, relations, registry)?;
        Ok(entities)
    }

    /// One counted page of filtered, sorted entities.
    ///
    /// With `page_size > 0` this issues one count query (identity
    /// projection only) and one windowed fetch; relations attach to the
    /// window only. With `page_size == 0` every matching row is returned
    /// as a single page and the count is the item count, with no separate
    /// count query. `page` is 1-based; `page == 0` is a caller error.
    pub fn paginate(
        &self,
        filters: &Filters,
        sorting: &Sorting,
        page: u64,
        page_size: u64,
        relations: &[&str],
        registry: &Registry,
    ) -> Result<Page<E>, EntityError> {
        let items = self.take_portion(filters, sorting, page, page_size, relations, registry)?;
        let total_count = if page_size > 0 {
            self.count_for_pagination(filters)?
        } else {
            items.len() as u64
        };
        Ok(Page::new(items, total_count, page, page_size))
    }

    /// Paginate a prebuilt query expression (advanced search).
    ///
    /// A query carrying a left outer join duplicates parent rows in the
    /// fan-out, so a COUNT aggregate would over-count; in that case the
    /// full result set is materialized and distinct identity values are
    /// counted instead. Queries without a left join count with the
    /// aggregate.
    pub fn paginated_query(
        &self,
        query: TableQuery<'_>,
        page: u64,
        page_size: u64,
        relations: &[&str],
        registry: &Registry,
    ) -> Result<Page<E>, EntityError> {
        let total_count = if query.has_left_join() {
            distinct_row_count(&query.get()?)
        } else {
            query.count()?
        };

        let mut windowed = query;
        if page_size > 0 {
            let (offset, limit) = window(page, page_size);
            windowed = windowed.take(limit).skip(offset);
        }
        let mut items = mapper::to_entities(windowed.get()?)?;
        attach_relations(&mut items, relations, registry)?;
        Ok(Page::new(items, total_count, page, page_size))
    }
}

/// Registry mapping entity types to their repository instances.
///
/// Relation loading resolves child repositories here. Registration is
/// explicit; how instances are constructed and wired is the host
/// application's concern.
#[derive(Default)]
pub struct Registry {
    repositories: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the repository for entity type `E`, replacing any previous
    /// registration.
    pub fn register<E: Entity>(&mut self, repository: Repository<E>) {
        self.repositories
            .insert(TypeId::of::<E>(), Box::new(repository));
    }

    /// The repository registered for entity type `E`.
    pub fn repository<E: Entity>(&self) -> Result<&Repository<E>, EntityError> {
        self.repositories
            .get(&TypeId::of::<E>())
            .and_then(|r| r.downcast_ref::<Repository<E>>())
            .ok_or(EntityError::Unregistered {
                entity: E::descriptor().entity,
            })
    }
}
