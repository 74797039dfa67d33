//! Row-level query builder over the engine capability.
//!
//! [`TableQuery`] scopes one table on one logical connection and exposes the
//! predicate and execution primitives the repositories compose: `where_*`
//! chainers, ordering, windowing (`take`/`skip`), and the executors `get`,
//! `first`, `count`, `insert`, `insert_get_id`, `update`, `delete`.
//!
//! SQL is built with sea-query and executed through the injected
//! [`QueryEngine`]. Join state is tracked structurally so pagination can ask
//! `has_left_join()` instead of scanning generated SQL text.

use crate::engine::{EngineError, QueryEngine, Row};
use sea_query::{
    Asterisk, DeleteStatement, DynIden, Expr, ExprTrait, InsertStatement, JoinType, Order,
    PostgresQueryBuilder, SelectStatement, UpdateStatement, Value, Values,
};

fn col(name: &str) -> DynIden {
    DynIden::from(name.to_string())
}

/// Query builder scoped to one table and one logical connection
///
/// Returned by `Repository::query()` and consumed by the filter translator
/// and the pagination engine. Chainers take `self` and return `Self`.
///
/// # Example
///
/// ```no_run
/// use entable::{QueryEngine, TableQuery};
/// use sea_query::Value;
///
/// # let engine: &dyn QueryEngine = todo!();
/// let rows = TableQuery::new(engine, "default", "users")
///     .where_eq("status", Value::Int(Some(1)))
///     .order_by("id", sea_query::Order::Asc)
///     .take(10)
///     .get()?;
/// # Ok::<(), entable::EngineError>(())
/// ```
#[derive(Clone)]
pub struct TableQuery<'e> {
    engine: &'e dyn QueryEngine,
    conn: String,
    table: String,
    projection: Vec<String>,
    predicates: Vec<Expr>,
    sorts: Vec<(String, Order)>,
    left_joins: Vec<(String, Expr)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'e> TableQuery<'e> {
    /// Create a builder for `table` on the logical connection `conn`.
    pub fn new(engine: &'e dyn QueryEngine, conn: &str, table: &str) -> Self {
        Self {
            engine,
            conn: conn.to_string(),
            table: table.to_string(),
            projection: Vec::new(),
            predicates: Vec::new(),
            sorts: Vec::new(),
            left_joins: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Restrict the projection to one column (may be called repeatedly).
    pub fn select_column(mut self, column: &str) -> Self {
        self.projection.push(column.to_string());
        self
    }

    /// Add an arbitrary predicate, ANDed with the existing ones.
    pub fn and_where(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add an equality predicate.
    pub fn where_eq(self, column: &str, value: Value) -> Self {
        let predicate = Expr::col(col(column)).eq(value);
        self.and_where(predicate)
    }

    /// Add a set-membership predicate.
    pub fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        let predicate = Expr::col(col(column)).is_in(values);
        self.and_where(predicate)
    }

    /// Add a negated set-membership predicate.
    pub fn where_not_in(self, column: &str, values: Vec<Value>) -> Self {
        let predicate = Expr::col(col(column)).is_not_in(values);
        self.and_where(predicate)
    }

    /// Add a closed-range predicate.
    pub fn where_between(self, column: &str, low: Value, high: Value) -> Self {
        let predicate = Expr::col(col(column)).between(low, high);
        self.and_where(predicate)
    }

    /// Add an engine-native predicate fragment, passed through verbatim.
    ///
    /// Escape hatch; the caller is responsible for injection safety.
    pub fn where_raw(self, fragment: &str) -> Self {
        self.and_where(Expr::cust(fragment.to_string()))
    }

    /// Add an ORDER BY clause; call order is significant (primary sort
    /// first).
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.sorts.push((column.to_string(), order));
        self
    }

    /// LIMIT the result set.
    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// OFFSET into the result set.
    pub fn skip(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add a LEFT OUTER JOIN. The join is recorded structurally and is
    /// visible through [`TableQuery::has_left_join`].
    pub fn left_join(mut self, table: &str, on: Expr) -> Self {
        self.left_joins.push((table.to_string(), on));
        self
    }

    /// Whether this query carries a left outer join. Pagination uses this
    /// to decide between a COUNT aggregate and a materialized distinct
    /// count (join fan-out duplicates parent rows).
    pub fn has_left_join(&self) -> bool {
        !self.left_joins.is_empty()
    }

    fn build_select(&self, windowed: bool) -> (String, Values) {
        let mut stmt = SelectStatement::default();
        if self.projection.is_empty() {
            stmt.column(Asterisk);
        } else {
            for column in &self.projection {
                stmt.column(col(column));
            }
        }
        stmt.from(col(&self.table));
        for (table, on) in &self.left_joins {
            stmt.join(JoinType::LeftJoin, col(table), on.clone());
        }
        for predicate in &self.predicates {
            stmt.and_where(predicate.clone());
        }
        if windowed {
            for (column, order) in &self.sorts {
                stmt.order_by(col(column), order.clone());
            }
            if let Some(limit) = self.limit {
                stmt.limit(limit);
            }
            if let Some(offset) = self.offset {
                stmt.offset(offset);
            }
        }
        stmt.build(PostgresQueryBuilder)
    }

    /// Execute and return every row.
    pub fn get(&self) -> Result<Vec<Row>, EngineError> {
        let (sql, values) = self.build_select(true);
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.fetch_all(&self.conn, &sql, &values)
    }

    /// Execute with LIMIT 1 and return the first row, if any.
    pub fn first(&self) -> Result<Option<Row>, EngineError> {
        let (sql, values) = self.clone().take(1).build_select(true);
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.fetch_one(&self.conn, &sql, &values)
    }

    /// Count matching rows.
    ///
    /// The filtered query (projection, joins and predicates, but no
    /// ordering or window) is wrapped in a `SELECT COUNT(*)` subquery, so a
    /// caller-applied window never truncates the count.
    pub fn count(&self) -> Result<u64, EngineError> {
        let (inner_sql, values) = self.build_select(false);
        let sql = format!("SELECT COUNT(*) FROM ({inner_sql}) AS count_subquery");
        log::debug!("[{}] {}", self.conn, sql);
        let row = self
            .engine
            .fetch_one(&self.conn, &sql, &values)?
            .ok_or_else(|| EngineError::Decode("count query returned no row".to_string()))?;
        match row.values().next().map(crate::value::canonical) {
            Some(Value::BigInt(Some(n))) if n >= 0 => Ok(n as u64),
            other => Err(EngineError::Decode(format!(
                "count query returned a non-integer value: {other:?}"
            ))),
        }
    }

    /// Insert one row of column-to-value pairs.
    pub fn insert(&self, fields: &Row) -> Result<u64, EngineError> {
        let (sql, values) = self.build_insert(fields, None)?;
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.execute(&self.conn, &sql, &values)
    }

    /// Insert one row and return the generated value of `id_column`.
    pub fn insert_get_id(&self, fields: &Row, id_column: &str) -> Result<i64, EngineError> {
        let (sql, values) = self.build_insert(fields, Some(id_column))?;
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.insert_returning_id(&self.conn, &sql, &values)
    }

    fn build_insert(
        &self,
        fields: &Row,
        returning: Option<&str>,
    ) -> Result<(String, Values), EngineError> {
        if fields.is_empty() {
            return Err(EngineError::Unsupported("no fields to insert".to_string()));
        }
        let mut stmt = InsertStatement::default();
        stmt.into_table(col(&self.table));
        stmt.columns(fields.keys().map(|name| col(name)).collect::<Vec<_>>());
        stmt.values(fields.values().map(|v| Expr::val(v.clone())).collect::<Vec<_>>())
            .map_err(|e| EngineError::Unsupported(format!("failed to bind insert values: {e}")))?;
        if let Some(id_column) = returning {
            stmt.returning_col(col(id_column));
        }
        Ok(stmt.build(PostgresQueryBuilder))
    }

    /// Apply the accumulated predicates to an UPDATE of the given columns.
    pub fn update(&self, fields: &Row) -> Result<u64, EngineError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut stmt = UpdateStatement::default();
        stmt.table(col(&self.table));
        for (column, value) in fields {
            stmt.value(col(column), Expr::val(value.clone()));
        }
        for predicate in &self.predicates {
            stmt.and_where(predicate.clone());
        }
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.execute(&self.conn, &sql, &values)
    }

    /// Apply the accumulated predicates to a DELETE.
    pub fn delete(&self) -> Result<u64, EngineError> {
        let mut stmt = DeleteStatement::default();
        stmt.from_table(col(&self.table));
        for predicate in &self.predicates {
            stmt.and_where(predicate.clone());
        }
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        log::debug!("[{}] {}", self.conn, sql);
        self.engine.execute(&self.conn, &sql, &values)
    }
}
