//! Query engine capability boundary.
//!
//! The mapping layer never talks to a database directly. It builds SQL with
//! sea-query and hands the text plus bound values to a [`QueryEngine`],
//! addressed by a logical connection name (repositories fix one name for
//! reads and one for writes at construction time). The engine owns
//! connections, timeouts and cancellation; this layer performs no retries
//! and no transaction management.
//!
//! Rows cross the boundary as plain column-name-to-value mappings, which
//! keeps the trait implementable for real drivers (see
//! [`crate::postgres::MayPostgresEngine`]) and for in-memory test doubles
//! alike.

use sea_query::{Value, Values};
use std::collections::BTreeMap;
use std::fmt;

/// One raw result row: column name to value.
pub type Row = BTreeMap<String, Value>;

/// Build a [`Row`] from `(column, value)` pairs.
pub fn row_from(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Engine-side error type
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unknown connection name or failed connection establishment
    Connection(String),
    /// Query execution failed; carries the driver's full error text
    Query(String),
    /// A result row could not be decoded into values
    Decode(String),
    /// A bound value or statement shape the engine cannot represent
    Unsupported(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Connection(s) => write!(f, "Connection error: {s}"),
            EngineError::Query(s) => write!(f, "Query error: {s}"),
            EngineError::Decode(s) => write!(f, "Decode error: {s}"),
            EngineError::Unsupported(s) => write!(f, "Unsupported: {s}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Trait for executing built statements against a named connection.
///
/// Implementations must be safe for concurrent use; the mapping layer holds
/// one engine behind an `Arc` and may be called from several threads or
/// coroutines at once.
///
/// # Examples
///
/// ```no_run
/// use entable::{QueryEngine, Repository};
/// use std::sync::Arc;
///
/// # #[derive(Clone, Debug)] struct User;
/// # impl entable::Entity for User {
/// #     fn descriptor() -> &'static entable::EntityDescriptor<Self> { todo!() }
/// #     fn from_row(_: &entable::Row) -> Result<Self, entable::EntityError> { todo!() }
/// #     fn id(&self) -> Option<i64> { todo!() }
/// #     fn set_id(&mut self, _: i64) {}
/// #     fn original_snapshot(&self) -> &entable::Snapshot { todo!() }
/// #     fn set_original_snapshot(&mut self, _: entable::Snapshot) {}
/// # }
/// # let engine: Arc<dyn QueryEngine> = todo!();
/// let users: Repository<User> = Repository::new(engine, "users");
/// ```
pub trait QueryEngine: Send + Sync {
    /// Run a SELECT and return every row.
    fn fetch_all(&self, conn: &str, sql: &str, params: &Values) -> Result<Vec<Row>, EngineError>;

    /// Run a SELECT and return the first row, if any.
    fn fetch_one(&self, conn: &str, sql: &str, params: &Values)
        -> Result<Option<Row>, EngineError>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, conn: &str, sql: &str, params: &Values) -> Result<u64, EngineError>;

    /// Run an INSERT carrying a RETURNING clause for the identity column
    /// and return the generated id.
    fn insert_returning_id(
        &self,
        conn: &str,
        sql: &str,
        params: &Values,
    ) -> Result<i64, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::Query("duplicate key".to_string());
        assert!(err.to_string().contains("Query error"));
        assert!(err.to_string().contains("duplicate key"));

        let err = EngineError::Connection("no such connection `replica`".to_string());
        assert!(err.to_string().contains("Connection error"));
    }

    #[test]
    fn test_row_from() {
        let row = row_from([
            ("id", Value::BigInt(Some(1))),
            ("name", Value::String(Some("a".to_string()))),
        ]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::BigInt(Some(1))));
    }
}
