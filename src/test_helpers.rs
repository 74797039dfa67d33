//! Mock query engine for tests.
//!
//! Records every issued statement (connection name, SQL text, bound
//! parameter count) and replays queued results in FIFO order. Queue one
//! `Vec<Row>` per expected fetch; executes default to one affected row and
//! generated ids count up from 1 unless queued explicitly.

use crate::engine::{EngineError, QueryEngine, Row};
use sea_query::{Value, Values};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct MockCall {
    pub conn: String,
    pub sql: String,
    pub params: Vec<Value>,
}

/// In-memory [`QueryEngine`] double
///
/// ```
/// use entable::test_helpers::MockEngine;
/// use entable::engine::row_from;
/// use sea_query::Value;
///
/// let engine = MockEngine::new();
/// engine.queue_rows(vec![row_from([("id", Value::BigInt(Some(1)))])]);
/// ```
#[derive(Default)]
pub struct MockEngine {
    calls: Mutex<Vec<MockCall>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    affected: Mutex<VecDeque<u64>>,
    ids: Mutex<VecDeque<i64>>,
    errors: Mutex<VecDeque<EngineError>>,
    next_id: AtomicI64,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    /// Queue the result rows for the next fetch.
    pub fn queue_rows(&self, rows: Vec<Row>) {
        self.rows.lock().unwrap().push_back(rows);
    }

    /// Queue the affected-row count for the next execute.
    pub fn queue_affected(&self, affected: u64) {
        self.affected.lock().unwrap().push_back(affected);
    }

    /// Queue the generated id for the next id-returning insert.
    pub fn queue_id(&self, id: i64) {
        self.ids.lock().unwrap().push_back(id);
    }

    /// Queue an error for the next call of any kind.
    pub fn queue_error(&self, error: EngineError) {
        self.errors.lock().unwrap().push_back(error);
    }

    /// Every recorded call, in issue order.
    pub fn recorded(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `(connection, sql)` pairs, in issue order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.recorded()
            .into_iter()
            .map(|c| (c.conn, c.sql))
            .collect()
    }

    /// Issued SQL texts, in issue order.
    pub fn issued_sql(&self) -> Vec<String> {
        self.recorded().into_iter().map(|c| c.sql).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, conn: &str, sql: &str, params: &Values) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(MockCall {
            conn: conn.to_string(),
            sql: sql.to_string(),
            params: params.iter().cloned().collect(),
        });
        match self.errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl QueryEngine for MockEngine {
    fn fetch_all(&self, conn: &str, sql: &str, params: &Values) -> Result<Vec<Row>, EngineError> {
        self.record(conn, sql, params)?;
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn fetch_one(
        &self,
        conn: &str,
        sql: &str,
        params: &Values,
    ) -> Result<Option<Row>, EngineError> {
        self.record(conn, sql, params)?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
            .into_iter()
            .next())
    }

    fn execute(&self, conn: &str, sql: &str, params: &Values) -> Result<u64, EngineError> {
        self.record(conn, sql, params)?;
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(1))
    }

    fn insert_returning_id(
        &self,
        conn: &str,
        sql: &str,
        params: &Values,
    ) -> Result<i64, EngineError> {
        self.record(conn, sql, params)?;
        Ok(self
            .ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::row_from;
    use sea_query::Value;

    #[test]
    fn test_records_calls_and_replays_rows() {
        let engine = MockEngine::new();
        engine.queue_rows(vec![row_from([("id", Value::BigInt(Some(1)))])]);

        let rows = engine
            .fetch_all("read", "SELECT 1", &Values(vec![]))
            .unwrap();
        assert_eq!(rows.len(), 1);

        // queue exhausted: empty result
        let rows = engine
            .fetch_all("read", "SELECT 2", &Values(vec![]))
            .unwrap();
        assert!(rows.is_empty());

        let calls = engine.recorded();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].conn, "read");
        assert_eq!(calls[0].sql, "SELECT 1");
    }

    #[test]
    fn test_queued_error_fires_once() {
        let engine = MockEngine::new();
        engine.queue_error(EngineError::Query("boom".to_string()));

        assert!(engine
            .fetch_all("read", "SELECT 1", &Values(vec![]))
            .is_err());
        assert!(engine
            .fetch_all("read", "SELECT 1", &Values(vec![]))
            .is_ok());
    }

    #[test]
    fn test_generated_ids_count_up() {
        let engine = MockEngine::new();
        let a = engine
            .insert_returning_id("write", "INSERT", &Values(vec![]))
            .unwrap();
        let b = engine
            .insert_returning_id("write", "INSERT", &Values(vec![]))
            .unwrap();
        assert_eq!((a, b), (1, 2));
    }
}
