//! # entable
//!
//! Entity-table mapping layer over a pluggable query engine: declarative
//! filters become SQL predicates, result rows become typed entities,
//! relations load in one batched query per relation, and updates persist
//! only the fields that actually changed since load.
//!
//! The core pieces:
//!
//! - [`Filters`]/[`filter::apply_filters`] — filter-to-predicate translation
//! - [`mapper`] — row ⇄ entity mapping via static field descriptors
//! - [`relation`] — batched relation resolution (no per-row queries)
//! - [`diff`] — dirty-field detection against the original snapshot
//! - [`Repository`] — per-entity read facade with pagination
//! - [`EntityManager`] — create/update/merge/delete on the write connection
//!
//! Execution is synchronous and stateless between calls; every operation
//! issues a bounded number of queries through the injected [`QueryEngine`]
//! ([`postgres::MayPostgresEngine`] in production, a mock in tests).

pub mod config;
pub mod diff;
pub mod engine;
pub mod entity;
pub mod error;
pub mod filter;
pub mod manager;
pub mod mapper;
pub mod naming;
pub mod pagination;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;
pub mod relation;
pub mod repository;
pub mod value;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(test)]
mod tests_cfg;

pub use config::MappingConfig;
pub use engine::{EngineError, QueryEngine, Row};
pub use entity::{Entity, EntityDescriptor, FieldAccess, FieldDescriptor, Snapshot, ID_COLUMN};
pub use error::EntityError;
pub use filter::{FilterOp, FilterValue, Filters, Operand, Sorting};
pub use manager::EntityManager;
pub use pagination::Page;
pub use query::TableQuery;
pub use relation::{RelationDef, RelationKind, RelationLoader};
pub use repository::{Registry, Repository, DEFAULT_CONNECTION};

// Re-exported so callers build filters and sorts without importing
// sea-query themselves.
pub use sea_query::{Order, Value};
