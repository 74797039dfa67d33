//! Error types for the mapping layer.
//!
//! Everything the library can fail with surfaces synchronously as an
//! [`EntityError`]. Nothing is retried internally; retry policy belongs to
//! the caller or to the underlying engine.

use crate::engine::EngineError;
use std::fmt;

/// Error type for mapping, relation and persistence operations
#[derive(Debug, Clone, PartialEq)]
pub enum EntityError {
    /// Malformed tuple-form filter; raised before any query executes.
    /// Carries the offending filter for diagnostics. Non-retryable,
    /// the caller must fix the filter.
    InvalidFilterShape { field: String, filter: String },
    /// A requested relation name has no matching descriptor on the
    /// entity's configuration
    MissingRelation {
        entity: &'static str,
        relation: String,
    },
    /// A relation's child entity type has no repository in the registry
    Unregistered { entity: &'static str },
    /// A write operation was attempted on an entity with no identity
    MissingIdentity { entity: &'static str },
    /// Underlying write failed; the message may be redacted depending on
    /// the manager's configuration (full detail is always logged)
    Persistence(String),
    /// Read-side engine failure
    Engine(EngineError),
    /// Row-to-entity conversion error
    Parse(String),
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::InvalidFilterShape { field, filter } => {
                write!(f, "Invalid filter shape for `{field}`: {filter}")
            }
            EntityError::MissingRelation { entity, relation } => {
                write!(f, "Entity {entity} has no relation `{relation}`")
            }
            EntityError::Unregistered { entity } => {
                write!(f, "No repository registered for entity {entity}")
            }
            EntityError::MissingIdentity { entity } => {
                write!(f, "Entity {entity} has no identity; persist it first")
            }
            EntityError::Persistence(s) => {
                write!(f, "Persistence failure: {s}")
            }
            EntityError::Engine(e) => {
                write!(f, "Engine error: {e}")
            }
            EntityError::Parse(s) => {
                write!(f, "Parse error: {s}")
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl From<EngineError> for EntityError {
    fn from(err: EngineError) -> Self {
        EntityError::Engine(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_all_variants() {
        let err = EntityError::InvalidFilterShape {
            field: "status".to_string(),
            filter: "Where(In, None)".to_string(),
        };
        assert!(err.to_string().contains("Invalid filter shape"));
        assert!(err.to_string().contains("status"));

        let err = EntityError::MissingRelation {
            entity: "User",
            relation: "posts".to_string(),
        };
        assert!(err.to_string().contains("no relation `posts`"));

        let err = EntityError::Persistence("constraint violation".to_string());
        assert!(err.to_string().contains("Persistence failure"));

        let err = EntityError::MissingIdentity { entity: "User" };
        assert!(err.to_string().contains("no identity"));
    }

    #[test]
    fn test_from_engine_error() {
        let err: EntityError = EngineError::Query("boom".to_string()).into();
        assert!(matches!(err, EntityError::Engine(_)));
        assert!(err.to_string().contains("boom"));
    }
}
