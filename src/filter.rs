//! Declarative filter and sort descriptors and their translation into
//! query predicates.
//!
//! A [`Filters`] value is an ordered list of `(field, FilterValue)` entries.
//! A bare scalar means equality; the tuple form pairs a [`FilterOp`] with an
//! [`Operand`]. Translation walks the entries in insertion order and adds
//! one conjunctive predicate per entry; the first malformed entry aborts
//! translation with [`EntityError::InvalidFilterShape`] (predicates for
//! earlier entries are already applied at that point).

use crate::error::EntityError;
use crate::query::TableQuery;
use sea_query::{DynIden, Expr, ExprTrait, Order, Value};
use std::fmt;

/// Filter operators accepted in the tuple form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    Between,
    Raw,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::In => "IN",
            FilterOp::NotIn => "NOT IN",
            FilterOp::Between => "BETWEEN",
            FilterOp::Raw => "RAW",
        };
        f.write_str(s)
    }
}

/// Operand of a tuple-form filter.
///
/// `None` models the source shape "tuple with a missing element": it is
/// representable so that translation can reject it, matching the original
/// behavior of failing on the malformed filter rather than at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    One(Value),
    Many(Vec<Value>),
}

/// One filter entry value: a bare scalar (equality) or a tuple form
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    Where(FilterOp, Operand),
}

/// Ordered filter map; iteration order is application order
///
/// # Example
///
/// ```
/// use entable::{Filters, FilterOp};
///
/// let filters = Filters::new()
///     .eq("status", 1)
///     .cmp("age", FilterOp::Gte, 18)
///     .is_in("role", ["admin", "editor"])
///     .between("created_at", "2024-01-01", "2024-12-31");
/// assert_eq!(filters.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<(String, FilterValue)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw `(field, value)` entry.
    pub fn push(mut self, field: &str, value: FilterValue) -> Self {
        self.0.push((field.to_string(), value));
        self
    }

    /// Append a scalar equality filter.
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, FilterValue::Scalar(value.into()))
    }

    /// Append a comparison filter in tuple form.
    pub fn cmp(self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.push(field, FilterValue::Where(op, Operand::One(value.into())))
    }

    /// Append a set-membership filter.
    pub fn is_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(field, FilterValue::Where(FilterOp::In, Operand::Many(values)))
    }

    /// Append a negated set-membership filter.
    pub fn not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(
            field,
            FilterValue::Where(FilterOp::NotIn, Operand::Many(values)),
        )
    }

    /// Append a closed-range filter.
    pub fn between(self, field: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push(
            field,
            FilterValue::Where(FilterOp::Between, Operand::Many(vec![low.into(), high.into()])),
        )
    }

    /// Append a verbatim engine-native predicate fragment.
    ///
    /// The field name only labels the entry; the fragment is passed through
    /// unescaped. Callers are responsible for injection safety.
    pub fn raw(self, field: &str, fragment: &str) -> Self {
        self.push(
            field,
            FilterValue::Where(
                FilterOp::Raw,
                Operand::One(Value::String(Some(fragment.to_string()))),
            ),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FilterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered sort specification; the first entry is the primary sort
#[derive(Debug, Clone, Default)]
pub struct Sorting(Vec<(String, Order)>);

impl Sorting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), Order::Asc));
        self
    }

    pub fn desc(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), Order::Desc));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Order)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn bad_shape(field: &str, op: FilterOp, operand: &Operand) -> EntityError {
    EntityError::InvalidFilterShape {
        field: field.to_string(),
        filter: format!("({op}, {operand:?})"),
    }
}

fn comparison(field: &str, op: FilterOp, value: Value) -> Expr {
    let column = Expr::col(DynIden::from(field.to_string()));
    match op {
        FilterOp::Eq => column.eq(value),
        FilterOp::Ne => column.ne(value),
        FilterOp::Gt => column.gt(value),
        FilterOp::Lt => column.lt(value),
        FilterOp::Gte => column.gte(value),
        FilterOp::Lte => column.lte(value),
        // set/range/raw operators are dispatched before reaching here
        FilterOp::In | FilterOp::NotIn | FilterOp::Between | FilterOp::Raw => {
            unreachable!("non-comparison operator in comparison dispatch")
        }
    }
}

/// Add one conjunctive predicate per filter entry to `query`.
///
/// Entries apply in iteration order; existing predicates on the query are
/// kept. Translation stops at the first malformed entry and returns
/// [`EntityError::InvalidFilterShape`] carrying the offending filter.
pub fn apply_filters<'e>(
    mut query: TableQuery<'e>,
    filters: &Filters,
) -> Result<TableQuery<'e>, EntityError> {
    for (field, filter) in filters.iter() {
        match filter {
            FilterValue::Scalar(value) => {
                query = query.where_eq(field, value.clone());
            }
            FilterValue::Where(op, operand) => match (op, operand) {
                (_, Operand::None) => return Err(bad_shape(field, *op, operand)),
                (FilterOp::In, Operand::Many(values)) => {
                    query = query.where_in(field, values.clone());
                }
                (FilterOp::NotIn, Operand::Many(values)) => {
                    query = query.where_not_in(field, values.clone());
                }
                (FilterOp::Between, Operand::Many(values)) if values.len() == 2 => {
                    query = query.where_between(field, values[0].clone(), values[1].clone());
                }
                (FilterOp::Raw, Operand::One(Value::String(Some(fragment)))) => {
                    query = query.where_raw(fragment);
                }
                (
                    FilterOp::Eq
                    | FilterOp::Ne
                    | FilterOp::Gt
                    | FilterOp::Lt
                    | FilterOp::Gte
                    | FilterOp::Lte,
                    Operand::One(value),
                ) => {
                    query = query.and_where(comparison(field, *op, value.clone()));
                }
                _ => return Err(bad_shape(field, *op, operand)),
            },
        }
    }
    Ok(query)
}
