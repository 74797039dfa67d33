//! Value canonicalization and extraction helpers.
//!
//! Runtime field values are `sea_query::Value`. Rows coming back from an
//! engine are loosely typed (a MySQL-style boolean arrives as an integer
//! 0/1, an id may arrive as `Int` or `BigInt`), so comparisons and grouping
//! keys go through a canonical form first: integer widths are unified,
//! booleans are normalized to 0/1. There is no loose cross-kind equality;
//! a string never equals a number.

use sea_query::Value;

/// Reduce a value to its canonical comparison form.
///
/// Integer variants (signed and unsigned up to `i64::MAX`) collapse to
/// `BigInt`, booleans collapse to `BigInt` 0/1, `Float` widens to `Double`.
/// Everything else is returned unchanged.
pub fn canonical(value: &Value) -> Value {
    match value {
        Value::Bool(Some(b)) => Value::BigInt(Some(i64::from(*b))),
        Value::Bool(None) => Value::BigInt(None),
        Value::TinyInt(Some(i)) => Value::BigInt(Some(i64::from(*i))),
        Value::SmallInt(Some(i)) => Value::BigInt(Some(i64::from(*i))),
        Value::Int(Some(i)) => Value::BigInt(Some(i64::from(*i))),
        Value::BigInt(Some(i)) => Value::BigInt(Some(*i)),
        Value::TinyUnsigned(Some(u)) => Value::BigInt(Some(i64::from(*u))),
        Value::SmallUnsigned(Some(u)) => Value::BigInt(Some(i64::from(*u))),
        Value::Unsigned(Some(u)) => Value::BigInt(Some(i64::from(*u))),
        Value::BigUnsigned(Some(u)) if *u <= i64::MAX as u64 => {
            Value::BigInt(Some(*u as i64))
        }
        Value::TinyInt(None)
        | Value::SmallInt(None)
        | Value::Int(None)
        | Value::BigInt(None)
        | Value::TinyUnsigned(None)
        | Value::SmallUnsigned(None)
        | Value::Unsigned(None)
        | Value::BigUnsigned(None) => Value::BigInt(None),
        Value::Float(Some(f)) => Value::Double(Some(f64::from(*f))),
        Value::Float(None) => Value::Double(None),
        other => other.clone(),
    }
}

/// Compare two values on their canonical forms.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    canonical(a) == canonical(b)
}

/// Whether a value is a SQL NULL of any kind.
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none(),
        Value::TinyInt(v) => v.is_none(),
        Value::SmallInt(v) => v.is_none(),
        Value::Int(v) => v.is_none(),
        Value::BigInt(v) => v.is_none(),
        Value::TinyUnsigned(v) => v.is_none(),
        Value::SmallUnsigned(v) => v.is_none(),
        Value::Unsigned(v) => v.is_none(),
        Value::BigUnsigned(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        _ => false,
    }
}

/// Render a value as a stable grouping key.
///
/// Used for keying relation groups and `key_by` maps. The rendering is on
/// the canonical form, so `Int(5)` and `BigInt(5)` produce the same key.
pub fn key_string(value: &Value) -> String {
    match canonical(value) {
        Value::BigInt(Some(i)) => i.to_string(),
        Value::BigInt(None) => String::new(),
        Value::Double(Some(d)) => d.to_string(),
        Value::Double(None) => String::new(),
        Value::String(Some(s)) => s,
        Value::String(None) => String::new(),
        Value::Char(Some(c)) => c.to_string(),
        Value::Char(None) => String::new(),
        Value::Bytes(Some(b)) => b.iter().map(|byte| format!("{byte:02x}")).collect(),
        Value::Bytes(None) => String::new(),
        other => format!("{other:?}"),
    }
}

/// Extract an integer, accepting any integer width or a boolean 0/1.
pub fn get_i64(row: &crate::engine::Row, column: &str) -> Option<i64> {
    match row.get(column).map(canonical) {
        Some(Value::BigInt(v)) => v,
        _ => None,
    }
}

/// Extract a string.
pub fn get_string(row: &crate::engine::Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(Some(s))) => Some(s.clone()),
        Some(Value::Char(Some(c))) => Some(c.to_string()),
        _ => None,
    }
}

/// Extract a boolean, accepting a native boolean or the integer 0/1 form
/// the boolean-getter convention persists.
pub fn get_bool(row: &crate::engine::Row, column: &str) -> Option<bool> {
    match row.get(column) {
        Some(Value::Bool(Some(b))) => Some(*b),
        Some(other) => match canonical(other) {
            Value::BigInt(Some(i)) => Some(i != 0),
            _ => None,
        },
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths_compare_equal() {
        assert!(values_equal(&Value::Int(Some(5)), &Value::BigInt(Some(5))));
        assert!(values_equal(
            &Value::SmallInt(Some(5)),
            &Value::TinyUnsigned(Some(5))
        ));
        assert!(!values_equal(&Value::Int(Some(5)), &Value::Int(Some(6))));
    }

    #[test]
    fn test_bool_normalizes_to_int() {
        assert!(values_equal(&Value::Bool(Some(true)), &Value::Int(Some(1))));
        assert!(values_equal(&Value::Bool(Some(false)), &Value::Int(Some(0))));
        assert!(!values_equal(&Value::Bool(Some(true)), &Value::Int(Some(0))));
    }

    #[test]
    fn test_no_cross_kind_equality() {
        assert!(!values_equal(
            &Value::String(Some("5".to_string())),
            &Value::Int(Some(5))
        ));
    }

    #[test]
    fn test_null_detection() {
        assert!(is_null(&Value::Int(None)));
        assert!(is_null(&Value::String(None)));
        assert!(!is_null(&Value::Int(Some(0))));
    }

    #[test]
    fn test_key_string_is_width_stable() {
        assert_eq!(key_string(&Value::Int(Some(7))), "7");
        assert_eq!(key_string(&Value::BigInt(Some(7))), "7");
        assert_eq!(key_string(&Value::String(Some("abc".to_string()))), "abc");
        assert_eq!(key_string(&Value::Bool(Some(true))), "1");
    }

    #[test]
    fn test_row_extractors() {
        let mut row = crate::engine::Row::new();
        row.insert("id".to_string(), Value::Int(Some(3)));
        row.insert("name".to_string(), Value::String(Some("a".to_string())));
        row.insert("active".to_string(), Value::Int(Some(1)));

        assert_eq!(get_i64(&row, "id"), Some(3));
        assert_eq!(get_string(&row, "name"), Some("a".to_string()));
        assert_eq!(get_bool(&row, "active"), Some(true));
        assert_eq!(get_i64(&row, "missing"), None);
    }
}
