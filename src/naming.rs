//! Field name translation between wire form and internal form.
//!
//! Columns travel in a word-separated wire form (`created_at`) while entity
//! fields use a lowerCamel internal form (`createdAt`). The two transforms
//! are exact inverses for canonical identifiers: lowercase snake_case with
//! single separators on the wire side, lowerCamelCase with no consecutive
//! capitals on the internal side.

/// Translate an internal-form identifier to its wire form.
///
/// # Example
///
/// ```
/// use entable::naming::wire_form;
///
/// assert_eq!(wire_form("createdAt"), "created_at");
/// assert_eq!(wire_form("id"), "id");
/// ```
pub fn wire_form(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Translate a wire-form identifier to its internal form.
///
/// # Example
///
/// ```
/// use entable::naming::internal_form;
///
/// assert_eq!(internal_form("created_at"), "createdAt");
/// assert_eq!(internal_form("id"), "id");
/// ```
pub fn internal_form(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form() {
        assert_eq!(wire_form("createdAt"), "created_at");
        assert_eq!(wire_form("isActivePartner"), "is_active_partner");
        assert_eq!(wire_form("name"), "name");
        assert_eq!(wire_form(""), "");
    }

    #[test]
    fn test_internal_form() {
        assert_eq!(internal_form("created_at"), "createdAt");
        assert_eq!(internal_form("is_active_partner"), "isActivePartner");
        assert_eq!(internal_form("name"), "name");
        assert_eq!(internal_form(""), "");
    }

    #[test]
    fn test_round_trip() {
        for internal in ["id", "name", "createdAt", "isActive", "addr1", "x"] {
            assert_eq!(internal_form(&wire_form(internal)), internal);
        }
        for wire in ["id", "name", "created_at", "is_active", "addr1", "x"] {
            assert_eq!(wire_form(&internal_form(wire)), wire);
        }
    }
}
