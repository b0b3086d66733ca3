//! Mapping between accessor method names and property names.

use alloc::string::String;

/// `getX` or `isX`.
pub fn is_getter(name: &str) -> bool {
    (name.starts_with("get") && name.len() > 3) || (name.starts_with("is") && name.len() > 2)
}

/// `setX`.
pub fn is_setter(name: &str) -> bool {
    name.starts_with("set") && name.len() > 3
}

pub fn is_property(name: &str) -> bool {
    is_getter(name) || is_setter(name)
}

/// Names that never become properties: compiler markers starting with `$`,
/// the serialization id and `class`.
pub fn is_valid_property_name(name: &str) -> bool {
    !name.starts_with('$') && name != "serialVersionUID" && name != "class"
}

/// Strips the accessor prefix and lowercases the first character, unless
/// the second one is uppercase too.
///
/// Returns `None` when `name` is not an accessor name.
///
/// # Examples
///
/// ```
/// use mo_reflect::reflector::namer::method_to_property;
///
/// assert_eq!(method_to_property("getName").as_deref(), Some("name"));
/// assert_eq!(method_to_property("isActive").as_deref(), Some("active"));
/// assert_eq!(method_to_property("getURL").as_deref(), Some("URL"));
/// assert_eq!(method_to_property("compute"), None);
/// ```
pub fn method_to_property(name: &str) -> Option<String> {
    let rest = if let Some(rest) = name.strip_prefix("is") {
        rest
    } else if let Some(rest) = name.strip_prefix("get").or_else(|| name.strip_prefix("set")) {
        rest
    } else {
        return None;
    };

    let mut chars = rest.chars();
    let first = chars.next()?;
    let keep = chars.next().is_some_and(char::is_uppercase);
    let mut out = String::with_capacity(rest.len());
    if keep {
        out.push(first);
    } else {
        out.extend(first.to_lowercase());
    }
    out.push_str(&rest[first.len_utf8()..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        assert!(is_getter("getX"));
        assert!(is_getter("isX"));
        assert!(!is_getter("get"));
        assert!(!is_getter("is"));
        assert!(is_setter("setX"));
        assert!(!is_setter("set"));
        assert!(is_property("setX"));
        assert!(!is_property("reset"));
    }

    #[test]
    fn decapitalize() {
        assert_eq!(method_to_property("setX").as_deref(), Some("x"));
        assert_eq!(method_to_property("getXCoord").as_deref(), Some("XCoord"));
        assert_eq!(method_to_property("is").as_deref(), None);
    }

    #[test]
    fn reserved_names() {
        assert!(!is_valid_property_name("$jacocoData"));
        assert!(!is_valid_property_name("serialVersionUID"));
        assert!(!is_valid_property_name("class"));
        assert!(is_valid_property_name("klass"));
    }
}
