//! XML name validation
//!
//! Lexical checks for the name-derived builtin datatypes (Name, NCName,
//! QName, NMTOKEN and the ID family).

use once_cell::sync::Lazy;
use regex::Regex;

const NAME_START: &str = r"A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\u{10000}-\u{EFFFF}";
const NAME_EXTRA: &str = r"\-\.0-9\u{B7}\u{300}-\u{36F}\u{203F}-\u{2040}";

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[:{NAME_START}][:{NAME_START}{NAME_EXTRA}]*$")).unwrap()
});

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[{NAME_START}][{NAME_START}{NAME_EXTRA}]*$")).unwrap()
});

static NMTOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[:{NAME_START}{NAME_EXTRA}]+$")).unwrap());

/// Check if a string is a valid XML Name
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid NMTOKEN
pub fn is_valid_nmtoken(name: &str) -> bool {
    NMTOKEN.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_valid_ncname(prefix) && is_valid_ncname(local),
        None => is_valid_ncname(name),
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}
