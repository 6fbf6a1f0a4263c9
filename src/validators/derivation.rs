//! Type derivation
//!
//! Derivation flags (`block`, `final`) and the Type Derivation OK
//! constraint, walked from the derived type up its base chain.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#cos-ct-derived-ok

use std::fmt;
use std::sync::Arc;

use super::complex_types::{TypeDefinition, XsdComplexType};
use super::simple_types::{SimpleTypeVariety, XsdSimpleType};

/// Derivation method of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationMethod {
    /// Type derived by restriction
    #[default]
    Restriction,
    /// Type derived by extension
    Extension,
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restriction => write!(f, "restriction"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

/// A set of derivation methods, as written in `block`, `final` and
/// `blockDefault` attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivationFlags {
    /// Extension
    pub extension: bool,
    /// Restriction
    pub restriction: bool,
    /// Substitution (element `block` only)
    pub substitution: bool,
    /// List (simple type `final` only)
    pub list: bool,
    /// Union (simple type `final` only)
    pub union: bool,
}

impl DerivationFlags {
    /// No method blocked
    pub fn none() -> Self {
        Self::default()
    }

    /// Every method blocked (`#all`)
    pub fn all() -> Self {
        Self {
            extension: true,
            restriction: true,
            substitution: true,
            list: true,
            union: true,
        }
    }

    /// Parse a `block`/`final` attribute value; unknown tokens are ignored
    pub fn from_attr(value: &str) -> Self {
        let value = value.trim();
        if value == "#all" {
            return Self::all();
        }
        let mut flags = Self::default();
        for token in value.split_ascii_whitespace() {
            match token {
                "extension" => flags.extension = true,
                "restriction" => flags.restriction = true,
                "substitution" => flags.substitution = true,
                "list" => flags.list = true,
                "union" => flags.union = true,
                _ => {}
            }
        }
        flags
    }

    /// Whether a derivation method is in the set
    pub fn contains(&self, method: DerivationMethod) -> bool {
        match method {
            DerivationMethod::Restriction => self.restriction,
            DerivationMethod::Extension => self.extension,
        }
    }

    /// Combine two sets
    pub fn union_with(self, other: Self) -> Self {
        Self {
            extension: self.extension || other.extension,
            restriction: self.restriction || other.restriction,
            substitution: self.substitution || other.substitution,
            list: self.list || other.list,
            union: self.union || other.union,
        }
    }
}

/// Check Type Derivation OK for any pair of type definitions.
///
/// `block` holds the derivation methods that may not appear on the path
/// from `derived` to `base`.
pub fn check_type_derivation_ok(
    derived: &TypeDefinition,
    base: &TypeDefinition,
    block: DerivationFlags,
) -> bool {
    if derived.is_any_type() {
        return base.is_any_type();
    }
    match derived {
        TypeDefinition::Simple(simple) => {
            if simple.is_any_simple_type() {
                return base.is_any_type()
                    || base.as_simple().map_or(false, |b| b.is_any_simple_type());
            }
            match base {
                TypeDefinition::Simple(b) => check_simple_derivation(simple, b, block),
                TypeDefinition::Complex(b) if b.is_any_type() => {
                    check_simple_derivation(simple, &super::builtins::any_simple_type(), block)
                }
                TypeDefinition::Complex(_) => false,
            }
        }
        TypeDefinition::Complex(complex) => check_complex_derivation(complex, base, block),
    }
}

/// Type Derivation OK (Simple)
pub fn check_simple_derivation(
    derived: &Arc<XsdSimpleType>,
    base: &Arc<XsdSimpleType>,
    block: DerivationFlags,
) -> bool {
    if Arc::ptr_eq(derived, base) {
        return true;
    }
    let direct_base = match &derived.base {
        Some(direct_base) => direct_base,
        None => return false,
    };
    if block.restriction || direct_base.final_deriv.restriction {
        return false;
    }
    if Arc::ptr_eq(direct_base, base) {
        return true;
    }
    if !direct_base.is_any_simple_type() && check_simple_derivation(direct_base, base, block) {
        return true;
    }
    if base.is_any_simple_type()
        && matches!(
            derived.variety,
            SimpleTypeVariety::List(_) | SimpleTypeVariety::Union(_)
        )
    {
        return true;
    }
    if let SimpleTypeVariety::Union(members) = &base.variety {
        return members
            .iter()
            .any(|member| check_simple_derivation(derived, member, block));
    }
    false
}

fn check_complex_derivation(
    derived: &Arc<XsdComplexType>,
    base: &TypeDefinition,
    block: DerivationFlags,
) -> bool {
    if let TypeDefinition::Complex(b) = base {
        if b.id == derived.id {
            return true;
        }
    }
    if block.contains(derived.derivation) {
        return false;
    }
    let direct_base = derived.base_type();
    if direct_base.same_as(base) {
        return true;
    }
    if direct_base.is_any_type() {
        return false;
    }
    match &direct_base {
        TypeDefinition::Complex(c) => check_complex_derivation(c, base, block),
        TypeDefinition::Simple(s) => {
            if s.is_any_simple_type() {
                return false;
            }
            match base {
                TypeDefinition::Simple(b) => check_simple_derivation(s, b, block),
                TypeDefinition::Complex(b) if b.is_any_type() => {
                    check_simple_derivation(s, &super::builtins::any_simple_type(), block)
                }
                TypeDefinition::Complex(_) => false,
            }
        }
    }
}
