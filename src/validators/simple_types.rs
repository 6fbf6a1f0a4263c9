//! XSD Simple Type validators
//!
//! This module implements simple type definitions and the value validation
//! the element/attribute loop delegates to:
//! - Atomic types (built-in and derived by restriction)
//! - List types (whitespace-separated lists)
//! - Union types (value matching any member type)
//!
//! Validation returns `Result<ValidatedInfo, InvalidValue>`; the caller
//! reports the failure and continues.
//!
//! See: https://www.w3.org/TR/xmlschema-2/

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::namespaces::{NamespaceContext, QName};

use super::builtins::{self, BuiltinKind, Primitive};
use super::derivation::DerivationFlags;
use super::facets::{FacetSet, WhiteSpace};

/// Variety of a simple type
#[derive(Debug, Clone)]
pub enum SimpleTypeVariety {
    /// Atomic type (single value)
    Atomic,
    /// List type (whitespace-separated values of the item type)
    List(Arc<XsdSimpleType>),
    /// Union type (value matches one of the member types, in order)
    Union(Vec<Arc<XsdSimpleType>>),
}

/// A simple-type value failure, with the message key and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    /// Message key (e.g. `cvc-datatype-valid.1.2.1`)
    pub key: &'static str,
    /// Message arguments
    pub args: Vec<String>,
}

impl InvalidValue {
    /// Create a new failure
    pub fn new<I, S>(key: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", super::messages::format_message(self.key, &self.args))
    }
}

impl std::error::Error for InvalidValue {}

/// An XSD timeline value; values with a timezone are normalized to UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineValue {
    /// Date and time, in UTC when `timezoned`
    pub instant: chrono::NaiveDateTime,
    /// Whether the lexical form carried a timezone
    pub timezoned: bool,
}

/// A typed atomic value in one of the primitive value spaces
#[derive(Debug, Clone)]
pub enum Value {
    /// string and its derivations, anyURI, anySimpleType
    String(String),
    /// boolean
    Boolean(bool),
    /// decimal and the integer family
    Decimal(Decimal),
    /// float and double
    Float(f64),
    /// dateTime, date and time
    Timeline(TimelineValue),
    /// hexBinary and base64Binary
    Binary(Vec<u8>),
    /// QName
    QName(QName),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            // identity-constraint equality: NaN equals itself
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Timeline(a), Value::Timeline(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::QName(a), Value::QName(b)) => a == b,
            _ => false,
        }
    }
}

/// An atomic value tagged with its primitive type
#[derive(Debug, Clone)]
pub struct AtomicValue {
    /// Primitive value space
    pub primitive: Primitive,
    /// The value
    pub value: Value,
    /// Canonical-ish text of the value, used in messages
    pub lexical: String,
}

// The lexical form never takes part in equality: `1.0` and `1.00` are one value.
impl PartialEq for AtomicValue {
    fn eq(&self, other: &Self) -> bool {
        self.primitive == other.primitive && self.value == other.value
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexical)
    }
}

/// The actual value of a validated simple-type instance
#[derive(Debug, Clone, PartialEq)]
pub enum ActualValue {
    /// A single atomic value
    Atomic(AtomicValue),
    /// A list of atomic values
    List(Vec<AtomicValue>),
}

/// Result of a successful simple-type validation
#[derive(Debug, Clone)]
pub struct ValidatedInfo {
    /// Schema-normalized value
    pub normalized: String,
    /// Typed value
    pub value: ActualValue,
    /// The union member type that validated the value
    pub member_type: Option<Arc<XsdSimpleType>>,
    /// Member types of list items drawn from a union item type
    pub item_member_types: Vec<Arc<XsdSimpleType>>,
}

impl ValidatedInfo {
    /// Type-aware equality (identity constraints and fixed values).
    ///
    /// Values from different primitive value spaces are never equal; lists
    /// are compared itemwise.
    pub fn is_value_equal(&self, other: &ValidatedInfo) -> bool {
        self.value == other.value
    }
}

/// XSD simple type definition
#[derive(Debug)]
pub struct XsdSimpleType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Base type; `None` only for anySimpleType, whose base is anyType
    pub base: Option<Arc<XsdSimpleType>>,
    /// Variety
    pub variety: SimpleTypeVariety,
    /// Built-in datatype this type is, if it is one
    pub builtin: Option<BuiltinKind>,
    /// Facets added by this type's restriction step
    pub facets: FacetSet,
    /// Final derivation flags
    pub final_deriv: DerivationFlags,
}

impl XsdSimpleType {
    /// Derive an atomic (or list/union, following the base) type by restriction
    pub fn restriction(name: Option<QName>, base: Arc<XsdSimpleType>, facets: FacetSet) -> Self {
        Self {
            name,
            variety: base.variety.clone(),
            base: Some(base),
            builtin: None,
            facets,
            final_deriv: DerivationFlags::default(),
        }
    }

    /// Create a list type
    pub fn list(name: Option<QName>, item: Arc<XsdSimpleType>) -> Self {
        Self {
            name,
            base: Some(builtins::any_simple_type()),
            variety: SimpleTypeVariety::List(item),
            builtin: None,
            facets: FacetSet::default(),
            final_deriv: DerivationFlags::default(),
        }
    }

    /// Create a union type
    pub fn union(name: Option<QName>, members: Vec<Arc<XsdSimpleType>>) -> Self {
        Self {
            name,
            base: Some(builtins::any_simple_type()),
            variety: SimpleTypeVariety::Union(members),
            builtin: None,
            facets: FacetSet::default(),
            final_deriv: DerivationFlags::default(),
        }
    }

    /// Type name for messages
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => "#AnonType".to_string(),
        }
    }

    /// Iterate this type and its simple base types
    pub fn ancestors(&self) -> impl Iterator<Item = &XsdSimpleType> {
        std::iter::successors(Some(self), |t| t.base.as_deref())
    }

    /// Whether this type is anySimpleType itself
    pub fn is_any_simple_type(&self) -> bool {
        self.builtin == Some(BuiltinKind::AnySimpleType)
    }

    /// The nearest built-in ancestor
    pub fn builtin_ancestor(&self) -> BuiltinKind {
        self.ancestors()
            .find_map(|t| t.builtin)
            .unwrap_or(BuiltinKind::AnySimpleType)
    }

    /// Primitive value space of an atomic type
    pub fn primitive(&self) -> Primitive {
        self.builtin_ancestor().primitive()
    }

    /// Effective whiteSpace facet
    pub fn white_space(&self) -> WhiteSpace {
        match self.variety {
            SimpleTypeVariety::List(_) => WhiteSpace::Collapse,
            SimpleTypeVariety::Union(_) => WhiteSpace::Preserve,
            SimpleTypeVariety::Atomic => self
                .ancestors()
                .find_map(|t| t.facets.white_space)
                .unwrap_or_else(|| self.builtin_ancestor().white_space()),
        }
    }

    /// Check if this type derives from a built-in type
    pub fn derives_from_builtin(&self, kind: BuiltinKind) -> bool {
        self.ancestors().any(|t| t.builtin == Some(kind))
    }

    /// Whether values of this type are IDs (xs:ID or a restriction of it)
    pub fn is_id_type(&self) -> bool {
        matches!(self.variety, SimpleTypeVariety::Atomic) && self.derives_from_builtin(BuiltinKind::Id)
    }

    /// Whether values of this type are IDREFs (IDREF, IDREFS or a list of IDREF)
    pub fn is_idref_type(&self) -> bool {
        match &self.variety {
            SimpleTypeVariety::Atomic => self.derives_from_builtin(BuiltinKind::IdRef),
            SimpleTypeVariety::List(item) => item.is_idref_type(),
            SimpleTypeVariety::Union(_) => false,
        }
    }

    /// Validate a lexical value
    pub fn validate(
        &self,
        lexical: &str,
        namespaces: &NamespaceContext,
    ) -> Result<ValidatedInfo, InvalidValue> {
        let normalized = self.white_space().normalize(lexical);
        match &self.variety {
            SimpleTypeVariety::Atomic => {
                let value = self.validate_atomic(&normalized, namespaces)?;
                Ok(ValidatedInfo {
                    normalized,
                    value: ActualValue::Atomic(value),
                    member_type: None,
                    item_member_types: Vec::new(),
                })
            }
            SimpleTypeVariety::List(item) => {
                let mut items = Vec::new();
                let mut item_member_types = Vec::new();
                for token in normalized.split(' ').filter(|t| !t.is_empty()) {
                    let info = item.validate(token, namespaces).map_err(|_| {
                        InvalidValue::new(
                            "cvc-datatype-valid.1.2.2",
                            [normalized.clone(), self.display_name()],
                        )
                    })?;
                    if let Some(member) = info.member_type {
                        item_member_types.push(member);
                    }
                    match info.value {
                        ActualValue::Atomic(v) => items.push(v),
                        ActualValue::List(vs) => items.extend(vs),
                    }
                }
                for t in self.ancestors() {
                    t.facets.check_length(&normalized, items.len(), &self.display_name())?;
                    t.facets.check_patterns(&normalized, &self.display_name())?;
                }
                Ok(ValidatedInfo {
                    normalized,
                    value: ActualValue::List(items),
                    member_type: None,
                    item_member_types,
                })
            }
            SimpleTypeVariety::Union(members) => {
                for t in self.ancestors() {
                    t.facets.check_patterns(&normalized, &self.display_name())?;
                }
                for member in members {
                    if let Ok(mut info) = member.validate(lexical, namespaces) {
                        if info.member_type.is_none() {
                            info.member_type = Some(Arc::clone(member));
                        }
                        if let ActualValue::Atomic(value) = &info.value {
                            for t in self.ancestors() {
                                t.facets.check_enumeration(&info.normalized, value)?;
                            }
                        }
                        return Ok(info);
                    }
                }
                Err(InvalidValue::new(
                    "cvc-datatype-valid.1.2.3",
                    [normalized, self.display_name()],
                ))
            }
        }
    }

    fn validate_atomic(
        &self,
        normalized: &str,
        namespaces: &NamespaceContext,
    ) -> Result<AtomicValue, InvalidValue> {
        let kind = self.builtin_ancestor();
        let value = builtins::parse_lexical(kind, normalized, namespaces).map_err(|key| {
            InvalidValue::new(key, [normalized.to_string(), kind.name().to_string()])
        })?;

        let type_name = self.display_name();
        for t in self.ancestors() {
            if t.facets.is_empty() {
                continue;
            }
            t.facets
                .check_length(normalized, value_length(&value, normalized), &type_name)?;
            t.facets.check_patterns(normalized, &type_name)?;
            t.facets.check_enumeration(normalized, &value)?;
            t.facets.check_bounds(normalized, &value, &type_name)?;
        }
        Ok(value)
    }
}

fn value_length(value: &AtomicValue, normalized: &str) -> usize {
    match &value.value {
        Value::Binary(bytes) => bytes.len(),
        _ => normalized.chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtins::builtin;
    use crate::validators::facets::PatternFacet;

    fn ns() -> NamespaceContext {
        NamespaceContext::new()
    }

    #[test]
    fn test_decimal_equality_is_value_based() {
        let decimal = builtin(BuiltinKind::Decimal);
        let a = decimal.validate("1.0", &ns()).unwrap();
        let b = decimal.validate("1.00", &ns()).unwrap();
        assert!(a.is_value_equal(&b));

        let string = builtin(BuiltinKind::String);
        let s = string.validate("1.0", &ns()).unwrap();
        assert!(!a.is_value_equal(&s));
    }

    #[test]
    fn test_restriction_facets() {
        let mut facets = FacetSet::new();
        facets.max_inclusive = Some(Decimal::from(10));
        let small = XsdSimpleType::restriction(
            Some(QName::local("small")),
            builtin(BuiltinKind::Integer),
            facets,
        );
        assert!(small.validate(" 7 ", &ns()).is_ok());
        assert_eq!(
            small.validate("11", &ns()).unwrap_err().key,
            "cvc-maxInclusive-valid"
        );
        assert_eq!(
            small.validate("x", &ns()).unwrap_err().key,
            "cvc-datatype-valid.1.2.1"
        );
    }

    #[test]
    fn test_enumeration_and_pattern() {
        let mut facets = FacetSet::new();
        facets.patterns.push(PatternFacet::new("[A-Z]{2}").unwrap());
        let code = Arc::new(XsdSimpleType::restriction(None, builtin(BuiltinKind::Token), facets));
        assert!(code.validate("NL", &ns()).is_ok());
        assert_eq!(code.validate("nl", &ns()).unwrap_err().key, "cvc-pattern-valid");

        let mut facets = FacetSet::new();
        facets.enumeration = vec![
            builtins::atomic(BuiltinKind::Token, "NL").unwrap(),
            builtins::atomic(BuiltinKind::Token, "BE").unwrap(),
        ];
        let country = XsdSimpleType::restriction(None, code, facets);
        assert!(country.validate("BE", &ns()).is_ok());
        assert_eq!(
            country.validate("DE", &ns()).unwrap_err().key,
            "cvc-enumeration-valid"
        );
    }

    #[test]
    fn test_list_type() {
        let ints = XsdSimpleType::list(None, builtin(BuiltinKind::Int));
        let info = ints.validate(" 1  2\n3 ", &ns()).unwrap();
        assert_eq!(info.normalized, "1 2 3");
        match &info.value {
            ActualValue::List(items) => assert_eq!(items.len(), 3),
            other => panic!("expected a list, got {:?}", other),
        }
        assert_eq!(
            ints.validate("1 x", &ns()).unwrap_err().key,
            "cvc-datatype-valid.1.2.2"
        );

        let other = XsdSimpleType::list(None, builtin(BuiltinKind::Int))
            .validate("1 2 3.0", &ns());
        assert!(other.is_err());
        let same = ints.validate("1 2 3", &ns()).unwrap();
        assert!(info.is_value_equal(&same));
    }

    #[test]
    fn test_union_member_type() {
        let union = XsdSimpleType::union(
            None,
            vec![builtin(BuiltinKind::Int), builtin(BuiltinKind::Boolean)],
        );
        let info = union.validate("true", &ns()).unwrap();
        assert_eq!(
            info.member_type.as_ref().and_then(|t| t.builtin),
            Some(BuiltinKind::Boolean)
        );
        assert!(union.validate("maybe", &ns()).is_err());

        // an int and a boolean never compare equal
        let one = union.validate("1", &ns()).unwrap();
        let truth = builtin(BuiltinKind::Boolean).validate("1", &ns()).unwrap();
        assert!(!one.is_value_equal(&truth));
    }

    #[test]
    fn test_id_types() {
        assert!(builtin(BuiltinKind::Id).is_id_type());
        assert!(builtin(BuiltinKind::IdRefs).is_idref_type());
        assert!(!builtin(BuiltinKind::NcName).is_id_type());
        let my_id = XsdSimpleType::restriction(None, builtin(BuiltinKind::Id), FacetSet::new());
        assert!(my_id.is_id_type());
    }
}
