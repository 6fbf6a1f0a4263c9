//! XSD Wildcards and the namespace-constraint algebra
//!
//! This module implements wildcards for XSD element and attribute content
//! (xs:any, xs:anyAttribute) together with the set operations the schema
//! rules need: namespace membership, subset, union and intersection.
//!
//! A single representation serves both language versions. `##other` in a
//! schema with target namespace `T` is `Not({T, absent})`, and a 1.0
//! `##other` without a target namespace is `Not({absent})`. The 1.1 algebra
//! is closed over this representation; for 1.0 an operation result that has
//! no 1.0 spelling is reported as not expressible (`None`).
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use std::collections::BTreeSet;
use std::fmt;

use crate::error::SchemaError;
use crate::namespaces::QName;
use crate::settings::SchemaVersion;

use super::base::ValidationMode;

/// A namespace name, `None` standing for ·absent·
pub type NamespaceName = Option<String>;

/// Namespace constraint of a wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Every namespace except the listed ones
    Not(BTreeSet<NamespaceName>),
    /// Only the listed namespaces
    Enumeration(BTreeSet<NamespaceName>),
}

fn parse_namespace_token(
    token: &str,
    target_namespace: Option<&str>,
    attr: &str,
) -> Result<NamespaceName, SchemaError> {
    match token {
        "##local" => Ok(None),
        "##targetNamespace" => Ok(target_namespace.map(String::from)),
        s if s.starts_with("##") => Err(SchemaError::new(format!(
            "wrong value '{}' in '{}' attribute",
            s, attr
        ))),
        uri => Ok(Some(uri.to_string())),
    }
}

impl NamespaceConstraint {
    /// Create from a namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, SchemaError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::other(target_namespace)),
            value => value
                .split_whitespace()
                .map(|ns| parse_namespace_token(ns, target_namespace, "namespace"))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Self::Enumeration),
        }
    }

    /// Create from a notNamespace attribute value (XSD 1.1)
    pub fn from_not_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, SchemaError> {
        value
            .split_whitespace()
            .map(|ns| parse_namespace_token(ns, target_namespace, "notNamespace"))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self::Not)
            .map(Self::normalized)
    }

    /// The ##other constraint for a target namespace
    pub fn other(target_namespace: Option<&str>) -> Self {
        let mut excluded = BTreeSet::new();
        excluded.insert(None);
        if let Some(tns) = target_namespace {
            excluded.insert(Some(tns.to_string()));
        }
        Self::Not(excluded)
    }

    /// Enumeration from a list of namespaces
    pub fn enumeration<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::Enumeration(namespaces.into_iter().map(|ns| ns.map(Into::into)).collect())
    }

    fn normalized(self) -> Self {
        match self {
            Self::Not(set) if set.is_empty() => Self::Any,
            other => other,
        }
    }

    /// Check if a namespace is allowed by this constraint
    pub fn allows_namespace(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Not(set) => !set.contains(&namespace.map(String::from)),
            Self::Enumeration(set) => set.contains(&namespace.map(String::from)),
        }
    }

    /// Whether the constraint has an XSD 1.0 spelling
    pub fn is_expressible_1_0(&self) -> bool {
        match self {
            Self::Any | Self::Enumeration(_) => true,
            Self::Not(set) => set.contains(&None) && set.len() <= 2,
        }
    }

    /// Check if no namespace at all is allowed
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Enumeration(set) if set.is_empty())
    }

    /// Namespace constraint subset (cos-ns-subset)
    pub fn is_subset_of(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Any, _) => false,
            (Self::Enumeration(sub), Self::Enumeration(sup)) => sub.is_subset(sup),
            (Self::Enumeration(sub), Self::Not(excluded)) => sub.is_disjoint(excluded),
            (Self::Not(sub), Self::Not(sup)) => sup.is_subset(sub),
            (Self::Not(_), Self::Enumeration(_)) => false,
        }
    }

    /// Namespace constraint union, closed under the 1.1 algebra
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Self::Any, _) | (_, Self::Any) => Self::Any,
            (Self::Enumeration(a), Self::Enumeration(b)) => {
                Self::Enumeration(a.union(b).cloned().collect())
            }
            (Self::Not(a), Self::Not(b)) => {
                Self::Not(a.intersection(b).cloned().collect()).normalized()
            }
            (Self::Not(excluded), Self::Enumeration(set))
            | (Self::Enumeration(set), Self::Not(excluded)) => {
                Self::Not(excluded.difference(set).cloned().collect()).normalized()
            }
        }
    }

    /// Namespace constraint intersection, closed under the 1.1 algebra
    pub fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Self::Any, x) | (x, Self::Any) => x.clone(),
            (Self::Enumeration(a), Self::Enumeration(b)) => {
                Self::Enumeration(a.intersection(b).cloned().collect())
            }
            (Self::Not(a), Self::Not(b)) => Self::Not(a.union(b).cloned().collect()),
            (Self::Not(excluded), Self::Enumeration(set))
            | (Self::Enumeration(set), Self::Not(excluded)) => {
                Self::Enumeration(set.difference(excluded).cloned().collect())
            }
        }
    }
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |set: &BTreeSet<NamespaceName>| {
            set.iter()
                .map(|ns| ns.as_deref().unwrap_or("##local").to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        match self {
            Self::Any => write!(f, "##any"),
            Self::Not(set) => write!(f, "not({})", list(set)),
            Self::Enumeration(set) => write!(f, "{}", list(set)),
        }
    }
}

/// A wildcard: namespace constraint, disallowed names and process contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdWildcard {
    /// Process contents mode
    pub process_contents: ValidationMode,
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Disallowed QNames (XSD 1.1 notQName)
    pub disallowed_names: BTreeSet<QName>,
    /// notQName="##defined" (XSD 1.1)
    pub disallow_defined: bool,
    /// notQName="##definedSibling" (XSD 1.1)
    pub disallow_defined_sibling: bool,
}

impl Default for XsdWildcard {
    fn default() -> Self {
        Self::new(NamespaceConstraint::Any, ValidationMode::Strict)
    }
}

impl XsdWildcard {
    /// Create a wildcard with a namespace constraint and process contents
    pub fn new(namespace: NamespaceConstraint, process_contents: ValidationMode) -> Self {
        Self {
            process_contents,
            namespace,
            disallowed_names: BTreeSet::new(),
            disallow_defined: false,
            disallow_defined_sibling: false,
        }
    }

    /// Wildcard allowing anything with the given process contents
    pub fn any(process_contents: ValidationMode) -> Self {
        Self::new(NamespaceConstraint::Any, process_contents)
    }

    /// Add a disallowed name (XSD 1.1)
    pub fn with_disallowed_name(mut self, name: QName) -> Self {
        self.disallowed_names.insert(name);
        self
    }

    /// Disallow globally declared names (XSD 1.1 ##defined)
    pub fn with_disallow_defined(mut self) -> Self {
        self.disallow_defined = true;
        self
    }

    /// Check if a namespace is allowed
    pub fn allows_namespace(&self, namespace: Option<&str>) -> bool {
        self.namespace.allows_namespace(namespace)
    }

    /// Check if a name is allowed. `is_defined` reports whether the name has
    /// a global declaration, consulted only for `##defined`.
    pub fn allows_name(&self, name: &QName, is_defined: impl FnOnce(&QName) -> bool) -> bool {
        self.allows_namespace(name.ns())
            && !self.disallowed_names.contains(name)
            && !(self.disallow_defined && is_defined(name))
    }

    /// Equality of everything except process contents
    pub fn same_constraint(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.disallowed_names == other.disallowed_names
            && self.disallow_defined == other.disallow_defined
    }

    /// Wildcard subset (cos-ns-subset), ignoring process contents
    pub fn is_subset_of(&self, other: &Self) -> bool {
        if !self.namespace.is_subset_of(&other.namespace) {
            return false;
        }
        if other.disallow_defined && !self.disallow_defined {
            return false;
        }
        other
            .disallowed_names
            .iter()
            .all(|name| !self.allows_name(name, |_| false))
    }

    /// Check if this wildcard is a valid restriction of another
    pub fn is_restriction_of(&self, other: &Self) -> bool {
        self.process_contents.is_restriction_of(&other.process_contents) && self.is_subset_of(other)
    }

    /// Attribute wildcard union (cos-aw-union). `None` when not expressible.
    ///
    /// The result keeps the process contents of `self`.
    pub fn union(&self, other: &Self, version: SchemaVersion) -> Option<Self> {
        let namespace = self.namespace.union(&other.namespace);
        if !version.is_1_1() && !namespace.is_expressible_1_0() {
            return None;
        }

        let disallowed_names = self
            .disallowed_names
            .iter()
            .filter(|name| !other.allows_name(name, |_| false))
            .chain(
                other
                    .disallowed_names
                    .iter()
                    .filter(|name| !self.allows_name(name, |_| false)),
            )
            .cloned()
            .collect();

        Some(Self {
            process_contents: self.process_contents,
            namespace,
            disallowed_names,
            disallow_defined: self.disallow_defined && other.disallow_defined,
            disallow_defined_sibling: self.disallow_defined_sibling
                && other.disallow_defined_sibling,
        })
    }

    /// Attribute wildcard intersection (cos-aw-intersect). `None` when not expressible.
    ///
    /// The result keeps the process contents of `self`.
    pub fn intersection(&self, other: &Self, version: SchemaVersion) -> Option<Self> {
        let namespace = self.namespace.intersection(&other.namespace);
        if !version.is_1_1() && !namespace.is_expressible_1_0() {
            return None;
        }

        let disallowed_names = self
            .disallowed_names
            .union(&other.disallowed_names)
            .filter(|name| namespace.allows_namespace(name.ns()))
            .cloned()
            .collect();

        Some(Self {
            process_contents: self.process_contents,
            namespace,
            disallowed_names,
            disallow_defined: self.disallow_defined || other.disallow_defined,
            disallow_defined_sibling: self.disallow_defined_sibling
                || other.disallow_defined_sibling,
        })
    }

    /// Whether some element name could match both wildcards
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.namespace.intersection(&other.namespace).is_empty()
    }
}

impl fmt::Display for XsdWildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        if !self.disallowed_names.is_empty() {
            let names: Vec<_> = self.disallowed_names.iter().map(|n| n.to_string()).collect();
            write!(f, " except {}", names.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: &str = "http://target.com";

    fn set(items: &[Option<&str>]) -> BTreeSet<NamespaceName> {
        items.iter().map(|ns| ns.map(String::from)).collect()
    }

    fn enumeration(items: &[Option<&str>]) -> NamespaceConstraint {
        NamespaceConstraint::Enumeration(set(items))
    }

    fn not(items: &[Option<&str>]) -> NamespaceConstraint {
        NamespaceConstraint::Not(set(items))
    }

    fn wildcard(namespace: NamespaceConstraint) -> XsdWildcard {
        XsdWildcard::new(namespace, ValidationMode::Lax)
    }

    #[test]
    fn test_namespace_constraint_any() {
        let constraint = NamespaceConstraint::from_namespace_attr("##any", None).unwrap();
        assert_eq!(constraint, NamespaceConstraint::Any);
        assert!(constraint.allows_namespace(Some("http://example.com")));
        assert!(constraint.allows_namespace(None));
    }

    #[test]
    fn test_namespace_constraint_other() {
        let constraint = NamespaceConstraint::from_namespace_attr("##other", Some(T)).unwrap();
        assert_eq!(constraint, not(&[Some(T), None]));

        assert!(constraint.allows_namespace(Some("http://example.com")));
        assert!(!constraint.allows_namespace(Some(T)));
        assert!(!constraint.allows_namespace(None));

        let no_tns = NamespaceConstraint::from_namespace_attr("##other", None).unwrap();
        assert_eq!(no_tns, not(&[None]));
        assert!(no_tns.is_expressible_1_0());
    }

    #[test]
    fn test_namespace_constraint_enumeration() {
        let constraint = NamespaceConstraint::from_namespace_attr(
            "http://ns1.com http://ns2.com ##local ##targetNamespace",
            Some(T),
        )
        .unwrap();

        assert_eq!(
            constraint,
            enumeration(&[Some("http://ns1.com"), Some("http://ns2.com"), None, Some(T)])
        );
        assert!(!constraint.allows_namespace(Some("http://other.com")));
        assert!(NamespaceConstraint::from_namespace_attr("##bogus", None).is_err());
    }

    #[test]
    fn test_namespace_constraint_not() {
        let constraint =
            NamespaceConstraint::from_not_namespace_attr("http://excluded.com ##local", None)
                .unwrap();

        assert!(constraint.allows_namespace(Some("http://example.com")));
        assert!(!constraint.allows_namespace(Some("http://excluded.com")));
        assert!(!constraint.allows_namespace(None));

        // an empty notNamespace excludes nothing
        assert_eq!(
            NamespaceConstraint::from_not_namespace_attr("", None).unwrap(),
            NamespaceConstraint::Any
        );
    }

    #[test]
    fn test_subset() {
        let any = NamespaceConstraint::Any;
        let other = NamespaceConstraint::other(Some(T));
        let e = enumeration(&[Some("http://example.com")]);

        assert!(e.is_subset_of(&any));
        assert!(other.is_subset_of(&any));
        assert!(!any.is_subset_of(&other));
        assert!(!any.is_subset_of(&e));
        assert!(e.is_subset_of(&other));
        assert!(!enumeration(&[None]).is_subset_of(&other));
        assert!(!enumeration(&[Some(T)]).is_subset_of(&other));
        assert!(!other.is_subset_of(&e));

        // not(a) is a subset of not(absent), never the other way around
        assert!(other.is_subset_of(&not(&[None])));
        assert!(!not(&[None]).is_subset_of(&other));
        assert!(!other.is_subset_of(&NamespaceConstraint::other(Some("urn:b"))));
    }

    #[test]
    fn test_union_1_0() {
        let v = SchemaVersion::V1_0;
        let other_a = wildcard(NamespaceConstraint::other(Some("urn:a")));
        let other_b = wildcard(NamespaceConstraint::other(Some("urn:b")));

        // two different negations give not(absent)
        let u = other_a.union(&other_b, v).unwrap();
        assert_eq!(u.namespace, not(&[None]));

        // the set contains both the negated name and absent
        let u = other_a.union(&wildcard(enumeration(&[Some("urn:a"), None])), v).unwrap();
        assert_eq!(u.namespace, NamespaceConstraint::Any);

        // the set contains the negated name but not absent
        let u = other_a.union(&wildcard(enumeration(&[Some("urn:a")])), v).unwrap();
        assert_eq!(u.namespace, not(&[None]));
        // the set contains absent but not the negated name
        assert!(other_a.union(&wildcard(enumeration(&[None])), v).is_none());

        // the set contains neither
        let u = other_a.union(&wildcard(enumeration(&[Some("urn:c")])), v).unwrap();
        assert_eq!(u.namespace, other_a.namespace);

        // not(absent) against a set with or without absent
        let not_absent = wildcard(not(&[None]));
        assert_eq!(
            not_absent.union(&wildcard(enumeration(&[None])), v).unwrap().namespace,
            NamespaceConstraint::Any
        );
        assert_eq!(
            not_absent.union(&wildcard(enumeration(&[Some("urn:c")])), v).unwrap().namespace,
            not(&[None])
        );
    }

    #[test]
    fn test_union_1_1() {
        let v = SchemaVersion::V1_1;
        let other_a = wildcard(NamespaceConstraint::other(Some("urn:a")));

        // same as 1.0 when the set holds the negated name
        let u = other_a.union(&wildcard(enumeration(&[Some("urn:a")])), v).unwrap();
        assert_eq!(u.namespace, not(&[None]));
        // expressible in 1.1 where 1.0 gives up
        let u = other_a.union(&wildcard(enumeration(&[None])), v).unwrap();
        assert_eq!(u.namespace, not(&[Some("urn:a")]));
    }

    #[test]
    fn test_intersection_versions() {
        let other_a = wildcard(NamespaceConstraint::other(Some("urn:a")));
        let other_b = wildcard(NamespaceConstraint::other(Some("urn:b")));

        assert!(other_a.intersection(&other_b, SchemaVersion::V1_0).is_none());
        let i = other_a.intersection(&other_b, SchemaVersion::V1_1).unwrap();
        assert_eq!(i.namespace, not(&[Some("urn:a"), Some("urn:b"), None]));

        // not(a) and not(absent) intersect to not(a) in both versions
        let i = other_a
            .intersection(&wildcard(not(&[None])), SchemaVersion::V1_0)
            .unwrap();
        assert_eq!(i.namespace, other_a.namespace);

        let i = other_a
            .intersection(
                &wildcard(enumeration(&[Some("urn:a"), Some("urn:c"), None])),
                SchemaVersion::V1_0,
            )
            .unwrap();
        assert_eq!(i.namespace, enumeration(&[Some("urn:c")]));
    }

    #[test]
    fn test_disallowed_names() {
        let a = QName::namespaced("urn:x", "a");
        let w = wildcard(NamespaceConstraint::Any).with_disallowed_name(a.clone());
        assert!(!w.allows_name(&a, |_| false));
        assert!(w.allows_name(&QName::namespaced("urn:x", "b"), |_| false));

        let defined = wildcard(NamespaceConstraint::Any).with_disallow_defined();
        assert!(!defined.allows_name(&a, |_| true));
        assert!(defined.allows_name(&a, |_| false));

        // a wildcard without the exclusion is not a subset of one with it
        assert!(!wildcard(NamespaceConstraint::Any).is_subset_of(&w));
        assert!(w.is_subset_of(&wildcard(NamespaceConstraint::Any)));

        // union keeps only names excluded by both sides
        let plain = wildcard(enumeration(&[Some("urn:y")]));
        let u = w.union(&plain, SchemaVersion::V1_1).unwrap();
        assert!(u.disallowed_names.contains(&a));
        let u = w.union(&wildcard(NamespaceConstraint::Any), SchemaVersion::V1_1).unwrap();
        assert!(u.disallowed_names.is_empty());
    }

    #[test]
    fn test_wildcard_restriction() {
        let base = XsdWildcard::any(ValidationMode::Lax);
        let strict = XsdWildcard::new(enumeration(&[Some(T)]), ValidationMode::Strict);
        assert!(strict.is_restriction_of(&base));

        let skip = XsdWildcard::new(enumeration(&[Some(T)]), ValidationMode::Skip);
        assert!(!skip.is_restriction_of(&base));
    }

    #[test]
    fn test_overlaps() {
        let a = wildcard(enumeration(&[Some("urn:a"), Some("urn:b")]));
        let b = wildcard(enumeration(&[Some("urn:b")]));
        let c = wildcard(enumeration(&[Some("urn:c")]));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(wildcard(NamespaceConstraint::other(Some("urn:a"))).overlaps(&c));
        assert!(!wildcard(NamespaceConstraint::other(Some("urn:c"))).overlaps(&c));
    }

    fn namespace_strategy() -> impl Strategy<Value = NamespaceName> {
        prop_oneof![
            Just(None),
            Just(Some("urn:a".to_string())),
            Just(Some("urn:b".to_string())),
            Just(Some("urn:c".to_string())),
        ]
    }

    fn namespace_set_strategy() -> impl Strategy<Value = BTreeSet<NamespaceName>> {
        prop::collection::btree_set(namespace_strategy(), 0..4)
    }

    fn constraint_strategy() -> impl Strategy<Value = NamespaceConstraint> {
        prop_oneof![
            Just(NamespaceConstraint::Any),
            namespace_set_strategy().prop_map(|s| NamespaceConstraint::Not(s).normalized()),
            namespace_set_strategy().prop_map(NamespaceConstraint::Enumeration),
        ]
    }

    fn wildcard_strategy() -> impl Strategy<Value = XsdWildcard> {
        let names = prop::collection::btree_set(
            prop_oneof![
                Just(QName::namespaced("urn:a", "x")),
                Just(QName::namespaced("urn:b", "y")),
                Just(QName::local("z")),
            ],
            0..3,
        );
        (constraint_strategy(), names).prop_map(|(namespace, names)| {
            let mut w = XsdWildcard::new(namespace, ValidationMode::Strict);
            w.disallowed_names = names;
            w
        })
    }

    fn version_strategy() -> impl Strategy<Value = SchemaVersion> {
        prop_oneof![Just(SchemaVersion::V1_0), Just(SchemaVersion::V1_1)]
    }

    proptest! {
        #[test]
        fn union_is_commutative(w1 in wildcard_strategy(), w2 in wildcard_strategy(), v in version_strategy()) {
            match (w1.union(&w2, v), w2.union(&w1, v)) {
                (Some(a), Some(b)) => prop_assert!(a.same_constraint(&b)),
                (None, None) => {}
                _ => prop_assert!(false, "expressibility differs"),
            }
        }

        #[test]
        fn intersection_is_commutative(w1 in wildcard_strategy(), w2 in wildcard_strategy(), v in version_strategy()) {
            match (w1.intersection(&w2, v), w2.intersection(&w1, v)) {
                (Some(a), Some(b)) => prop_assert!(a.same_constraint(&b)),
                (None, None) => {}
                _ => prop_assert!(false, "expressibility differs"),
            }
        }

        #[test]
        fn wildcard_is_subset_of_union(w1 in wildcard_strategy(), w2 in wildcard_strategy(), v in version_strategy()) {
            if let Some(u) = w1.union(&w2, v) {
                prop_assert!(w1.is_subset_of(&u));
                prop_assert!(w2.is_subset_of(&u));
            }
        }

        #[test]
        fn intersection_is_subset(w1 in wildcard_strategy(), w2 in wildcard_strategy()) {
            if let Some(i) = w1.intersection(&w2, SchemaVersion::V1_1) {
                prop_assert!(i.is_subset_of(&w1));
                prop_assert!(i.is_subset_of(&w2));
            }
        }

        #[test]
        fn subset_agrees_with_membership(c1 in constraint_strategy(), c2 in constraint_strategy(), ns in namespace_strategy()) {
            if c1.is_subset_of(&c2) && c1.allows_namespace(ns.as_deref()) {
                prop_assert!(c2.allows_namespace(ns.as_deref()));
            }
        }
    }
}
