//! XSD Element Declarations
//!
//! Element declarations refer to their type by name (or carry an
//! anonymous type inline) so that recursive content models need no
//! cyclic ownership.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Element_Declarations

use std::sync::Arc;

use crate::namespaces::QName;

use super::complex_types::TypeRef;
use super::derivation::DerivationFlags;
use super::identities::XsdIdentity;

/// A value constraint on an element or attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueConstraint {
    /// Value supplied when the instance has none
    Default(String),
    /// Value supplied when absent, and required to match when present
    Fixed(String),
}

impl ValueConstraint {
    /// The constraint's lexical value
    pub fn value(&self) -> &str {
        match self {
            ValueConstraint::Default(v) | ValueConstraint::Fixed(v) => v,
        }
    }

    /// The fixed value, if this is a fixed constraint
    pub fn fixed(&self) -> Option<&str> {
        match self {
            ValueConstraint::Fixed(v) => Some(v),
            ValueConstraint::Default(_) => None,
        }
    }
}

/// XSD Element declaration
#[derive(Debug, Clone)]
pub struct XsdElement {
    /// Element name
    pub name: QName,
    /// Type definition
    pub type_ref: TypeRef,
    /// Whether this element is abstract
    pub abstract_element: bool,
    /// Whether this element is nillable
    pub nillable: bool,
    /// Default or fixed value
    pub value_constraint: Option<ValueConstraint>,
    /// Substitution group head element name
    pub substitution_group: Option<QName>,
    /// Disallowed substitutions
    pub block: DerivationFlags,
    /// Identity constraints scoped to this element
    pub identities: Vec<Arc<XsdIdentity>>,
    /// Whether this is a top-level declaration
    pub global: bool,
}

impl XsdElement {
    /// Create a local element declaration
    pub fn new(name: QName, type_ref: TypeRef) -> Self {
        Self {
            name,
            type_ref,
            abstract_element: false,
            nillable: false,
            value_constraint: None,
            substitution_group: None,
            block: DerivationFlags::none(),
            identities: Vec::new(),
            global: false,
        }
    }

    /// Create a top-level element declaration
    pub fn global(name: QName, type_ref: TypeRef) -> Self {
        Self {
            global: true,
            ..Self::new(name, type_ref)
        }
    }

    /// Set the abstract flag
    pub fn with_abstract(mut self, abstract_element: bool) -> Self {
        self.abstract_element = abstract_element;
        self
    }

    /// Set the nillable flag
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.value_constraint = Some(ValueConstraint::Default(value.into()));
        self
    }

    /// Set a fixed value
    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.value_constraint = Some(ValueConstraint::Fixed(value.into()));
        self
    }

    /// Join a substitution group
    pub fn with_substitution_group(mut self, head: QName) -> Self {
        self.substitution_group = Some(head);
        self
    }

    /// Set the disallowed substitutions
    pub fn with_block(mut self, block: DerivationFlags) -> Self {
        self.block = block;
        self
    }

    /// Attach an identity constraint
    pub fn with_identity(mut self, identity: XsdIdentity) -> Self {
        self.identities.push(Arc::new(identity));
        self
    }

    /// The fixed value, if any
    pub fn fixed(&self) -> Option<&str> {
        self.value_constraint.as_ref().and_then(|vc| vc.fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder() {
        let e = XsdElement::global(QName::local("e"), TypeRef::any_type())
            .with_nillable(true)
            .with_fixed("x");
        assert!(e.global && e.nillable);
        assert_eq!(e.fixed(), Some("x"));
        assert_eq!(e.value_constraint.as_ref().map(|v| v.value()), Some("x"));

        let d = XsdElement::new(QName::local("d"), TypeRef::any_type()).with_default("y");
        assert_eq!(d.fixed(), None);
    }
}
