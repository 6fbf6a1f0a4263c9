//! XSD attribute declarations and attribute uses

use std::sync::Arc;

use crate::namespaces::QName;

use super::builtins;
use super::elements::ValueConstraint;
use super::simple_types::XsdSimpleType;

/// XSD attribute declaration
#[derive(Debug, Clone)]
pub struct XsdAttribute {
    /// Attribute name
    pub name: QName,
    /// Simple type of the attribute value
    pub type_def: Arc<XsdSimpleType>,
    /// Default or fixed value
    pub value_constraint: Option<ValueConstraint>,
    /// Whether this is a top-level declaration
    pub global: bool,
}

impl XsdAttribute {
    /// Create a local attribute declaration
    pub fn new(name: QName, type_def: Arc<XsdSimpleType>) -> Self {
        Self {
            name,
            type_def,
            value_constraint: None,
            global: false,
        }
    }

    /// Create a top-level attribute declaration
    pub fn global(name: QName, type_def: Arc<XsdSimpleType>) -> Self {
        Self {
            global: true,
            ..Self::new(name, type_def)
        }
    }

    /// Attribute typed as anySimpleType
    pub fn untyped(name: QName) -> Self {
        Self::new(name, builtins::any_simple_type())
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
}

/// An attribute use within a complex type
#[derive(Debug, Clone)]
pub struct XsdAttributeUse {
    /// The declaration in use
    pub attribute: Arc<XsdAttribute>,
    /// Whether the attribute must be present
    pub required: bool,
    /// Value constraint of the use, overriding the declaration's
    pub value_constraint: Option<ValueConstraint>,
}

impl XsdAttributeUse {
    /// Optional use of a declaration
    pub fn optional(attribute: impl Into<Arc<XsdAttribute>>) -> Self {
        Self {
            attribute: attribute.into(),
            required: false,
            value_constraint: None,
        }
    }

    /// Required use of a declaration
    pub fn required(attribute: impl Into<Arc<XsdAttribute>>) -> Self {
        Self {
            required: true,
            ..Self::optional(attribute)
        }
    }

    /// Set a default value on the use
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.value_constraint = Some(ValueConstraint::Default(value.into()));
        self
    }

    /// Set a fixed value on the use
    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.value_constraint = Some(ValueConstraint::Fixed(value.into()));
        self
    }

    /// Attribute name
    pub fn name(&self) -> &QName {
        &self.attribute.name
    }

    /// Effective value constraint: the use's, else the declaration's
    pub fn effective_value_constraint(&self) -> Option<&ValueConstraint> {
        self.value_constraint
            .as_ref()
            .or(self.attribute.value_constraint.as_ref())
    }
}
