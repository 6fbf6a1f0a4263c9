//! Post-schema-validation infoset
//!
//! The augmentations attached to each validated element and attribute.
//! Records are plain data and serialize with serde.

use serde::Serialize;

use crate::namespaces::QName;

use super::base::{ValidationStatus, ValidityStatus};
use super::complex_types::TypeDefinition;
use super::simple_types::ValidatedInfo;

/// A reference to a type definition in the PSVI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeInfo {
    /// Type name, or a generated name for anonymous types
    pub name: String,
    /// Whether the type is anonymous
    pub anonymous: bool,
    /// Whether the type is a simple type
    pub simple: bool,
}

impl From<&TypeDefinition> for TypeInfo {
    fn from(t: &TypeDefinition) -> Self {
        Self {
            name: t.display_name(),
            anonymous: t.name().is_none(),
            simple: t.is_simple(),
        }
    }
}

/// PSVI of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElementPsvi {
    /// Element name
    pub name: QName,
    /// Name of the validation root
    pub validation_context: String,
    /// Governing element declaration
    pub element_declaration: Option<QName>,
    /// Governing type definition
    pub type_definition: Option<TypeInfo>,
    /// The element was nilled
    pub nil: bool,
    /// Notation named by the element's content
    pub notation: Option<QName>,
    /// Schema-normalized value of simple content
    pub schema_normalized_value: Option<String>,
    /// Union member type that validated the content
    pub member_type: Option<String>,
    /// The value came from the declaration's default or fixed value
    pub schema_default: bool,
    /// [validation attempted]
    pub validation_attempted: ValidationStatus,
    /// [validity]
    pub validity: ValidityStatus,
    /// Error codes attributable to the element and its strictly assessed descendants
    pub error_codes: Vec<String>,
}

impl ElementPsvi {
    /// An unassessed element
    pub fn new(name: QName) -> Self {
        Self {
            name,
            validation_context: String::new(),
            element_declaration: None,
            type_definition: None,
            nil: false,
            notation: None,
            schema_normalized_value: None,
            member_type: None,
            schema_default: false,
            validation_attempted: ValidationStatus::None,
            validity: ValidityStatus::NotKnown,
            error_codes: Vec::new(),
        }
    }

    /// Whether the element was strictly assessed and found valid
    pub fn is_valid(&self) -> bool {
        self.validity == ValidityStatus::Valid
    }

    /// Copy the normalized value and member type of a validated value
    pub fn set_value(&mut self, info: &ValidatedInfo, normalize: bool) {
        if normalize {
            self.schema_normalized_value = Some(info.normalized.clone());
        }
        self.member_type = info.member_type.as_ref().map(|t| t.display_name());
    }
}

/// PSVI of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttributePsvi {
    /// Governing attribute declaration
    pub attribute_declaration: Option<QName>,
    /// Governing type definition
    pub type_definition: Option<TypeInfo>,
    /// Schema-normalized value
    pub schema_normalized_value: Option<String>,
    /// Union member type that validated the value
    pub member_type: Option<String>,
    /// [validation attempted]
    pub validation_attempted: ValidationStatus,
    /// [validity]
    pub validity: ValidityStatus,
    /// Error codes of the attribute
    pub error_codes: Vec<String>,
    /// False when the attribute was supplied from a default
    pub specified: bool,
}

impl Default for AttributePsvi {
    fn default() -> Self {
        Self {
            attribute_declaration: None,
            type_definition: None,
            schema_normalized_value: None,
            member_type: None,
            validation_attempted: ValidationStatus::None,
            validity: ValidityStatus::NotKnown,
            error_codes: Vec::new(),
            specified: true,
        }
    }
}

impl AttributePsvi {
    /// Whether the attribute was strictly assessed and found valid
    pub fn is_valid(&self) -> bool {
        self.validity == ValidityStatus::Valid
    }
}
