//! XSD Complex Type definitions
//!
//! Complex types can have empty content, simple content, element-only
//! content (a particle) or mixed content. The generic type handle
//! `TypeDefinition` covers both simple and complex types.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use std::fmt;
use std::sync::Arc;

use crate::namespaces::QName;

use super::attributes::XsdAttributeUse;
use super::base::ValidationMode;
use super::builtins;
use super::derivation::{DerivationFlags, DerivationMethod};
use super::groups::XsdGroup;
use super::particles::{next_component_id, XsdParticle};
use super::simple_types::XsdSimpleType;
use super::wildcards::XsdWildcard;

/// Content type label for complex types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeLabel {
    /// No content (empty element)
    Empty,
    /// Simple content (text only)
    Simple,
    /// Mixed content (text and elements)
    Mixed,
    /// Element-only content
    ElementOnly,
}

impl fmt::Display for ContentTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::Mixed => write!(f, "mixed"),
            Self::ElementOnly => write!(f, "element-only"),
        }
    }
}

/// The content of a complex type
#[derive(Debug, Clone)]
pub enum ComplexContent {
    /// No text or children
    Empty,
    /// Text validated against a simple type
    Simple(Arc<XsdSimpleType>),
    /// Children only
    ElementOnly(XsdParticle),
    /// Children and text
    Mixed(XsdParticle),
}

impl ComplexContent {
    /// Element-only content from a model group occurring once
    pub fn element_only(group: XsdGroup) -> Self {
        ComplexContent::ElementOnly(XsdParticle::group(group))
    }

    /// Mixed content from a model group occurring once
    pub fn mixed(group: XsdGroup) -> Self {
        ComplexContent::Mixed(XsdParticle::group(group))
    }

    /// Content type label
    pub fn label(&self) -> ContentTypeLabel {
        match self {
            ComplexContent::Empty => ContentTypeLabel::Empty,
            ComplexContent::Simple(_) => ContentTypeLabel::Simple,
            ComplexContent::ElementOnly(_) => ContentTypeLabel::ElementOnly,
            ComplexContent::Mixed(_) => ContentTypeLabel::Mixed,
        }
    }

    /// The content particle, for element-only and mixed content
    pub fn particle(&self) -> Option<&XsdParticle> {
        match self {
            ComplexContent::ElementOnly(p) | ComplexContent::Mixed(p) => Some(p),
            _ => None,
        }
    }
}

/// XSD complex type definition
#[derive(Debug)]
pub struct XsdComplexType {
    /// Component id, unique per process
    pub id: usize,
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Base type; `None` means anyType
    pub base: Option<TypeDefinition>,
    /// Derivation method from the base
    pub derivation: DerivationMethod,
    /// Content
    pub content: ComplexContent,
    /// Attribute uses
    pub attribute_uses: Vec<XsdAttributeUse>,
    /// Attribute wildcard
    pub attribute_wildcard: Option<XsdWildcard>,
    /// Whether this type is abstract
    pub abstract_type: bool,
    /// Prohibited substitutions
    pub block: DerivationFlags,
    /// Final derivation flags
    pub final_deriv: DerivationFlags,
}

lazy_static::lazy_static! {
    static ref ANY_TYPE: Arc<XsdComplexType> = {
        let content = XsdParticle::wildcard(XsdWildcard::any(ValidationMode::Lax))
            .with_occurs(0, None);
        Arc::new(XsdComplexType {
            id: next_component_id(),
            name: Some(QName::xsd("anyType")),
            base: None,
            derivation: DerivationMethod::Restriction,
            content: ComplexContent::Mixed(content),
            attribute_uses: Vec::new(),
            attribute_wildcard: Some(XsdWildcard::any(ValidationMode::Lax)),
            abstract_type: false,
            block: DerivationFlags::none(),
            final_deriv: DerivationFlags::none(),
        })
    };
}

/// The anyType definition, shared process-wide
pub fn any_type() -> Arc<XsdComplexType> {
    Arc::clone(&ANY_TYPE)
}

impl XsdComplexType {
    /// Create a complex type restricting anyType
    pub fn new(name: Option<QName>, content: ComplexContent) -> Self {
        Self {
            id: next_component_id(),
            name,
            base: None,
            derivation: DerivationMethod::Restriction,
            content,
            attribute_uses: Vec::new(),
            attribute_wildcard: None,
            abstract_type: false,
            block: DerivationFlags::none(),
            final_deriv: DerivationFlags::none(),
        }
    }

    /// Set the base type and derivation method
    pub fn derived_from(mut self, base: TypeDefinition, method: DerivationMethod) -> Self {
        self.base = Some(base);
        self.derivation = method;
        self
    }

    /// Add an attribute use
    pub fn with_attribute(mut self, attribute_use: XsdAttributeUse) -> Self {
        self.attribute_uses.push(attribute_use);
        self
    }

    /// Set the attribute wildcard
    pub fn with_attribute_wildcard(mut self, wildcard: XsdWildcard) -> Self {
        self.attribute_wildcard = Some(wildcard);
        self
    }

    /// Set the abstract flag
    pub fn with_abstract(mut self, abstract_type: bool) -> Self {
        self.abstract_type = abstract_type;
        self
    }

    /// Set the prohibited substitutions
    pub fn with_block(mut self, block: DerivationFlags) -> Self {
        self.block = block;
        self
    }

    /// Whether this is anyType
    pub fn is_any_type(&self) -> bool {
        self.id == ANY_TYPE.id
    }

    /// Base type definition, anyType when none is set
    pub fn base_type(&self) -> TypeDefinition {
        self.base.clone().unwrap_or_else(TypeDefinition::any_type)
    }

    /// Content type label
    pub fn content_type(&self) -> ContentTypeLabel {
        self.content.label()
    }

    /// Find the attribute use for a name
    pub fn attribute_use(&self, name: &QName) -> Option<&XsdAttributeUse> {
        self.attribute_uses.iter().find(|u| u.name() == name)
    }

    /// Whether an attribute use has an ID-derived type
    pub fn has_id_attribute(&self) -> bool {
        self.attribute_uses
            .iter()
            .any(|u| u.attribute.type_def.is_id_type())
    }

    /// Type name for messages
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("#AnonType_{}", self.id),
        }
    }
}

/// A simple or complex type definition
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    /// Simple type
    Simple(Arc<XsdSimpleType>),
    /// Complex type
    Complex(Arc<XsdComplexType>),
}

impl TypeDefinition {
    /// The anyType definition
    pub fn any_type() -> Self {
        TypeDefinition::Complex(any_type())
    }

    /// Type name (None for anonymous types)
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDefinition::Simple(t) => t.name.as_ref(),
            TypeDefinition::Complex(t) => t.name.as_ref(),
        }
    }

    /// Type name for messages
    pub fn display_name(&self) -> String {
        match self {
            TypeDefinition::Simple(t) => t.display_name(),
            TypeDefinition::Complex(t) => t.display_name(),
        }
    }

    /// Whether this is anyType
    pub fn is_any_type(&self) -> bool {
        matches!(self, TypeDefinition::Complex(t) if t.is_any_type())
    }

    /// The simple type, if this is one
    pub fn as_simple(&self) -> Option<&Arc<XsdSimpleType>> {
        match self {
            TypeDefinition::Simple(t) => Some(t),
            TypeDefinition::Complex(_) => None,
        }
    }

    /// The complex type, if this is one
    pub fn as_complex(&self) -> Option<&Arc<XsdComplexType>> {
        match self {
            TypeDefinition::Complex(t) => Some(t),
            TypeDefinition::Simple(_) => None,
        }
    }

    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeDefinition::Simple(_))
    }

    /// Whether the type is abstract
    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeDefinition::Complex(t) if t.abstract_type)
    }

    /// Prohibited substitutions of a complex type
    pub fn block(&self) -> DerivationFlags {
        match self {
            TypeDefinition::Complex(t) => t.block,
            TypeDefinition::Simple(_) => DerivationFlags::none(),
        }
    }

    /// Component identity
    pub fn same_as(&self, other: &TypeDefinition) -> bool {
        match (self, other) {
            (TypeDefinition::Simple(a), TypeDefinition::Simple(b)) => Arc::ptr_eq(a, b),
            (TypeDefinition::Complex(a), TypeDefinition::Complex(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// Simple type used for the element's character content, if any
    pub fn content_simple_type(&self) -> Option<&Arc<XsdSimpleType>> {
        match self {
            TypeDefinition::Simple(t) => Some(t),
            TypeDefinition::Complex(t) => match &t.content {
                ComplexContent::Simple(s) => Some(s),
                _ => None,
            },
        }
    }
}

impl From<Arc<XsdSimpleType>> for TypeDefinition {
    fn from(t: Arc<XsdSimpleType>) -> Self {
        TypeDefinition::Simple(t)
    }
}

impl From<Arc<XsdComplexType>> for TypeDefinition {
    fn from(t: Arc<XsdComplexType>) -> Self {
        TypeDefinition::Complex(t)
    }
}

impl From<XsdComplexType> for TypeDefinition {
    fn from(t: XsdComplexType) -> Self {
        TypeDefinition::Complex(Arc::new(t))
    }
}

/// Reference from a declaration to its type
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A named type, resolved through the grammars
    Named(QName),
    /// An anonymous type defined in place
    Inline(TypeDefinition),
}

impl TypeRef {
    /// Reference to xs:anyType
    pub fn any_type() -> Self {
        TypeRef::Inline(TypeDefinition::any_type())
    }

    /// Reference to a built-in simple type by local name
    pub fn xsd(local_name: &str) -> Self {
        TypeRef::Named(QName::xsd(local_name))
    }

    /// Whether two references denote the same type definition
    pub fn same_as(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::Named(a), TypeRef::Named(b)) => a == b,
            (TypeRef::Inline(a), TypeRef::Inline(b)) => a.same_as(b),
            (TypeRef::Named(name), TypeRef::Inline(t)) | (TypeRef::Inline(t), TypeRef::Named(name)) => {
                t.name() == Some(name)
            }
        }
    }
}

impl From<TypeDefinition> for TypeRef {
    fn from(t: TypeDefinition) -> Self {
        TypeRef::Inline(t)
    }
}

impl From<Arc<XsdSimpleType>> for TypeRef {
    fn from(t: Arc<XsdSimpleType>) -> Self {
        TypeRef::Inline(TypeDefinition::Simple(t))
    }
}

impl From<Arc<XsdComplexType>> for TypeRef {
    fn from(t: Arc<XsdComplexType>) -> Self {
        TypeRef::Inline(TypeDefinition::Complex(t))
    }
}

impl From<XsdComplexType> for TypeRef {
    fn from(t: XsdComplexType) -> Self {
        TypeRef::Inline(TypeDefinition::Complex(Arc::new(t)))
    }
}

/// Convenience for a built-in simple type handle
pub fn builtin_type(kind: builtins::BuiltinKind) -> TypeDefinition {
    TypeDefinition::Simple(builtins::builtin(kind))
}
