//! Global XSD declarations management
//!
//! A [`SchemaGrammar`] holds the global components of one target
//! namespace. A [`GrammarBucket`] gathers the grammars known to a
//! validator and answers QName lookups across them; grammars it does not
//! yet know are requested from a [`GrammarResolver`].

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

use crate::error::Result;
use crate::namespaces::{QName, XSD_NAMESPACE};

use super::attributes::XsdAttribute;
use super::builtins;
use super::complex_types::{TypeDefinition, TypeRef, XsdComplexType};
use super::derivation::check_type_derivation_ok;
use super::elements::XsdElement;
use super::identities::XsdIdentity;
use super::simple_types::XsdSimpleType;

/// XSD Notation declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdNotation {
    /// Notation name
    pub name: QName,
    /// Public identifier
    pub public: Option<String>,
    /// System identifier
    pub system: Option<String>,
}

impl XsdNotation {
    /// Create a new notation
    pub fn new(name: QName) -> Self {
        Self {
            name,
            public: None,
            system: None,
        }
    }

    /// Set public identifier
    pub fn with_public(mut self, public: impl Into<String>) -> Self {
        self.public = Some(public.into());
        self
    }

    /// Set system identifier
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Global components of one target namespace
#[derive(Debug, Default, Clone)]
pub struct SchemaGrammar {
    /// Target namespace
    pub target_namespace: Option<String>,
    elements: IndexMap<QName, Arc<XsdElement>>,
    types: IndexMap<QName, TypeDefinition>,
    attributes: IndexMap<QName, Arc<XsdAttribute>>,
    identities: IndexMap<QName, Arc<XsdIdentity>>,
    notations: IndexMap<QName, XsdNotation>,
}

impl SchemaGrammar {
    /// Create an empty grammar
    pub fn new(target_namespace: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.map(str::to_string),
            ..Self::default()
        }
    }

    /// Qualify a local name with the target namespace
    pub fn qname(&self, local_name: &str) -> QName {
        QName::new(self.target_namespace.as_deref(), local_name)
    }

    /// Register a global element declaration
    pub fn add_element(&mut self, mut element: XsdElement) -> Arc<XsdElement> {
        element.global = true;
        for identity in &element.identities {
            self.identities
                .insert(identity.name.clone(), identity.clone());
        }
        let element = Arc::new(element);
        self.elements
            .insert(element.name.clone(), element.clone());
        element
    }

    /// Register a named complex type
    pub fn add_complex_type(&mut self, complex_type: XsdComplexType) -> Arc<XsdComplexType> {
        let complex_type = Arc::new(complex_type);
        if let Some(name) = complex_type.name.clone() {
            self.types
                .insert(name, TypeDefinition::Complex(complex_type.clone()));
        }
        complex_type
    }

    /// Register a named simple type
    pub fn add_simple_type(&mut self, simple_type: XsdSimpleType) -> Arc<XsdSimpleType> {
        let simple_type = Arc::new(simple_type);
        if let Some(name) = simple_type.name.clone() {
            self.types
                .insert(name, TypeDefinition::Simple(simple_type.clone()));
        }
        simple_type
    }

    /// Register a global attribute declaration
    pub fn add_attribute(&mut self, mut attribute: XsdAttribute) -> Arc<XsdAttribute> {
        attribute.global = true;
        let attribute = Arc::new(attribute);
        self.attributes
            .insert(attribute.name.clone(), attribute.clone());
        attribute
    }

    /// Register a notation
    pub fn add_notation(&mut self, notation: XsdNotation) {
        self.notations.insert(notation.name.clone(), notation);
    }

    /// Look up a global element
    pub fn element(&self, name: &QName) -> Option<&Arc<XsdElement>> {
        self.elements.get(name)
    }

    /// Look up a named type
    pub fn type_definition(&self, name: &QName) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Look up a global attribute
    pub fn attribute(&self, name: &QName) -> Option<&Arc<XsdAttribute>> {
        self.attributes.get(name)
    }

    /// Look up an identity constraint
    pub fn identity(&self, name: &QName) -> Option<&Arc<XsdIdentity>> {
        self.identities.get(name)
    }

    /// Look up a notation
    pub fn notation(&self, name: &QName) -> Option<&XsdNotation> {
        self.notations.get(name)
    }

    /// Global elements in declaration order
    pub fn elements(&self) -> impl Iterator<Item = &Arc<XsdElement>> {
        self.elements.values()
    }

    /// Named types in declaration order
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Global attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = &Arc<XsdAttribute>> {
        self.attributes.values()
    }
}

/// The grammars known to a validator, by target namespace
#[derive(Debug, Default, Clone)]
pub struct GrammarBucket {
    grammars: IndexMap<Option<String>, Arc<SchemaGrammar>>,
}

impl GrammarBucket {
    /// Create an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the grammar of a namespace
    pub fn add(&mut self, grammar: impl Into<Arc<SchemaGrammar>>) {
        let grammar = grammar.into();
        self.grammars
            .insert(grammar.target_namespace.clone(), grammar);
    }

    /// The grammar of a namespace
    pub fn get(&self, namespace: Option<&str>) -> Option<&Arc<SchemaGrammar>> {
        self.grammars.get(&namespace.map(str::to_string))
    }

    /// Whether a grammar for the namespace is known
    pub fn contains(&self, namespace: Option<&str>) -> bool {
        self.get(namespace).is_some()
    }

    /// All grammars
    pub fn grammars(&self) -> impl Iterator<Item = &Arc<SchemaGrammar>> {
        self.grammars.values()
    }

    /// Number of grammars
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    /// Whether the bucket is empty
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    /// Global element lookup
    pub fn element(&self, name: &QName) -> Option<Arc<XsdElement>> {
        self.get(name.ns())?.element(name).cloned()
    }

    /// Global attribute lookup
    pub fn attribute(&self, name: &QName) -> Option<Arc<XsdAttribute>> {
        self.get(name.ns())?.attribute(name).cloned()
    }

    /// Notation lookup
    pub fn notation(&self, name: &QName) -> Option<&XsdNotation> {
        self.get(name.ns())?.notation(name)
    }

    /// Type lookup, built-in types first
    pub fn type_definition(&self, name: &QName) -> Option<TypeDefinition> {
        if name.ns() == Some(XSD_NAMESPACE) {
            if name.local_name == "anyType" {
                return Some(TypeDefinition::any_type());
            }
            if let Some(simple) = builtins::lookup(name) {
                return Some(TypeDefinition::Simple(simple));
            }
        }
        self.get(name.ns())?.type_definition(name).cloned()
    }

    /// Resolve a declaration's type reference
    pub fn resolve_type(&self, type_ref: &TypeRef) -> Option<TypeDefinition> {
        match type_ref {
            TypeRef::Inline(t) => Some(t.clone()),
            TypeRef::Named(name) => self.type_definition(name),
        }
    }

    /// Elements that may substitute for `head`, transitively.
    ///
    /// Members whose type derivation is blocked by the head are excluded,
    /// as is everything when the head blocks substitution.
    pub fn substitution_members(&self, head: &XsdElement) -> Vec<Arc<XsdElement>> {
        if head.block.substitution {
            return Vec::new();
        }
        let head_type = self.resolve_type(&head.type_ref);
        let mut members: Vec<Arc<XsdElement>> = Vec::new();
        let mut heads = vec![head.name.clone()];
        while let Some(current) = heads.pop() {
            for element in self.grammars().flat_map(|g| g.elements()) {
                if element.substitution_group.as_ref() != Some(&current)
                    || members.iter().any(|m| m.name == element.name)
                    || element.name == head.name
                {
                    continue;
                }
                heads.push(element.name.clone());
                let allowed = match (&head_type, self.resolve_type(&element.type_ref)) {
                    (Some(base), Some(derived)) => check_type_derivation_ok(&derived, base, head.block),
                    _ => true,
                };
                if allowed {
                    members.push(element.clone());
                }
            }
        }
        members
    }

    /// Drop all grammars
    pub fn clear(&mut self) {
        self.grammars.clear();
    }
}

/// A location hint from xsi:schemaLocation or xsi:noNamespaceSchemaLocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLocationHint {
    /// Namespace the hint is for
    pub namespace: Option<String>,
    /// Location, resolved against the document base URI when one is known
    pub location: String,
}

/// Parse the value of xsi:schemaLocation into hints.
///
/// A trailing namespace without a location is ignored.
pub fn parse_schema_location(value: &str, base: Option<&Url>) -> Vec<SchemaLocationHint> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    tokens
        .chunks_exact(2)
        .map(|pair| SchemaLocationHint {
            namespace: Some(pair[0].to_string()),
            location: resolve_location(pair[1], base),
        })
        .collect()
}

/// Parse the value of xsi:noNamespaceSchemaLocation into a hint
pub fn parse_no_namespace_schema_location(value: &str, base: Option<&Url>) -> Option<SchemaLocationHint> {
    let location = value.trim();
    if location.is_empty() {
        return None;
    }
    Some(SchemaLocationHint {
        namespace: None,
        location: resolve_location(location, base),
    })
}

fn resolve_location(location: &str, base: Option<&Url>) -> String {
    match base.map(|b| b.join(location)) {
        Some(Ok(url)) => url.to_string(),
        _ => location.to_string(),
    }
}

/// What caused a grammar lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTrigger {
    /// An element without a known grammar
    Element,
    /// An attribute matched by a wildcard
    Attribute,
    /// An xsi:type value
    XsiType,
    /// A location hint seen on an element
    Hint,
}

/// A request to the grammar resolver
#[derive(Debug, Clone)]
pub struct GrammarRequest<'a> {
    /// Requested namespace
    pub namespace: Option<&'a str>,
    /// What caused the lookup
    pub trigger: ResolutionTrigger,
    /// Element being validated
    pub enclosing_element: Option<&'a QName>,
    /// Location hints in scope
    pub hints: &'a [SchemaLocationHint],
}

impl GrammarRequest<'_> {
    /// Hints for the requested namespace
    pub fn namespace_hints(&self) -> impl Iterator<Item = &SchemaLocationHint> {
        let namespace = self.namespace;
        self.hints
            .iter()
            .filter(move |h| h.namespace.as_deref() == namespace)
    }
}

/// Supplier of grammars for namespaces the validator does not know.
///
/// `Ok(None)` is a recoverable miss; `Err` aborts the validation episode.
pub trait GrammarResolver {
    /// Find the grammar of a namespace
    fn find_schema_grammar(&mut self, request: &GrammarRequest<'_>) -> Result<Option<Arc<SchemaGrammar>>>;
}

/// Resolver that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

impl GrammarResolver for NoResolver {
    fn find_schema_grammar(&mut self, _request: &GrammarRequest<'_>) -> Result<Option<Arc<SchemaGrammar>>> {
        Ok(None)
    }
}

/// Resolver backed by pre-built grammars, keyed by location
#[derive(Debug, Default, Clone)]
pub struct LocationResolver {
    by_location: HashMap<String, Arc<SchemaGrammar>>,
}

impl LocationResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a grammar available at a location
    pub fn with_grammar(mut self, location: impl Into<String>, grammar: impl Into<Arc<SchemaGrammar>>) -> Self {
        self.by_location.insert(location.into(), grammar.into());
        self
    }
}

impl GrammarResolver for LocationResolver {
    fn find_schema_grammar(&mut self, request: &GrammarRequest<'_>) -> Result<Option<Arc<SchemaGrammar>>> {
        let found = request
            .namespace_hints()
            .filter_map(|h| self.by_location.get(&h.location))
            .find(|g| g.target_namespace.as_deref() == request.namespace)
            .cloned();
        if let Some(ref grammar) = found {
            tracing::debug!(namespace = ?grammar.target_namespace, "grammar resolved from location hint");
        }
        Ok(found)
    }
}
