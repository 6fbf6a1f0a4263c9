//! XSD Identity Constraints
//!
//! This module implements identity constraints for XML Schema:
//! - xs:unique - Ensures values are unique within scope
//! - xs:key - Like unique, but all field values must be present
//! - xs:keyref - References a key/unique constraint (foreign key)
//!
//! Evaluation is streaming. Each constraint on an element declaration
//! activates a selector matcher when an instance of the element starts;
//! every element the selector selects activates one field matcher per
//! field. Matchers live on a stack segmented by element, so everything an
//! element activated is dropped when it ends.

use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::namespaces::{NamespaceContext, QName};
use crate::xpath::IdentityPath;

use super::complex_types::TypeDefinition;
use super::elements::XsdElement;
use super::exceptions::Diagnostic;
use super::simple_types::ValidatedInfo;
use super::value_stores::{FieldSlot, StoreKey, ValueStoreCache};

/// Identity constraint category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCategory {
    /// xs:unique
    Unique,
    /// xs:key
    Key,
    /// xs:keyref
    KeyRef,
}

/// An identity constraint definition
#[derive(Debug, Clone)]
pub struct XsdIdentity {
    /// Constraint name
    pub name: QName,
    /// Category
    pub category: IdentityCategory,
    /// Selector path
    pub selector: IdentityPath,
    /// Field paths
    pub fields: Vec<IdentityPath>,
    /// Referenced key or unique (keyref only)
    pub refer: Option<QName>,
}

impl XsdIdentity {
    /// Check if this is a key constraint
    pub fn is_key(&self) -> bool {
        self.category == IdentityCategory::Key
    }

    /// Check if this is a keyref constraint
    pub fn is_keyref(&self) -> bool {
        self.category == IdentityCategory::KeyRef
    }
}

/// Builder for identity constraints
#[derive(Debug)]
pub struct IdentityBuilder {
    name: Option<QName>,
    category: IdentityCategory,
    selector: Option<String>,
    fields: Vec<String>,
    refer: Option<QName>,
    namespaces: NamespaceContext,
}

impl IdentityBuilder {
    fn new(category: IdentityCategory) -> Self {
        Self {
            name: None,
            category,
            selector: None,
            fields: Vec::new(),
            refer: None,
            namespaces: NamespaceContext::new(),
        }
    }

    /// Create a builder for a unique constraint
    pub fn unique() -> Self {
        Self::new(IdentityCategory::Unique)
    }

    /// Create a builder for a key constraint
    pub fn key() -> Self {
        Self::new(IdentityCategory::Key)
    }

    /// Create a builder for a keyref constraint
    pub fn keyref() -> Self {
        Self::new(IdentityCategory::KeyRef)
    }

    /// Set the constraint name
    pub fn name(mut self, name: QName) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the selector
    pub fn selector(mut self, xpath: impl Into<String>) -> Self {
        self.selector = Some(xpath.into());
        self
    }

    /// Add a field
    pub fn field(mut self, xpath: impl Into<String>) -> Self {
        self.fields.push(xpath.into());
        self
    }

    /// Set the refer attribute (for keyref)
    pub fn refer(mut self, refer: QName) -> Self {
        self.refer = Some(refer);
        self
    }

    /// Namespace bindings in scope for the XPath expressions
    pub fn namespaces(mut self, namespaces: NamespaceContext) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Build the identity constraint
    pub fn build(self) -> Result<XsdIdentity> {
        let name = self
            .name
            .ok_or_else(|| SchemaError::new("identity constraint must have a name"))?;
        let component = name.to_string();

        let selector = self.selector.ok_or_else(|| {
            SchemaError::new("identity constraint must have a selector").with_component(&component)
        })?;
        if self.fields.is_empty() {
            return Err(SchemaError::new("identity constraint must have at least one field")
                .with_component(&component)
                .into());
        }
        if self.category == IdentityCategory::KeyRef && self.refer.is_none() {
            return Err(SchemaError::new("keyref must have a 'refer' attribute")
                .with_component(&component)
                .into());
        }

        let selector = IdentityPath::selector(&selector, &self.namespaces)?;
        let fields = self
            .fields
            .iter()
            .map(|f| IdentityPath::field(f, &self.namespaces))
            .collect::<Result<Vec<_>>>()?;

        Ok(XsdIdentity {
            name,
            category: self.category,
            selector,
            fields,
            refer: self.refer,
        })
    }
}

/// An attribute of the current element as seen by field matchers
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidate<'a> {
    /// Attribute name
    pub name: &'a QName,
    /// Validated value, if the attribute was validated
    pub value: Option<&'a ValidatedInfo>,
}

/// What field matchers see of an element when it ends
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementContent<'a> {
    /// Governing type
    pub type_def: Option<&'a TypeDefinition>,
    /// xsi:nil was true
    pub nil: bool,
    /// Validated simple content
    pub value: Option<&'a ValidatedInfo>,
}

#[derive(Debug)]
struct SelectorMatcher {
    identity: Arc<XsdIdentity>,
    store: StoreKey,
    path: Vec<QName>,
    started: bool,
    selected: Vec<usize>,
}

impl SelectorMatcher {
    /// Returns true if the element is selected
    fn start(&mut self, name: &QName) -> bool {
        if self.started {
            self.path.push(name.clone());
        } else {
            self.started = true;
        }
        if self.identity.selector.matches_element(&self.path) {
            self.selected.push(self.path.len());
            true
        } else {
            false
        }
    }

    /// Returns true if a selected element ended
    fn end(&mut self) -> bool {
        let ended = self.selected.last() == Some(&self.path.len());
        if ended {
            self.selected.pop();
        }
        self.path.pop();
        ended
    }
}

#[derive(Debug)]
struct FieldMatcher {
    identity: Arc<XsdIdentity>,
    field: usize,
    store: StoreKey,
    scope: usize,
    path: Vec<QName>,
    started: bool,
}

impl FieldMatcher {
    fn start(
        &mut self,
        name: &QName,
        attributes: &[FieldCandidate<'_>],
        stores: &mut ValueStoreCache,
        errors: &mut Vec<Diagnostic>,
    ) {
        if self.started {
            self.path.push(name.clone());
        } else {
            self.started = true;
        }
        let field = &self.identity.fields[self.field];
        for test in field.attribute_tests(&self.path) {
            for attr in attributes.iter().filter(|a| test.matches(a.name)) {
                if let (Some(value), Some(store)) = (attr.value, stores.store_mut(&self.store)) {
                    store.add_value(self.scope, self.field, FieldSlot::Value(value.clone().into()), errors);
                }
            }
        }
    }

    fn end(
        &mut self,
        element: &QName,
        content: &ElementContent<'_>,
        stores: &mut ValueStoreCache,
        errors: &mut Vec<Diagnostic>,
    ) {
        let field = &self.identity.fields[self.field];
        if field.matches_element(&self.path) {
            let simple = content
                .type_def
                .map_or(false, |t| t.content_simple_type().is_some());
            if !simple {
                errors.push(Diagnostic::new(
                    "cvc-identity-constraint.3",
                    [field.xpath.clone(), self.identity.name.to_string(), element.to_string()],
                ));
            } else if let Some(store) = stores.store_mut(&self.store) {
                if content.nil {
                    if self.identity.is_key() {
                        errors.push(Diagnostic::new(
                            "KeyMatchesNillable",
                            [element.to_string(), self.identity.name.to_string()],
                        ));
                    }
                    store.add_value(self.scope, self.field, FieldSlot::Nil, errors);
                } else if let Some(value) = content.value {
                    store.add_value(self.scope, self.field, FieldSlot::Value(value.clone().into()), errors);
                }
            }
        }
        self.path.pop();
    }
}

#[derive(Debug)]
enum Matcher {
    Selector(SelectorMatcher),
    Field(FieldMatcher),
}

/// Streaming evaluator of unique/key/keyref constraints
#[derive(Debug, Default)]
pub struct IdentityConstraintEngine {
    matchers: Vec<Matcher>,
    contexts: Vec<usize>,
    names: Vec<QName>,
    stores: ValueStoreCache,
    errors: Vec<Diagnostic>,
}

impl IdentityConstraintEngine {
    /// Create an idle engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Current element depth
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// Number of active matchers
    pub fn active_matchers(&self) -> usize {
        self.matchers.len()
    }

    /// An element started.
    ///
    /// `declaration` activates the constraints it carries; `attributes`
    /// must already be validated.
    pub fn start_element(
        &mut self,
        name: &QName,
        declaration: Option<&XsdElement>,
        attributes: &[FieldCandidate<'_>],
    ) {
        let depth = self.contexts.len();
        self.stores.start_element();
        self.contexts.push(self.matchers.len());
        self.names.push(name.clone());

        if let Some(decl) = declaration {
            for identity in &decl.identities {
                let store = self
                    .stores
                    .init_store(identity.clone(), decl.name.clone(), depth);
                tracing::trace!(constraint = %identity.name, depth, "identity constraint activated");
                self.matchers.push(Matcher::Selector(SelectorMatcher {
                    identity: identity.clone(),
                    store,
                    path: Vec::new(),
                    started: false,
                    selected: Vec::new(),
                }));
            }
        }

        let Self {
            matchers,
            stores,
            errors,
            ..
        } = self;
        let count = matchers.len();
        for i in 0..count {
            let activated = match &mut matchers[i] {
                Matcher::Field(field) => {
                    field.start(name, attributes, stores, errors);
                    None
                }
                Matcher::Selector(selector) => {
                    if selector.start(name) {
                        Some((selector.identity.clone(), selector.store.clone()))
                    } else {
                        None
                    }
                }
            };
            let Some((identity, store_key)) = activated else {
                continue;
            };
            let Some(store) = stores.store_mut(&store_key) else {
                continue;
            };
            let scope = store.start_value_scope();
            for field in 0..identity.fields.len() {
                let mut matcher = FieldMatcher {
                    identity: identity.clone(),
                    field,
                    store: store_key.clone(),
                    scope,
                    path: Vec::new(),
                    started: false,
                };
                matcher.start(name, attributes, stores, errors);
                matchers.push(Matcher::Field(matcher));
            }
        }
    }

    /// The current element ended
    pub fn end_element(&mut self, content: ElementContent<'_>) {
        let Some(mark) = self.contexts.pop() else {
            return;
        };
        let element = self.names.pop().unwrap_or_else(|| QName::local(""));

        let Self {
            matchers,
            stores,
            errors,
            ..
        } = self;
        for matcher in matchers.iter_mut().rev() {
            match matcher {
                Matcher::Field(field) => field.end(&element, &content, stores, errors),
                Matcher::Selector(selector) => {
                    if selector.end() {
                        if let Some(store) = stores.store_mut(&selector.store) {
                            store.end_value_scope(errors);
                        }
                    }
                }
            }
        }

        let finished: Vec<Matcher> = matchers.drain(mark..).collect();
        let selectors = finished.iter().rev().filter_map(|m| match m {
            Matcher::Selector(s) => Some(s),
            Matcher::Field(_) => None,
        });
        let (keyrefs, others): (Vec<_>, Vec<_>) = selectors.partition(|s| s.identity.is_keyref());
        for selector in others {
            stores.transplant(&selector.store);
        }
        for selector in keyrefs {
            stores.end_keyref(&selector.store, errors);
        }
        stores.end_element();
    }

    /// Take the errors raised since the last call
    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    /// Drop all matchers and value stores
    pub fn reset(&mut self) {
        self.matchers.clear();
        self.contexts.clear();
        self.names.clear();
        self.stores.clear();
        self.errors.clear();
    }
}
