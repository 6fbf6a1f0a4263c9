//! Identity-constraint value stores
//!
//! A value store accumulates the field tuples of one identity-constraint
//! activation (a constraint on one element instance). The cache keeps the
//! stores local to their activation until the declaring element ends; then
//! key and unique stores are moved to a per-scope global map where keyrefs
//! of enclosing elements can see them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::namespaces::QName;

use super::exceptions::Diagnostic;
use super::identities::{IdentityCategory, XsdIdentity};
use super::simple_types::ValidatedInfo;

/// A typed field value
#[derive(Debug, Clone)]
pub struct FieldValue {
    /// The validated value
    pub info: ValidatedInfo,
}

impl FieldValue {
    /// Wrap a validated value
    pub fn new(info: ValidatedInfo) -> Self {
        Self { info }
    }
}

impl From<ValidatedInfo> for FieldValue {
    fn from(info: ValidatedInfo) -> Self {
        Self::new(info)
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.info.is_value_equal(&other.info)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info.normalized)
    }
}

/// A complete field tuple
pub type FieldTuple = Vec<FieldValue>;

fn tuple_to_string(tuple: &[FieldValue]) -> String {
    tuple
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// What a field contributed in the current selector scope
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSlot {
    /// No match yet
    Empty,
    /// Matched a value
    Value(FieldValue),
    /// Matched a nilled element
    Nil,
}

impl FieldSlot {
    fn is_empty(&self) -> bool {
        matches!(self, FieldSlot::Empty)
    }
}

/// Field tuples of one identity-constraint activation
#[derive(Debug, Clone)]
pub struct ValueStore {
    identity: Arc<XsdIdentity>,
    element: QName,
    scopes: Vec<Vec<FieldSlot>>,
    tuples: Vec<FieldTuple>,
}

impl ValueStore {
    /// Create a store for a constraint declared on `element`
    pub fn new(identity: Arc<XsdIdentity>, element: QName) -> Self {
        Self {
            identity,
            element,
            scopes: Vec::new(),
            tuples: Vec::new(),
        }
    }

    /// The constraint
    pub fn identity(&self) -> &Arc<XsdIdentity> {
        &self.identity
    }

    /// Committed tuples
    pub fn tuples(&self) -> &[FieldTuple] {
        &self.tuples
    }

    /// Whether a tuple was committed
    pub fn contains(&self, tuple: &[FieldValue]) -> bool {
        self.tuples.iter().any(|t| t.as_slice() == tuple)
    }

    /// A selector matched an element: open a fresh tuple.
    ///
    /// Returns the scope index the field matchers of that element write to.
    pub fn start_value_scope(&mut self) -> usize {
        self.scopes
            .push(vec![FieldSlot::Empty; self.identity.fields.len()]);
        self.scopes.len() - 1
    }

    /// Record a field match.
    ///
    /// A second match of the same field keeps the first value. The tuple is
    /// committed as soon as every field has matched.
    pub fn add_value(
        &mut self,
        scope: usize,
        field: usize,
        slot: FieldSlot,
        errors: &mut Vec<Diagnostic>,
    ) {
        let Some(slots) = self.scopes.get_mut(scope) else {
            return;
        };
        if field >= slots.len() {
            return;
        }
        if !slots[field].is_empty() {
            errors.push(Diagnostic::new(
                "FieldMultipleMatch",
                [self.identity.fields[field].xpath.clone()],
            ));
            return;
        }
        slots[field] = slot;
        if slots.iter().any(FieldSlot::is_empty) {
            return;
        }

        let mut tuple = Vec::with_capacity(slots.len());
        for slot in slots.iter() {
            match slot {
                FieldSlot::Value(v) => tuple.push(v.clone()),
                // nilled fields never form a tuple
                _ => return,
            }
        }
        self.commit(tuple, errors);
    }

    fn commit(&mut self, tuple: FieldTuple, errors: &mut Vec<Diagnostic>) {
        let key = match self.identity.category {
            IdentityCategory::Unique => Some("DuplicateUnique"),
            IdentityCategory::Key => Some("DuplicateKey"),
            IdentityCategory::KeyRef => None,
        };
        if let Some(key) = key {
            if self.contains(&tuple) {
                errors.push(Diagnostic::new(
                    key,
                    [
                        tuple_to_string(&tuple),
                        self.element.to_string(),
                        self.identity.name.to_string(),
                    ],
                ));
                return;
            }
        }
        tracing::trace!(
            constraint = %self.identity.name,
            tuple = %tuple_to_string(&tuple),
            "identity tuple committed"
        );
        self.tuples.push(tuple);
    }

    /// The selected element ended: close its tuple
    pub fn end_value_scope(&mut self, errors: &mut Vec<Diagnostic>) {
        let Some(slots) = self.scopes.pop() else {
            return;
        };
        if self.identity.category != IdentityCategory::Key {
            return;
        }
        let matched = slots.iter().filter(|s| !s.is_empty()).count();
        let args = [self.element.to_string(), self.identity.name.to_string()];
        if matched == 0 {
            errors.push(Diagnostic::new("AbsentKeyValue", args));
        } else if matched < slots.len() {
            errors.push(Diagnostic::new("KeyNotEnoughValues", args));
        }
    }

    /// Concatenate the tuples of another activation of the same constraint
    pub fn append(&mut self, other: ValueStore) {
        self.tuples.extend(other.tuples);
    }

    /// Check keyref tuples against the referenced key or unique store
    pub fn resolve_keyref(&self, key_store: Option<&ValueStore>, errors: &mut Vec<Diagnostic>) {
        let Some(key_store) = key_store else {
            errors.push(Diagnostic::new(
                "KeyRefOutOfScope",
                [self.identity.name.to_string()],
            ));
            return;
        };
        let mut reported: Vec<&FieldTuple> = Vec::new();
        for tuple in &self.tuples {
            if key_store.contains(tuple) || reported.contains(&tuple) {
                continue;
            }
            errors.push(Diagnostic::new(
                "KeyNotFound",
                [
                    self.identity.name.to_string(),
                    tuple_to_string(tuple),
                    self.element.to_string(),
                ],
            ));
            reported.push(tuple);
        }
    }
}

/// Key of a local value store: constraint name and the depth of the
/// element that activated it
pub type StoreKey = (QName, usize);

/// Local and scoped-global value stores
#[derive(Debug, Default)]
pub struct ValueStoreCache {
    local: IndexMap<StoreKey, ValueStore>,
    global: HashMap<QName, ValueStore>,
    global_stack: Vec<Option<HashMap<QName, ValueStore>>>,
}

impl ValueStoreCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element: its subtree starts with an empty global map
    pub fn start_element(&mut self) {
        if self.global.is_empty() {
            self.global_stack.push(None);
        } else {
            self.global_stack.push(Some(std::mem::take(&mut self.global)));
        }
    }

    /// Leave an element: merge the enclosing scope's stores back
    pub fn end_element(&mut self) {
        let Some(Some(saved)) = self.global_stack.pop() else {
            return;
        };
        for (name, store) in saved {
            match self.global.get_mut(&name) {
                Some(current) => current.append(store),
                None => {
                    self.global.insert(name, store);
                }
            }
        }
    }

    /// Create the store for a constraint activated at `depth`
    pub fn init_store(&mut self, identity: Arc<XsdIdentity>, element: QName, depth: usize) -> StoreKey {
        let key = (identity.name.clone(), depth);
        self.local
            .insert(key.clone(), ValueStore::new(identity, element));
        key
    }

    /// Local store lookup
    pub fn store_mut(&mut self, key: &StoreKey) -> Option<&mut ValueStore> {
        self.local.get_mut(key)
    }

    /// Move a finished key or unique store into the global map
    pub fn transplant(&mut self, key: &StoreKey) {
        let Some(store) = self.local.shift_remove(key) else {
            return;
        };
        if store.identity.category == IdentityCategory::KeyRef {
            self.local.insert(key.clone(), store);
            return;
        }
        match self.global.get_mut(&key.0) {
            Some(current) => current.append(store),
            None => {
                self.global.insert(key.0.clone(), store);
            }
        }
    }

    /// Resolve a finished keyref store and drop it
    pub fn end_keyref(&mut self, key: &StoreKey, errors: &mut Vec<Diagnostic>) {
        let Some(store) = self.local.shift_remove(key) else {
            return;
        };
        let refer = store.identity.refer.as_ref();
        let key_store = refer.and_then(|r| self.global.get(r));
        store.resolve_keyref(key_store, errors);
    }

    /// Global store of a constraint in the current scope
    pub fn global_store(&self, name: &QName) -> Option<&ValueStore> {
        self.global.get(name)
    }

    /// Drop every store
    pub fn clear(&mut self) {
        self.local.clear();
        self.global.clear();
        self.global_stack.clear();
    }
}
