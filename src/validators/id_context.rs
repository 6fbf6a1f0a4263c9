//! ID/IDREF table
//!
//! Every element gets a fresh binding scope. Attribute IDs are bound to the
//! scope of the element they occur on. Once the attributes are done the
//! element switches to its parent's scope, so ID-typed simple content binds
//! to the parent. In XSD 1.1 the same value bound twice in one scope is a
//! single binding: `<p id="x"><c>x</c></p>` binds `x` once, while
//! `<c id="x">x</c>` binds it in two scopes.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::settings::SchemaVersion;

/// ID bindings and pending IDREFs of one document
#[derive(Debug, Default, Clone)]
pub struct IdContext {
    ids: HashMap<String, usize>,
    idrefs: IndexSet<String>,
    /// (own scope, scope new bindings go to) per open element
    scopes: Vec<(usize, usize)>,
    next_scope: usize,
    version: SchemaVersion,
}

impl IdContext {
    /// Create an empty context
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Enter an element
    pub fn push_scope(&mut self) {
        self.next_scope += 1;
        self.scopes.push((self.next_scope, self.next_scope));
    }

    /// Bind the rest of the current element's IDs in its parent's scope
    pub fn set_scope_to_parent(&mut self) {
        let parent = match self.scopes.len() {
            0 | 1 => 0,
            n => self.scopes[n - 2].0,
        };
        if let Some(top) = self.scopes.last_mut() {
            top.1 = parent;
        }
    }

    /// Leave an element
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn current_scope(&self) -> usize {
        self.scopes.last().map_or(0, |&(_, current)| current)
    }

    /// Bind an ID; returns false if the value is already bound
    pub fn add_id(&mut self, value: &str) -> bool {
        let scope = self.current_scope();
        match self.ids.get(value) {
            None => {
                self.ids.insert(value.to_string(), scope);
                true
            }
            Some(&bound) => self.version.is_1_1() && bound == scope,
        }
    }

    /// Whether an ID is bound
    pub fn contains_id(&self, value: &str) -> bool {
        self.ids.contains_key(value)
    }

    /// Record an IDREF for resolution at the end of the validation root
    pub fn add_idref(&mut self, value: &str) {
        self.idrefs.insert(value.to_string());
    }

    /// IDREFs with no matching ID, in first-seen order
    pub fn unresolved_idrefs(&self) -> Vec<String> {
        self.idrefs
            .iter()
            .filter(|r| !self.ids.contains_key(r.as_str()))
            .cloned()
            .collect()
    }

    /// Forget everything, keeping the schema version
    pub fn clear(&mut self) {
        self.ids.clear();
        self.idrefs.clear();
        self.scopes.clear();
        self.next_scope = 0;
    }

    /// Change the schema version (takes effect for new bindings)
    pub fn set_version(&mut self, version: SchemaVersion) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids() {
        let mut ctx = IdContext::new(SchemaVersion::V1_0);
        ctx.push_scope();
        assert!(ctx.add_id("a"));
        assert!(!ctx.add_id("a"));
        ctx.push_scope();
        assert!(!ctx.add_id("a"));
        assert!(ctx.add_id("b"));
    }

    #[test]
    fn test_same_scope_binding_1_1() {
        let mut ctx = IdContext::new(SchemaVersion::V1_1);
        ctx.push_scope();
        assert!(ctx.add_id("a"));
        assert!(ctx.add_id("a"));
        ctx.pop_scope();
        ctx.push_scope();
        assert!(!ctx.add_id("a"));
    }

    #[test]
    fn test_content_binds_in_parent_scope_1_1() {
        // <p id="x"><c>x</c></p>
        let mut ctx = IdContext::new(SchemaVersion::V1_1);
        ctx.push_scope();
        assert!(ctx.add_id("x"));
        ctx.set_scope_to_parent();
        ctx.push_scope();
        ctx.set_scope_to_parent();
        assert!(ctx.add_id("x"));
        ctx.pop_scope();
        ctx.pop_scope();

        // <c id="y">y</c>
        ctx.push_scope();
        assert!(ctx.add_id("y"));
        ctx.set_scope_to_parent();
        assert!(!ctx.add_id("y"));
    }

    #[test]
    fn test_unresolved_idrefs() {
        let mut ctx = IdContext::new(SchemaVersion::V1_0);
        ctx.push_scope();
        ctx.add_idref("x");
        ctx.add_idref("a");
        ctx.add_idref("x");
        ctx.add_id("a");
        assert_eq!(ctx.unresolved_idrefs(), vec!["x".to_string()]);
        ctx.clear();
        assert!(ctx.unresolved_idrefs().is_empty());
        assert!(!ctx.contains_id("a"));
    }
}
