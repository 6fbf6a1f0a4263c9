//! Document Validation
//!
//! The streaming element validation loop. A host feeds start/characters/end
//! events; each element is matched against its parent's content model,
//! given a governing declaration and type, validated, and annotated with
//! its post-schema-validation infoset.
//!
//! [validation attempted] is computed in constant time per element from
//! two depth markers: the deepest open element at or below which something
//! was validated, and the deepest at or below which something was not.
//! Markers are lowered to the parent's depth when an element ends, so
//! siblings never see each other's state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::names::is_valid_qname;
use crate::namespaces::{xsi, NamespaceContext, QName, XSI_NAMESPACE};
use crate::settings::ValidatorSettings;

use super::attribute_validation::XmlAttributes;
use super::base::{ValidationMode, ValidationStatus, ValidityStatus};
use super::builtins::BuiltinKind;
use super::checker::SchemaConstraintChecker;
use super::complex_types::{ComplexContent, TypeDefinition, TypeRef, XsdComplexType};
use super::derivation::check_type_derivation_ok;
use super::elements::{ValueConstraint, XsdElement};
use super::exceptions::{CollectingReporter, Diagnostic, ErrorContextStack, ErrorReporter, ValidationError};
use super::globals::{
    parse_no_namespace_schema_location, parse_schema_location, GrammarBucket, GrammarRequest,
    GrammarResolver, NoResolver, ResolutionTrigger, SchemaGrammar, SchemaLocationHint,
};
use super::id_context::IdContext;
use super::identities::{ElementContent, FieldCandidate, IdentityConstraintEngine};
use super::models::{ContentModel, ModelState, Transition};
use super::psvi::{ElementPsvi, TypeInfo};
use super::simple_types::{ValidatedInfo, XsdSimpleType};

/// Depth bookkeeping of [validation attempted]; `-1` means unset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthMarkers {
    /// Deepest open element at or below which an element was validated
    pub last_full: isize,
    /// Deepest open element at or below which an element was not validated
    pub last_none: isize,
    /// Root of the subtree being skipped
    pub skip: isize,
}

impl Default for DepthMarkers {
    fn default() -> Self {
        Self {
            last_full: -1,
            last_none: -1,
            skip: -1,
        }
    }
}

#[derive(Debug)]
struct Frame {
    name: QName,
    declaration: Option<Arc<XsdElement>>,
    /// `None` when the element is not assessed
    type_def: Option<TypeDefinition>,
    nil: bool,
    model: Option<Arc<ContentModel>>,
    state: ModelState,
    saw_child: bool,
    saw_non_whitespace: bool,
    text: String,
    namespaces: NamespaceContext,
}

impl Frame {
    fn collects_text(&self) -> bool {
        match &self.type_def {
            Some(TypeDefinition::Simple(_)) => true,
            Some(TypeDefinition::Complex(c)) => {
                matches!(c.content, ComplexContent::Simple(_) | ComplexContent::Mixed(_))
            }
            None => false,
        }
    }
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn expected_list(expected: &[String]) -> String {
    format!("{{{}}}", expected.join(", "))
}

/// The content error for a child the model did not accept
fn unexpected_child(model: &ContentModel, state: &ModelState, child: &QName) -> Diagnostic {
    let expected = model.what_can_go_here(state);
    let info = model.occurrence_info(state);
    let child = child.to_string();
    if !expected.is_empty() {
        match info {
            Some(i) if i.count < i.min => {
                if i.missing() > 1 {
                    Diagnostic::new(
                        "cvc-complex-type.2.4.j",
                        [child, i.term.clone(), i.min.to_string(), i.missing().to_string()],
                    )
                } else {
                    Diagnostic::new("cvc-complex-type.2.4.g", [child, i.term.clone(), i.min.to_string()])
                }
            }
            Some(i) if i.is_max_reached() => Diagnostic::new(
                "cvc-complex-type.2.4.e",
                [child, expected_list(&expected), i.max.unwrap_or(0).to_string()],
            ),
            _ => Diagnostic::new("cvc-complex-type.2.4.a", [child, expected_list(&expected)]),
        }
    } else {
        match info {
            Some(i) if i.is_max_reached() => {
                Diagnostic::new("cvc-complex-type.2.4.f", [child, i.max.unwrap_or(0).to_string()])
            }
            _ => Diagnostic::new("cvc-complex-type.2.4.d", [child]),
        }
    }
}

/// The content error for an element whose content ended too early
fn incomplete_content(model: &ContentModel, state: &ModelState, element: &QName) -> Diagnostic {
    let element = element.to_string();
    match model.occurrence_info(state) {
        Some(i) if i.count < i.min && i.missing() > 1 => Diagnostic::new(
            "cvc-complex-type.2.4.j",
            [element, i.term.clone(), i.min.to_string(), i.missing().to_string()],
        ),
        Some(i) if i.count < i.min => {
            Diagnostic::new("cvc-complex-type.2.4.g", [element, i.term.clone(), i.min.to_string()])
        }
        _ => Diagnostic::new(
            "cvc-complex-type.2.4.b",
            [element, expected_list(&model.what_can_go_here(state))],
        ),
    }
}

/// Streaming XML Schema validator.
///
/// One instance validates one document at a time; call [`reset`](Self::reset)
/// between documents.
pub struct XmlSchemaValidator<R: ErrorReporter = CollectingReporter> {
    pub(super) settings: ValidatorSettings,
    pub(super) grammars: GrammarBucket,
    resolver: Box<dyn GrammarResolver>,
    pub(super) reporter: R,
    pub(super) contexts: ErrorContextStack,
    pub(super) ids: IdContext,
    frames: Vec<Frame>,
    path: Vec<String>,
    depth: isize,
    markers: DepthMarkers,
    detached: bool,
    validation_root: Option<String>,
    hints: Vec<SchemaLocationHint>,
    base_uri: Option<Url>,
    models: HashMap<usize, Arc<ContentModel>>,
    identities: IdentityConstraintEngine,
    checker: SchemaConstraintChecker,
}

impl XmlSchemaValidator<CollectingReporter> {
    /// Create a validator over a set of grammars, collecting errors
    pub fn new(grammars: GrammarBucket) -> Self {
        Self::with_reporter(grammars, CollectingReporter::new())
    }
}

impl<R: ErrorReporter> XmlSchemaValidator<R> {
    /// Create a validator delivering errors to `reporter`
    pub fn with_reporter(grammars: GrammarBucket, reporter: R) -> Self {
        let settings = ValidatorSettings::default();
        Self {
            ids: IdContext::new(settings.schema_version),
            settings,
            grammars,
            resolver: Box::new(NoResolver),
            reporter,
            contexts: ErrorContextStack::new(),
            frames: Vec::new(),
            path: Vec::new(),
            depth: -1,
            markers: DepthMarkers::default(),
            detached: false,
            validation_root: None,
            hints: Vec::new(),
            base_uri: None,
            models: HashMap::new(),
            identities: IdentityConstraintEngine::new(),
            checker: SchemaConstraintChecker::new(),
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: ValidatorSettings) -> Result<Self> {
        settings.check()?;
        self.ids.set_version(settings.schema_version);
        self.settings = settings;
        Ok(self)
    }

    /// Use a grammar resolver for namespaces without a grammar
    pub fn with_resolver(mut self, resolver: impl GrammarResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Base URI against which location hints are resolved
    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// The settings in use
    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// The grammars known so far
    pub fn grammars(&self) -> &GrammarBucket {
        &self.grammars
    }

    /// Add a grammar
    pub fn add_grammar(&mut self, grammar: impl Into<Arc<SchemaGrammar>>) {
        self.grammars.add(grammar);
        self.models.clear();
    }

    /// The error reporter
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// The error reporter, mutably
    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Consume the validator, returning its reporter
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Whether the validator stopped validating the current document
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Depth of the current element, `-1` outside the root
    pub fn depth(&self) -> isize {
        self.depth
    }

    /// Current [validation attempted] depth markers
    pub fn depth_markers(&self) -> DepthMarkers {
        self.markers
    }

    /// Forget the current document and everything reported so far
    pub fn reset(&mut self) {
        self.reset_state();
        self.reporter.reset();
        self.checker.reset();
    }

    fn reset_state(&mut self) {
        self.frames.clear();
        self.path.clear();
        self.depth = -1;
        self.markers = DepthMarkers::default();
        self.detached = false;
        self.validation_root = None;
        self.hints.clear();
        self.contexts.clear();
        self.identities.reset();
        self.ids.clear();
        self.ids.set_version(self.settings.schema_version);
    }

    /// A document starts
    pub fn start_document(&mut self) -> Result<()> {
        self.reset_state();
        debug!(grammars = self.grammars.len(), "start document");
        Ok(())
    }

    /// The document ended
    pub fn end_document(&mut self) -> Result<()> {
        if !self.frames.is_empty() && !self.detached {
            return Err(Error::EventStream(format!(
                "document ended with {} open elements",
                self.frames.len()
            )));
        }
        debug!(detached = self.detached, "end document");
        Ok(())
    }

    pub(super) fn report(&mut self, diagnostic: Diagnostic) -> Result<()> {
        let mut error = ValidationError::from(diagnostic);
        if !self.path.is_empty() {
            error = error.with_path(format!("/{}", self.path.join("/")));
        }
        self.contexts.record(error.key.clone());
        self.reporter.report(&error)
    }

    pub(super) fn error<I, S>(&mut self, key: &'static str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report(Diagnostic::new(key, args))
    }

    fn report_all(&mut self, diagnostics: Vec<Diagnostic>) -> Result<()> {
        diagnostics.into_iter().try_for_each(|d| self.report(d))
    }

    /// Find the grammar of a namespace, asking the resolver on a miss
    pub(super) fn find_grammar(
        &mut self,
        namespace: Option<&str>,
        trigger: ResolutionTrigger,
        enclosing_element: Option<&QName>,
    ) -> Result<bool> {
        if self.grammars.contains(namespace) {
            return Ok(true);
        }
        if self.settings.use_grammar_pool_only {
            return Ok(false);
        }
        let request = GrammarRequest {
            namespace,
            trigger,
            enclosing_element,
            hints: &self.hints,
        };
        match self.resolver.find_schema_grammar(&request)? {
            Some(grammar) => {
                debug!(namespace = ?namespace, ?trigger, "grammar added by resolver");
                self.add_grammar(grammar);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn content_model(&mut self, ctype: &XsdComplexType) -> Option<Arc<ContentModel>> {
        let particle = ctype.content.particle()?;
        let grammars = &self.grammars;
        let model = self
            .models
            .entry(ctype.id)
            .or_insert_with(|| Arc::new(ContentModel::build(particle, grammars)));
        Some(model.clone())
    }

    fn collect_hints(&mut self, attributes: &XmlAttributes, element: &QName) -> Result<()> {
        let mut added = Vec::new();
        let schema_location = QName::namespaced(XSI_NAMESPACE, xsi::SCHEMA_LOCATION);
        if let Some(value) = attributes.value(&schema_location) {
            added.extend(parse_schema_location(value, self.base_uri.as_ref()));
        }
        let no_namespace = QName::namespaced(XSI_NAMESPACE, xsi::NO_NAMESPACE_SCHEMA_LOCATION);
        if let Some(value) = attributes.value(&no_namespace) {
            added.extend(parse_no_namespace_schema_location(value, self.base_uri.as_ref()));
        }
        if added.is_empty() {
            return Ok(());
        }
        self.hints.extend(added.iter().cloned());
        for hint in added {
            self.find_grammar(hint.namespace.as_deref(), ResolutionTrigger::Hint, Some(element))?;
        }
        Ok(())
    }

    fn unassessed_psvi(&self, name: &QName) -> Option<ElementPsvi> {
        self.settings.augment_psvi.then(|| {
            let mut psvi = ElementPsvi::new(name.clone());
            psvi.validation_context = self.validation_root.clone().unwrap_or_default();
            psvi
        })
    }

    /// An element starts.
    ///
    /// `attributes` are validated in place and receive their PSVI;
    /// defaulted attributes are appended. `namespaces` are the bindings in
    /// scope on the element.
    pub fn start_element(
        &mut self,
        name: &QName,
        attributes: &mut XmlAttributes,
        namespaces: &NamespaceContext,
    ) -> Result<Option<ElementPsvi>> {
        if self.detached {
            return Ok(None);
        }
        if self.markers.skip >= 0 {
            self.depth += 1;
            return Ok(self.unassessed_psvi(name));
        }

        // the parent's content model decides first
        let mut declaration = None;
        let mut wildcard = None;
        let mut content_error = None;
        let grammars = &self.grammars;
        if let Some(parent) = self.frames.last_mut() {
            parent.saw_child = true;
            if let Some(model) = &parent.model {
                let is_defined = |n: &QName| grammars.element(n).is_some();
                match model.transition(name, &mut parent.state, &is_defined) {
                    Transition::Element(decl) => declaration = Some(decl),
                    Transition::Wildcard(w) => wildcard = Some(w),
                    Transition::NoMatch => {}
                }
                if parent.state.is_first_error() {
                    content_error = Some(unexpected_child(model, &parent.state, name));
                }
            }
        }
        if let Some(diagnostic) = content_error {
            self.report(diagnostic)?;
        }

        self.depth += 1;
        if let Some(max_depth) = self.settings.max_depth {
            if self.depth + 1 > max_depth as isize {
                return Err(Error::LimitExceeded(format!(
                    "element '{}' exceeds the maximum depth of {}",
                    name, max_depth
                )));
            }
        }
        if matches!(&wildcard, Some(w) if w.process_contents == ValidationMode::Skip) {
            self.markers.skip = self.depth;
            trace!(element = %name, depth = self.depth, "skipping subtree");
            return Ok(self.unassessed_psvi(name));
        }

        if self.depth == 0 {
            self.validation_root = Some(name.to_string());
            debug!(root = %name, "validation root");
        }
        self.path.push(name.to_string());
        self.collect_hints(attributes, name)?;

        // stipulated root, then global lookup
        let mut pending = Vec::new();
        let mut type_def = None;
        if self.depth == 0 {
            if let Some(root) = self.settings.root_element_declaration.clone() {
                self.find_grammar(root.ns(), ResolutionTrigger::Element, Some(name))?;
                declaration = self.grammars.element(&root);
                if declaration.is_none() {
                    pending.push(Diagnostic::new("src-resolve", [root.to_string(), "element declaration".to_string()]));
                }
            } else if let Some(root_type) = self.settings.root_type_definition.clone() {
                self.find_grammar(root_type.ns(), ResolutionTrigger::XsiType, Some(name))?;
                type_def = self.grammars.type_definition(&root_type);
                if type_def.is_none() {
                    pending.push(Diagnostic::new("src-resolve", [root_type.to_string(), "type definition".to_string()]));
                }
            }
        }
        if declaration.is_none() && type_def.is_none() && self.find_grammar(name.ns(), ResolutionTrigger::Element, None)? {
            declaration = self.grammars.element(name);
        }
        if let Some(decl) = &declaration {
            type_def = self.grammars.resolve_type(&decl.type_ref);
            if let (None, TypeRef::Named(type_name)) = (&type_def, &decl.type_ref) {
                pending.push(Diagnostic::new("src-resolve", [type_name.to_string(), "type definition".to_string()]));
            }
        }

        let xsi_type_name = QName::namespaced(XSI_NAMESPACE, xsi::TYPE);
        let xsi_type = if self.settings.ignore_xsi_type {
            None
        } else {
            attributes.value(&xsi_type_name).map(str::to_string)
        };
        if declaration.is_none() && type_def.is_none() {
            if matches!(&wildcard, Some(w) if w.process_contents == ValidationMode::Strict) {
                // an error in the parent's content
                self.path.pop();
                self.error("cvc-complex-type.2.4.c", [name.to_string()])?;
                self.path.push(name.to_string());
            } else if self.depth == 0 && xsi_type.is_none() {
                if self.settings.dynamic_validation {
                    debug!(root = %name, "no declaration for the root, detaching");
                    self.detached = true;
                    self.path.pop();
                    return Ok(None);
                }
                if self.settings.validate_content == ValidationMode::Strict {
                    pending.push(Diagnostic::new("cvc-elt.1.a", [name.to_string()]));
                }
            }
        }

        self.contexts.push_context();
        self.report_all(pending)?;

        if let Some(value) = xsi_type {
            type_def = self.resolve_xsi_type(name, &value, declaration.as_deref(), type_def, namespaces)?;
        }

        let mut nil = false;
        let mut model = None;
        let mut state = ModelState::default();
        self.ids.push_scope();
        match &type_def {
            None => {
                self.markers.last_none = self.depth;
                // attributes are still assessed laxly through anyType's wildcard
                self.process_attributes(name, &TypeDefinition::any_type(), attributes, namespaces)?;
            }
            Some(t) => {
                self.markers.last_full = self.depth;
                if declaration.as_ref().map_or(false, |d| d.abstract_element) {
                    self.error("cvc-elt.2", [name.to_string()])?;
                }
                if t.is_abstract() {
                    self.error("cvc-type.2", [name.to_string()])?;
                }
                nil = self.check_nil(name, declaration.as_deref(), attributes)?;
                if let TypeDefinition::Complex(ctype) = t {
                    model = self.content_model(ctype);
                    if let Some(m) = &model {
                        state = m.start_state();
                    }
                }
                let t = t.clone();
                self.process_attributes(name, &t, attributes, namespaces)?;
            }
        }
        self.ids.set_scope_to_parent();

        if self.settings.identity_constraint_checking {
            let candidates: Vec<FieldCandidate<'_>> = attributes
                .iter()
                .map(|a| FieldCandidate {
                    name: &a.name,
                    value: a.validated(),
                })
                .collect();
            self.identities.start_element(name, declaration.as_deref(), &candidates);
            let errors = self.identities.take_errors();
            self.report_all(errors)?;
        }

        trace!(element = %name, depth = self.depth, assessed = type_def.is_some(), "push frame");
        let psvi = self.settings.augment_psvi.then(|| {
            let mut psvi = ElementPsvi::new(name.clone());
            psvi.validation_context = self.validation_root.clone().unwrap_or_default();
            psvi.element_declaration = declaration.as_ref().map(|d| d.name.clone());
            psvi.type_definition = type_def.as_ref().map(TypeInfo::from);
            psvi.nil = nil;
            psvi
        });
        self.frames.push(Frame {
            name: name.clone(),
            declaration,
            type_def,
            nil,
            model,
            state,
            saw_child: false,
            saw_non_whitespace: false,
            text: String::new(),
            namespaces: namespaces.clone(),
        });
        Ok(psvi)
    }

    /// Apply xsi:type; the previous type is kept when the override is rejected
    fn resolve_xsi_type(
        &mut self,
        element: &QName,
        value: &str,
        declaration: Option<&XsdElement>,
        current: Option<TypeDefinition>,
        namespaces: &NamespaceContext,
    ) -> Result<Option<TypeDefinition>> {
        let lexical = value.trim();
        let resolved = if is_valid_qname(lexical) {
            namespaces.resolve(lexical).ok()
        } else {
            None
        };
        let Some(type_name) = resolved else {
            self.error("cvc-elt.4.1", [element.to_string(), "xsi:type".to_string(), value.to_string()])?;
            return Ok(current);
        };

        self.find_grammar(type_name.ns(), ResolutionTrigger::XsiType, Some(element))?;
        let Some(xsi_type) = self.grammars.type_definition(&type_name) else {
            self.error("cvc-elt.4.2", [element.to_string(), value.to_string()])?;
            return Ok(current);
        };

        if let Some(current_type) = &current {
            let mut block = current_type.block();
            if let Some(decl) = declaration {
                block = block.union_with(decl.block);
            }
            if !check_type_derivation_ok(&xsi_type, current_type, block) {
                self.error(
                    "cvc-elt.4.3",
                    [element.to_string(), xsi_type.display_name(), current_type.display_name()],
                )?;
                return Ok(current);
            }
        }
        trace!(element = %element, xsi_type = %xsi_type.display_name(), "xsi:type applied");
        Ok(Some(xsi_type))
    }

    fn check_nil(
        &mut self,
        element: &QName,
        declaration: Option<&XsdElement>,
        attributes: &XmlAttributes,
    ) -> Result<bool> {
        let xsi_nil = QName::namespaced(XSI_NAMESPACE, xsi::NIL);
        let Some(value) = attributes.value(&xsi_nil).map(str::to_string) else {
            return Ok(false);
        };
        if let Some(decl) = declaration {
            if !decl.nillable {
                self.error("cvc-elt.3.1", [element.to_string(), "xsi:nil".to_string()])?;
                return Ok(false);
            }
        }
        let nil = match value.trim() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => {
                self.error("cvc-datatype-valid.1.2.1", [value.clone(), "boolean".to_string()])?;
                false
            }
        };
        if nil && declaration.and_then(|d| d.fixed()).is_some() {
            self.error("cvc-elt.3.2.2", [element.to_string(), "xsi:nil".to_string()])?;
        }
        Ok(nil)
    }

    /// Character data
    pub fn characters(&mut self, text: &str) -> Result<()> {
        if self.detached || self.markers.skip >= 0 {
            return Ok(());
        }
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        if !text.chars().all(is_xml_whitespace) {
            frame.saw_non_whitespace = true;
        }
        if frame.collects_text() {
            frame.text.push_str(text);
        }
        Ok(())
    }

    /// Whitespace the host knows to be insignificant
    pub fn ignorable_whitespace(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// An element ends
    pub fn end_element(&mut self, name: &QName) -> Result<Option<ElementPsvi>> {
        if self.detached {
            return Ok(None);
        }
        if self.markers.skip >= 0 {
            if self.markers.skip == self.depth {
                self.markers.skip = -1;
                self.markers.last_none = self.depth - 1;
            }
            self.depth -= 1;
            return Ok(self.unassessed_psvi(name));
        }

        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::EventStream(format!("unexpected end tag '{}'", name)))?;
        if frame.name != *name {
            return Err(Error::EventStream(format!(
                "end tag '{}' does not match start tag '{}'",
                name, frame.name
            )));
        }

        let mut psvi = ElementPsvi::new(frame.name.clone());
        let value = match &frame.type_def {
            Some(t) => self.validate_element_content(&frame, t, &mut psvi)?,
            None => None,
        };

        if self.settings.identity_constraint_checking {
            self.identities.end_element(ElementContent {
                type_def: frame.type_def.as_ref(),
                nil: frame.nil,
                value: value.as_ref(),
            });
            let errors = self.identities.take_errors();
            self.report_all(errors)?;
        }
        self.ids.pop_scope();

        if self.depth == 0 {
            if self.settings.id_idref_checking {
                for idref in self.ids.unresolved_idrefs() {
                    self.error("cvc-id.1", [idref])?;
                }
            }
            if self.settings.schema_full_checking {
                let findings = self.checker.check(&self.grammars, self.settings.schema_version);
                for finding in findings {
                    self.reporter.report(&ValidationError::from(finding))?;
                }
            }
        }

        let depth = self.depth;
        psvi.validation_attempted = if depth > self.markers.last_none {
            ValidationStatus::Full
        } else if depth > self.markers.last_full {
            ValidationStatus::None
        } else {
            ValidationStatus::Partial
        };
        if self.markers.last_full == depth {
            self.markers.last_full = depth - 1;
        }
        if self.markers.last_none == depth {
            self.markers.last_none = depth - 1;
        }

        if frame.type_def.is_some() {
            psvi.error_codes = self.contexts.merge_context();
            psvi.validity = if psvi.error_codes.is_empty() {
                ValidityStatus::Valid
            } else {
                ValidityStatus::Invalid
            };
        } else {
            // errors below a lax element never reach its ancestors
            psvi.error_codes = self.contexts.pop_context();
            psvi.validity = ValidityStatus::NotKnown;
        }
        psvi.validation_context = self.validation_root.clone().unwrap_or_default();
        psvi.element_declaration = frame.declaration.as_ref().map(|d| d.name.clone());
        psvi.type_definition = frame.type_def.as_ref().map(TypeInfo::from);
        psvi.nil = frame.nil;

        trace!(element = %name, depth, validity = %psvi.validity, "pop frame");
        self.path.pop();
        self.depth -= 1;
        if self.depth < 0 {
            self.contexts.clear();
        }
        Ok(self.settings.augment_psvi.then_some(psvi))
    }

    /// Check the content of an ended element against its type
    fn validate_element_content(
        &mut self,
        frame: &Frame,
        type_def: &TypeDefinition,
        psvi: &mut ElementPsvi,
    ) -> Result<Option<ValidatedInfo>> {
        let name = &frame.name;
        if frame.nil {
            if frame.saw_child || frame.saw_non_whitespace {
                self.error("cvc-elt.3.2.1", [name.to_string(), "xsi:nil".to_string()])?;
            }
            return Ok(None);
        }

        let constraint = frame.declaration.as_ref().and_then(|d| d.value_constraint.clone());
        let use_default = !frame.saw_child && frame.text.is_empty() && constraint.is_some();
        let text = match (&constraint, use_default) {
            (Some(c), true) => {
                psvi.schema_default = true;
                c.value().to_string()
            }
            _ => frame.text.clone(),
        };

        let mut value = None;
        match type_def {
            TypeDefinition::Simple(st) => {
                if frame.saw_child {
                    self.error("cvc-type.3.1.2", [name.to_string()])?;
                }
                value = self.validate_text(name, st, &text, &frame.namespaces, "cvc-type.3.1.3")?;
            }
            TypeDefinition::Complex(ctype) => match &ctype.content {
                ComplexContent::Empty => {
                    if frame.saw_child || frame.saw_non_whitespace {
                        self.error("cvc-complex-type.2.1", [name.to_string()])?;
                    }
                }
                ComplexContent::Simple(st) => {
                    if frame.saw_child {
                        self.error("cvc-complex-type.2.2", [name.to_string()])?;
                    }
                    value = self.validate_text(name, st, &text, &frame.namespaces, "cvc-complex-type.2.2")?;
                }
                ComplexContent::ElementOnly(_) | ComplexContent::Mixed(_) => {
                    if matches!(ctype.content, ComplexContent::ElementOnly(_)) && frame.saw_non_whitespace {
                        self.error("cvc-complex-type.2.3", [name.to_string()])?;
                    }
                    if let Some(model) = &frame.model {
                        if !model.end_content_model(&frame.state) {
                            self.report(incomplete_content(model, &frame.state, name))?;
                        }
                    }
                }
            },
        }

        if let (Some(ValueConstraint::Fixed(fixed)), false) = (&constraint, use_default) {
            if frame.saw_child {
                self.error("cvc-elt.5.2.2.1", [name.to_string()])?;
            } else if let Some(st) = type_def.content_simple_type() {
                if let Some(info) = &value {
                    let matches = st
                        .validate(fixed, &frame.namespaces)
                        .map_or(false, |f| f.is_value_equal(info));
                    if !matches {
                        self.error(
                            "cvc-elt.5.2.2.2.2",
                            [name.to_string(), info.normalized.clone(), fixed.clone()],
                        )?;
                    }
                }
            } else if text != *fixed {
                self.error("cvc-elt.5.2.2.2.1", [name.to_string(), text.clone(), fixed.clone()])?;
            }
        }

        if let Some(info) = &value {
            psvi.set_value(info, self.settings.normalize_data);
            if type_def
                .content_simple_type()
                .map_or(false, |st| st.derives_from_builtin(BuiltinKind::Notation))
            {
                psvi.notation = frame
                    .namespaces
                    .resolve(&info.normalized)
                    .ok()
                    .filter(|q| self.grammars.notation(q).is_some());
            }
        }
        Ok(value)
    }

    fn validate_text(
        &mut self,
        element: &QName,
        simple_type: &Arc<XsdSimpleType>,
        text: &str,
        namespaces: &NamespaceContext,
        error_key: &'static str,
    ) -> Result<Option<ValidatedInfo>> {
        match simple_type.validate(text, namespaces) {
            Ok(info) => {
                self.check_id_value(simple_type, &info)?;
                Ok(Some(info))
            }
            Err(invalid) => {
                self.report(invalid.into())?;
                self.error(error_key, [element.to_string(), text.to_string()])?;
                Ok(None)
            }
        }
    }

    /// Bind IDs and record IDREFs of a validated value
    pub(super) fn check_id_value(&mut self, simple_type: &XsdSimpleType, info: &ValidatedInfo) -> Result<()> {
        if !self.settings.id_idref_checking {
            return Ok(());
        }
        let simple_type = info.member_type.as_deref().unwrap_or(simple_type);
        if simple_type.is_id_type() {
            if !self.ids.add_id(&info.normalized) {
                self.error("cvc-id.2", [info.normalized.clone()])?;
            }
        } else if simple_type.is_idref_type() {
            for token in info.normalized.split_whitespace() {
                self.ids.add_idref(token);
            }
        }
        Ok(())
    }
}
