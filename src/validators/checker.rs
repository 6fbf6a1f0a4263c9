//! Whole-grammar constraint checking
//!
//! Unique Particle Attribution (`cos-nonambig`) and Element Declarations
//! Consistent (`cos-element-consistent`) over every complex type reachable
//! from the grammars of a bucket.
//!
//! The first pass checks every type. Later passes recheck only the types
//! that were flagged, unless the bucket gained a grammar since the last
//! pass: new substitution group members can make any content model
//! ambiguous, so everything is checked again.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::settings::SchemaVersion;

use super::complex_types::{TypeDefinition, TypeRef, XsdComplexType};
use super::exceptions::Diagnostic;
use super::globals::{GrammarBucket, SchemaGrammar};
use super::models::{check_element_consistency, ContentModel, SubstitutionLookup};
use super::particles::{ParticleTerm, XsdParticle};

/// Incremental UPA/EDC checker
#[derive(Debug, Default)]
pub struct SchemaConstraintChecker {
    pending: Vec<Arc<XsdComplexType>>,
    grammars: Vec<Arc<SchemaGrammar>>,
    reported: HashSet<(&'static str, Vec<String>)>,
    passes: usize,
}

impl SchemaConstraintChecker {
    /// Create a checker that has not seen any grammar
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of types waiting for a recheck
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of passes run so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Run one pass and return the violations not reported before
    pub fn check(&mut self, grammars: &GrammarBucket, version: SchemaVersion) -> Vec<Diagnostic> {
        let grew = grammars
            .grammars()
            .any(|g| !self.grammars.iter().any(|seen| Arc::ptr_eq(seen, g)));
        if grew {
            self.grammars = grammars.grammars().cloned().collect();
            self.pending = collect_complex_types(grammars);
        }

        let worklist = std::mem::take(&mut self.pending);
        let checked = worklist.len();
        let mut found = Vec::new();
        for ctype in worklist {
            let findings = check_complex_type(&ctype, grammars, version);
            if !findings.is_empty() {
                self.pending.push(ctype);
            }
            for finding in findings {
                if self.reported.insert((finding.key, finding.args.clone())) {
                    found.push(finding);
                }
            }
        }
        self.passes += 1;
        debug!(
            pass = self.passes,
            checked,
            flagged = self.pending.len(),
            full = grew,
            "schema constraint checking"
        );
        found
    }

    /// Forget all grammars and findings
    pub fn reset(&mut self) {
        self.pending.clear();
        self.grammars.clear();
        self.reported.clear();
        self.passes = 0;
    }
}

/// UPA and EDC violations of one complex type
pub fn check_complex_type(
    ctype: &XsdComplexType,
    lookup: &dyn SubstitutionLookup,
    version: SchemaVersion,
) -> Vec<Diagnostic> {
    let Some(particle) = ctype.content.particle() else {
        return Vec::new();
    };
    let model = ContentModel::build(particle, lookup);
    let mut findings: Vec<Diagnostic> = model
        .check_unique_particle_attribution(version)
        .into_iter()
        .map(|(a, b)| Diagnostic::new("cos-nonambig", [a, b]))
        .collect();
    findings.extend(check_element_consistency(particle).into_iter().map(|name| {
        Diagnostic::new("cos-element-consistent", [ctype.display_name(), name.to_string()])
    }));
    findings
}

/// Every complex type of the bucket, named or anonymous, except anyType
fn collect_complex_types(grammars: &GrammarBucket) -> Vec<Arc<XsdComplexType>> {
    fn visit_type(t: &TypeDefinition, seen: &mut HashSet<usize>, out: &mut Vec<Arc<XsdComplexType>>) {
        let TypeDefinition::Complex(ctype) = t else {
            return;
        };
        if ctype.is_any_type() || !seen.insert(ctype.id) {
            return;
        }
        out.push(ctype.clone());
        if let Some(particle) = ctype.content.particle() {
            visit_particle(particle, seen, out);
        }
    }

    fn visit_particle(p: &XsdParticle, seen: &mut HashSet<usize>, out: &mut Vec<Arc<XsdComplexType>>) {
        match &p.term {
            ParticleTerm::Element(e) => {
                if let TypeRef::Inline(t) = &e.type_ref {
                    visit_type(t, seen, out);
                }
            }
            ParticleTerm::Wildcard(_) => {}
            ParticleTerm::Group(g) => g.particles.iter().for_each(|p| visit_particle(p, seen, out)),
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for grammar in grammars.grammars() {
        for t in grammar.types() {
            visit_type(t, &mut seen, &mut out);
        }
        for element in grammar.elements() {
            if let TypeRef::Inline(t) = &element.type_ref {
                visit_type(t, &mut seen, &mut out);
            }
        }
    }
    out
}
