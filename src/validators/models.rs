//! XSD Content Model Validators
//!
//! This module compiles a complex type's particle into an automaton over
//! child element names and provides:
//! - the transition function used while validating children
//! - expected-term and occurrence diagnostics for content errors
//! - Unique Particle Attribution and Element Declarations Consistent checks
//!
//! The automaton is a position automaton: every element or wildcard leaf
//! is a position with its own occurrence counter, so `a{2,5}` needs no
//! unfolding. A repeated group is compiled once; its loop-back edges carry
//! the group's iteration counter, which lives in each configuration next
//! to the leaf counter. A top-level `all` group gets a dedicated per-child
//! counting model.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#coss-particle

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::namespaces::QName;
use crate::settings::SchemaVersion;

use super::elements::XsdElement;
use super::globals::GrammarBucket;
use super::groups::{ModelType, XsdGroup};
use super::particles::{Occurs, ParticleTerm, XsdParticle};
use super::wildcards::XsdWildcard;

/// Source of substitution-group members
pub trait SubstitutionLookup {
    /// Elements that may appear in place of `head`
    fn substitution_members(&self, head: &XsdElement) -> Vec<Arc<XsdElement>>;
}

impl SubstitutionLookup for GrammarBucket {
    fn substitution_members(&self, head: &XsdElement) -> Vec<Arc<XsdElement>> {
        GrammarBucket::substitution_members(self, head)
    }
}

/// Lookup for schemas without substitution groups
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSubstitutions;

impl SubstitutionLookup for NoSubstitutions {
    fn substitution_members(&self, _head: &XsdElement) -> Vec<Arc<XsdElement>> {
        Vec::new()
    }
}

/// A leaf term of the automaton
#[derive(Debug, Clone)]
pub enum ModelTerm {
    /// An element declaration and the members of its substitution group
    Element {
        /// The declaration
        declaration: Arc<XsdElement>,
        /// Substitution group members
        members: Vec<Arc<XsdElement>>,
    },
    /// An element wildcard
    Wildcard(Arc<XsdWildcard>),
}

impl ModelTerm {
    fn names(&self) -> impl Iterator<Item = &QName> {
        let elements: Vec<&Arc<XsdElement>> = match self {
            ModelTerm::Element {
                declaration,
                members,
            } => std::iter::once(declaration).chain(members.iter()).collect(),
            ModelTerm::Wildcard(_) => Vec::new(),
        };
        elements.into_iter().map(|e| &e.name)
    }

    fn match_name(&self, name: &QName, is_defined: &dyn Fn(&QName) -> bool) -> Option<Transition> {
        match self {
            ModelTerm::Element {
                declaration,
                members,
            } => {
                if declaration.name == *name {
                    return Some(Transition::Element(declaration.clone()));
                }
                members
                    .iter()
                    .find(|m| m.name == *name)
                    .map(|m| Transition::Element(m.clone()))
            }
            ModelTerm::Wildcard(wildcard) => wildcard
                .allows_name(name, is_defined)
                .then(|| Transition::Wildcard(wildcard.clone())),
        }
    }

    fn overlaps(&self, other: &ModelTerm, version: SchemaVersion) -> bool {
        match (self, other) {
            (ModelTerm::Wildcard(a), ModelTerm::Wildcard(b)) => a.overlaps(b),
            (ModelTerm::Element { .. }, ModelTerm::Element { .. }) => {
                let names: HashSet<&QName> = self.names().collect();
                other.names().any(|n| names.contains(n))
            }
            // an element particle takes precedence over a wildcard in 1.1
            _ if version.is_1_1() => false,
            (ModelTerm::Wildcard(w), element) | (element, ModelTerm::Wildcard(w)) => {
                element.names().any(|n| w.allows_name(n, |_| false))
            }
        }
    }

    /// Term text used in diagnostics
    pub fn display(&self) -> String {
        match self {
            ModelTerm::Element { declaration, .. } => declaration.name.to_string(),
            ModelTerm::Wildcard(w) => format!("WC[{}]", w),
        }
    }
}

/// Result of matching a child against the content model
#[derive(Debug, Clone)]
pub enum Transition {
    /// Matched an element particle
    Element(Arc<XsdElement>),
    /// Matched a wildcard particle
    Wildcard(Arc<XsdWildcard>),
    /// Nothing matched
    NoMatch,
}

/// Occurrence bookkeeping of a counted particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceInfo {
    /// minOccurs
    pub min: u32,
    /// maxOccurs, `None` for unbounded
    pub max: Option<u32>,
    /// Occurrences seen so far
    pub count: u32,
    /// The particle's term
    pub term: String,
}

impl OccurrenceInfo {
    /// Whether maxOccurs has been reached
    pub fn is_max_reached(&self) -> bool {
        matches!(self.max, Some(max) if self.count >= max)
    }

    /// Occurrences still required
    pub fn missing(&self) -> u32 {
        self.min.saturating_sub(self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ErrorState {
    #[default]
    None,
    First,
    Subsequent,
}

/// One configuration of the automaton: a position, the occurrences of its
/// leaf, and the iteration count of every repeated group around it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Config {
    position: usize,
    count: u32,
    loops: Vec<u32>,
}

/// Validation state of one element's children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelState {
    active: Vec<Config>,
    counts: Vec<u32>,
    error: ErrorState,
}

impl ModelState {
    /// The last transition failed for the first time
    pub fn is_first_error(&self) -> bool {
        self.error == ErrorState::First
    }

    /// A transition failed
    pub fn is_error(&self) -> bool {
        self.error != ErrorState::None
    }

    fn fail(&mut self) {
        self.error = match self.error {
            ErrorState::None => ErrorState::First,
            _ => ErrorState::Subsequent,
        };
    }
}

/// Counts above minOccurs are only distinguished up to maxOccurs
fn saturate(occurs: &Occurs, count: u32) -> u32 {
    match occurs.max {
        Some(max) => count.min(max),
        None => count.min(occurs.min.max(1)),
    }
}

#[derive(Debug, Clone)]
struct Position {
    term: Option<ModelTerm>,
    particle: usize,
    occurs: Occurs,
    /// Repeated groups containing this position, outermost first
    groups: Vec<usize>,
}

impl Position {
    fn can_repeat(&self, count: u32) -> bool {
        !self.occurs.is_over(count)
    }
}

/// A group particle whose occurrences are counted
#[derive(Debug, Clone)]
struct GroupLoop {
    occurs: Occurs,
    body_nullable: bool,
}

impl GroupLoop {
    /// Whether the group may be left after `count` iterations; an emptiable
    /// body fills the missing iterations
    fn can_exit(&self, count: u32) -> bool {
        self.body_nullable || count >= self.occurs.min
    }
}

/// A follow edge; `repeat` names the group whose next iteration it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    target: usize,
    repeat: Option<usize>,
}

#[derive(Debug, Clone)]
enum ModelKind {
    Positions {
        positions: Vec<Position>,
        follow: Vec<Vec<Edge>>,
        loops: Vec<GroupLoop>,
        accepting: Vec<bool>,
    },
    All {
        children: Vec<Position>,
        emptiable: bool,
    },
}

/// A compiled content model
#[derive(Debug, Clone)]
pub struct ContentModel {
    kind: ModelKind,
}

struct Fragment {
    first: Vec<usize>,
    last: Vec<usize>,
    nullable: bool,
}

impl Fragment {
    fn epsilon() -> Self {
        Self {
            first: Vec::new(),
            last: Vec::new(),
            nullable: true,
        }
    }

    fn nothing() -> Self {
        Self {
            nullable: false,
            ..Self::epsilon()
        }
    }
}

fn push_unique<T: Copy + PartialEq>(target: &mut Vec<T>, items: &[T]) {
    for &item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn edges(targets: &[usize], repeat: Option<usize>) -> Vec<Edge> {
    targets.iter().map(|&target| Edge { target, repeat }).collect()
}

struct Builder<'a> {
    positions: Vec<Position>,
    follow: Vec<Vec<Edge>>,
    loops: Vec<GroupLoop>,
    lookup: &'a dyn SubstitutionLookup,
}

impl Builder<'_> {
    fn leaf(&mut self, term: ModelTerm, particle: &XsdParticle) -> Fragment {
        let index = self.positions.len();
        self.positions.push(Position {
            term: Some(term),
            particle: particle.id,
            occurs: particle.occurs,
            groups: Vec::new(),
        });
        self.follow.push(Vec::new());
        Fragment {
            first: vec![index],
            last: vec![index],
            nullable: particle.occurs.min == 0,
        }
    }

    fn particle(&mut self, particle: &XsdParticle) -> Fragment {
        if particle.occurs.is_empty() {
            return Fragment::epsilon();
        }
        match &particle.term {
            ParticleTerm::Element(element) => {
                let members = self.lookup.substitution_members(element);
                let term = ModelTerm::Element {
                    declaration: element.clone(),
                    members,
                };
                self.leaf(term, particle)
            }
            ParticleTerm::Wildcard(wildcard) => {
                self.leaf(ModelTerm::Wildcard(wildcard.clone()), particle)
            }
            ParticleTerm::Group(group) => self.repeat(group, particle.occurs),
        }
    }

    fn repeat(&mut self, group: &XsdGroup, occurs: Occurs) -> Fragment {
        let start = self.positions.len();
        let mut body = self.group(group);
        if occurs.max == Some(1) {
            body.nullable |= occurs.min == 0;
            return body;
        }

        let index = self.loops.len();
        self.loops.push(GroupLoop {
            occurs,
            body_nullable: body.nullable,
        });
        for position in &mut self.positions[start..] {
            position.groups.insert(0, index);
        }
        let back = edges(&body.first, Some(index));
        for &l in &body.last {
            push_unique(&mut self.follow[l], &back);
        }
        body.nullable |= occurs.min == 0;
        body
    }

    fn group(&mut self, group: &XsdGroup) -> Fragment {
        match group.model {
            // a nested all group is matched in order
            ModelType::Sequence | ModelType::All => {
                let mut result = Fragment::epsilon();
                for particle in &group.particles {
                    let f = self.particle(particle);
                    result = self.concat(result, f);
                }
                result
            }
            ModelType::Choice => {
                let mut result = Fragment::nothing();
                for particle in &group.particles {
                    let f = self.particle(particle);
                    push_unique(&mut result.first, &f.first);
                    push_unique(&mut result.last, &f.last);
                    result.nullable |= f.nullable;
                }
                result
            }
        }
    }

    fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let forward = edges(&b.first, None);
        for &l in &a.last {
            push_unique(&mut self.follow[l], &forward);
        }
        let mut first = a.first;
        if a.nullable {
            push_unique(&mut first, &b.first);
        }
        let mut last = b.last;
        if b.nullable {
            push_unique(&mut last, &a.last);
        }
        Fragment {
            first,
            last,
            nullable: a.nullable && b.nullable,
        }
    }
}

impl ContentModel {
    /// Compile a particle
    pub fn build(particle: &XsdParticle, lookup: &dyn SubstitutionLookup) -> Self {
        if let ParticleTerm::Group(group) = &particle.term {
            if group.model == ModelType::All && !particle.occurs.is_empty() {
                if let Some(model) = Self::build_all(group, particle.occurs, lookup) {
                    return model;
                }
            }
        }

        let mut builder = Builder {
            positions: vec![Position {
                term: None,
                particle: usize::MAX,
                occurs: Occurs::once(),
                groups: Vec::new(),
            }],
            follow: vec![Vec::new()],
            loops: Vec::new(),
            lookup,
        };
        let root = builder.particle(particle);
        builder.follow[0] = edges(&root.first, None);
        let mut accepting = vec![false; builder.positions.len()];
        accepting[0] = root.nullable;
        for &l in &root.last {
            accepting[l] = true;
        }
        ContentModel {
            kind: ModelKind::Positions {
                positions: builder.positions,
                follow: builder.follow,
                loops: builder.loops,
                accepting,
            },
        }
    }

    fn build_all(group: &XsdGroup, occurs: Occurs, lookup: &dyn SubstitutionLookup) -> Option<Self> {
        let mut children = Vec::with_capacity(group.particles.len());
        for particle in &group.particles {
            let term = match &particle.term {
                ParticleTerm::Element(element) => ModelTerm::Element {
                    declaration: element.clone(),
                    members: lookup.substitution_members(element),
                },
                ParticleTerm::Wildcard(wildcard) => ModelTerm::Wildcard(wildcard.clone()),
                ParticleTerm::Group(_) => return None,
            };
            children.push(Position {
                term: Some(term),
                particle: particle.id,
                occurs: particle.occurs,
                groups: Vec::new(),
            });
        }
        Some(ContentModel {
            kind: ModelKind::All {
                children,
                emptiable: occurs.min == 0,
            },
        })
    }

    /// The state before the first child
    pub fn start_state(&self) -> ModelState {
        match &self.kind {
            ModelKind::Positions { .. } => ModelState {
                active: vec![Config {
                    position: 0,
                    count: 1,
                    loops: Vec::new(),
                }],
                ..ModelState::default()
            },
            ModelKind::All { children, .. } => ModelState {
                counts: vec![0; children.len()],
                ..ModelState::default()
            },
        }
    }

    /// Configurations reachable by consuming one more child
    fn moves(&self, state: &ModelState) -> Vec<Config> {
        let mut moves = Vec::new();
        match &self.kind {
            ModelKind::Positions {
                positions,
                follow,
                loops,
                ..
            } => {
                for config in &state.active {
                    let pos = &positions[config.position];
                    if config.position != 0 && pos.can_repeat(config.count) {
                        moves.push(Config {
                            count: saturate(&pos.occurs, config.count + 1),
                            ..config.clone()
                        });
                    }
                    if config.count >= pos.occurs.min {
                        moves.extend(
                            follow[config.position]
                                .iter()
                                .filter_map(|edge| Self::follow_edge(positions, loops, config, edge)),
                        );
                    }
                }
            }
            ModelKind::All { children, .. } => {
                for (i, child) in children.iter().enumerate() {
                    if child.can_repeat(state.counts[i]) {
                        moves.push(Config {
                            position: i,
                            count: state.counts[i] + 1,
                            loops: Vec::new(),
                        });
                    }
                }
            }
        }
        moves
    }

    /// Take a follow edge: leave the groups the target is not in, count a
    /// new iteration of a repeated group, and enter the target's groups
    fn follow_edge(positions: &[Position], loops: &[GroupLoop], from: &Config, edge: &Edge) -> Option<Config> {
        let source = &positions[from.position].groups;
        let target = &positions[edge.target];
        let shared = source
            .iter()
            .zip(&target.groups)
            .take_while(|(a, b)| a == b)
            .count();
        let kept = match edge.repeat {
            Some(group) => source.iter().position(|&g| g == group)?,
            None => shared,
        };

        let inner = if edge.repeat.is_some() { kept + 1 } else { kept };
        for (&group, &count) in source.iter().zip(&from.loops).skip(inner) {
            if !loops[group].can_exit(count) {
                return None;
            }
        }

        let mut counters = from.loops[..kept].to_vec();
        if let Some(group) = edge.repeat {
            let occurs = &loops[group].occurs;
            let count = from.loops[kept];
            if occurs.is_over(count) {
                return None;
            }
            counters.push(saturate(occurs, count + 1));
        }
        for &group in &target.groups[counters.len()..] {
            counters.push(saturate(&loops[group].occurs, 1));
        }
        Some(Config {
            position: edge.target,
            count: saturate(&target.occurs, 1),
            loops: counters,
        })
    }

    fn positions(&self) -> &[Position] {
        match &self.kind {
            ModelKind::Positions { positions, .. } => positions,
            ModelKind::All { children, .. } => children,
        }
    }

    /// Match a child element.
    ///
    /// Element particles are preferred over wildcards. On failure the state
    /// keeps its previous configuration and enters the error state; the
    /// returned transition is then a best-effort declaration lookup so that
    /// the child can still be validated.
    pub fn transition(
        &self,
        name: &QName,
        state: &mut ModelState,
        is_defined: &dyn Fn(&QName) -> bool,
    ) -> Transition {
        if state.is_error() {
            state.fail();
            return self.find_matching_declaration(name);
        }

        let positions = self.positions();
        let mut element_hits = Vec::new();
        let mut wildcard_hits = Vec::new();
        let mut element_match = None;
        let mut wildcard_match = None;
        for config in self.moves(state) {
            let Some(term) = &positions[config.position].term else {
                continue;
            };
            match term.match_name(name, is_defined) {
                Some(Transition::Element(decl)) => {
                    element_hits.push(config);
                    element_match.get_or_insert(decl);
                }
                Some(Transition::Wildcard(w)) => {
                    wildcard_hits.push(config);
                    wildcard_match.get_or_insert(w);
                }
                _ => {}
            }
        }

        let (hits, transition) = match (element_match, wildcard_match) {
            (Some(decl), _) => (element_hits, Transition::Element(decl)),
            (None, Some(w)) => (wildcard_hits, Transition::Wildcard(w)),
            (None, None) => {
                state.fail();
                return self.find_matching_declaration(name);
            }
        };

        match &self.kind {
            ModelKind::Positions { .. } => {
                let mut active = hits;
                active.sort_unstable();
                active.dedup();
                state.active = active;
            }
            ModelKind::All { .. } => {
                if let Some(config) = hits.first() {
                    state.counts[config.position] = config.count;
                }
            }
        }
        transition
    }

    fn find_matching_declaration(&self, name: &QName) -> Transition {
        self.positions()
            .iter()
            .filter_map(|p| p.term.as_ref())
            .find_map(|term| match term.match_name(name, &|_| false) {
                Some(t @ Transition::Element(_)) => Some(t),
                _ => None,
            })
            .unwrap_or(Transition::NoMatch)
    }

    /// Whether the content may end here; an errored state was already
    /// reported and counts as complete
    pub fn end_content_model(&self, state: &ModelState) -> bool {
        if state.is_error() {
            return true;
        }
        match &self.kind {
            ModelKind::Positions {
                positions,
                loops,
                accepting,
                ..
            } => state.active.iter().any(|config| {
                let pos = &positions[config.position];
                accepting[config.position]
                    && config.count >= pos.occurs.min
                    && pos
                        .groups
                        .iter()
                        .zip(&config.loops)
                        .all(|(&group, &count)| loops[group].can_exit(count))
            }),
            ModelKind::All {
                children,
                emptiable,
            } => {
                let complete = children
                    .iter()
                    .zip(&state.counts)
                    .all(|(child, &count)| count >= child.occurs.min);
                complete || (*emptiable && state.counts.iter().all(|&c| c == 0))
            }
        }
    }

    /// Terms that could match the next child
    pub fn what_can_go_here(&self, state: &ModelState) -> Vec<String> {
        let positions = self.positions();
        let mut expected: Vec<String> = Vec::new();
        for config in self.moves(state) {
            if let Some(term) = &positions[config.position].term {
                let text = term.display();
                if !expected.contains(&text) {
                    expected.push(text);
                }
            }
        }
        expected
    }

    /// Occurrence information when the state sits on a single counted particle
    pub fn occurrence_info(&self, state: &ModelState) -> Option<OccurrenceInfo> {
        let ModelKind::Positions { positions, .. } = &self.kind else {
            return None;
        };
        let [config] = state.active.as_slice() else {
            return None;
        };
        let pos = &positions[config.position];
        if config.position == 0 || !pos.occurs.is_counted() {
            return None;
        }
        Some(OccurrenceInfo {
            min: pos.occurs.min,
            max: pos.occurs.max,
            count: config.count,
            term: pos.term.as_ref().map(ModelTerm::display).unwrap_or_default(),
        })
    }

    /// Unique Particle Attribution.
    ///
    /// Returns the terms of each pair of distinct particles that can compete
    /// for the same child.
    pub fn check_unique_particle_attribution(&self, version: SchemaVersion) -> Vec<(String, String)> {
        let mut competing: Vec<Vec<usize>> = Vec::new();
        match &self.kind {
            ModelKind::Positions {
                positions, follow, ..
            } => {
                for (p, pos) in positions.iter().enumerate() {
                    let mut set: Vec<usize> = Vec::new();
                    for edge in &follow[p] {
                        push_unique(&mut set, &[edge.target]);
                    }
                    if p != 0 && pos.occurs.max.map_or(true, |max| pos.occurs.min < max) {
                        push_unique(&mut set, &[p]);
                    }
                    competing.push(set);
                }
            }
            ModelKind::All { children, .. } => competing.push((0..children.len()).collect()),
        }

        let positions = self.positions();
        let mut seen = HashSet::new();
        let mut conflicts = Vec::new();
        for set in competing {
            for (i, &a) in set.iter().enumerate() {
                for &b in &set[i + 1..] {
                    let (pa, pb) = (&positions[a], &positions[b]);
                    if pa.particle == pb.particle {
                        continue;
                    }
                    let (Some(ta), Some(tb)) = (&pa.term, &pb.term) else {
                        continue;
                    };
                    let key = (pa.particle.min(pb.particle), pa.particle.max(pb.particle));
                    if ta.overlaps(tb, version) && seen.insert(key) {
                        conflicts.push((ta.display(), tb.display()));
                    }
                }
            }
        }
        conflicts
    }

    /// Number of leaf positions
    pub fn len(&self) -> usize {
        match &self.kind {
            ModelKind::Positions { positions, .. } => positions.len() - 1,
            ModelKind::All { children, .. } => children.len(),
        }
    }

    /// Whether the model has no leaf
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element Declarations Consistent: names of element particles that occur
/// more than once in a content model with different types
pub fn check_element_consistency(particle: &XsdParticle) -> Vec<QName> {
    fn collect<'a>(particle: &'a XsdParticle, out: &mut Vec<&'a Arc<XsdElement>>) {
        match &particle.term {
            ParticleTerm::Element(e) => out.push(e),
            ParticleTerm::Wildcard(_) => {}
            ParticleTerm::Group(g) => g.particles.iter().for_each(|p| collect(p, out)),
        }
    }

    let mut elements = Vec::new();
    collect(particle, &mut elements);
    let mut first_seen: HashMap<&QName, &Arc<XsdElement>> = HashMap::new();
    let mut inconsistent: Vec<QName> = Vec::new();
    for element in elements {
        match first_seen.get(&element.name) {
            Some(previous) => {
                if !previous.type_ref.same_as(&element.type_ref) && !inconsistent.contains(&element.name) {
                    inconsistent.push(element.name.clone());
                }
            }
            None => {
                first_seen.insert(&element.name, element);
            }
        }
    }
    inconsistent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::ValidationMode;
    use crate::validators::complex_types::TypeRef;
    use crate::validators::wildcards::NamespaceConstraint;

    fn elem(name: &str) -> XsdParticle {
        XsdParticle::element(Arc::new(XsdElement::new(QName::local(name), TypeRef::xsd("string"))))
    }

    fn model(particle: XsdParticle) -> ContentModel {
        ContentModel::build(&particle, &NoSubstitutions)
    }

    fn run(model: &ContentModel, children: &[&str]) -> (ModelState, bool) {
        let mut state = model.start_state();
        let mut ok = true;
        for child in children {
            model.transition(&QName::local(*child), &mut state, &|_| false);
            ok &= !state.is_error();
        }
        (state, ok)
    }

    fn accepts(model: &ContentModel, children: &[&str]) -> bool {
        let (state, ok) = run(model, children);
        ok && model.end_content_model(&state)
    }

    #[test]
    fn test_sequence() {
        let m = model(XsdParticle::group(XsdGroup::sequence(vec![elem("a"), elem("b").with_occurs(0, Some(1))])));
        assert!(accepts(&m, &["a"]));
        assert!(accepts(&m, &["a", "b"]));
        assert!(!accepts(&m, &[]));
        assert!(!accepts(&m, &["b"]));
        assert!(!accepts(&m, &["a", "b", "b"]));
        assert_eq!(m.what_can_go_here(&m.start_state()), vec!["a".to_string()]);
    }

    #[test]
    fn test_choice_and_group_occurs() {
        let choice = XsdGroup::choice(vec![elem("a"), elem("b")]);
        let m = model(XsdParticle::group(choice).with_occurs(2, Some(3)));
        assert!(!accepts(&m, &["a"]));
        assert!(accepts(&m, &["a", "b"]));
        assert!(accepts(&m, &["b", "b", "a"]));
        assert!(!accepts(&m, &["a", "a", "a", "a"]));

        let star = model(XsdParticle::group(XsdGroup::sequence(vec![elem("a"), elem("b")])).with_occurs(1, None));
        assert!(accepts(&star, &["a", "b", "a", "b"]));
        assert!(!accepts(&star, &["a", "b", "a"]));
    }

    #[test]
    fn test_large_group_bounds_are_counted() {
        let pair = XsdParticle::group(XsdGroup::sequence(vec![elem("a"), elem("b")])).with_occurs(100, Some(100));
        let m = model(pair);
        let reps = |n: usize| -> Vec<&'static str> { ["a", "b"].iter().copied().cycle().take(2 * n).collect() };
        assert!(accepts(&m, &reps(100)));
        assert!(!accepts(&m, &reps(64)));
        assert!(!accepts(&m, &reps(99)));
        assert!(!accepts(&m, &reps(101)));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_nested_group_occurs() {
        let inner = XsdParticle::group(XsdGroup::sequence(vec![elem("b"), elem("c")])).with_occurs(2, Some(3));
        let m = model(XsdParticle::group(XsdGroup::sequence(vec![elem("a"), inner, elem("d")])).with_occurs(1, Some(2)));
        assert!(accepts(&m, &["a", "b", "c", "b", "c", "d"]));
        assert!(accepts(&m, &["a", "b", "c", "b", "c", "b", "c", "d", "a", "b", "c", "b", "c", "d"]));
        assert!(!accepts(&m, &["a", "b", "c", "d"]));
        assert!(!accepts(&m, &["a", "b", "c", "b", "c", "b", "c", "b", "c", "d"]));
        assert!(!accepts(&m, &["a", "b", "c", "b", "c", "d", "a", "b", "c", "d"]));

        let (state, ok) = run(&m, &["a", "b", "c", "b", "c", "b", "c"]);
        assert!(ok);
        assert_eq!(m.what_can_go_here(&state), vec!["d".to_string()]);
    }

    #[test]
    fn test_emptiable_group_body_fills_minimum() {
        let body = XsdParticle::group(XsdGroup::sequence(vec![elem("a").with_occurs(0, Some(1))])).with_occurs(3, Some(3));
        let m = model(XsdParticle::group(XsdGroup::sequence(vec![body, elem("z")])));
        assert!(accepts(&m, &["z"]));
        assert!(accepts(&m, &["a", "z"]));
        assert!(accepts(&m, &["a", "a", "a", "z"]));
        assert!(!accepts(&m, &["a", "a", "a", "a", "z"]));
    }

    #[test]
    fn test_empty_choice_accepts_nothing() {
        let m = model(XsdParticle::group(XsdGroup::choice(vec![])));
        assert!(!accepts(&m, &[]));
        let empty_seq = model(XsdParticle::group(XsdGroup::sequence(vec![])));
        assert!(accepts(&empty_seq, &[]));
        assert!(empty_seq.is_empty());
    }

    #[test]
    fn test_counted_leaf_diagnostics() {
        let m = model(XsdParticle::group(XsdGroup::sequence(vec![
            elem("a").with_occurs(2, Some(3)),
            elem("b"),
        ])));
        let (state, ok) = run(&m, &["a"]);
        assert!(ok);
        let info = m.occurrence_info(&state).unwrap();
        assert_eq!((info.min, info.count, info.missing()), (2, 1, 1));
        assert_eq!(m.what_can_go_here(&state), vec!["a".to_string()]);

        let (state, _) = run(&m, &["a", "a", "a"]);
        let info = m.occurrence_info(&state).unwrap();
        assert!(info.is_max_reached());
        assert_eq!(m.what_can_go_here(&state), vec!["b".to_string()]);

        let (state, ok) = run(&m, &["a", "a", "a", "a"]);
        assert!(!ok && state.is_first_error());
        assert!(accepts(&m, &["a", "a", "b"]));
    }

    #[test]
    fn test_error_state_recovers_declaration() {
        let m = model(XsdParticle::group(XsdGroup::sequence(vec![elem("a"), elem("b")])));
        let mut state = m.start_state();
        let t = m.transition(&QName::local("b"), &mut state, &|_| false);
        assert!(state.is_first_error());
        assert!(matches!(t, Transition::Element(ref d) if d.name.local_name == "b"));
        let t = m.transition(&QName::local("zzz"), &mut state, &|_| false);
        assert!(state.is_error() && !state.is_first_error());
        assert!(matches!(t, Transition::NoMatch));
        assert!(m.end_content_model(&state));
    }

    #[test]
    fn test_element_preferred_over_wildcard() {
        let m = model(XsdParticle::group(XsdGroup::choice(vec![
            XsdParticle::wildcard(XsdWildcard::any(ValidationMode::Lax)),
            elem("a"),
        ])));
        let mut state = m.start_state();
        assert!(matches!(
            m.transition(&QName::local("a"), &mut state, &|_| false),
            Transition::Element(_)
        ));
        let mut state = m.start_state();
        assert!(matches!(
            m.transition(&QName::local("x"), &mut state, &|_| false),
            Transition::Wildcard(_)
        ));
    }

    #[test]
    fn test_all_model() {
        let m = model(XsdParticle::group(XsdGroup::all(vec![elem("a"), elem("b").with_occurs(0, Some(1))])));
        assert!(accepts(&m, &["a"]));
        assert!(accepts(&m, &["b", "a"]));
        assert!(!accepts(&m, &["a", "a"]));
        assert!(!accepts(&m, &["b"]));
        assert!(m.check_unique_particle_attribution(SchemaVersion::V1_0).is_empty());
    }

    #[test]
    fn test_substitution_group_match() {
        let mut grammar = crate::validators::globals::SchemaGrammar::new(None);
        let head = grammar.add_element(XsdElement::new(QName::local("head"), TypeRef::xsd("string")));
        grammar.add_element(
            XsdElement::new(QName::local("member"), TypeRef::xsd("string"))
                .with_substitution_group(QName::local("head")),
        );
        let mut bucket = GrammarBucket::new();
        bucket.add(grammar);
        let particle = XsdParticle::group(XsdGroup::sequence(vec![XsdParticle::element(head)]));
        let m = ContentModel::build(&particle, &bucket);
        let mut state = m.start_state();
        let t = m.transition(&QName::local("member"), &mut state, &|_| false);
        assert!(matches!(t, Transition::Element(ref d) if d.name.local_name == "member"));
        assert!(m.end_content_model(&state));
    }

    #[test]
    fn test_upa_wildcards() {
        let wc = |ns: &str| {
            XsdParticle::wildcard(XsdWildcard::new(
                NamespaceConstraint::enumeration([Some(ns)]),
                ValidationMode::Lax,
            ))
        };
        let overlapping = model(XsdParticle::group(XsdGroup::choice(vec![wc("urn:a"), wc("urn:a")])));
        assert_eq!(overlapping.check_unique_particle_attribution(SchemaVersion::V1_0).len(), 1);
        let disjoint = model(XsdParticle::group(XsdGroup::choice(vec![wc("urn:a"), wc("urn:b")])));
        assert!(disjoint.check_unique_particle_attribution(SchemaVersion::V1_0).is_empty());
    }

    #[test]
    fn test_upa_counted_leaf() {
        let ambiguous = model(XsdParticle::group(XsdGroup::sequence(vec![
            elem("a").with_occurs(0, Some(2)),
            elem("a"),
        ])));
        assert_eq!(ambiguous.check_unique_particle_attribution(SchemaVersion::V1_0).len(), 1);

        let fixed = model(XsdParticle::group(XsdGroup::sequence(vec![
            elem("a").with_occurs(2, Some(2)),
            elem("a"),
        ])));
        assert!(fixed.check_unique_particle_attribution(SchemaVersion::V1_0).is_empty());
    }

    #[test]
    fn test_upa_element_wildcard_by_version() {
        let m = model(XsdParticle::group(XsdGroup::choice(vec![
            elem("a"),
            XsdParticle::wildcard(XsdWildcard::any(ValidationMode::Lax)),
        ])));
        assert_eq!(m.check_unique_particle_attribution(SchemaVersion::V1_0).len(), 1);
        assert!(m.check_unique_particle_attribution(SchemaVersion::V1_1).is_empty());
    }

    #[test]
    fn test_element_consistency() {
        let a_string = elem("a");
        let a_int = XsdParticle::element(Arc::new(XsdElement::new(QName::local("a"), TypeRef::xsd("int"))));
        let group = XsdParticle::group(XsdGroup::choice(vec![a_string, elem("a"), a_int]));
        assert_eq!(check_element_consistency(&group), vec![QName::local("a")]);
    }
}
