//! XSD Particle Schema Components
//!
//! Particles pair a term (element declaration, wildcard or model group)
//! with occurrence bounds.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::elements::XsdElement;
use super::groups::XsdGroup;
use super::wildcards::XsdWildcard;

static NEXT_COMPONENT_ID: AtomicUsize = AtomicUsize::new(1);

/// Allocate a process-unique component id.
///
/// Complex types and particles carry one so that caches and the particle
/// attribution check can tell components apart without pointer identity.
pub fn next_component_id() -> usize {
    NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self::new(1, Some(1))
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self::new(0, Some(1))
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self::new(0, None)
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self::new(1, None)
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Whether a count is below minOccurs
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Whether a count has reached maxOccurs
    pub fn is_over(&self, count: u32) -> bool {
        matches!(self.max, Some(max) if count >= max)
    }

    /// Whether the particle repeats or has a minimum above one, so that
    /// its occurrences must be counted
    pub fn is_counted(&self) -> bool {
        self.min > 1 || self.max != Some(1)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{}]", self.min, max),
            None => write!(f, "[{}..unbounded]", self.min),
        }
    }
}

/// The term of a particle
#[derive(Debug, Clone)]
pub enum ParticleTerm {
    /// Element declaration (local, or a reference to a global one)
    Element(Arc<XsdElement>),
    /// Element wildcard
    Wildcard(Arc<XsdWildcard>),
    /// Nested model group
    Group(Arc<XsdGroup>),
}

/// A particle
#[derive(Debug, Clone)]
pub struct XsdParticle {
    /// Component id
    pub id: usize,
    /// Term
    pub term: ParticleTerm,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl XsdParticle {
    /// Create a particle
    pub fn new(term: ParticleTerm, occurs: Occurs) -> Self {
        Self {
            id: next_component_id(),
            term,
            occurs,
        }
    }

    /// Element particle occurring once
    pub fn element(element: Arc<XsdElement>) -> Self {
        Self::new(ParticleTerm::Element(element), Occurs::once())
    }

    /// Wildcard particle occurring once
    pub fn wildcard(wildcard: XsdWildcard) -> Self {
        Self::new(ParticleTerm::Wildcard(Arc::new(wildcard)), Occurs::once())
    }

    /// Group particle occurring once
    pub fn group(group: XsdGroup) -> Self {
        Self::new(ParticleTerm::Group(Arc::new(group)), Occurs::once())
    }

    /// Replace the occurrence bounds
    pub fn with_occurs(mut self, min: u32, max: Option<u32>) -> Self {
        self.occurs = Occurs::new(min, max);
        self
    }

    /// Whether the particle can match an empty sequence
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.is_emptiable() || self.occurs.is_empty() {
            return true;
        }
        match &self.term {
            ParticleTerm::Group(group) => group.is_emptiable(),
            _ => false,
        }
    }
}

impl fmt::Display for XsdParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.term {
            ParticleTerm::Element(e) => write!(f, "{}", e.name),
            ParticleTerm::Wildcard(w) => write!(f, "{}", w),
            ParticleTerm::Group(g) => write!(f, "{}", g.model),
        }
    }
}
