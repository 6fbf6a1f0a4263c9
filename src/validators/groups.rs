//! XSD Model Groups
//!
//! Sequence, choice and all compositors.

use std::fmt;

use super::particles::XsdParticle;

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Children in order
    Sequence,
    /// Exactly one of the children
    Choice,
    /// Children in any order
    All,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Sequence => write!(f, "sequence"),
            ModelType::Choice => write!(f, "choice"),
            ModelType::All => write!(f, "all"),
        }
    }
}

/// A model group
#[derive(Debug, Clone)]
pub struct XsdGroup {
    /// Compositor
    pub model: ModelType,
    /// Child particles
    pub particles: Vec<XsdParticle>,
}

impl XsdGroup {
    /// Create an empty group
    pub fn new(model: ModelType) -> Self {
        Self {
            model,
            particles: Vec::new(),
        }
    }

    /// Sequence of particles
    pub fn sequence(particles: Vec<XsdParticle>) -> Self {
        Self {
            model: ModelType::Sequence,
            particles,
        }
    }

    /// Choice between particles
    pub fn choice(particles: Vec<XsdParticle>) -> Self {
        Self {
            model: ModelType::Choice,
            particles,
        }
    }

    /// All group
    pub fn all(particles: Vec<XsdParticle>) -> Self {
        Self {
            model: ModelType::All,
            particles,
        }
    }

    /// Add a particle
    pub fn push(&mut self, particle: XsdParticle) {
        self.particles.push(particle);
    }

    /// Whether the group can match an empty sequence
    pub fn is_emptiable(&self) -> bool {
        match self.model {
            ModelType::Choice => self.particles.iter().any(|p| p.is_emptiable()),
            ModelType::Sequence | ModelType::All => {
                self.particles.iter().all(|p| p.is_emptiable())
            }
        }
    }

    /// Whether the group has no particles at all
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
