//! Base validation enums
//!
//! Assessment modes and the two PSVI outcome properties shared by every
//! validated element and attribute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Assessment mode applied to an element or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// A declaration is required
    #[default]
    Strict,
    /// Validate if a declaration is found
    Lax,
    /// No validation is performed
    Skip,
}

impl ValidationMode {
    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }

    /// Check if this mode is at least as strict as another
    pub fn is_restriction_of(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Strict, _) | (Self::Lax, Self::Lax | Self::Skip) | (Self::Skip, Self::Skip)
        )
    }
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Config(format!(
                "Invalid validation mode: '{}'. Must be 'strict', 'lax', or 'skip'",
                s
            ))),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The PSVI [validation attempted] property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The item and all its descendants were validated
    Full,
    /// Some but not all of the subtree was validated
    Partial,
    /// Nothing in the subtree was validated
    None,
}

/// The PSVI [validity] property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidityStatus {
    /// Strictly assessed and valid
    Valid,
    /// Strictly assessed and invalid
    Invalid,
    /// Not strictly assessed
    NotKnown,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::None => write!(f, "none"),
        }
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::NotKnown => write!(f, "notKnown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_mode() {
        assert_eq!("strict".parse::<ValidationMode>().unwrap(), ValidationMode::Strict);
        assert_eq!("lax".parse::<ValidationMode>().unwrap(), ValidationMode::Lax);
        assert_eq!("skip".parse::<ValidationMode>().unwrap(), ValidationMode::Skip);
        assert!("invalid".parse::<ValidationMode>().is_err());
    }

    #[test]
    fn test_validation_mode_display() {
        assert_eq!(ValidationMode::Strict.to_string(), "strict");
        assert_eq!(ValidationMode::Lax.to_string(), "lax");
        assert_eq!(ValidationMode::Skip.to_string(), "skip");
    }

    #[test]
    fn test_mode_restriction() {
        assert!(ValidationMode::Strict.is_restriction_of(&ValidationMode::Skip));
        assert!(ValidationMode::Lax.is_restriction_of(&ValidationMode::Skip));
        assert!(!ValidationMode::Skip.is_restriction_of(&ValidationMode::Lax));
        assert!(!ValidationMode::Lax.is_restriction_of(&ValidationMode::Strict));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ValidationStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!(ValidityStatus::NotKnown.to_string(), "notKnown");
    }
}
