//! XSD Facets
//!
//! Constraining facets applied by simple types after lexical validation.
//! Value-space facets (enumeration, bounds) compare typed values so that
//! `1.0` and `1.00` are the same decimal.

use regex::Regex;
use rust_decimal::Decimal;

use super::simple_types::{AtomicValue, InvalidValue, Value};

/// The whiteSpace facet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpace {
    /// Preserve all white space
    #[default]
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_ascii_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// A pattern facet, anchored at both ends as XSD regular expressions are
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// The pattern as written in the schema
    pub source: String,
    regex: Regex,
}

impl PatternFacet {
    /// Compile a pattern facet
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    /// Check a normalized lexical value
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Container for the facets that constrain a simple type
#[derive(Debug, Clone, Default)]
pub struct FacetSet {
    /// Exact length (characters, octets or list items)
    pub length: Option<usize>,
    /// Minimum length
    pub min_length: Option<usize>,
    /// Maximum length
    pub max_length: Option<usize>,
    /// Pattern facets; each one must match
    pub patterns: Vec<PatternFacet>,
    /// Enumeration, as typed values of the base type
    pub enumeration: Vec<AtomicValue>,
    /// White space handling
    pub white_space: Option<WhiteSpace>,
    /// Minimum inclusive bound
    pub min_inclusive: Option<Decimal>,
    /// Maximum inclusive bound
    pub max_inclusive: Option<Decimal>,
    /// Minimum exclusive bound
    pub min_exclusive: Option<Decimal>,
    /// Maximum exclusive bound
    pub max_exclusive: Option<Decimal>,
}

impl FacetSet {
    /// Create an empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any facet is present
    pub fn is_empty(&self) -> bool {
        self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.patterns.is_empty()
            && self.enumeration.is_empty()
            && self.min_inclusive.is_none()
            && self.max_inclusive.is_none()
            && self.min_exclusive.is_none()
            && self.max_exclusive.is_none()
    }

    /// Check the length facets against a measured length
    pub fn check_length(&self, value: &str, len: usize, type_name: &str) -> Result<(), InvalidValue> {
        if let Some(expected) = self.length {
            if len != expected {
                return Err(InvalidValue::new(
                    "cvc-length-valid",
                    [value.to_string(), len.to_string(), expected.to_string(), type_name.to_string()],
                ));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(InvalidValue::new(
                    "cvc-minLength-valid",
                    [value.to_string(), len.to_string(), min.to_string(), type_name.to_string()],
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(InvalidValue::new(
                    "cvc-maxLength-valid",
                    [value.to_string(), len.to_string(), max.to_string(), type_name.to_string()],
                ));
            }
        }
        Ok(())
    }

    /// Check pattern facets against the normalized lexical form
    pub fn check_patterns(&self, value: &str, type_name: &str) -> Result<(), InvalidValue> {
        if let Some(pattern) = self.patterns.iter().find(|p| !p.is_match(value)) {
            return Err(InvalidValue::new(
                "cvc-pattern-valid",
                [value.to_string(), pattern.source.clone(), type_name.to_string()],
            ));
        }
        Ok(())
    }

    /// Check the enumeration facet against a typed value
    pub fn check_enumeration(
        &self,
        lexical: &str,
        value: &AtomicValue,
    ) -> Result<(), InvalidValue> {
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == value) {
            let allowed: Vec<String> = self.enumeration.iter().map(|e| e.to_string()).collect();
            return Err(InvalidValue::new(
                "cvc-enumeration-valid",
                [lexical.to_string(), format!("[{}]", allowed.join(", "))],
            ));
        }
        Ok(())
    }

    /// Check numeric bounds against a typed value
    pub fn check_bounds(&self, lexical: &str, value: &AtomicValue, type_name: &str) -> Result<(), InvalidValue> {
        let number = match &value.value {
            Value::Decimal(d) => *d,
            _ => return Ok(()),
        };
        let violation = |key: &'static str, bound: &Decimal| {
            InvalidValue::new(key, [lexical.to_string(), bound.to_string(), type_name.to_string()])
        };
        if let Some(bound) = &self.min_inclusive {
            if number < *bound {
                return Err(violation("cvc-minInclusive-valid", bound));
            }
        }
        if let Some(bound) = &self.max_inclusive {
            if number > *bound {
                return Err(violation("cvc-maxInclusive-valid", bound));
            }
        }
        if let Some(bound) = &self.min_exclusive {
            if number <= *bound {
                return Err(violation("cvc-minExclusive-valid", bound));
            }
        }
        if let Some(bound) = &self.max_exclusive {
            if number >= *bound {
                return Err(violation("cvc-maxExclusive-valid", bound));
            }
        }
        Ok(())
    }
}
