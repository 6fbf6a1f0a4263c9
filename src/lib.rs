//! # xmlschema-psvi
//!
//! A streaming XML Schema (XSD 1.0 and 1.1) instance validator producing a
//! post-schema-validation infoset.
//!
//! ## Features
//!
//! - Event-driven validation: start/characters/end events, no document tree
//! - Content models compiled to position automata, with UPA checking
//! - Built-in and derived simple types with facets, lists and unions
//! - xsi:type, xsi:nil, default and fixed values
//! - ID/IDREF and unique/key/keyref identity constraints
//! - PSVI records (validity, validation attempted, normalized values)
//! - Lazy grammar resolution through a pluggable resolver
//!
//! ## Example
//!
//! ```rust
//! use xmlschema_psvi::namespaces::QName;
//! use xmlschema_psvi::validators::{GrammarBucket, SchemaGrammar, TypeRef, XsdElement, XmlSchemaValidator};
//!
//! let mut grammar = SchemaGrammar::new(None);
//! grammar.add_element(XsdElement::new(QName::local("count"), TypeRef::xsd("int")));
//! let mut grammars = GrammarBucket::new();
//! grammars.add(grammar);
//!
//! let mut validator = XmlSchemaValidator::new(grammars);
//! let report = validator.validate_str("<count>42</count>").unwrap();
//! assert!(report.is_valid());
//! assert!(report.root().unwrap().is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod names;
pub mod namespaces;
pub mod settings;

pub mod validators;
pub mod xpath;

pub mod documents;

pub use documents::{stream_document, validate_str, ValidationReport};
pub use error::{Error, Result};
pub use settings::{SchemaVersion, ValidatorSettings};
pub use validators::{ElementPsvi, GrammarBucket, SchemaGrammar, XmlSchemaValidator};

/// Version of the xmlschema-psvi library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
