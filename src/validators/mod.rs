//! XML Schema validators
//!
//! Schema components are built in memory (see [`globals::SchemaGrammar`])
//! and handed to an [`XmlSchemaValidator`], which assesses an instance
//! document one event at a time.

// Foundation
pub mod base;
pub mod exceptions;
pub mod messages;

// Type system
pub mod builtins;
pub mod facets;
pub mod simple_types;
pub mod derivation;

// Structures
pub mod wildcards;
pub mod particles;
pub mod groups;
pub mod elements;
pub mod attributes;
pub mod complex_types;
pub mod globals;

// Content models and schema constraints
pub mod models;
pub mod checker;

// Identity
pub mod identities;
pub mod value_stores;
pub mod id_context;

// Instance validation
pub mod psvi;
pub mod attribute_validation;
pub mod document_validation;

pub use attribute_validation::{XmlAttribute, XmlAttributes};
pub use base::{ValidationMode, ValidationStatus, ValidityStatus};
pub use checker::SchemaConstraintChecker;
pub use complex_types::{ComplexContent, TypeDefinition, TypeRef, XsdComplexType};
pub use document_validation::{DepthMarkers, XmlSchemaValidator};
pub use elements::{ValueConstraint, XsdElement};
pub use exceptions::{CollectingReporter, Diagnostic, ErrorReporter, Severity, ValidationError};
pub use globals::{
    GrammarBucket, GrammarRequest, GrammarResolver, LocationResolver, NoResolver, ResolutionTrigger,
    SchemaGrammar, SchemaLocationHint,
};
pub use models::ContentModel;
pub use psvi::{AttributePsvi, ElementPsvi, TypeInfo};
pub use simple_types::{ValidatedInfo, XsdSimpleType};
