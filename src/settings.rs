//! Validator settings
//!
//! The recognized configuration surface of the validator. Settings can be
//! built in code with the `with_*` setters or deserialized from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::namespaces::QName;
use crate::validators::base::ValidationMode;

/// XML Schema language version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// XSD 1.0
    #[default]
    #[serde(rename = "1.0")]
    V1_0,
    /// XSD 1.1
    #[serde(rename = "1.1")]
    V1_1,
}

impl SchemaVersion {
    /// Whether XSD 1.1 rules apply
    pub fn is_1_1(self) -> bool {
        self == SchemaVersion::V1_1
    }
}

/// Options controlling a validator instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidatorSettings {
    /// Run whole-grammar constraint checks (UPA, element consistency)
    pub schema_full_checking: bool,
    /// Only validate documents whose root has a declaration
    pub dynamic_validation: bool,
    /// Expose schema-normalized values in the PSVI
    pub normalize_data: bool,
    /// Attach PSVI records to elements and attributes
    pub augment_psvi: bool,
    /// Never call the grammar resolver
    pub use_grammar_pool_only: bool,
    /// Ignore xsi:type attributes
    pub ignore_xsi_type: bool,
    /// Check ID uniqueness and IDREF resolution
    pub id_idref_checking: bool,
    /// Evaluate unique/key/keyref constraints
    pub identity_constraint_checking: bool,
    /// Stipulated type of the validation root
    pub root_type_definition: Option<QName>,
    /// Stipulated declaration of the validation root
    pub root_element_declaration: Option<QName>,
    /// Schema language version
    pub schema_version: SchemaVersion,
    /// Assessment applied to a root without a declaration
    pub validate_content: ValidationMode,
    /// Maximum element depth, `None` for unlimited
    pub max_depth: Option<usize>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            schema_full_checking: false,
            dynamic_validation: false,
            normalize_data: true,
            augment_psvi: true,
            use_grammar_pool_only: false,
            ignore_xsi_type: false,
            id_idref_checking: true,
            identity_constraint_checking: true,
            root_type_definition: None,
            root_element_declaration: None,
            schema_version: SchemaVersion::V1_0,
            validate_content: ValidationMode::Strict,
            max_depth: None,
        }
    }
}

impl ValidatorSettings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.check()?;
        Ok(settings)
    }

    /// Reject contradictory option combinations
    pub fn check(&self) -> Result<()> {
        if self.root_type_definition.is_some() && self.root_element_declaration.is_some() {
            return Err(Error::Config(
                "root-type-definition and root-element-declaration are mutually exclusive"
                    .to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(Error::Config("max-depth must be positive".to_string()));
        }
        Ok(())
    }

    /// Enable or disable full schema checking
    pub fn with_full_checking(mut self, enabled: bool) -> Self {
        self.schema_full_checking = enabled;
        self
    }

    /// Enable or disable dynamic validation
    pub fn with_dynamic_validation(mut self, enabled: bool) -> Self {
        self.dynamic_validation = enabled;
        self
    }

    /// Enable or disable normalized values in the PSVI
    pub fn with_normalize_data(mut self, enabled: bool) -> Self {
        self.normalize_data = enabled;
        self
    }

    /// Enable or disable PSVI augmentation
    pub fn with_augment_psvi(mut self, enabled: bool) -> Self {
        self.augment_psvi = enabled;
        self
    }

    /// Never consult the grammar resolver
    pub fn with_grammar_pool_only(mut self, enabled: bool) -> Self {
        self.use_grammar_pool_only = enabled;
        self
    }

    /// Ignore xsi:type attributes
    pub fn with_ignore_xsi_type(mut self, enabled: bool) -> Self {
        self.ignore_xsi_type = enabled;
        self
    }

    /// Enable or disable ID/IDREF checking
    pub fn with_id_idref_checking(mut self, enabled: bool) -> Self {
        self.id_idref_checking = enabled;
        self
    }

    /// Enable or disable identity-constraint checking
    pub fn with_identity_constraint_checking(mut self, enabled: bool) -> Self {
        self.identity_constraint_checking = enabled;
        self
    }

    /// Stipulate the root type
    pub fn with_root_type(mut self, name: QName) -> Self {
        self.root_type_definition = Some(name);
        self
    }

    /// Stipulate the root element declaration
    pub fn with_root_element(mut self, name: QName) -> Self {
        self.root_element_declaration = Some(name);
        self
    }

    /// Select the schema language version
    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    /// Assessment for undeclared roots
    pub fn with_validate_content(mut self, mode: ValidationMode) -> Self {
        self.validate_content = mode;
        self
    }

    /// Limit the element depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
