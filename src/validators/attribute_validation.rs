//! Attribute validation
//!
//! Attribute uses, attribute wildcards, value constraints, default
//! attributes and the single-ID rule for attributes matched by wildcards.

use std::sync::Arc;

use crate::error::Result;
use crate::namespaces::{xsi, NamespaceContext, QName, XMLNS_NAMESPACE};

use super::base::{ValidationMode, ValidationStatus, ValidityStatus};
use super::complex_types::TypeDefinition;
use super::document_validation::XmlSchemaValidator;
use super::exceptions::ErrorReporter;
use super::globals::ResolutionTrigger;
use super::psvi::{AttributePsvi, TypeInfo};
use super::simple_types::{ValidatedInfo, XsdSimpleType};

/// An attribute of an element start tag
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// Expanded attribute name
    pub name: QName,
    /// Value as written, or the default value
    pub value: String,
    /// False when supplied from a default
    pub specified: bool,
    /// Filled in by the validator
    pub psvi: Option<AttributePsvi>,
    validated: Option<ValidatedInfo>,
}

impl XmlAttribute {
    /// A specified attribute
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            specified: true,
            psvi: None,
            validated: None,
        }
    }

    /// The typed value, once validated
    pub fn validated(&self) -> Option<&ValidatedInfo> {
        self.validated.as_ref()
    }
}

/// The attributes of an element, in document order
#[derive(Debug, Clone, Default)]
pub struct XmlAttributes {
    items: Vec<XmlAttribute>,
}

impl XmlAttributes {
    /// No attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a specified attribute
    pub fn push(&mut self, name: QName, value: impl Into<String>) {
        self.items.push(XmlAttribute::new(name, value));
    }

    /// Look up an attribute by name
    pub fn get(&self, name: &QName) -> Option<&XmlAttribute> {
        self.items.iter().find(|a| a.name == *name)
    }

    /// Value of an attribute by name
    pub fn value(&self, name: &QName) -> Option<&str> {
        self.get(name).map(|a| a.value.as_str())
    }

    /// Attributes in document order, defaults last
    pub fn iter(&self) -> std::slice::Iter<'_, XmlAttribute> {
        self.items.iter()
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(QName, String)> for XmlAttributes {
    fn from_iter<T: IntoIterator<Item = (QName, String)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(|(n, v)| XmlAttribute::new(n, v)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a XmlAttributes {
    type Item = &'a XmlAttribute;
    type IntoIter = std::slice::Iter<'a, XmlAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Namespace declarations and the xsi attributes the validator consumes
fn is_reserved(name: &QName) -> bool {
    if name.ns() == Some(XMLNS_NAMESPACE) || (name.ns().is_none() && name.local_name == "xmlns") {
        return true;
    }
    name.is_xsi()
        && matches!(
            name.local_name.as_str(),
            xsi::TYPE | xsi::NIL | xsi::SCHEMA_LOCATION | xsi::NO_NAMESPACE_SCHEMA_LOCATION
        )
}

fn matches_fixed(
    simple_type: &XsdSimpleType,
    fixed: &str,
    info: &ValidatedInfo,
    namespaces: &NamespaceContext,
) -> bool {
    simple_type
        .validate(fixed, namespaces)
        .map_or(false, |f| f.is_value_equal(info))
}

impl<R: ErrorReporter> XmlSchemaValidator<R> {
    /// Validate the attributes of an assessed element and add defaults
    pub(super) fn process_attributes(
        &mut self,
        element: &QName,
        type_def: &TypeDefinition,
        attributes: &mut XmlAttributes,
        namespaces: &NamespaceContext,
    ) -> Result<()> {
        let ctype = match type_def {
            TypeDefinition::Simple(_) => {
                for attribute in attributes.items.iter().filter(|a| !is_reserved(&a.name)) {
                    self.error("cvc-type.3.1.1", [element.to_string(), attribute.name.to_string()])?;
                }
                return Ok(());
            }
            TypeDefinition::Complex(ctype) => Arc::clone(ctype),
        };
        let is_1_0 = !self.settings.schema_version.is_1_1();

        let mut wildcard_id: Option<QName> = None;
        for attribute in attributes.items.iter_mut() {
            if is_reserved(&attribute.name) {
                continue;
            }
            let attr_name = attribute.name.to_string();
            self.contexts.push_context();

            let mut declaration = None;
            let mut use_fixed = None;
            let mut from_wildcard = false;
            match ctype.attribute_use(&attribute.name) {
                Some(attribute_use) => {
                    declaration = Some(attribute_use.attribute.clone());
                    use_fixed = attribute_use
                        .value_constraint
                        .as_ref()
                        .and_then(|c| c.fixed())
                        .map(str::to_string);
                }
                None => {
                    let grammars = &self.grammars;
                    let wildcard = ctype
                        .attribute_wildcard
                        .as_ref()
                        .filter(|w| w.allows_name(&attribute.name, |n| grammars.attribute(n).is_some()));
                    match wildcard {
                        Some(w) if w.process_contents == ValidationMode::Skip => {}
                        Some(w) => {
                            from_wildcard = true;
                            self.find_grammar(attribute.name.ns(), ResolutionTrigger::Attribute, Some(element))?;
                            declaration = self.grammars.attribute(&attribute.name);
                            if declaration.is_none() && w.process_contents == ValidationMode::Strict {
                                self.error("cvc-complex-type.3.2.2", [element.to_string(), attr_name.clone()])?;
                            }
                        }
                        None => {
                            self.error("cvc-complex-type.3.2.2", [element.to_string(), attr_name.clone()])?;
                        }
                    }
                }
            }

            let mut psvi = AttributePsvi::default();
            if let Some(decl) = &declaration {
                psvi.attribute_declaration = Some(decl.name.clone());
                psvi.type_definition = Some(TypeInfo::from(&TypeDefinition::Simple(decl.type_def.clone())));
                psvi.validation_attempted = ValidationStatus::Full;
                match decl.type_def.validate(&attribute.value, namespaces) {
                    Ok(info) => {
                        if let Some(fixed) = decl.value_constraint.as_ref().and_then(|c| c.fixed()) {
                            if !matches_fixed(&decl.type_def, fixed, &info, namespaces) {
                                self.error(
                                    "cvc-attribute.4",
                                    [element.to_string(), attr_name.clone(), attribute.value.clone(), fixed.to_string()],
                                )?;
                            }
                        }
                        if let Some(fixed) = &use_fixed {
                            if !matches_fixed(&decl.type_def, fixed, &info, namespaces) {
                                self.error(
                                    "cvc-complex-type.3.1",
                                    [element.to_string(), attr_name.clone(), attribute.value.clone(), fixed.clone()],
                                )?;
                            }
                        }
                        if from_wildcard && is_1_0 && decl.type_def.is_id_type() {
                            if let Some(previous) = &wildcard_id {
                                self.error(
                                    "cvc-complex-type.5.1",
                                    [element.to_string(), attr_name.clone(), previous.to_string()],
                                )?;
                            } else if let Some(id_use) =
                                ctype.attribute_uses.iter().find(|u| u.attribute.type_def.is_id_type())
                            {
                                self.error(
                                    "cvc-complex-type.5.2",
                                    [element.to_string(), attr_name.clone(), id_use.name().to_string()],
                                )?;
                            }
                            wildcard_id.get_or_insert_with(|| attribute.name.clone());
                        }
                        self.check_id_value(&decl.type_def, &info)?;
                        if self.settings.normalize_data {
                            psvi.schema_normalized_value = Some(info.normalized.clone());
                        }
                        psvi.member_type = info.member_type.as_ref().map(|t| t.display_name());
                        attribute.validated = Some(info);
                    }
                    Err(invalid) => {
                        self.report(invalid.into())?;
                        self.error(
                            "cvc-attribute.3",
                            [
                                element.to_string(),
                                attr_name.clone(),
                                attribute.value.clone(),
                                decl.type_def.display_name(),
                            ],
                        )?;
                    }
                }
            }

            // attribute errors also belong to the element
            psvi.error_codes = self.contexts.merge_context();
            if declaration.is_some() {
                psvi.validity = if psvi.error_codes.is_empty() {
                    ValidityStatus::Valid
                } else {
                    ValidityStatus::Invalid
                };
            }
            if self.settings.augment_psvi {
                attribute.psvi = Some(psvi);
            }
        }

        for attribute_use in &ctype.attribute_uses {
            if attributes.get(attribute_use.name()).is_some() {
                continue;
            }
            if attribute_use.required {
                self.error("cvc-complex-type.4", [element.to_string(), attribute_use.name().to_string()])?;
                continue;
            }
            let Some(constraint) = attribute_use.effective_value_constraint() else {
                continue;
            };
            let decl = &attribute_use.attribute;
            let mut defaulted = XmlAttribute::new(decl.name.clone(), constraint.value());
            defaulted.specified = false;
            let mut psvi = AttributePsvi {
                attribute_declaration: Some(decl.name.clone()),
                type_definition: Some(TypeInfo::from(&TypeDefinition::Simple(decl.type_def.clone()))),
                validation_attempted: ValidationStatus::Full,
                validity: ValidityStatus::Valid,
                specified: false,
                ..AttributePsvi::default()
            };
            if let Ok(info) = decl.type_def.validate(constraint.value(), namespaces) {
                self.check_id_value(&decl.type_def, &info)?;
                if self.settings.normalize_data {
                    psvi.schema_normalized_value = Some(info.normalized.clone());
                }
                defaulted.validated = Some(info);
            }
            if self.settings.augment_psvi {
                defaulted.psvi = Some(psvi);
            }
            attributes.items.push(defaulted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::XSI_NAMESPACE;
    use crate::settings::{SchemaVersion, ValidatorSettings};
    use crate::validators::attributes::{XsdAttribute, XsdAttributeUse};
    use crate::validators::builtins::{builtin, BuiltinKind};
    use crate::validators::complex_types::{ComplexContent, TypeRef, XsdComplexType};
    use crate::validators::elements::XsdElement;
    use crate::validators::globals::{GrammarBucket, SchemaGrammar};
    use crate::validators::wildcards::XsdWildcard;

    fn attribute(name: &str, kind: BuiltinKind) -> XsdAttribute {
        XsdAttribute::new(QName::local(name), builtin(kind))
    }

    fn validator(ctype: XsdComplexType, globals: Vec<XsdAttribute>) -> XmlSchemaValidator {
        let mut grammar = SchemaGrammar::new(Some("urn:t"));
        for a in globals {
            grammar.add_attribute(a);
        }
        grammar.add_element(XsdElement::new(QName::namespaced("urn:t", "e"), TypeRef::from(ctype)));
        let mut bucket = GrammarBucket::new();
        bucket.add(grammar);
        XmlSchemaValidator::new(bucket)
    }

    fn start(v: &mut XmlSchemaValidator, attributes: &mut XmlAttributes) {
        v.start_document().unwrap();
        v.start_element(&QName::namespaced("urn:t", "e"), attributes, &NamespaceContext::new())
            .unwrap();
    }

    fn keys(v: &XmlSchemaValidator) -> Vec<String> {
        v.reporter().errors().iter().map(|e| e.key.clone()).collect()
    }

    #[test]
    fn test_defaults_and_required() {
        let ctype = XsdComplexType::new(None, ComplexContent::Empty)
            .with_attribute(XsdAttributeUse::optional(attribute("lang", BuiltinKind::Language)).with_default("en"))
            .with_attribute(XsdAttributeUse::required(attribute("id", BuiltinKind::Id)));
        let mut v = validator(ctype, vec![]);
        let mut attributes = XmlAttributes::new();
        start(&mut v, &mut attributes);

        assert_eq!(keys(&v), vec!["cvc-complex-type.4"]);
        let lang = attributes.get(&QName::local("lang")).unwrap();
        assert!(!lang.specified);
        assert_eq!(lang.value, "en");
        let psvi = lang.psvi.as_ref().unwrap();
        assert!(!psvi.specified);
        assert!(psvi.is_valid());
    }

    #[test]
    fn test_fixed_attribute_compares_values() {
        let ctype = || {
            XsdComplexType::new(None, ComplexContent::Empty)
                .with_attribute(XsdAttributeUse::optional(attribute("n", BuiltinKind::Decimal)).with_fixed("1.0"))
        };
        let mut v = validator(ctype(), vec![]);
        let mut attributes: XmlAttributes = [(QName::local("n"), "01.00".to_string())].into_iter().collect();
        start(&mut v, &mut attributes);
        assert!(keys(&v).is_empty());

        let mut v = validator(ctype(), vec![]);
        let mut attributes: XmlAttributes = [(QName::local("n"), "2".to_string())].into_iter().collect();
        start(&mut v, &mut attributes);
        assert_eq!(keys(&v), vec!["cvc-complex-type.3.1"]);
    }

    #[test]
    fn test_wildcard_processing() {
        let ctype = XsdComplexType::new(None, ComplexContent::Empty)
            .with_attribute_wildcard(XsdWildcard::any(ValidationMode::Strict));
        let global = XsdAttribute::global(QName::namespaced("urn:t", "g"), builtin(BuiltinKind::Int));
        let mut v = validator(ctype, vec![global]);
        let mut attributes: XmlAttributes = [
            (QName::namespaced("urn:t", "g"), "5".to_string()),
            (QName::namespaced("urn:t", "h"), "x".to_string()),
        ]
        .into_iter()
        .collect();
        start(&mut v, &mut attributes);

        assert_eq!(keys(&v), vec!["cvc-complex-type.3.2.2"]);
        let g = attributes.get(&QName::namespaced("urn:t", "g")).unwrap();
        assert!(g.psvi.as_ref().unwrap().is_valid());
        assert!(g.validated().is_some());
        let h = attributes.get(&QName::namespaced("urn:t", "h")).unwrap();
        assert_eq!(h.psvi.as_ref().unwrap().validity, ValidityStatus::NotKnown);
    }

    #[test]
    fn test_undeclared_element_attributes_are_lax() {
        let ctype = XsdComplexType::new(None, ComplexContent::Empty);
        let global = XsdAttribute::global(QName::namespaced("urn:t", "g"), builtin(BuiltinKind::Int));
        let mut v = validator(ctype, vec![global]);
        let mut attributes: XmlAttributes = [
            (QName::namespaced("urn:t", "g"), "x".to_string()),
            (QName::namespaced("urn:t", "h"), "x".to_string()),
        ]
        .into_iter()
        .collect();
        v.start_document().unwrap();
        let psvi = v
            .start_element(&QName::namespaced("urn:t", "undeclared"), &mut attributes, &NamespaceContext::new())
            .unwrap();

        assert_eq!(keys(&v), vec!["cvc-elt.1.a", "cvc-datatype-valid.1.2.1", "cvc-attribute.3"]);
        assert!(psvi.is_some());
        let g = attributes.get(&QName::namespaced("urn:t", "g")).unwrap();
        assert_eq!(g.psvi.as_ref().unwrap().validity, ValidityStatus::Invalid);
        let h = attributes.get(&QName::namespaced("urn:t", "h")).unwrap();
        assert_eq!(h.psvi.as_ref().unwrap().validity, ValidityStatus::NotKnown);

        let element = v.end_element(&QName::namespaced("urn:t", "undeclared")).unwrap().unwrap();
        assert_eq!(element.validity, ValidityStatus::NotKnown);
        assert_eq!(element.validation_attempted, ValidationStatus::None);
    }

    #[test]
    fn test_second_id_through_wildcard() {
        let ctype = || {
            XsdComplexType::new(None, ComplexContent::Empty)
                .with_attribute(XsdAttributeUse::optional(attribute("key", BuiltinKind::Id)))
                .with_attribute_wildcard(XsdWildcard::any(ValidationMode::Lax))
        };
        let global = XsdAttribute::global(QName::namespaced("urn:t", "ref"), builtin(BuiltinKind::Id));
        let mut attributes: XmlAttributes = [(QName::namespaced("urn:t", "ref"), "r1".to_string())]
            .into_iter()
            .collect();

        let mut v = validator(ctype(), vec![global.clone()]);
        start(&mut v, &mut attributes.clone());
        assert_eq!(keys(&v), vec!["cvc-complex-type.5.2"]);

        let settings = ValidatorSettings::new().with_schema_version(SchemaVersion::V1_1);
        let mut v = validator(ctype(), vec![global]).with_settings(settings).unwrap();
        start(&mut v, &mut attributes);
        assert!(keys(&v).is_empty());
    }

    #[test]
    fn test_reserved_attributes_are_not_validated() {
        let ctype = XsdComplexType::new(None, ComplexContent::Empty);
        let mut v = validator(ctype, vec![]);
        let mut attributes: XmlAttributes = [
            (QName::namespaced(XSI_NAMESPACE, "schemaLocation"), "urn:t t.xsd".to_string()),
            (QName::local("xmlns"), "urn:t".to_string()),
        ]
        .into_iter()
        .collect();
        start(&mut v, &mut attributes);
        assert!(keys(&v).is_empty());
    }
}
