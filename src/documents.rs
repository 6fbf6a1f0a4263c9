//! XML document validation
//!
//! Drives an [`XmlSchemaValidator`] from a quick-xml event stream. Namespace
//! declarations are tracked here and stripped from the attributes handed to
//! the validator.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::namespaces::{NamespaceContext, QName};
use crate::settings::ValidatorSettings;
use crate::validators::{
    CollectingReporter, ElementPsvi, ErrorReporter, GrammarBucket, ValidationError, XmlAttributes,
    XmlSchemaValidator,
};

/// Outcome of validating one document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationReport {
    /// Errors in the order they were reported
    pub errors: Vec<ValidationError>,
    /// PSVI of every element, in document order
    pub elements: Vec<ElementPsvi>,
    /// Whether validation stopped at an undeclared root
    pub detached: bool,
}

impl ValidationReport {
    /// PSVI of the root element
    pub fn root(&self) -> Option<&ElementPsvi> {
        self.elements.first()
    }

    /// No errors were reported
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// PSVI records of elements with a given local name
    pub fn find<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a ElementPsvi> + 'a {
        self.elements.iter().filter(move |e| e.name.local_name == local_name)
    }
}

struct OpenElement {
    name: QName,
    namespaces: NamespaceContext,
    index: Option<usize>,
}

/// Feed a document to a validator and return the PSVI of its elements in
/// document order. Errors go to the validator's reporter.
pub fn stream_document<R: ErrorReporter>(
    validator: &mut XmlSchemaValidator<R>,
    xml: &str,
) -> Result<Vec<ElementPsvi>> {
    let mut reader = Reader::from_str(xml);
    reader.expand_empty_elements(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut slots: Vec<Option<ElementPsvi>> = Vec::new();
    let root_namespaces = NamespaceContext::new();

    validator.start_document()?;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let parent = stack.last().map_or(&root_namespaces, |open| &open.namespaces);
                let (name, mut attributes, namespaces) = parse_start(&e, parent)?;
                let psvi = validator.start_element(&name, &mut attributes, &namespaces)?;
                let index = psvi.map(|_| {
                    slots.push(None);
                    slots.len() - 1
                });
                stack.push(OpenElement { name, namespaces, index });
            }
            Ok(Event::End(_)) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("end tag without a start tag".to_string()))?;
                let psvi = validator.end_element(&open.name)?;
                if let (Some(index), Some(psvi)) = (open.index, psvi) {
                    slots[index] = Some(psvi);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                if !stack.is_empty() {
                    validator.characters(&text)?;
                }
            }
            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| Error::Xml(format!("Invalid CDATA section: {}", e)))?;
                validator.characters(text)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!(
                    "Error parsing XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {} // comments, processing instructions, doctype
        }
    }
    if !stack.is_empty() {
        return Err(Error::Xml(format!("{} unclosed elements at end of input", stack.len())));
    }
    validator.end_document()?;
    Ok(slots.into_iter().flatten().collect())
}

/// Split a start tag into the element name, its attributes and the
/// namespace bindings in scope on it
fn parse_start(start: &BytesStart, parent: &NamespaceContext) -> Result<(QName, XmlAttributes, NamespaceContext)> {
    let mut namespaces = parent.clone();
    let mut raw_attributes = Vec::new();
    for attr_result in start.attributes() {
        let attr = attr_result.map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;
        let attr_name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
            .to_string();
        let attr_value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
            .to_string();

        if attr_name == "xmlns" {
            namespaces.set_default_namespace(attr_value);
        } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
            namespaces.add_prefix(prefix, attr_value);
        } else {
            raw_attributes.push((attr_name, attr_value));
        }
    }

    let name_bytes = start.name();
    let raw_name = std::str::from_utf8(name_bytes.as_ref())
        .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;
    let name = namespaces.resolve(raw_name)?;

    let attributes = raw_attributes
        .into_iter()
        .map(|(n, v)| Ok((namespaces.resolve_attribute(&n)?, v)))
        .collect::<Result<XmlAttributes>>()?;
    Ok((name, attributes, namespaces))
}

/// Validate a document against a set of grammars with the given settings
pub fn validate_str(grammars: GrammarBucket, settings: ValidatorSettings, xml: &str) -> Result<ValidationReport> {
    XmlSchemaValidator::new(grammars).with_settings(settings)?.validate_str(xml)
}

impl XmlSchemaValidator<CollectingReporter> {
    /// Validate a whole document held in a string.
    ///
    /// The validator is reset first, so one instance can validate many
    /// documents.
    pub fn validate_str(&mut self, xml: &str) -> Result<ValidationReport> {
        self.reset();
        let elements = stream_document(self, xml)?;
        let errors = self.reporter_mut().take();
        debug!(errors = errors.len(), elements = elements.len(), "document validated");
        Ok(ValidationReport {
            errors,
            elements,
            detached: self.is_detached(),
        })
    }
}
