//! XPath Selectors for XML Schema
//!
//! Identity constraints use a small XPath subset:
//!
//! ```text
//! Selector ::= Path ( '|' Path )*
//! Path     ::= ('.//')? Step ( '/' Step )*
//! Step     ::= '.' | NameTest
//! Field    ::= FPath ( '|' FPath )*
//! FPath    ::= ('.//')? ( Step '/' )* ( Step | '@' NameTest )
//! NameTest ::= QName | '*' | NCName ':' '*'
//! ```
//!
//! Paths are compiled once against the schema's namespace bindings and
//! then matched against the chain of element names below the context
//! element.

use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, split_qname};
use crate::namespaces::{NamespaceContext, QName};

/// A name test in a path step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// `prefix:*`
    Namespace(Option<String>),
    /// A qualified name
    Name(QName),
}

impl NameTest {
    fn parse(test: &str, namespaces: &NamespaceContext, xpath: &str) -> Result<Self> {
        if test == "*" {
            return Ok(NameTest::Any);
        }
        let (prefix, local) = split_qname(test);
        let namespace = match prefix {
            Some(prefix) => {
                if !is_valid_ncname(prefix) {
                    return Err(invalid(xpath, "invalid prefix"));
                }
                let uri = namespaces.get_namespace(prefix).ok_or_else(|| {
                    Error::XPath(format!("unbound prefix '{}' in '{}'", prefix, xpath))
                })?;
                Some(uri.to_string())
            }
            None => None,
        };
        if local == "*" && prefix.is_some() {
            return Ok(NameTest::Namespace(namespace));
        }
        if !is_valid_ncname(local) {
            return Err(invalid(xpath, "invalid name test"));
        }
        Ok(NameTest::Name(QName::new(namespace, local)))
    }

    /// Check a name against this test
    pub fn matches(&self, name: &QName) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Namespace(ns) => name.namespace == *ns,
            NameTest::Name(expected) => expected == name,
        }
    }
}

/// One alternative of a selector or field expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    /// Starts with `.//`
    pub descendant: bool,
    /// Element steps; `.` steps are dropped
    pub steps: Vec<NameTest>,
    /// Final attribute step (fields only)
    pub attribute: Option<NameTest>,
}

impl LocationPath {
    /// Match the names of the elements from the context element (exclusive)
    /// down to the current element (inclusive)
    pub fn matches_element(&self, path: &[QName]) -> bool {
        let n = self.steps.len();
        if self.descendant {
            if path.len() < n {
                return false;
            }
        } else if path.len() != n {
            return false;
        }
        path[path.len() - n..]
            .iter()
            .zip(&self.steps)
            .all(|(name, test)| test.matches(name))
    }
}

/// A compiled identity-constraint selector or field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPath {
    /// Source expression
    pub xpath: String,
    /// Alternatives separated by `|`
    pub alternatives: Vec<LocationPath>,
}

impl IdentityPath {
    /// Compile a selector expression
    pub fn selector(xpath: &str, namespaces: &NamespaceContext) -> Result<Self> {
        Self::compile(xpath, namespaces, false)
    }

    /// Compile a field expression
    pub fn field(xpath: &str, namespaces: &NamespaceContext) -> Result<Self> {
        Self::compile(xpath, namespaces, true)
    }

    fn compile(xpath: &str, namespaces: &NamespaceContext, allow_attribute: bool) -> Result<Self> {
        let compact: String = xpath.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(invalid(xpath, "empty expression"));
        }
        let alternatives = compact
            .split('|')
            .map(|alt| parse_location_path(alt, namespaces, allow_attribute, xpath))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            xpath: xpath.to_string(),
            alternatives,
        })
    }

    /// Whether the current element is selected
    pub fn matches_element(&self, path: &[QName]) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.attribute.is_none() && alt.matches_element(path))
    }

    /// The attribute tests applying at the current element
    pub fn attribute_tests<'a>(&'a self, path: &'a [QName]) -> impl Iterator<Item = &'a NameTest> + 'a {
        self.alternatives.iter().filter_map(move |alt| match &alt.attribute {
            Some(test) if alt.matches_element(path) => Some(test),
            _ => None,
        })
    }
}

fn parse_location_path(
    path: &str,
    namespaces: &NamespaceContext,
    allow_attribute: bool,
    xpath: &str,
) -> Result<LocationPath> {
    let (descendant, rest) = match path.strip_prefix(".//") {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    if rest.is_empty() {
        return Err(invalid(xpath, "missing step"));
    }

    let segments: Vec<&str> = rest.split('/').collect();
    let mut steps = Vec::new();
    let mut attribute = None;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(invalid(xpath, "'//' is only allowed at the start"));
        }
        let attr_test = segment
            .strip_prefix('@')
            .or_else(|| segment.strip_prefix("attribute::"));
        if let Some(test) = attr_test {
            if !allow_attribute || i + 1 != segments.len() {
                return Err(invalid(xpath, "attribute step not allowed here"));
            }
            attribute = Some(NameTest::parse(test, namespaces, xpath)?);
            continue;
        }
        if *segment == "." {
            continue;
        }
        let test = segment.strip_prefix("child::").unwrap_or(segment);
        steps.push(NameTest::parse(test, namespaces, xpath)?);
    }

    Ok(LocationPath {
        descendant,
        steps,
        attribute,
    })
}

fn invalid(xpath: &str, reason: &str) -> Error {
    Error::XPath(format!("invalid identity-constraint xpath '{}': {}", xpath, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<QName> {
        list.iter().map(|n| QName::local(*n)).collect()
    }

    #[test]
    fn test_child_selector() {
        let ns = NamespaceContext::new();
        let sel = IdentityPath::selector("item", &ns).unwrap();
        assert!(sel.matches_element(&names(&["item"])));
        assert!(!sel.matches_element(&names(&["list", "item"])));
        assert!(!sel.matches_element(&[]));
    }

    #[test]
    fn test_descendant_selector() {
        let ns = NamespaceContext::new();
        let sel = IdentityPath::selector(".//item", &ns).unwrap();
        assert!(sel.matches_element(&names(&["item"])));
        assert!(sel.matches_element(&names(&["a", "b", "item"])));
        assert!(!sel.matches_element(&names(&["item", "x"])));
    }

    #[test]
    fn test_self_and_union() {
        let ns = NamespaceContext::new();
        let sel = IdentityPath::selector(". | a/*", &ns).unwrap();
        assert_eq!(sel.alternatives.len(), 2);
        assert!(sel.matches_element(&[]));
        assert!(sel.matches_element(&names(&["a", "zzz"])));
        assert!(!sel.matches_element(&names(&["b", "zzz"])));
    }

    #[test]
    fn test_prefixed_tests() {
        let mut ns = NamespaceContext::new();
        ns.add_prefix("t", "urn:t");
        let sel = IdentityPath::selector("t:item/t:*", &ns).unwrap();
        let path = vec![QName::namespaced("urn:t", "item"), QName::namespaced("urn:t", "x")];
        assert!(sel.matches_element(&path));
        assert!(!sel.matches_element(&names(&["item", "x"])));
        assert!(matches!(
            IdentityPath::selector("u:item", &ns),
            Err(Error::XPath(_))
        ));
    }

    #[test]
    fn test_field_attribute() {
        let ns = NamespaceContext::new();
        let field = IdentityPath::field("@id", &ns).unwrap();
        assert!(!field.matches_element(&[]));
        let tests: Vec<_> = field.attribute_tests(&[]).collect();
        assert_eq!(tests, vec![&NameTest::Name(QName::local("id"))]);

        let nested = IdentityPath::field("child/@ref", &ns).unwrap();
        assert_eq!(nested.attribute_tests(&names(&["child"])).count(), 1);
        assert_eq!(nested.attribute_tests(&[]).count(), 0);
    }

    #[test]
    fn test_rejected_expressions() {
        let ns = NamespaceContext::new();
        assert!(IdentityPath::selector("@id", &ns).is_err());
        assert!(IdentityPath::selector("a//b", &ns).is_err());
        assert!(IdentityPath::selector("", &ns).is_err());
        assert!(IdentityPath::field("@id/x", &ns).is_err());
        assert!(IdentityPath::selector("a[1]", &ns).is_err());
    }
}
