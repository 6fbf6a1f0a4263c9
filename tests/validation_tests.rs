//! Integration tests for instance validation and the PSVI
//!
//! Grammars are built programmatically; documents go through the quick-xml
//! driver or straight through the event API.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use xmlschema_psvi::namespaces::{NamespaceContext, QName};
use xmlschema_psvi::validators::base::{ValidationMode, ValidationStatus, ValidityStatus};
use xmlschema_psvi::validators::derivation::{DerivationFlags, DerivationMethod};
use xmlschema_psvi::validators::groups::XsdGroup;
use xmlschema_psvi::validators::identities::IdentityBuilder;
use xmlschema_psvi::validators::particles::XsdParticle;
use xmlschema_psvi::validators::wildcards::{NamespaceConstraint, XsdWildcard};
use xmlschema_psvi::validators::attributes::{XsdAttribute, XsdAttributeUse};
use xmlschema_psvi::validators::builtins::{builtin, BuiltinKind};
use xmlschema_psvi::validators::{
    ComplexContent, GrammarBucket, SchemaGrammar, TypeDefinition, TypeRef, XmlAttributes,
    XmlSchemaValidator, XsdComplexType, XsdElement,
};
use xmlschema_psvi::{validate_str, SchemaVersion, ValidationReport, ValidatorSettings};

const XSI: &str = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

fn local(name: &str) -> QName {
    QName::local(name)
}

fn keys(report: &ValidationReport) -> Vec<&str> {
    report.errors.iter().map(|e| e.key.as_str()).collect()
}

fn attempted(report: &ValidationReport) -> Vec<(String, ValidationStatus)> {
    report
        .elements
        .iter()
        .map(|e| (e.name.local_name.clone(), e.validation_attempted))
        .collect()
}

fn bucket(grammar: SchemaGrammar) -> GrammarBucket {
    let mut bucket = GrammarBucket::new();
    bucket.add(grammar);
    bucket
}

/// `root` takes anything laxly, `strict` takes `known` elements only
fn lax_grammar() -> GrammarBucket {
    let mut grammar = SchemaGrammar::new(None);
    let known = grammar.add_element(XsdElement::new(local("known"), TypeRef::xsd("int")));
    let anything = XsdParticle::wildcard(XsdWildcard::any(ValidationMode::Lax)).with_occurs(0, None);
    let root = XsdComplexType::new(None, ComplexContent::element_only(XsdGroup::sequence(vec![anything])));
    grammar.add_element(XsdElement::new(local("root"), TypeRef::from(root)));
    let strict = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![
            XsdParticle::element(known).with_occurs(0, None)
        ])),
    );
    grammar.add_element(XsdElement::new(local("strict"), TypeRef::from(strict)));
    bucket(grammar)
}

#[test]
fn test_validation_attempted_aggregation() {
    let xml = "<root><u><known>1</known><v/></u><known>2</known><w><x/></w></root>";
    let report = XmlSchemaValidator::new(lax_grammar()).validate_str(xml).unwrap();

    assert_eq!(
        attempted(&report),
        vec![
            ("root".to_string(), ValidationStatus::Partial),
            ("u".to_string(), ValidationStatus::Partial),
            ("known".to_string(), ValidationStatus::Full),
            ("v".to_string(), ValidationStatus::None),
            ("known".to_string(), ValidationStatus::Full),
            ("w".to_string(), ValidationStatus::None),
            ("x".to_string(), ValidationStatus::None),
        ]
    );
    assert!(report.is_valid());
}

#[test]
fn test_depth_markers_never_dangle() {
    // Some starts an element, None ends the innermost open one
    let events: &[Option<&str>] = &[
        Some("root"),
        Some("u"),
        Some("known"),
        None,
        Some("v"),
        Some("known"),
        None,
        None,
        None,
        Some("known"),
        None,
        Some("w"),
        None,
        None,
    ];
    let mut validator = XmlSchemaValidator::new(lax_grammar());
    let ns = NamespaceContext::new();
    let mut open = Vec::new();
    validator.start_document().unwrap();
    for event in events {
        match event {
            Some(name) => {
                validator.start_element(&local(name), &mut XmlAttributes::new(), &ns).unwrap();
                if *name == "known" {
                    validator.characters("5").unwrap();
                }
                open.push(local(name));
            }
            None => {
                let depth = validator.depth();
                let name = open.pop().unwrap();
                validator.end_element(&name).unwrap();
                let markers = validator.depth_markers();
                assert!(markers.last_full < depth, "{:?} after depth {}", markers, depth);
                assert!(markers.last_none < depth, "{:?} after depth {}", markers, depth);
            }
        }
    }
    validator.end_document().unwrap();
    assert_eq!(validator.depth_markers().last_full, -1);
    assert_eq!(validator.depth_markers().last_none, -1);
}

#[test]
fn test_validity_propagates_through_strict_chain_only() {
    let mut validator = XmlSchemaValidator::new(lax_grammar());

    let report = validator.validate_str("<strict><known>bad</known></strict>").unwrap();
    assert_eq!(report.root().unwrap().validity, ValidityStatus::Invalid);
    assert_eq!(report.find("known").next().unwrap().validity, ValidityStatus::Invalid);

    // the unknown element is laxly assessed: its errors stay below it
    let report = validator.validate_str("<root><u><known>bad</known></u></root>").unwrap();
    assert_eq!(keys(&report), vec!["cvc-datatype-valid.1.2.1", "cvc-type.3.1.3"]);
    assert_eq!(report.find("known").next().unwrap().validity, ValidityStatus::Invalid);
    let u = report.find("u").next().unwrap();
    assert_eq!(u.validity, ValidityStatus::NotKnown);
    assert_eq!(u.error_codes.len(), 2);
    assert_eq!(report.root().unwrap().validity, ValidityStatus::Valid);
}

fn item_list(identities: Vec<xmlschema_psvi::validators::identities::XsdIdentity>) -> GrammarBucket {
    typed_item_list(BuiltinKind::String, identities)
}

fn typed_item_list(
    id_type: BuiltinKind,
    identities: Vec<xmlschema_psvi::validators::identities::XsdIdentity>,
) -> GrammarBucket {
    let mut grammar = SchemaGrammar::new(None);
    let with_id = || {
        XsdComplexType::new(None, ComplexContent::Empty)
            .with_attribute(XsdAttributeUse::required(XsdAttribute::new(local("id"), builtin(id_type))))
    };
    let item = Arc::new(XsdElement::new(local("item"), TypeRef::from(with_id())));
    let reference = Arc::new(XsdElement::new(local("ref"), TypeRef::from(with_id())));
    let content = XsdGroup::choice(vec![XsdParticle::element(item), XsdParticle::element(reference)]);
    let list = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::group(content).with_occurs(0, None)])),
    );
    let mut root = XsdElement::new(local("list"), TypeRef::from(list));
    for identity in identities {
        root = root.with_identity(identity);
    }
    grammar.add_element(root);
    bucket(grammar)
}

#[test]
fn test_unique_round_trip() {
    let unique = IdentityBuilder::unique()
        .name(local("uniqueId"))
        .selector("item")
        .field("@id")
        .build()
        .unwrap();
    let mut validator = XmlSchemaValidator::new(item_list(vec![unique]));

    let report = validator.validate_str(r#"<list><item id="a"/><item id="b"/></list>"#).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);

    let report = validator.validate_str(r#"<list><item id="a"/><item id="a"/></list>"#).unwrap();
    assert_eq!(keys(&report), vec!["DuplicateUnique"]);
    assert_eq!(report.errors[0].path.as_deref(), Some("/list/item"));
    let items: Vec<ValidityStatus> = report.find("item").map(|i| i.validity).collect();
    assert_eq!(items, vec![ValidityStatus::Valid, ValidityStatus::Invalid]);
}

#[test]
fn test_identity_values_compare_in_value_space() {
    let key = IdentityBuilder::key()
        .name(local("itemKey"))
        .selector("item")
        .field("@id")
        .build()
        .unwrap();
    let keyref = IdentityBuilder::keyref()
        .name(local("itemRef"))
        .selector("ref")
        .field("@id")
        .refer(local("itemKey"))
        .build()
        .unwrap();
    let mut validator = XmlSchemaValidator::new(typed_item_list(BuiltinKind::Decimal, vec![key, keyref]));

    let report = validator.validate_str(r#"<list><item id="1.0"/><item id="1.00"/></list>"#).unwrap();
    assert_eq!(keys(&report), vec!["DuplicateKey"]);

    let report = validator.validate_str(r#"<list><ref id="2"/><item id="02.0"/></list>"#).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);

    let report = validator.validate_str(r#"<list><item id="1.5"/><item id="15"/></list>"#).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn test_keyref_resolution() {
    let constraints = || {
        let key = IdentityBuilder::key()
            .name(local("itemKey"))
            .selector("item")
            .field("@id")
            .build()
            .unwrap();
        let keyref = IdentityBuilder::keyref()
            .name(local("itemRef"))
            .selector("ref")
            .field("@id")
            .refer(local("itemKey"))
            .build()
            .unwrap();
        vec![key, keyref]
    };

    let mut validator = XmlSchemaValidator::new(item_list(constraints()));
    let report = validator.validate_str(r#"<list><ref id="x"/><item id="a"/></list>"#).unwrap();
    assert_eq!(keys(&report), vec!["KeyNotFound"]);

    // the key may appear after the reference
    let report = validator.validate_str(r#"<list><ref id="a"/><item id="a"/></list>"#).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn test_blocked_xsi_type_keeps_declared_type() {
    let mut grammar = SchemaGrammar::new(None);
    let optional_a = || {
        XsdGroup::sequence(vec![XsdParticle::element(Arc::new(XsdElement::new(
            local("a"),
            TypeRef::xsd("string"),
        )))
        .with_occurs(0, Some(1))])
    };
    let base = grammar.add_complex_type(XsdComplexType::new(Some(local("T")), ComplexContent::element_only(optional_a())));
    grammar.add_complex_type(
        XsdComplexType::new(Some(local("R")), ComplexContent::element_only(XsdGroup::sequence(vec![])))
            .derived_from(TypeDefinition::Complex(base), DerivationMethod::Restriction),
    );
    grammar.add_element(
        XsdElement::new(local("e"), TypeRef::Named(local("T"))).with_block(DerivationFlags::from_attr("restriction")),
    );
    let grammars = bucket(grammar);

    let xml = format!(r#"<e {} xsi:type="R"><a>kept</a></e>"#, XSI);
    let report = XmlSchemaValidator::new(grammars).validate_str(&xml).unwrap();
    // <a> is accepted by T, so the only error is the rejected override
    assert_eq!(keys(&report), vec!["cvc-elt.4.3"]);
    assert_eq!(report.root().unwrap().type_definition.as_ref().unwrap().name, "T");
}

#[test]
fn test_xsi_type_resolution_errors() {
    let xml = format!(r#"<strict {} xsi:type="p:T"/>"#, XSI);
    let report = XmlSchemaValidator::new(lax_grammar()).validate_str(&xml).unwrap();
    assert_eq!(keys(&report), vec!["cvc-elt.4.1"]);

    let xml = format!(r#"<strict {} xsi:type="Missing"/>"#, XSI);
    let report = XmlSchemaValidator::new(lax_grammar()).validate_str(&xml).unwrap();
    assert_eq!(keys(&report), vec!["cvc-elt.4.2"]);
}

fn ambiguous_grammar(first: &str, second: &str) -> GrammarBucket {
    let wildcard = |ns: &str| {
        XsdParticle::wildcard(XsdWildcard::new(
            NamespaceConstraint::enumeration([Some(ns)]),
            ValidationMode::Lax,
        ))
    };
    let mut grammar = SchemaGrammar::new(None);
    let choice = XsdGroup::choice(vec![wildcard(first), wildcard(second)]);
    let root = XsdComplexType::new(
        Some(local("Root")),
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::group(choice).with_occurs(0, None)])),
    );
    grammar.add_complex_type(root);
    grammar.add_element(XsdElement::new(local("root"), TypeRef::Named(local("Root"))));
    bucket(grammar)
}

#[test]
fn test_full_checking_detects_ambiguity() {
    let settings = ValidatorSettings::new().with_full_checking(true);

    let report = validate_str(ambiguous_grammar("urn:a", "urn:a"), settings.clone(), "<root/>").unwrap();
    assert_eq!(keys(&report), vec!["cos-nonambig"]);
    // schema errors do not touch the instance's validity
    assert!(report.root().unwrap().is_valid());

    let report = validate_str(ambiguous_grammar("urn:a", "urn:b"), settings, "<root/>").unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn test_reset_isolation() {
    let unique = IdentityBuilder::unique()
        .name(local("uniqueId"))
        .selector("item")
        .field("@id")
        .build()
        .unwrap();
    let second = r#"<list><item id="a"/><ref id="r"/><item id="a"/></list>"#;
    let grammars = item_list(vec![unique]);
    let fresh = XmlSchemaValidator::new(grammars.clone()).validate_str(second).unwrap();

    // leave the first document half done, with value stores and markers live
    let mut validator = XmlSchemaValidator::new(grammars);
    let ns = NamespaceContext::new();
    validator.start_document().unwrap();
    validator.start_element(&local("list"), &mut XmlAttributes::new(), &ns).unwrap();
    let mut attributes: XmlAttributes = [(local("id"), "a".to_string())].into_iter().collect();
    validator.start_element(&local("item"), &mut attributes, &ns).unwrap();
    validator.start_element(&local("bogus"), &mut XmlAttributes::new(), &ns).unwrap();
    validator.reset();
    assert_eq!(validator.depth(), -1);
    assert!(validator.reporter().is_empty());

    let report = validator.validate_str(second).unwrap();
    assert_eq!(report.errors, fresh.errors);
    assert_eq!(report.elements, fresh.elements);
}

#[test]
fn test_nil_default_and_fixed() {
    let mut grammar = SchemaGrammar::new(None);
    let element = |name: &str| Arc::new(XsdElement::new(local(name), TypeRef::xsd("decimal")));
    let nillable = Arc::new(XsdElement::new(local("n"), TypeRef::xsd("int")).with_nillable(true));
    let defaulted = Arc::new(XsdElement::new(local("d"), TypeRef::xsd("int")).with_default("7"));
    let fixed = Arc::new(XsdElement::new(local("f"), TypeRef::xsd("decimal")).with_fixed("1.5"));
    let content = XsdGroup::sequence(vec![
        XsdParticle::element(nillable),
        XsdParticle::element(defaulted),
        XsdParticle::element(fixed),
        XsdParticle::element(element("plain")).with_occurs(0, Some(1)),
    ]);
    let root = XsdComplexType::new(None, ComplexContent::element_only(content));
    grammar.add_element(XsdElement::new(local("root"), TypeRef::from(root)));
    let grammars = bucket(grammar);

    let xml = format!(r#"<root {}><n xsi:nil="true"/><d/><f>1.50</f></root>"#, XSI);
    let report = XmlSchemaValidator::new(grammars.clone()).validate_str(&xml).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(report.find("n").next().unwrap().nil);
    let d = report.find("d").next().unwrap();
    assert!(d.schema_default);
    assert_eq!(d.schema_normalized_value.as_deref(), Some("7"));

    let xml = format!(r#"<root {}><n xsi:nil="true">3</n><d>1</d><f>2</f></root>"#, XSI);
    let report = XmlSchemaValidator::new(grammars).validate_str(&xml).unwrap();
    assert_eq!(keys(&report), vec!["cvc-elt.3.2.1", "cvc-elt.5.2.2.2.2"]);
}

#[test]
fn test_id_and_idref() {
    let mut grammar = SchemaGrammar::new(None);
    let node = XsdComplexType::new(None, ComplexContent::Empty)
        .with_attribute(XsdAttributeUse::optional(XsdAttribute::new(local("id"), builtin(BuiltinKind::Id))))
        .with_attribute(XsdAttributeUse::optional(XsdAttribute::new(local("to"), builtin(BuiltinKind::IdRefs))));
    let node = Arc::new(XsdElement::new(local("node"), TypeRef::from(node)));
    let graph = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::element(node).with_occurs(0, None)])),
    );
    grammar.add_element(XsdElement::new(local("graph"), TypeRef::from(graph)));
    let mut validator = XmlSchemaValidator::new(bucket(grammar));

    let report = validator
        .validate_str(r#"<graph><node id="a" to="b"/><node id="b" to="a b"/></graph>"#)
        .unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);

    let report = validator
        .validate_str(r#"<graph><node id="a" to="c"/><node id="a"/></graph>"#)
        .unwrap();
    assert_eq!(keys(&report), vec!["cvc-id.2", "cvc-id.1"]);
    assert_eq!(report.root().unwrap().validity, ValidityStatus::Invalid);
}

#[test]
fn test_group_occurrence_bounds() {
    let mut grammar = SchemaGrammar::new(None);
    let leaf = |name: &str| XsdParticle::element(Arc::new(XsdElement::new(local(name), TypeRef::xsd("int"))));
    let pair = XsdParticle::group(XsdGroup::sequence(vec![leaf("a"), leaf("b")])).with_occurs(70, Some(70));
    let root = XsdComplexType::new(None, ComplexContent::element_only(XsdGroup::sequence(vec![pair, leaf("end")])));
    grammar.add_element(XsdElement::new(local("root"), TypeRef::from(root)));
    let mut validator = XmlSchemaValidator::new(bucket(grammar));
    let document = |pairs: usize| format!("<root>{}<end>0</end></root>", "<a>1</a><b>2</b>".repeat(pairs));

    let report = validator.validate_str(&document(70)).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);

    let report = validator.validate_str(&document(64)).unwrap();
    assert_eq!(keys(&report), vec!["cvc-complex-type.2.4.a"]);
    assert!(report.errors[0].message.contains("'end'"));

    let report = validator.validate_str(&document(71)).unwrap();
    assert_eq!(keys(&report), vec!["cvc-complex-type.2.4.a"]);
    assert!(report.errors[0].message.contains("'a'"));
}

/// `doc` holds `p` elements (ID attribute, `c` children with ID content)
/// and `v` elements (ID attribute and ID content)
fn id_scope_grammar() -> GrammarBucket {
    let mut grammar = SchemaGrammar::new(None);
    let id_attribute = || XsdAttributeUse::optional(XsdAttribute::new(local("id"), builtin(BuiltinKind::Id)));
    let c = Arc::new(XsdElement::new(local("c"), TypeRef::xsd("ID")));
    let p = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::element(c).with_occurs(0, None)])),
    )
    .with_attribute(id_attribute());
    let v = XsdComplexType::new(None, ComplexContent::Simple(builtin(BuiltinKind::Id))).with_attribute(id_attribute());
    let content = XsdGroup::choice(vec![
        XsdParticle::element(Arc::new(XsdElement::new(local("p"), TypeRef::from(p)))),
        XsdParticle::element(Arc::new(XsdElement::new(local("v"), TypeRef::from(v)))),
    ]);
    let doc = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::group(content).with_occurs(0, None)])),
    );
    grammar.add_element(XsdElement::new(local("doc"), TypeRef::from(doc)));
    bucket(grammar)
}

#[test]
fn test_simple_content_ids_bind_to_parent() {
    let v1_1 = ValidatorSettings::new().with_schema_version(SchemaVersion::V1_1);

    let report = validate_str(id_scope_grammar(), v1_1.clone(), r#"<doc><p id="x"><c>x</c></p></doc>"#).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);

    let report = validate_str(id_scope_grammar(), v1_1, r#"<doc><v id="y">y</v></doc>"#).unwrap();
    assert_eq!(keys(&report), vec!["cvc-id.2"]);

    let report = validate_str(id_scope_grammar(), ValidatorSettings::new(), r#"<doc><p id="x"><c>x</c></p></doc>"#)
        .unwrap();
    assert_eq!(keys(&report), vec!["cvc-id.2"]);
}

#[test]
fn test_skip_wildcard_subtree_is_invisible() {
    let mut grammar = SchemaGrammar::new(None);
    grammar.add_element(XsdElement::new(local("known"), TypeRef::xsd("int")));
    let skip = XsdParticle::wildcard(XsdWildcard::any(ValidationMode::Skip)).with_occurs(0, None);
    let root = XsdComplexType::new(None, ComplexContent::element_only(XsdGroup::sequence(vec![skip])));
    grammar.add_element(XsdElement::new(local("root"), TypeRef::from(root)));

    let xml = "<root><known>not a number</known><any><known>x</known></any></root>";
    let report = XmlSchemaValidator::new(bucket(grammar)).validate_str(xml).unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
    assert_eq!(
        attempted(&report),
        vec![
            ("root".to_string(), ValidationStatus::Partial),
            ("known".to_string(), ValidationStatus::None),
            ("any".to_string(), ValidationStatus::None),
            ("known".to_string(), ValidationStatus::None),
        ]
    );
    assert_eq!(report.root().unwrap().validity, ValidityStatus::Valid);
}

#[test]
fn test_settings_from_json() {
    let settings = ValidatorSettings::from_json(r#"{"dynamic-validation": true, "augment-psvi": false}"#).unwrap();
    let report = validate_str(lax_grammar(), settings, "<undeclared><known>1</known></undeclared>").unwrap();
    assert!(report.detached);
    assert!(report.elements.is_empty());
    assert!(report.is_valid());
}
