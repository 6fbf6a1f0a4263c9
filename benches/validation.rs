//! Validation throughput benchmarks.
//!
//! One validator instance validates the same document repeatedly, which
//! exercises the content model cache and reset path.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use xmlschema_psvi::namespaces::QName;
use xmlschema_psvi::validators::attributes::{XsdAttribute, XsdAttributeUse};
use xmlschema_psvi::validators::builtins::{builtin, BuiltinKind};
use xmlschema_psvi::validators::groups::XsdGroup;
use xmlschema_psvi::validators::identities::IdentityBuilder;
use xmlschema_psvi::validators::particles::XsdParticle;
use xmlschema_psvi::validators::{
    ComplexContent, GrammarBucket, SchemaGrammar, TypeRef, XmlSchemaValidator, XsdComplexType, XsdElement,
};

fn orders_grammar() -> GrammarBucket {
    let mut grammar = SchemaGrammar::new(None);
    let line = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![
            XsdParticle::element(Arc::new(XsdElement::new(QName::local("sku"), TypeRef::xsd("token")))),
            XsdParticle::element(Arc::new(XsdElement::new(QName::local("qty"), TypeRef::xsd("positiveInteger")))),
            XsdParticle::element(Arc::new(XsdElement::new(QName::local("price"), TypeRef::xsd("decimal")))),
        ])),
    )
    .with_attribute(XsdAttributeUse::required(XsdAttribute::new(
        QName::local("n"),
        builtin(BuiltinKind::Int),
    )));
    let line = Arc::new(XsdElement::new(QName::local("line"), TypeRef::from(line)));
    let order = XsdComplexType::new(
        None,
        ComplexContent::element_only(XsdGroup::sequence(vec![XsdParticle::element(line).with_occurs(1, None)])),
    );
    let unique = IdentityBuilder::unique()
        .name(QName::local("lineNumber"))
        .selector("line")
        .field("@n")
        .build()
        .expect("valid identity constraint");
    grammar.add_element(XsdElement::new(QName::local("order"), TypeRef::from(order)).with_identity(unique));

    let mut bucket = GrammarBucket::new();
    bucket.add(grammar);
    bucket
}

fn order_document(lines: usize) -> String {
    let mut xml = String::from("<order>");
    for n in 0..lines {
        xml.push_str(&format!(
            "<line n=\"{n}\"><sku>A-{n}</sku><qty>{}</qty><price>{n}.95</price></line>",
            n % 7 + 1
        ));
    }
    xml.push_str("</order>");
    xml
}

fn bench_validate_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation/document");

    for lines in [10usize, 100, 1000] {
        let xml = order_document(lines);
        let mut validator = XmlSchemaValidator::new(orders_grammar());
        group.bench_with_input(BenchmarkId::from_parameter(lines), &xml, |b, xml| {
            b.iter(|| {
                let report = validator.validate_str(black_box(xml)).expect("well-formed document");
                assert!(report.is_valid());
                report
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate_document);
criterion_main!(benches);
