mod support;

use oxigraph::model::vocab::xsd;
use oxigraph::model::{Literal, Term};
use sparaudit::check::DatatypePropertyRange;
use sparaudit::{Auditor, Expected};
use support::*;

#[test]
fn string_value_of_an_integer_property() {
    let gateway = gateway(
        "ex:C a owl:Class .
        ex:p a owl:DatatypeProperty ; rdfs:range xsd:integer .",
        "ex:r1 a ex:C ; ex:p \"abc\" .",
    );
    let report = Auditor::with_default_checks(scope()).run(&gateway);
    assert_eq!(report.error_count(), 1);
    let check = report.check("datatype-property-range").unwrap();
    let errors = check.errors().collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    let error = errors[0];
    assert_eq!(error.code().to_string(), "CHECK-DATATYPE-PROPERTY-RANGE-100");
    assert_eq!(
        error.expected(),
        Some(&Expected::Datatype(xsd::INTEGER.into_owned()))
    );
    assert_eq!(error.invalid_value(), None);
    assert_eq!(
        error.value(),
        Some(&Term::from(Literal::new_simple_literal("abc")))
    );
    assert_eq!(error.observed(), [xsd::STRING.into_owned()]);
    assert_eq!(error.affected_records(), [record("r1")]);
}

#[test]
fn lexical_forms_are_checked_against_the_declared_datatype() {
    let gateway = gateway(
        "ex:age a owl:DatatypeProperty ; rdfs:range xsd:unsignedByte .
        ex:flag a owl:DatatypeProperty ; rdfs:range xsd:boolean .
        ex:label a owl:DatatypeProperty ; rdfs:range rdfs:Literal .",
        "ex:r1 ex:age 12 ; ex:flag true ; ex:label \"x\"@en .
        ex:r2 ex:age 256 ; ex:flag 1 ; ex:label 5 .
        ex:r3 ex:age \"12\"^^xsd:unsignedByte ; ex:flag 2 .
        ex:r4 ex:age 256 .",
    );
    let findings = findings(DatatypePropertyRange, &gateway);
    assert_eq!(
        codes(&findings),
        [
            "CHECK-DATATYPE-PROPERTY-RANGE-101",
            "CHECK-DATATYPE-PROPERTY-RANGE-101",
            "CHECK-DATATYPE-PROPERTY-RANGE-100"
        ]
    );

    assert_eq!(findings[0].property(), Some(&ex("age")));
    assert_eq!(
        findings[0].invalid_value(),
        Some(&Literal::new_typed_literal("256", xsd::INTEGER))
    );
    assert_eq!(
        findings[0].affected_records(),
        [record("r2"), record("r4")]
    );

    assert_eq!(findings[1].property(), Some(&ex("flag")));
    assert_eq!(findings[1].affected_records(), [record("r3")]);

    assert_eq!(findings[2].property(), Some(&ex("label")));
    assert_eq!(findings[2].observed(), [xsd::INTEGER.into_owned()]);
}

#[test]
fn custom_datatypes_use_the_declared_pattern() {
    let gateway = gateway(
        "ex:zip a rdfs:Datatype ;
            owl:equivalentClass [
                a rdfs:Datatype ;
                owl:onDatatype xsd:string ;
                owl:withRestrictions ( [ xsd:pattern \"[0-9]{5}\" ] )
            ] .
        ex:postcode a owl:DatatypeProperty ; rdfs:range ex:zip .",
        "ex:r1 ex:postcode \"75001\"^^ex:zip .
        ex:r2 ex:postcode \"7500A\"^^ex:zip .",
    );
    let findings = findings(DatatypePropertyRange, &gateway);
    assert_eq!(codes(&findings), ["CHECK-DATATYPE-PROPERTY-RANGE-101"]);
    assert_eq!(
        findings[0].invalid_value(),
        Some(&Literal::new_typed_literal("7500A", ex("zip")))
    );
    assert_eq!(findings[0].affected_records(), [record("r2")]);
}

#[test]
fn invalid_custom_patterns_are_reported_once() {
    let gateway = gateway(
        "ex:zip a rdfs:Datatype ;
            owl:equivalentClass [
                owl:onDatatype xsd:string ;
                owl:withRestrictions ( [ xsd:pattern \"[0-9\" ] )
            ] .
        ex:postcode a owl:DatatypeProperty ; rdfs:range ex:zip .",
        "ex:r1 ex:postcode \"75001\"^^ex:zip .
        ex:r2 ex:postcode \"7500A\"^^ex:zip .",
    );
    let findings = findings(DatatypePropertyRange, &gateway);
    assert_eq!(codes(&findings), ["CHECK-DATATYPE-PROPERTY-RANGE-53"]);
    assert_eq!(
        findings[0].expected(),
        Some(&Expected::Datatype(ex("zip")))
    );
}

#[test]
fn custom_datatypes_without_pattern_are_accepted() {
    let gateway = gateway(
        "ex:code a rdfs:Datatype .
        ex:reference a owl:DatatypeProperty ; rdfs:range ex:code .
        ex:note a owl:DatatypeProperty .",
        "ex:r1 ex:reference \"anything\"^^ex:code ; ex:note \"free text\" .",
    );
    let findings = findings(DatatypePropertyRange, &gateway);
    assert_eq!(codes(&findings), ["CHECK-DATATYPE-PROPERTY-RANGE-51"]);
    assert_eq!(findings[0].property(), Some(&ex("note")));
}
