mod support;

use sparaudit::Auditor;
use sparaudit::check::{UndefinedClasses, UndefinedProperties};
use support::*;

#[test]
fn undefined_classes_are_reported_with_their_records() {
    let gateway = gateway(
        "ex:Person a owl:Class .
        ex:Place a rdfs:Class .
        ex:name a owl:DatatypeProperty .",
        "ex:alice a ex:Person ; ex:name \"Alice\" .
        ex:paris a ex:Place .
        ex:bob a ex:Robot .
        ex:carl a ex:Robot .",
    );
    let findings = findings(UndefinedClasses, &gateway);
    assert_eq!(codes(&findings), ["CHECK-UNDEFINED-CLASSES-51"]);
    assert_eq!(findings[0].subject(), Some(&record("Robot")));
    assert_eq!(
        findings[0].affected_records(),
        [record("bob"), record("carl")]
    );
    assert!(!findings[0].is_error());
}

#[test]
fn undefined_properties_are_reported_once() {
    let gateway = gateway(
        "ex:Person a owl:Class .
        ex:name a owl:DatatypeProperty .
        ex:knows a owl:ObjectProperty .
        ex:comment a owl:AnnotationProperty .
        ex:legacy a rdf:Property .",
        "ex:alice a ex:Person ; ex:name \"Alice\" ; ex:knows ex:bob ; ex:age 42 ;
            ex:comment \"hi\" ; ex:legacy true ; rdfs:label \"Alice\" .
        ex:bob a ex:Person ; ex:age 43 ; ex:shoeSize 44 .",
    );
    let findings = findings(UndefinedProperties, &gateway);
    assert_eq!(
        codes(&findings),
        [
            "CHECK-UNDEFINED-PROPERTIES-51",
            "CHECK-UNDEFINED-PROPERTIES-51"
        ]
    );
    assert_eq!(findings[0].property(), Some(&ex("age")));
    assert_eq!(findings[1].property(), Some(&ex("shoeSize")));
}

#[test]
fn unreachable_service_gives_a_single_warning() {
    let report = Auditor::new(scope())
        .with_check(UndefinedClasses)
        .with_check(UndefinedProperties)
        .run(&DownGateway);
    let codes = codes(&report.findings().cloned().collect::<Vec<_>>());
    assert_eq!(
        codes,
        [
            "CHECK-UNDEFINED-CLASSES-50",
            "CHECK-UNDEFINED-PROPERTIES-50"
        ]
    );
    assert!(report.is_clean());
    assert_eq!(report.warning_count(), 2);
}
