mod support;

use oxigraph::model::NamedNode;
use serde_json::Value;
use sparaudit::check::DanglingReferences;
use sparaudit::{AuditMode, AuditOptions, Auditor, FixAction, GatewayError, QueryGateway, Scope};
use sparesults::QuerySolution;
use support::*;

const ONTOLOGY_TTL: &str = "
ex:Agent a owl:Class .
ex:Person a owl:Class ; rdfs:subClassOf ex:Agent .
ex:Team a owl:Class ;
    rdfs:subClassOf [ a owl:Restriction ; owl:onProperty ex:member ; owl:maxCardinality \"2\"^^xsd:nonNegativeInteger ] ,
        [ a owl:Restriction ; owl:onProperty ex:name ; owl:someValuesFrom xsd:string ] .
ex:knows a owl:ObjectProperty ; rdfs:domain ex:Person ; rdfs:range ex:Person .
ex:member a owl:ObjectProperty ; rdfs:domain ex:Team ; rdfs:range ex:Person .
ex:name a owl:DatatypeProperty ; rdfs:domain ex:Agent ; rdfs:range xsd:string .
ex:age a owl:DatatypeProperty ; rdfs:domain ex:Person ; rdfs:range xsd:unsignedByte .
";

const DATA_TTL: &str = "
ex:alice a ex:Person ; ex:name \"Alice\" ; ex:age 300 ; ex:knows ex:bob , ex:ghost .
ex:bob a ex:Person ; ex:name \"Bob\" ; ex:shoeSize 44 .
ex:carl a ex:Person ; ex:knows ex:ghost .
ex:crew a ex:Team , ex:Crew ; ex:member ex:alice , ex:bob , ex:carl .
";

#[test]
fn repeated_audits_give_the_same_report() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let auditor = Auditor::with_default_checks(scope());
    let first = auditor.run(&gateway);
    let second = auditor.run(&gateway);
    assert_eq!(first, second);
    assert!(!first.is_clean());
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let sequential = Auditor::with_default_checks(scope()).run(&gateway);
    let parallel = Auditor::with_default_checks(scope())
        .with_options(AuditOptions {
            parallel: true,
            ..AuditOptions::default()
        })
        .run(&gateway);
    assert_eq!(sequential, parallel);
}

#[test]
fn full_catalogue() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let report = Auditor::with_default_checks(scope()).run(&gateway);
    let names = report
        .checks()
        .iter()
        .map(|check| check.name())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "undefined-classes",
            "undefined-properties",
            "object-property-range",
            "datatype-property-range",
            "restriction-max-cardinality",
            "restriction-some-values-from",
            "dangling-references"
        ]
    );
    let ids = |name: &str| codes(report.check(name).unwrap().findings());
    assert_eq!(ids("undefined-classes"), ["CHECK-UNDEFINED-CLASSES-51"]);
    assert_eq!(ids("undefined-properties"), ["CHECK-UNDEFINED-PROPERTIES-51"]);
    assert_eq!(
        ids("object-property-range"),
        ["CHECK-OBJECT-PROPERTY-RANGE-55"]
    );
    assert_eq!(
        ids("datatype-property-range"),
        ["CHECK-DATATYPE-PROPERTY-RANGE-101"]
    );
    assert_eq!(ids("restriction-max-cardinality"), ["OWL-RESTRICTION-MAX-100"]);
    assert_eq!(
        ids("restriction-some-values-from"),
        ["OWL-RESTRICTION-SOME-100"]
    );
    assert_eq!(
        ids("dangling-references"),
        ["CHECK-DANGLING-REFERENCES-100"]
    );
    assert_eq!(report.error_count(), 4);
    assert_eq!(report.warning_count(), 3);
}

#[test]
fn dangling_references_are_removed_in_fix_mode() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let report_only = Auditor::new(scope())
        .with_check(DanglingReferences)
        .run(&gateway);
    let finding = report_only.findings().next().unwrap();
    assert_eq!(finding.dataset(), Some(&NamedNode::new(DATA).unwrap()));
    assert_eq!(finding.property(), Some(&ex("knows")));
    assert_eq!(finding.value(), Some(&term("ghost")));
    assert_eq!(
        finding.affected_records(),
        [record("alice"), record("carl")]
    );
    assert!(report_only.checks()[0].fixes().is_empty());

    let report = Auditor::new(scope())
        .with_check(DanglingReferences)
        .with_options(AuditOptions {
            mode: AuditMode::ReportAndFix,
            ..AuditOptions::default()
        })
        .run(&gateway);
    let fixes = report.checks()[0].fixes();
    assert_eq!(
        fixes,
        [
            FixAction {
                dataset: NamedNode::new(DATA).unwrap(),
                subject: ex("alice"),
                predicate: ex("knows"),
                object: term("ghost"),
            },
            FixAction {
                dataset: NamedNode::new(DATA).unwrap(),
                subject: ex("carl"),
                predicate: ex("knows"),
                object: term("ghost"),
            }
        ]
    );
    let knows = "http://example.com/knows";
    let ghost = "http://example.com/ghost";
    assert!(!gateway.contains(DATA, "http://example.com/alice", knows, ghost));
    assert!(!gateway.contains(DATA, "http://example.com/carl", knows, ghost));
    assert!(gateway.contains(DATA, "http://example.com/alice", knows, "http://example.com/bob"));

    let after = Auditor::new(scope())
        .with_check(DanglingReferences)
        .run(&gateway);
    assert!(after.checks().is_empty());
}

#[test]
fn resources_described_in_another_dataset_are_not_dangling() {
    let gateway = gateway(ONTOLOGY_TTL, "ex:alice a ex:Person ; ex:knows ex:dave .");
    gateway.load(OTHER_DATA, "ex:dave a ex:Person .");
    let scope = Scope::new(
        [
            NamedNode::new(DATA).unwrap(),
            NamedNode::new(OTHER_DATA).unwrap(),
        ],
        [NamedNode::new(ONTOLOGY).unwrap()],
    );
    let report = Auditor::new(scope).with_check(DanglingReferences).run(&gateway);
    assert!(report.checks().is_empty());
}

#[test]
fn fixes_need_an_update_capable_gateway() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let report = Auditor::new(scope())
        .with_check(DanglingReferences)
        .with_options(AuditOptions {
            mode: AuditMode::ReportAndFix,
            ..AuditOptions::default()
        })
        .run(&ReadOnly(&gateway));
    let check = &report.checks()[0];
    assert!(check.fixes().is_empty());
    assert_eq!(
        codes(check.findings()),
        [
            "CHECK-DANGLING-REFERENCES-100",
            "CHECK-DANGLING-REFERENCES-51",
            "CHECK-DANGLING-REFERENCES-51"
        ]
    );
}

struct ReadOnly<'a>(&'a StoreGateway);

impl QueryGateway for ReadOnly<'_> {
    fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError> {
        self.0.select(query)
    }
}

#[test]
fn json_and_xml_reports() {
    let gateway = gateway(ONTOLOGY_TTL, DATA_TTL);
    let report = Auditor::with_default_checks(scope()).run(&gateway);

    let json: Value = serde_json::from_str(&report.to_json_string().unwrap()).unwrap();
    let checks = json["checks"].as_array().unwrap();
    assert_eq!(checks.len(), report.checks().len());
    let datatype = checks
        .iter()
        .find(|check| check["name"] == "datatype-property-range")
        .unwrap();
    assert_eq!(datatype["onDatasets"], serde_json::json!([DATA]));
    assert_eq!(datatype["usingOntologies"], serde_json::json!([ONTOLOGY]));
    let error = &datatype["validationErrors"][0];
    assert_eq!(error["id"], "CHECK-DATATYPE-PROPERTY-RANGE-101");
    assert_eq!(error["severity"], "error");
    assert_eq!(
        error["expectedDatatype"],
        "http://www.w3.org/2001/XMLSchema#unsignedByte"
    );
    assert_eq!(
        error["invalidValue"],
        "\"300\"^^<http://www.w3.org/2001/XMLSchema#integer>"
    );
    assert_eq!(
        error["affectedRecords"],
        serde_json::json!(["http://example.com/alice"])
    );
    assert!(datatype.get("fixes").is_none());

    let mut xml = Vec::new();
    report.write_xml(&mut xml).unwrap();
    let xml = String::from_utf8(xml).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<check name=\"datatype-property-range\">"));
    assert!(xml.contains("<id>CHECK-DATATYPE-PROPERTY-RANGE-101</id>"));
    assert!(xml.contains("<record>http://example.com/alice</record>"));
}
