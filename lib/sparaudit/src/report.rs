//! Audit reports and their JSON and XML renderings.

use crate::error::ReportError;
use crate::finding::{Expected, Finding, FixAction, Severity};
use oxrdf::{NamedNode, NamedOrBlankNode, Term};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

/// The outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    name: String,
    description: String,
    on_datasets: Vec<NamedNode>,
    using_ontologies: Vec<NamedNode>,
    findings: Vec<Finding>,
    fixes: Vec<FixAction>,
}

impl CheckReport {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        on_datasets: Vec<NamedNode>,
        using_ontologies: Vec<NamedNode>,
        findings: Vec<Finding>,
        fixes: Vec<FixAction>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            on_datasets,
            using_ontologies,
            findings,
            fixes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn on_datasets(&self) -> &[NamedNode] {
        &self.on_datasets
    }

    pub fn using_ontologies(&self) -> &[NamedNode] {
        &self.using_ontologies
    }

    /// All the findings in the order the check produced them.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity() == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|finding| finding.is_error())
    }

    pub fn fixes(&self) -> &[FixAction] {
        &self.fixes
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty() && self.fixes.is_empty()
    }
}

/// The outcome of an audit: the reports of the checks that found or fixed something, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    checks: Vec<CheckReport>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the report of a check. Empty reports are dropped.
    pub fn push(&mut self, check: CheckReport) {
        if !check.is_empty() {
            self.checks.push(check);
        }
    }

    pub fn checks(&self) -> &[CheckReport] {
        &self.checks
    }

    pub fn check(&self, name: &str) -> Option<&CheckReport> {
        self.checks.iter().find(|check| check.name == name)
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.checks.iter().flat_map(|check| check.findings.iter())
    }

    pub fn error_count(&self) -> usize {
        self.checks.iter().map(|check| check.errors().count()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.checks.iter().map(|check| check.warnings().count()).sum()
    }

    /// True if no check reported an error.
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    pub fn to_json_string(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&AuditRecord::from(self))?)
    }

    pub fn write_json(&self, writer: impl Write) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(writer, &AuditRecord::from(self))?;
        Ok(())
    }

    /// Writes the report as `<audit><check name="…">…</check></audit>`.
    ///
    /// The elements carry the same names as the JSON keys.
    pub fn write_xml(&self, writer: impl Write) -> Result<(), ReportError> {
        let mut writer = Writer::new_with_indent(writer, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("audit")))?;
        for check in &self.checks {
            let record = serde_json::to_value(CheckRecord::from(check))?;
            let Value::Object(fields) = record else {
                continue;
            };
            writer.write_event(Event::Start(
                BytesStart::new("check").with_attributes([("name", check.name.as_str())]),
            ))?;
            for (key, value) in &fields {
                if key != "name" {
                    write_xml_value(&mut writer, key, value)?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new("check")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("audit")))?;
        writer.into_inner().flush()?;
        Ok(())
    }
}

fn write_xml_value<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), ReportError> {
    match value {
        Value::Null => (),
        Value::Array(items) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            let item_name = xml_item_name(name);
            for item in items {
                write_xml_value(writer, item_name, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::Object(fields) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for (key, value) in fields {
                write_xml_value(writer, key, value)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::String(text) => write_xml_text(writer, name, text)?,
        Value::Bool(_) | Value::Number(_) => write_xml_text(writer, name, &value.to_string())?,
    }
    Ok(())
}

fn write_xml_text<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn xml_item_name(list: &str) -> &'static str {
    match list {
        "onDatasets" => "dataset",
        "usingOntologies" => "ontology",
        "validationWarnings" => "warning",
        "validationErrors" => "error",
        "fixes" => "fix",
        "observed" => "type",
        "superClasses" => "class",
        "affectedRecords" => "record",
        _ => "item",
    }
}

#[derive(Serialize)]
struct AuditRecord {
    checks: Vec<CheckRecord>,
}

impl From<&AuditReport> for AuditRecord {
    fn from(report: &AuditReport) -> Self {
        Self {
            checks: report.checks.iter().map(CheckRecord::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRecord {
    name: String,
    description: String,
    on_datasets: Vec<String>,
    using_ontologies: Vec<String>,
    validation_warnings: Vec<FindingRecord>,
    validation_errors: Vec<FindingRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fixes: Vec<FixRecord>,
}

impl From<&CheckReport> for CheckRecord {
    fn from(check: &CheckReport) -> Self {
        Self {
            name: check.name.clone(),
            description: check.description.clone(),
            on_datasets: check.on_datasets.iter().map(iri).collect(),
            using_ontologies: check.using_ontologies.iter().map(iri).collect(),
            validation_warnings: check.warnings().map(FindingRecord::from).collect(),
            validation_errors: check.errors().map(FindingRecord::from).collect(),
            fixes: check.fixes.iter().map(FixRecord::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FindingRecord {
    id: String,
    severity: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_cardinality: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_filler: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    observed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observed_count: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    super_classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    affected_records: Vec<String>,
}

impl From<&Finding> for FindingRecord {
    fn from(finding: &Finding) -> Self {
        let mut record = Self {
            id: finding.code().to_string(),
            severity: finding.severity().as_str(),
            message: finding.message().to_owned(),
            dataset: finding.dataset().map(iri),
            subject: finding.subject().map(resource),
            property: finding.property().map(iri),
            expected_class: None,
            expected_datatype: None,
            expected_cardinality: None,
            expected_filler: None,
            observed: finding.observed().iter().map(iri).collect(),
            value: finding.value().map(term),
            invalid_value: finding.invalid_value().map(ToString::to_string),
            observed_count: finding.observed_count(),
            super_classes: finding.super_classes().iter().map(iri).collect(),
            affected_records: finding.affected_records().iter().map(resource).collect(),
        };
        match finding.expected() {
            Some(Expected::Class(class)) => record.expected_class = Some(iri(class)),
            Some(Expected::Datatype(datatype)) => record.expected_datatype = Some(iri(datatype)),
            Some(Expected::Cardinality(bound)) => record.expected_cardinality = Some(*bound),
            Some(Expected::Filler(filler)) => record.expected_filler = Some(iri(filler)),
            None => (),
        }
        record
    }
}

#[derive(Serialize)]
struct FixRecord {
    dataset: String,
    subject: String,
    predicate: String,
    object: String,
}

impl From<&FixAction> for FixRecord {
    fn from(fix: &FixAction) -> Self {
        Self {
            dataset: iri(&fix.dataset),
            subject: iri(&fix.subject),
            predicate: iri(&fix.predicate),
            object: term(&fix.object),
        }
    }
}

fn iri(node: &NamedNode) -> String {
    node.as_str().to_owned()
}

fn resource(node: &NamedOrBlankNode) -> String {
    match node {
        NamedOrBlankNode::NamedNode(node) => iri(node),
        NamedOrBlankNode::BlankNode(node) => node.to_string(),
    }
}

/// IRIs are written bare, other terms in N-Triples syntax.
fn term(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => iri(node),
        _ => term.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingCode;
    use oxrdf::Literal;
    use oxrdf::vocab::xsd;

    fn sample() -> AuditReport {
        let dataset = NamedNode::new_unchecked("http://example.com/d");
        let ontology = NamedNode::new_unchecked("http://example.com/o");
        let property = NamedNode::new_unchecked("http://example.com/p");
        let record = NamedNode::new_unchecked("http://example.com/r1");
        let mut report = AuditReport::new();
        report.push(CheckReport::new(
            "undefined-classes",
            "Classes used but not defined",
            vec![dataset.clone()],
            vec![ontology.clone()],
            Vec::new(),
            Vec::new(),
        ));
        report.push(CheckReport::new(
            "datatype-property-range",
            "Datatype property ranges",
            vec![dataset],
            vec![ontology],
            vec![
                Finding::new(
                    FindingCode::new("CHECK-DATATYPE-PROPERTY-RANGE", 51),
                    "No range declared for <http://example.com/q>",
                ),
                Finding::new(
                    FindingCode::new("CHECK-DATATYPE-PROPERTY-RANGE", 100),
                    "Datatype mismatch",
                )
                .with_property(property)
                .with_expected(Expected::Datatype(xsd::INTEGER.into_owned()))
                .with_observed([xsd::STRING.into_owned()])
                .with_value(Literal::new_simple_literal("a < b"))
                .with_affected_records([record.into()]),
            ],
            Vec::new(),
        ));
        report
    }

    #[test]
    fn test_empty_checks_are_omitted() {
        let report = sample();
        assert_eq!(report.checks().len(), 1);
        assert!(report.check("undefined-classes").is_none());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.is_clean());
        assert!(AuditReport::new().is_clean());
    }

    #[test]
    fn test_json() {
        let json: Value = serde_json::from_str(&sample().to_json_string().unwrap()).unwrap();
        let check = &json["checks"][0];
        assert_eq!(check["name"], "datatype-property-range");
        assert_eq!(check["onDatasets"][0], "http://example.com/d");
        assert_eq!(
            check["validationWarnings"][0]["id"],
            "CHECK-DATATYPE-PROPERTY-RANGE-51"
        );
        let error = &check["validationErrors"][0];
        assert_eq!(error["id"], "CHECK-DATATYPE-PROPERTY-RANGE-100");
        assert_eq!(error["severity"], "error");
        assert_eq!(
            error["expectedDatatype"],
            "http://www.w3.org/2001/XMLSchema#integer"
        );
        assert_eq!(error["value"], "\"a < b\"");
        assert_eq!(error["affectedRecords"][0], "http://example.com/r1");
        assert!(error.get("invalidValue").is_none());
        assert!(check.get("fixes").is_none());
    }

    #[test]
    fn test_xml() {
        let mut buffer = Vec::new();
        sample().write_xml(&mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<check name=\"datatype-property-range\">"));
        assert!(xml.contains("<dataset>http://example.com/d</dataset>"));
        assert!(xml.contains("<id>CHECK-DATATYPE-PROPERTY-RANGE-100</id>"));
        assert!(xml.contains("a &lt; b"));
        assert!(xml.contains("<record>http://example.com/r1</record>"));
        assert!(xml.trim_end().ends_with("</audit>"));
    }
}
