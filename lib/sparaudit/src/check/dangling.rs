use crate::check::{Check, CheckContext, FixOutcome, gateway_failure};
use crate::finding::{Finding, FindingCode, FixAction};
use crate::gateway;
use crate::query::{SelectQuery, SparqlIri, not_builtin, values};
use crate::vocab::owl;
use oxrdf::{NamedNode, NamedOrBlankNode};
use tracing::info;

const FAMILY: &str = "CHECK-DANGLING-REFERENCES";

/// Object property values pointing to resources that no record of the datasets describes.
///
/// The fix removes the referencing triples.
pub struct DanglingReferences;

impl Check for DanglingReferences {
    fn name(&self) -> &str {
        "dangling-references"
    }

    fn description(&self) -> &str {
        "Object properties reference resources described in the datasets"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let scope = context.scope();
        let query = SelectQuery::new(["?dataset", "?property", "?value", "?record"])
            .distinct()
            .from_named_graphs(scope.datasets().iter().chain(scope.ontologies()))
            .pattern("GRAPH ?dataset { ?record ?property ?value . }")
            .pattern(values(
                "?dataset",
                scope.datasets().iter().map(NamedNode::as_ref),
            ))
            .filter(format!("isIRI(?value) && {}", not_builtin("?property")))
            .pattern(format!(
                "FILTER EXISTS {{ GRAPH ?ontology {{ ?property a {} . }} {} }}",
                SparqlIri(owl::OBJECT_PROPERTY),
                values("?ontology", scope.ontologies().iter().map(NamedNode::as_ref))
            ))
            .pattern(format!(
                "FILTER NOT EXISTS {{ GRAPH ?described {{ ?value ?p ?o . }} {} }}",
                values("?described", scope.datasets().iter().map(NamedNode::as_ref))
            ))
            .order_by(["?dataset", "?property", "?value", "?record"]);
        let solutions = match context.select(&query) {
            Ok(solutions) => solutions,
            Err(error) => {
                return vec![gateway_failure(
                    FindingCode::new(FAMILY, 50),
                    "Failed to list the references of the datasets",
                    &error,
                )];
            }
        };

        let mut dangling: Vec<((NamedNode, NamedNode, NamedNode), Vec<NamedOrBlankNode>)> =
            Vec::new();
        for solution in &solutions {
            let (Some(dataset), Some(property), Some(value), Some(record)) = (
                gateway::named_node(solution, "dataset"),
                gateway::named_node(solution, "property"),
                gateway::named_node(solution, "value"),
                gateway::record(solution, "record"),
            ) else {
                continue;
            };
            let key = (dataset, property, value);
            match dangling.last_mut() {
                Some((last, records)) if *last == key => records.push(record),
                _ => dangling.push((key, vec![record])),
            }
        }
        info!(count = dangling.len(), "dangling references found");
        dangling
            .into_iter()
            .map(|((dataset, property, value), records)| {
                Finding::new(
                    FindingCode::new(FAMILY, 100),
                    format!("{value} is referenced through {property} in {dataset} but is not described in the datasets"),
                )
                .with_dataset(dataset)
                .with_property(property)
                .with_value(value)
                .with_affected_records(records)
            })
            .collect()
    }

    fn fix(&self, context: &CheckContext<'_>, findings: &[Finding]) -> FixOutcome {
        let mut outcome = FixOutcome::default();
        for finding in findings {
            if finding.code() != FindingCode::new(FAMILY, 100) {
                continue;
            }
            let (Some(dataset), Some(property), Some(value)) =
                (finding.dataset(), finding.property(), finding.value())
            else {
                continue;
            };
            for record in finding.affected_records() {
                let NamedOrBlankNode::NamedNode(subject) = record else {
                    outcome.findings.push(
                        Finding::new(
                            FindingCode::new(FAMILY, 51),
                            format!(
                                "The reference from the blank node {record} to {value} can't be removed"
                            ),
                        )
                        .with_dataset(dataset.clone())
                        .with_subject(record.clone())
                        .with_property(property.clone()),
                    );
                    continue;
                };
                let action = FixAction {
                    dataset: dataset.clone(),
                    subject: subject.clone(),
                    predicate: property.clone(),
                    object: value.clone(),
                };
                match context.gateway().remove_triple(&action) {
                    Ok(()) => outcome.fixes.push(action),
                    Err(error) => {
                        outcome.findings.push(
                            gateway_failure(
                                FindingCode::new(FAMILY, 51),
                                format!("Failed to remove the reference from {subject} to {value}"),
                                &error,
                            )
                            .with_dataset(dataset.clone())
                            .with_subject(subject.clone())
                            .with_property(property.clone())
                            .with_value(value.clone()),
                        );
                    }
                }
            }
        }
        info!(fixes = outcome.fixes.len(), "dangling references removed");
        outcome
    }
}
