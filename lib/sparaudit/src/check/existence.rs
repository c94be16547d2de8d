use crate::check::{Check, CheckContext, gateway_failure};
use crate::finding::{Finding, FindingCode};
use crate::gateway;
use crate::query::{not_builtin, values};
use crate::vocab::owl;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{NamedNode, NamedOrBlankNode};
use tracing::info;

const CLASSES: &str = "CHECK-UNDEFINED-CLASSES";
const PROPERTIES: &str = "CHECK-UNDEFINED-PROPERTIES";

/// Classes typing records without being declared as `owl:Class` or `rdfs:Class` in any ontology.
pub struct UndefinedClasses;

impl Check for UndefinedClasses {
    fn name(&self) -> &str {
        "undefined-classes"
    }

    fn description(&self) -> &str {
        "Classes used to type records but not defined in the ontologies"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let query = context
            .data_query(["?class", "?record"])
            .distinct()
            .pattern("?record a ?class .")
            .filter(format!("isIRI(?class) && {}", not_builtin("?class")))
            .pattern(format!(
                "FILTER NOT EXISTS {{ GRAPH ?ontology {{ ?class a ?kind . }} {} }}",
                values("?kind", [owl::CLASS, rdfs::CLASS])
            ))
            .order_by(["?class", "?record"]);
        let solutions = match context.select(&query) {
            Ok(solutions) => solutions,
            Err(error) => {
                return vec![gateway_failure(
                    FindingCode::new(CLASSES, 50),
                    "Failed to list the classes used in the datasets",
                    &error,
                )];
            }
        };

        let mut undefined: Vec<(NamedNode, Vec<NamedOrBlankNode>)> = Vec::new();
        for solution in &solutions {
            let (Some(class), Some(record)) = (
                gateway::named_node(solution, "class"),
                gateway::record(solution, "record"),
            ) else {
                continue;
            };
            match undefined.last_mut() {
                Some((last, records)) if *last == class => records.push(record),
                _ => undefined.push((class, vec![record])),
            }
        }
        info!(count = undefined.len(), "undefined classes found");
        undefined
            .into_iter()
            .map(|(class, records)| {
                Finding::new(
                    FindingCode::new(CLASSES, 51),
                    format!("The class {class} is used but not defined in any ontology"),
                )
                .with_subject(class)
                .with_affected_records(records)
            })
            .collect()
    }
}

/// Properties used in the datasets without being declared in any ontology.
pub struct UndefinedProperties;

impl Check for UndefinedProperties {
    fn name(&self) -> &str {
        "undefined-properties"
    }

    fn description(&self) -> &str {
        "Properties used in records but not defined in the ontologies"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let query = context
            .data_query(["?property"])
            .distinct()
            .pattern("?record ?property ?value .")
            .filter(not_builtin("?property"))
            .pattern(format!(
                "FILTER NOT EXISTS {{ GRAPH ?ontology {{ ?property a ?kind . }} {} }}",
                values(
                    "?kind",
                    [
                        owl::OBJECT_PROPERTY,
                        owl::DATATYPE_PROPERTY,
                        owl::ANNOTATION_PROPERTY,
                        rdf::PROPERTY,
                    ]
                )
            ))
            .order_by(["?property"]);
        match context.select(&query) {
            Ok(solutions) => solutions
                .iter()
                .filter_map(|solution| gateway::named_node(solution, "property"))
                .map(|property| {
                    Finding::new(
                        FindingCode::new(PROPERTIES, 51),
                        format!("The property {property} is used but not defined in any ontology"),
                    )
                    .with_property(property)
                })
                .collect(),
            Err(error) => vec![gateway_failure(
                FindingCode::new(PROPERTIES, 50),
                "Failed to list the properties used in the datasets",
                &error,
            )],
        }
    }
}
