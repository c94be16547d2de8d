use crate::check::datatype::is_data_range_iri;
use crate::check::{
    Check, CheckContext, any_type_subsumed, gateway_failure, union_super_classes,
};
use crate::finding::{Expected, Finding, FindingCode};
use crate::gateway;
use crate::query::{SparqlIri, not_builtin, values};
use crate::subsumption::is_top_class;
use crate::vocab::owl;
use oxrdf::vocab::rdfs;
use oxrdf::{NamedNode, NamedOrBlankNode, Term};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

const FAMILY: &str = "CHECK-OBJECT-PROPERTY-RANGE";

/// Resources referenced through an object property must be instances of the `rdfs:range` of the property.
pub struct ObjectPropertyRange;

impl Check for ObjectPropertyRange {
    fn name(&self) -> &str {
        "object-property-range"
    }

    fn description(&self) -> &str {
        "Resources referenced by object properties are instances of the property range"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let query = context
            .data_query(["?property", "?range"])
            .distinct()
            .pattern("?record ?property ?value .")
            .filter(format!("!isLiteral(?value) && {}", not_builtin("?property")))
            .pattern("FILTER EXISTS { GRAPH ?declaring { ?property ?x ?y . } }")
            .pattern(format!(
                "FILTER NOT EXISTS {{ GRAPH ?declaring {{ ?property a ?kind . }} {} }}",
                values("?kind", [owl::DATATYPE_PROPERTY, owl::ANNOTATION_PROPERTY])
            ))
            .pattern(format!(
                "OPTIONAL {{ GRAPH ?ontology {{ ?property {} ?range . }} }}",
                SparqlIri(rdfs::RANGE)
            ))
            .order_by(["?property", "?range"]);
        let solutions = match context.select(&query) {
            Ok(solutions) => solutions,
            Err(error) => {
                return vec![gateway_failure(
                    FindingCode::new(FAMILY, 50),
                    "Failed to list the ranges of the object properties used in the datasets",
                    &error,
                )];
            }
        };

        let mut findings = Vec::new();
        for solution in &solutions {
            let Some(property) = gateway::named_node(solution, "property") else {
                continue;
            };
            match gateway::term(solution, "range") {
                None => findings.push(
                    Finding::new(
                        FindingCode::new(FAMILY, 51),
                        format!("No range is declared for {property}, owl:Thing is assumed"),
                    )
                    .with_property(property),
                ),
                Some(Term::NamedNode(range)) => {
                    if is_top_class(range.as_ref()) || is_data_range_iri(range.as_ref()) {
                        debug!(property = %property, range = %range, "skipping range");
                        continue;
                    }
                    verify(context, &property, &range, &mut findings);
                }
                Some(range) => findings.push(
                    Finding::new(
                        FindingCode::new(FAMILY, 54),
                        format!(
                            "The range {range} of {property} is a class expression that is not verified"
                        ),
                    )
                    .with_property(property),
                ),
            }
        }
        info!(
            findings = findings.len(),
            properties = solutions.len(),
            "object property ranges verified"
        );
        findings
    }
}

fn verify(
    context: &CheckContext<'_>,
    property: &NamedNode,
    range: &NamedNode,
    findings: &mut Vec<Finding>,
) {
    let query = context
        .data_query(["?value", "?type"])
        .distinct()
        .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())))
        .filter("!isLiteral(?value)")
        .pattern("OPTIONAL { ?value a ?type . FILTER(isIRI(?type)) }")
        .order_by(["?value", "?type"]);
    let solutions = match context.select(&query) {
        Ok(solutions) => solutions,
        Err(error) => {
            findings.push(
                gateway_failure(
                    FindingCode::new(FAMILY, 52),
                    format!("Failed to list the values of {property}"),
                    &error,
                )
                .with_property(property.clone()),
            );
            return;
        }
    };

    let mut referenced: Vec<(NamedOrBlankNode, Vec<NamedNode>)> = Vec::new();
    for solution in &solutions {
        let Some(value) = gateway::record(solution, "value") else {
            continue;
        };
        if referenced.last().is_none_or(|(last, _)| *last != value) {
            referenced.push((value, Vec::new()));
        }
        if let (Some((_, types)), Some(kind)) =
            (referenced.last_mut(), gateway::named_node(solution, "type"))
        {
            types.push(kind);
        }
    }

    let mut lookup_failures = FxHashSet::default();
    let mut failing = Vec::new();
    for (value, types) in referenced {
        if types.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::new(FAMILY, 55),
                    format!("{value} is referenced through {property} but has no type"),
                )
                .with_property(property.clone())
                .with_value(value)
                .with_expected(Expected::Class(range.clone())),
            );
            continue;
        }
        if any_type_subsumed(
            context,
            &types,
            range.as_ref(),
            FAMILY,
            &mut lookup_failures,
            findings,
        ) == Some(false)
        {
            failing.push((value, types));
        }
    }
    if failing.is_empty() {
        return;
    }

    let mut affected = affected_records(context, property, &failing, findings);
    for (value, types) in failing {
        let super_classes = union_super_classes(context, &types);
        let records = affected.remove(&value).unwrap_or_default();
        findings.push(
            Finding::new(
                FindingCode::new(FAMILY, 100),
                format!(
                    "{value} is referenced through {property} but its types {} are not subsumed by the range {range}",
                    types
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
            .with_subject(property.clone())
            .with_property(property.clone())
            .with_expected(Expected::Class(range.clone()))
            .with_observed(types)
            .with_value(value)
            .with_super_classes(super_classes)
            .with_affected_records(records),
        );
    }
}

/// The records referencing each failing value.
///
/// Blank node values can't be designated in a query and get no records.
fn affected_records(
    context: &CheckContext<'_>,
    property: &NamedNode,
    failing: &[(NamedOrBlankNode, Vec<NamedNode>)],
    findings: &mut Vec<Finding>,
) -> FxHashMap<NamedOrBlankNode, Vec<NamedOrBlankNode>> {
    let mut affected = FxHashMap::<NamedOrBlankNode, Vec<NamedOrBlankNode>>::default();
    let iris = failing
        .iter()
        .filter_map(|(value, _)| match value {
            NamedOrBlankNode::NamedNode(value) => Some(value.as_ref()),
            NamedOrBlankNode::BlankNode(_) => None,
        })
        .collect::<Vec<_>>();
    if iris.is_empty() {
        return affected;
    }
    let query = context
        .data_query(["?value", "?record"])
        .distinct()
        .pattern(values("?value", iris))
        .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())))
        .order_by(["?value", "?record"]);
    match context.select(&query) {
        Ok(solutions) => {
            for solution in &solutions {
                if let (Some(value), Some(record)) = (
                    gateway::record(solution, "value"),
                    gateway::record(solution, "record"),
                ) {
                    affected.entry(value).or_default().push(record);
                }
            }
        }
        Err(error) => findings.push(
            gateway_failure(
                FindingCode::new(FAMILY, 56),
                format!("Failed to list the records referencing invalid values of {property}"),
                &error,
            )
            .with_property(property.clone()),
        ),
    }
    affected
}
