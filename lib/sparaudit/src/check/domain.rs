use crate::check::{
    Check, CheckContext, any_type_subsumed, gateway_failure, union_super_classes,
};
use crate::finding::{Expected, Finding, FindingCode};
use crate::gateway;
use crate::query::{SparqlIri, not_builtin};
use crate::subsumption::is_top_class;
use oxrdf::vocab::rdfs;
use oxrdf::{NamedNode, NamedOrBlankNode, Term};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

const FAMILY: &str = "CHECK-PROPERTY-DOMAIN";

/// Records using a property must be instances of the `rdfs:domain` of the property.
///
/// A record passes if at least one of its types is the domain or one of its sub-classes.
pub struct PropertyDomain;

impl Check for PropertyDomain {
    fn name(&self) -> &str {
        "property-domain"
    }

    fn description(&self) -> &str {
        "Records using a property are instances of the property domain"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let query = context
            .data_query(["?property", "?domain"])
            .distinct()
            .pattern("?record ?property ?value .")
            .filter(not_builtin("?property"))
            .pattern("FILTER EXISTS { GRAPH ?declaring { ?property ?x ?y . } }")
            .pattern(format!(
                "OPTIONAL {{ GRAPH ?ontology {{ ?property {} ?domain . }} }}",
                SparqlIri(rdfs::DOMAIN)
            ))
            .order_by(["?property", "?domain"]);
        let solutions = match context.select(&query) {
            Ok(solutions) => solutions,
            Err(error) => {
                return vec![gateway_failure(
                    FindingCode::new(FAMILY, 50),
                    "Failed to list the domains of the properties used in the datasets",
                    &error,
                )];
            }
        };

        let mut findings = Vec::new();
        for solution in &solutions {
            let Some(property) = gateway::named_node(solution, "property") else {
                continue;
            };
            match gateway::term(solution, "domain") {
                None => findings.push(
                    Finding::new(
                        FindingCode::new(FAMILY, 51),
                        format!("No domain is declared for {property}, owl:Thing is assumed"),
                    )
                    .with_property(property),
                ),
                Some(Term::NamedNode(domain)) => {
                    if is_top_class(domain.as_ref()) {
                        debug!(property = %property, "skipping trivial domain");
                        continue;
                    }
                    verify(context, &property, &domain, &mut findings);
                }
                Some(domain) => findings.push(
                    Finding::new(
                        FindingCode::new(FAMILY, 54),
                        format!(
                            "The domain {domain} of {property} is a class expression that is not verified"
                        ),
                    )
                    .with_property(property),
                ),
            }
        }
        info!(
            findings = findings.len(),
            properties = solutions.len(),
            "property domains verified"
        );
        findings
    }
}

fn verify(
    context: &CheckContext<'_>,
    property: &NamedNode,
    domain: &NamedNode,
    findings: &mut Vec<Finding>,
) {
    let query = context
        .data_query(["?record", "?type"])
        .distinct()
        .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())))
        .pattern("OPTIONAL { ?record a ?type . FILTER(isIRI(?type)) }")
        .order_by(["?record", "?type"]);
    let solutions = match context.select(&query) {
        Ok(solutions) => solutions,
        Err(error) => {
            findings.push(
                gateway_failure(
                    FindingCode::new(FAMILY, 52),
                    format!("Failed to list the types of the records using {property}"),
                    &error,
                )
                .with_property(property.clone()),
            );
            return;
        }
    };

    // records and their types, in query order
    let mut records: Vec<(NamedOrBlankNode, Vec<NamedNode>)> = Vec::new();
    for solution in &solutions {
        let Some(record) = gateway::record(solution, "record") else {
            continue;
        };
        if records.last().is_none_or(|(last, _)| *last != record) {
            records.push((record, Vec::new()));
        }
        if let (Some((_, types)), Some(kind)) =
            (records.last_mut(), gateway::named_node(solution, "type"))
        {
            types.push(kind);
        }
    }

    let mut lookup_failures = FxHashSet::default();
    // failing type sets and the records having them
    let mut failures: Vec<(Vec<NamedNode>, Vec<NamedOrBlankNode>)> = Vec::new();
    for (record, types) in records {
        if any_type_subsumed(
            context,
            &types,
            domain.as_ref(),
            FAMILY,
            &mut lookup_failures,
            findings,
        ) != Some(false)
        {
            continue;
        }
        match failures.iter_mut().find(|(failing, _)| *failing == types) {
            Some((_, affected)) => affected.push(record),
            None => failures.push((types, vec![record])),
        }
    }

    for (types, affected) in failures {
        let super_classes = union_super_classes(context, &types);
        let message = if types.is_empty() {
            format!("Records using {property} have no type while the domain is {domain}")
        } else {
            format!(
                "Records using {property} are instances of {} that are not subsumed by the domain {domain}",
                types
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        findings.push(
            Finding::new(FindingCode::new(FAMILY, 100), message)
                .with_subject(property.clone())
                .with_property(property.clone())
                .with_expected(Expected::Class(domain.clone()))
                .with_observed(types)
                .with_super_classes(super_classes)
                .with_affected_records(affected),
        );
    }
}
