use crate::check::{Check, CheckContext, gateway_failure, group_by_value};
use crate::error::GatewayError;
use crate::finding::{Expected, Finding, FindingCode};
use crate::gateway;
use crate::query::{SparqlIri, not_builtin};
use crate::vocab::{RDF_PLAIN_LITERAL, XSD_NAMESPACE, owl, xsd_facet};
use oxrdf::vocab::{rdf, rdfs, xsd};
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};
use xsdlex::DatatypeValidators;

const FAMILY: &str = "CHECK-DATATYPE-PROPERTY-RANGE";

const INTEGER_NARROWED: [NamedNodeRef<'static>; 14] = [
    xsd::BOOLEAN,
    xsd::BYTE,
    xsd::SHORT,
    xsd::INT,
    xsd::LONG,
    xsd::UNSIGNED_BYTE,
    xsd::UNSIGNED_SHORT,
    xsd::UNSIGNED_INT,
    xsd::UNSIGNED_LONG,
    xsd::POSITIVE_INTEGER,
    xsd::NEGATIVE_INTEGER,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
    xsd::DECIMAL,
];

const STRING_DERIVED: [NamedNodeRef<'static>; 6] = [
    xsd::NORMALIZED_STRING,
    xsd::TOKEN,
    xsd::LANGUAGE,
    xsd::NAME,
    xsd::NC_NAME,
    xsd::NMTOKEN,
];

/// The datatypes a literal may have to match a declared datatype range.
///
/// `rdfs:Literal` is read as `xsd:string` and some datatypes also accept the
/// wider types SPARQL services tend to narrow literals to.
///
/// ```
/// use oxrdf::vocab::xsd;
/// use sparaudit::check::accepted_datatypes;
///
/// assert_eq!(accepted_datatypes(xsd::BYTE), [xsd::BYTE, xsd::INTEGER]);
/// ```
pub fn accepted_datatypes(declared: NamedNodeRef<'_>) -> Vec<NamedNodeRef<'_>> {
    let declared = normalize(declared);
    let mut accepted = vec![declared];
    if declared == xsd::STRING {
        accepted.extend([rdf::LANG_STRING, RDF_PLAIN_LITERAL]);
    } else if declared == RDF_PLAIN_LITERAL {
        accepted.extend([xsd::STRING, rdf::LANG_STRING]);
    } else if INTEGER_NARROWED.contains(&declared) {
        accepted.push(xsd::INTEGER);
    } else if declared == xsd::DATE_TIME_STAMP {
        accepted.push(xsd::DATE_TIME);
    } else if STRING_DERIVED.contains(&declared) {
        accepted.push(xsd::STRING);
    }
    accepted
}

fn normalize(declared: NamedNodeRef<'_>) -> NamedNodeRef<'_> {
    if declared == rdfs::LITERAL {
        xsd::STRING
    } else {
        declared
    }
}

/// True for IRIs that can only denote a datatype.
pub(crate) fn is_data_range_iri(iri: NamedNodeRef<'_>) -> bool {
    iri.as_str().starts_with(XSD_NAMESPACE)
        || iri == rdfs::LITERAL
        || iri == rdf::LANG_STRING
        || iri == rdf::XML_LITERAL
        || iri == rdf::HTML
        || iri == RDF_PLAIN_LITERAL
}

/// How a literal fares against a declared datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralVerdict {
    Valid,
    WrongDatatype,
    InvalidLexicalForm,
}

/// The built-in validators plus the custom datatypes described in the ontologies.
pub(crate) struct DatatypeTable {
    validators: DatatypeValidators,
    resolved: FxHashSet<NamedNode>,
}

impl DatatypeTable {
    pub(crate) fn new(validators: &DatatypeValidators) -> Self {
        Self {
            validators: validators.clone(),
            resolved: FxHashSet::default(),
        }
    }

    /// Makes sure a custom datatype pattern declared in the ontologies is known.
    ///
    /// On failure the datatype stays without validator and the error message is returned.
    /// A datatype is only resolved once.
    pub(crate) fn resolve(
        &mut self,
        context: &CheckContext<'_>,
        datatype: NamedNodeRef<'_>,
    ) -> Result<(), String> {
        let datatype = normalize(datatype);
        if self.validators.contains(datatype.as_str())
            || !self.resolved.insert(datatype.into_owned())
        {
            return Ok(());
        }
        let definition = custom_pattern(context, datatype).map_err(|e| {
            warn!(datatype = %datatype, error = %e, "failed to load datatype definition");
            format!("Failed to load the definition of {datatype}: {e}")
        })?;
        let Some((pattern, base)) = definition else {
            debug!(datatype = %datatype, "no pattern declared for custom datatype");
            return Ok(());
        };
        self.validators
            .add_pattern(
                datatype.as_str(),
                &pattern,
                base.as_ref().map(NamedNode::as_str),
            )
            .map_err(|e| {
                warn!(datatype = %datatype, error = %e, "invalid datatype pattern");
                format!("The pattern of {datatype} is invalid: {e}")
            })
    }

    pub(crate) fn judge(&self, declared: NamedNodeRef<'_>, literal: &Literal) -> LiteralVerdict {
        if !accepted_datatypes(declared).contains(&literal.datatype()) {
            return LiteralVerdict::WrongDatatype;
        }
        if self
            .validators
            .validate(normalize(declared).as_str(), literal.value())
        {
            LiteralVerdict::Valid
        } else {
            LiteralVerdict::InvalidLexicalForm
        }
    }
}

/// Reads `D owl:equivalentClass [ owl:onDatatype B ; owl:withRestrictions ( [ xsd:pattern "…" ] ) ]`.
fn custom_pattern(
    context: &CheckContext<'_>,
    datatype: NamedNodeRef<'_>,
) -> Result<Option<(String, Option<NamedNode>)>, GatewayError> {
    let query = context
        .ontology_query(["?base", "?pattern"])
        .pattern(format!(
            "{} {} ?definition .",
            SparqlIri(datatype),
            SparqlIri(owl::EQUIVALENT_CLASS)
        ))
        .pattern(format!(
            "?definition {} ?list .",
            SparqlIri(owl::WITH_RESTRICTIONS)
        ))
        .pattern(format!(
            "?list {}*/{} ?facet .",
            SparqlIri(rdf::REST),
            SparqlIri(rdf::FIRST)
        ))
        .pattern(format!("?facet {} ?pattern .", SparqlIri(xsd_facet::PATTERN)))
        .pattern(format!(
            "OPTIONAL {{ ?definition {} ?base . }}",
            SparqlIri(owl::ON_DATATYPE)
        ))
        .order_by(["?pattern"])
        .limit(1);
    Ok(context.select(&query)?.first().and_then(|solution| {
        let pattern = gateway::literal(solution, "pattern")?;
        Some((
            pattern.value().to_owned(),
            gateway::named_node(solution, "base"),
        ))
    }))
}

/// Literal values must match the `rdfs:range` of the property and be valid for it.
pub struct DatatypePropertyRange;

impl Check for DatatypePropertyRange {
    fn name(&self) -> &str {
        "datatype-property-range"
    }

    fn description(&self) -> &str {
        "Literal values have the datatype declared as property range and a valid lexical form"
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let query = context
            .data_query(["?property", "?range"])
            .distinct()
            .pattern("?record ?property ?value .")
            .filter(format!("isLiteral(?value) && {}", not_builtin("?property")))
            .pattern("FILTER EXISTS { GRAPH ?declaring { ?property ?x ?y . } }")
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
                    "Failed to list the ranges of the datatype properties used in the datasets",
                    &error,
                )];
            }
        };

        let mut table = DatatypeTable::new(context.validators());
        let mut findings = Vec::new();
        for solution in &solutions {
            let Some(property) = gateway::named_node(solution, "property") else {
                continue;
            };
            match gateway::term(solution, "range") {
                None => findings.push(
                    Finding::new(
                        FindingCode::new(FAMILY, 51),
                        format!("No range is declared for {property}, rdfs:Literal is assumed"),
                    )
                    .with_property(property),
                ),
                Some(Term::NamedNode(range)) => {
                    if let Err(message) = table.resolve(context, range.as_ref()) {
                        findings.push(
                            Finding::new(FindingCode::new(FAMILY, 53), message)
                                .with_property(property.clone())
                                .with_expected(Expected::Datatype(range.clone())),
                        );
                    }
                    verify(context, &table, &property, &range, &mut findings);
                }
                Some(range) => {
                    debug!(property = %property, range = %range, "skipping anonymous data range");
                }
            }
        }
        info!(
            findings = findings.len(),
            properties = solutions.len(),
            "datatype property ranges verified"
        );
        findings
    }
}

fn verify(
    context: &CheckContext<'_>,
    table: &DatatypeTable,
    property: &NamedNode,
    range: &NamedNode,
    findings: &mut Vec<Finding>,
) {
    let query = context
        .data_query(["?value", "?record"])
        .distinct()
        .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())))
        .filter("isLiteral(?value)")
        .order_by(["?value", "?record"]);
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

    for (value, records) in group_by_value(&solutions) {
        let Term::Literal(value) = value else {
            continue;
        };
        let finding = match table.judge(range.as_ref(), &value) {
            LiteralVerdict::Valid => continue,
            LiteralVerdict::WrongDatatype => Finding::new(
                FindingCode::new(FAMILY, 100),
                format!(
                    "{value} used with {property} has the datatype {} instead of {range}",
                    value.datatype()
                ),
            )
            .with_value(value.clone()),
            LiteralVerdict::InvalidLexicalForm => Finding::new(
                FindingCode::new(FAMILY, 101),
                format!("{value} used with {property} is not a valid {range}"),
            )
            .with_invalid_value(value.clone()),
        };
        findings.push(
            finding
                .with_property(property.clone())
                .with_expected(Expected::Datatype(range.clone()))
                .with_observed([value.datatype().into_owned()])
                .with_affected_records(records),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdfs_literal_is_read_as_string() {
        assert_eq!(
            accepted_datatypes(rdfs::LITERAL),
            [xsd::STRING, rdf::LANG_STRING, RDF_PLAIN_LITERAL]
        );
    }

    #[test]
    fn test_equivalences() {
        assert_eq!(
            accepted_datatypes(RDF_PLAIN_LITERAL),
            [RDF_PLAIN_LITERAL, xsd::STRING, rdf::LANG_STRING]
        );
        assert_eq!(
            accepted_datatypes(xsd::BOOLEAN),
            [xsd::BOOLEAN, xsd::INTEGER]
        );
        assert_eq!(
            accepted_datatypes(xsd::DATE_TIME_STAMP),
            [xsd::DATE_TIME_STAMP, xsd::DATE_TIME]
        );
        assert_eq!(accepted_datatypes(xsd::TOKEN), [xsd::TOKEN, xsd::STRING]);
        assert_eq!(accepted_datatypes(xsd::INTEGER), [xsd::INTEGER]);
        assert_eq!(accepted_datatypes(xsd::DOUBLE), [xsd::DOUBLE]);
    }

    #[test]
    fn test_data_range_iris() {
        assert!(is_data_range_iri(xsd::DATE));
        assert!(is_data_range_iri(rdfs::LITERAL));
        assert!(is_data_range_iri(RDF_PLAIN_LITERAL));
        assert!(!is_data_range_iri(NamedNodeRef::new_unchecked(
            "http://example.com/Person"
        )));
    }

    #[test]
    fn test_judge() {
        let table = DatatypeTable::new(&DatatypeValidators::new());
        let integer = |value: &str| Literal::new_typed_literal(value, xsd::INTEGER);
        assert_eq!(table.judge(xsd::INTEGER, &integer("12")), LiteralVerdict::Valid);
        assert_eq!(
            table.judge(xsd::UNSIGNED_BYTE, &integer("12")),
            LiteralVerdict::Valid
        );
        assert_eq!(
            table.judge(xsd::UNSIGNED_BYTE, &integer("256")),
            LiteralVerdict::InvalidLexicalForm
        );
        assert_eq!(
            table.judge(xsd::INTEGER, &Literal::new_simple_literal("abc")),
            LiteralVerdict::WrongDatatype
        );
        assert_eq!(
            table.judge(
                rdfs::LITERAL,
                &Literal::new_language_tagged_literal_unchecked("chat", "fr")
            ),
            LiteralVerdict::Valid
        );
        assert_eq!(
            table.judge(rdfs::LITERAL, &integer("1")),
            LiteralVerdict::WrongDatatype
        );
    }
}
