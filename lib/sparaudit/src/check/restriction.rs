//! OWL property restrictions: cardinalities, `owl:allValuesFrom` and `owl:someValuesFrom`.
//!
//! The five kinds share the same discovery and only differ by the bound they read and
//! by how the values of the restricted property are compared to it.

use crate::check::datatype::{DatatypeTable, LiteralVerdict, accepted_datatypes, is_data_range_iri};
use crate::check::{Check, CheckContext, gateway_failure, group_by_value};
use crate::error::GatewayError;
use crate::finding::{Expected, Finding, FindingCode};
use crate::gateway;
use crate::query::{SparqlIri, in_list, values};
use crate::subsumption::is_top_class;
use crate::vocab::owl;
use oxrdf::vocab::rdfs;
use oxrdf::{Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use rustc_hash::FxHashSet;
use std::fmt;
use tracing::{debug, info};

/// The kind of restriction a [`RestrictionCheck`] verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionKind {
    /// `owl:cardinality` and `owl:qualifiedCardinality`
    ExactCardinality,
    /// `owl:minCardinality` and `owl:minQualifiedCardinality`
    MinCardinality,
    /// `owl:maxCardinality` and `owl:maxQualifiedCardinality`
    MaxCardinality,
    /// `owl:allValuesFrom`
    AllValuesFrom,
    /// `owl:someValuesFrom`
    SomeValuesFrom,
}

impl RestrictionKind {
    fn family(self) -> &'static str {
        match self {
            Self::ExactCardinality => "OWL-RESTRICTION-EXACT",
            Self::MinCardinality => "OWL-RESTRICTION-MIN",
            Self::MaxCardinality => "OWL-RESTRICTION-MAX",
            Self::AllValuesFrom => "OWL-RESTRICTION-ONLY",
            Self::SomeValuesFrom => "OWL-RESTRICTION-SOME",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::ExactCardinality => "restriction-exact-cardinality",
            Self::MinCardinality => "restriction-min-cardinality",
            Self::MaxCardinality => "restriction-max-cardinality",
            Self::AllValuesFrom => "restriction-all-values-from",
            Self::SomeValuesFrom => "restriction-some-values-from",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::ExactCardinality => {
                "Records use restricted properties exactly as many times as the cardinality"
            }
            Self::MinCardinality => {
                "Records use restricted properties at least as many times as the minimal cardinality"
            }
            Self::MaxCardinality => {
                "Records use restricted properties at most as many times as the maximal cardinality"
            }
            Self::AllValuesFrom => {
                "All the values of restricted properties belong to the restriction filler"
            }
            Self::SomeValuesFrom => {
                "Records have at least one value of the restriction filler for restricted properties"
            }
        }
    }

    /// The predicates giving the bound, unqualified first.
    fn bound_predicates(self) -> [NamedNodeRef<'static>; 2] {
        match self {
            Self::ExactCardinality => [owl::CARDINALITY, owl::QUALIFIED_CARDINALITY],
            Self::MinCardinality => [owl::MIN_CARDINALITY, owl::MIN_QUALIFIED_CARDINALITY],
            Self::MaxCardinality => [owl::MAX_CARDINALITY, owl::MAX_QUALIFIED_CARDINALITY],
            Self::AllValuesFrom => [owl::ALL_VALUES_FROM, owl::ALL_VALUES_FROM],
            Self::SomeValuesFrom => [owl::SOME_VALUES_FROM, owl::SOME_VALUES_FROM],
        }
    }

    /// The `HAVING` comparison selecting violating records.
    fn violation_operator(self) -> Option<&'static str> {
        match self {
            Self::ExactCardinality => Some("!="),
            Self::MinCardinality => Some("<"),
            Self::MaxCardinality => Some(">"),
            Self::AllValuesFrom | Self::SomeValuesFrom => None,
        }
    }

    fn is_cardinality(self) -> bool {
        self.violation_operator().is_some()
    }

    fn code(self, number: u16) -> FindingCode {
        FindingCode::new(self.family(), number)
    }
}

/// What the values of a restricted property are expected to be.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Filler {
    DataRange(NamedNode),
    ClassExpression(NamedNode),
}

impl Filler {
    fn iri(&self) -> &NamedNode {
        match self {
            Self::DataRange(iri) | Self::ClassExpression(iri) => iri,
        }
    }

    /// True if every value qualifies.
    fn is_trivial(&self) -> bool {
        matches!(self, Self::ClassExpression(class) if is_top_class(class.as_ref()))
    }
}

impl fmt::Display for Filler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iri().fmt(f)
    }
}

#[derive(Debug, Clone)]
struct Restriction {
    class: NamedNode,
    property: NamedNode,
    bound: Option<u64>,
    filler: Option<Filler>,
}

/// Verifies one [`RestrictionKind`] on the records of the classes carrying it.
///
/// Restrictions are read from `rdfs:subClassOf` and `owl:equivalentClass` axioms of classes
/// that have at least one direct instance in the datasets.
pub struct RestrictionCheck {
    kind: RestrictionKind,
}

impl RestrictionCheck {
    pub fn new(kind: RestrictionKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> RestrictionKind {
        self.kind
    }

    fn discover(
        &self,
        context: &CheckContext<'_>,
        findings: &mut Vec<Finding>,
    ) -> Option<Vec<Restriction>> {
        let [unqualified, qualified] = self.kind.bound_predicates();
        let mut query = context
            .data_query([
                "?class",
                "?property",
                "?bound",
                "?onClass",
                "?onDataRange",
                "?isDatatype",
            ])
            .distinct()
            .pattern(format!(
                "GRAPH ?ontology {{ ?class ?link ?restriction . ?restriction {} ?property ; ?boundPredicate ?bound . }}",
                SparqlIri(owl::ON_PROPERTY)
            ))
            .pattern(values(
                "?link",
                [rdfs::SUB_CLASS_OF, owl::EQUIVALENT_CLASS],
            ))
            .pattern(values("?boundPredicate", [unqualified, qualified]));
        // the filler is ?onClass for qualified cardinalities and ?bound otherwise
        let filler = if self.kind.is_cardinality() {
            query = query
                .pattern(format!(
                    "OPTIONAL {{ GRAPH ?ontology {{ ?restriction {} ?onClass . }} }}",
                    SparqlIri(owl::ON_CLASS)
                ))
                .pattern(format!(
                    "OPTIONAL {{ GRAPH ?ontology {{ ?restriction {} ?onDataRange . }} }}",
                    SparqlIri(owl::ON_DATA_RANGE)
                ));
            "?onClass"
        } else {
            "?bound"
        };
        let query = query
            .pattern(format!(
                "BIND(BOUND({filler}) && EXISTS {{ GRAPH ?datatypeGraph {{ {filler} a {} . }} }} AS ?isDatatype)",
                SparqlIri(rdfs::DATATYPE)
            ))
            .filter("isIRI(?class) && isIRI(?property)")
            .pattern("FILTER EXISTS { ?record a ?class . }")
            .order_by(["?class", "?property", "?bound", "?onClass", "?onDataRange"]);

        let solutions = match context.select(&query) {
            Ok(solutions) => solutions,
            Err(error) => {
                findings.push(gateway_failure(
                    self.kind.code(50),
                    format!("Failed to list the {} restrictions", self.kind.name()),
                    &error,
                ));
                return None;
            }
        };

        let mut restrictions = Vec::new();
        for solution in &solutions {
            let (Some(class), Some(property), Some(bound)) = (
                gateway::named_node(solution, "class"),
                gateway::named_node(solution, "property"),
                gateway::term(solution, "bound"),
            ) else {
                continue;
            };
            let declared_datatype = matches!(
                gateway::literal(solution, "isDatatype"),
                Some(flag) if flag.value() == "true"
            );
            let (bound, filler) = if self.kind.is_cardinality() {
                let Some(bound) = cardinality(&bound) else {
                    findings.push(
                        Finding::new(
                            self.kind.code(53),
                            format!(
                                "The cardinality {bound} of the restriction of {class} on {property} is not a non-negative integer"
                            ),
                        )
                        .with_subject(class)
                        .with_property(property),
                    );
                    continue;
                };
                let filler = if let Some(range) = gateway::named_node(solution, "onDataRange") {
                    Some(Filler::DataRange(range))
                } else if let Some(class) = gateway::named_node(solution, "onClass") {
                    Some(classify(class, declared_datatype))
                } else {
                    None
                };
                (Some(bound), filler)
            } else {
                let Term::NamedNode(filler) = bound else {
                    debug!(class = %class, property = %property, "skipping anonymous filler");
                    continue;
                };
                (None, Some(classify(filler, declared_datatype)))
            };
            restrictions.push(Restriction {
                class,
                property,
                bound,
                filler: filler.filter(|filler| !filler.is_trivial() || !self.kind.is_cardinality()),
            });
        }
        Some(restrictions)
    }

    /// Builds the graph pattern selecting the values of `?value` that qualify for the filler.
    fn qualifier(
        &self,
        context: &CheckContext<'_>,
        table: &mut DatatypeTable,
        restriction: &Restriction,
    ) -> Result<Option<String>, Finding> {
        let Some(filler) = &restriction.filler else {
            return Ok(None);
        };
        match filler {
            Filler::DataRange(range) if range.as_ref() == rdfs::LITERAL => {
                Ok(Some("FILTER(isLiteral(?value))".to_owned()))
            }
            Filler::DataRange(range) => {
                table.resolve(context, range.as_ref()).map_err(|message| {
                    Finding::new(self.kind.code(52), message)
                        .with_subject(restriction.class.clone())
                        .with_property(restriction.property.clone())
                        .with_expected(Expected::Filler(range.clone()))
                })?;
                Ok(Some(format!(
                    "FILTER(isLiteral(?value) && {})",
                    in_list("DATATYPE(?value)", accepted_datatypes(range.as_ref()))
                )))
            }
            Filler::ClassExpression(class) if is_top_class(class.as_ref()) => Ok(None),
            Filler::ClassExpression(class) => {
                let classes = context
                    .subsumption()
                    .class_and_sub_classes(context.gateway(), class.as_ref())
                    .map_err(|error| {
                        gateway_failure(
                            self.kind.code(52),
                            format!("Failed to look up the sub-classes of {class}"),
                            &error,
                        )
                        .with_subject(restriction.class.clone())
                        .with_property(restriction.property.clone())
                        .with_expected(Expected::Filler(class.clone()))
                    })?;
                Ok(Some(format!(
                    "?value a ?valueType . FILTER({})",
                    in_list("?valueType", classes.iter().map(NamedNode::as_ref))
                )))
            }
        }
    }

    fn verify(
        &self,
        context: &CheckContext<'_>,
        table: &mut DatatypeTable,
        restriction: &Restriction,
        findings: &mut Vec<Finding>,
    ) {
        let qualifier = match self.qualifier(context, table, restriction) {
            Ok(qualifier) => qualifier,
            Err(finding) => {
                findings.push(finding);
                return;
            }
        };
        let result = match restriction.bound {
            Some(bound) => self.verify_cardinality(
                context,
                table,
                restriction,
                bound,
                qualifier.as_deref(),
                findings,
            ),
            None if self.kind == RestrictionKind::AllValuesFrom => {
                self.verify_all_values(context, table, restriction, qualifier.as_deref(), findings)
            }
            None => {
                self.verify_some_values(context, table, restriction, qualifier.as_deref(), findings)
            }
        };
        if let Err(error) = result {
            findings.push(
                gateway_failure(
                    self.kind.code(51),
                    format!(
                        "Failed to verify the restriction of {} on {}",
                        restriction.class, restriction.property
                    ),
                    &error,
                )
                .with_subject(restriction.class.clone())
                .with_property(restriction.property.clone()),
            );
        }
    }

    fn verify_cardinality(
        &self,
        context: &CheckContext<'_>,
        table: &DatatypeTable,
        restriction: &Restriction,
        bound: u64,
        qualifier: Option<&str>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), GatewayError> {
        let Restriction {
            class, property, ..
        } = restriction;
        let Some(operator) = self.kind.violation_operator() else {
            return Ok(());
        };
        let mut query = context
            .data_query(["?record", "(COUNT(DISTINCT ?value) AS ?count)"])
            .pattern(format!("?record a {} .", SparqlIri(class.as_ref())))
            .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())));
        if let Some(qualifier) = qualifier {
            query = query.pattern(qualifier);
        }
        let query = query
            .group_by(["?record"])
            .having(format!("COUNT(DISTINCT ?value) {operator} {bound}"))
            .order_by(["?record"]);
        for solution in context.select(&query)? {
            let (Some(record), Some(count)) = (
                gateway::record(&solution, "record"),
                gateway::count(&solution, "count"),
            ) else {
                continue;
            };
            findings.push(
                self.record_finding(100, restriction, &record, count, bound)
                    .with_observed_count(count)
                    .with_affected_records([record]),
            );
        }

        let checks_absence = matches!(
            self.kind,
            RestrictionKind::ExactCardinality | RestrictionKind::MinCardinality
        );
        if checks_absence && bound > 0 {
            for record in records_without_value(context, restriction, qualifier)? {
                findings.push(
                    self.record_finding(101, restriction, &record, 0, bound)
                        .with_observed_count(0)
                        .with_affected_records([record]),
                );
            }
        }

        if let Some(Filler::DataRange(range)) = &restriction.filler {
            if range.as_ref() != rdfs::LITERAL {
                for (record, invalid) in
                    records_without_valid_literal(context, table, range, restriction, qualifier)?
                {
                    let mut finding = Finding::new(
                        self.kind.code(102),
                        format!(
                            "{record} has no valid {range} value counted for the restriction of {class} on {property}"
                        ),
                    )
                    .with_subject(class.clone())
                    .with_property(property.clone())
                    .with_expected(Expected::Filler(range.clone()))
                    .with_affected_records([record]);
                    if let Some(invalid) = invalid {
                        finding = finding.with_invalid_value(invalid);
                    }
                    findings.push(finding);
                }
            }
        }
        Ok(())
    }

    fn record_finding(
        &self,
        number: u16,
        restriction: &Restriction,
        record: &NamedOrBlankNode,
        count: u64,
        bound: u64,
    ) -> Finding {
        let Restriction {
            class,
            property,
            filler,
            ..
        } = restriction;
        let expectation = match self.kind {
            RestrictionKind::MinCardinality => "at least",
            RestrictionKind::MaxCardinality => "at most",
            _ => "exactly",
        };
        let values = match filler {
            Some(filler) => format!("values of {filler}"),
            None => "values".to_owned(),
        };
        Finding::new(
            self.kind.code(number),
            format!(
                "{record} has {count} {values} for {property} while instances of {class} must have {expectation} {bound}"
            ),
        )
        .with_subject(class.clone())
        .with_property(property.clone())
        .with_expected(Expected::Cardinality(bound))
    }

    fn verify_all_values(
        &self,
        context: &CheckContext<'_>,
        table: &DatatypeTable,
        restriction: &Restriction,
        qualifier: Option<&str>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), GatewayError> {
        let Restriction {
            class,
            property,
            filler,
            ..
        } = restriction;
        let Some(filler) = filler else {
            return Ok(());
        };
        let candidates = match (filler, qualifier) {
            (Filler::DataRange(_), _) => values_of(context, restriction, None)?,
            (Filler::ClassExpression(_), Some(qualifier)) => {
                let query = context
                    .data_query(["?value", "?record"])
                    .distinct()
                    .pattern(format!("?record a {} .", SparqlIri(class.as_ref())))
                    .pattern(format!("?record {} ?value .", SparqlIri(property.as_ref())))
                    .pattern(format!("FILTER NOT EXISTS {{ {qualifier} }}"))
                    .order_by(["?value", "?record"]);
                group_by_value(&context.select(&query)?)
            }
            (Filler::ClassExpression(_), None) => Vec::new(),
        };
        for (value, records) in candidates {
            let finding = match (filler, &value) {
                (Filler::DataRange(range), _) if range.as_ref() == rdfs::LITERAL => {
                    if matches!(value, Term::Literal(_)) {
                        continue;
                    }
                    self.value_finding(100, restriction, filler, &value, "is not a literal")
                }
                (Filler::DataRange(range), Term::Literal(literal)) => {
                    match table.judge(range.as_ref(), literal) {
                        LiteralVerdict::Valid => continue,
                        LiteralVerdict::WrongDatatype => self
                            .value_finding(
                                100,
                                restriction,
                                filler,
                                &value,
                                "does not have the expected datatype",
                            )
                            .with_observed([literal.datatype().into_owned()]),
                        LiteralVerdict::InvalidLexicalForm => self
                            .value_finding(101, restriction, filler, &value, "is not a valid value")
                            .with_invalid_value(literal.clone()),
                    }
                }
                (Filler::DataRange(_), _) => {
                    self.value_finding(100, restriction, filler, &value, "is not a literal")
                }
                (Filler::ClassExpression(_), _) => self.value_finding(
                    100,
                    restriction,
                    filler,
                    &value,
                    "is not an instance",
                ),
            };
            findings.push(finding.with_affected_records(records));
        }

        let missing =
            self.records_without_qualifying_value(context, table, restriction, qualifier)?;
        for record in missing {
            findings.push(
                Finding::new(
                    self.kind.code(102),
                    format!(
                        "{record} has no value of {filler} for {property} while instances of {class} must have one"
                    ),
                )
                .with_subject(class.clone())
                .with_property(property.clone())
                .with_expected(Expected::Filler(filler.iri().clone()))
                .with_affected_records([record]),
            );
        }
        Ok(())
    }

    /// Instances of the restricted class without any qualifying value with a valid lexical form.
    fn records_without_qualifying_value(
        &self,
        context: &CheckContext<'_>,
        table: &DatatypeTable,
        restriction: &Restriction,
        qualifier: Option<&str>,
    ) -> Result<Vec<NamedOrBlankNode>, GatewayError> {
        let mut failing = records_without_value(context, restriction, qualifier)?;
        if let Some(Filler::DataRange(range)) = &restriction.filler {
            if range.as_ref() != rdfs::LITERAL {
                failing.extend(
                    records_without_valid_literal(context, table, range, restriction, qualifier)?
                        .into_iter()
                        .map(|(record, _)| record),
                );
                failing.sort_by_cached_key(ToString::to_string);
                failing.dedup();
            }
        }
        Ok(failing)
    }

    fn value_finding(
        &self,
        number: u16,
        restriction: &Restriction,
        filler: &Filler,
        value: &Term,
        problem: &str,
    ) -> Finding {
        let Restriction {
            class, property, ..
        } = restriction;
        Finding::new(
            self.kind.code(number),
            format!(
                "{value} {problem} of {filler} while all the values of {property} on instances of {class} must be"
            ),
        )
        .with_subject(class.clone())
        .with_property(property.clone())
        .with_expected(Expected::Filler(filler.iri().clone()))
        .with_value(value.clone())
    }

    fn verify_some_values(
        &self,
        context: &CheckContext<'_>,
        table: &DatatypeTable,
        restriction: &Restriction,
        qualifier: Option<&str>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), GatewayError> {
        let Restriction {
            class,
            property,
            filler,
            ..
        } = restriction;
        let failing =
            self.records_without_qualifying_value(context, table, restriction, qualifier)?;

        let expected = filler.as_ref().map_or_else(
            || "any value".to_owned(),
            |filler| format!("a value of {filler}"),
        );
        for record in failing {
            let mut finding = Finding::new(
                self.kind.code(100),
                format!(
                    "{record} has no {} for {property} while instances of {class} must have {expected}",
                    filler
                        .as_ref()
                        .map_or_else(|| "value".to_owned(), |filler| format!("value of {filler}"))
                ),
            )
            .with_subject(class.clone())
            .with_property(property.clone())
            .with_affected_records([record]);
            if let Some(filler) = filler {
                finding = finding.with_expected(Expected::Filler(filler.iri().clone()));
            }
            findings.push(finding);
        }
        Ok(())
    }
}

impl Check for RestrictionCheck {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        let Some(restrictions) = self.discover(context, &mut findings) else {
            return findings;
        };
        let mut table = DatatypeTable::new(context.validators());
        for restriction in &restrictions {
            self.verify(context, &mut table, restriction, &mut findings);
        }
        info!(
            kind = self.kind.name(),
            restrictions = restrictions.len(),
            findings = findings.len(),
            "restrictions verified"
        );
        findings
    }
}

/// A filler declared `rdfs:Datatype` or in a datatype namespace is a data range.
fn classify(filler: NamedNode, declared_datatype: bool) -> Filler {
    if declared_datatype || is_data_range_iri(filler.as_ref()) {
        Filler::DataRange(filler)
    } else {
        Filler::ClassExpression(filler)
    }
}

fn cardinality(bound: &Term) -> Option<u64> {
    match bound {
        Term::Literal(literal) => literal.value().trim().parse().ok(),
        _ => None,
    }
}

/// Instances of the restricted class without any qualifying value.
fn records_without_value(
    context: &CheckContext<'_>,
    restriction: &Restriction,
    qualifier: Option<&str>,
) -> Result<Vec<NamedOrBlankNode>, GatewayError> {
    let query = context
        .data_query(["?record"])
        .distinct()
        .pattern(format!("?record a {} .", SparqlIri(restriction.class.as_ref())))
        .pattern(format!(
            "FILTER NOT EXISTS {{ ?record {} ?value . {} }}",
            SparqlIri(restriction.property.as_ref()),
            qualifier.unwrap_or_default()
        ))
        .order_by(["?record"]);
    Ok(context
        .select(&query)?
        .iter()
        .filter_map(|solution| gateway::record(solution, "record"))
        .collect())
}

/// Records whose qualifying literals all have an invalid lexical form for `range`,
/// with the first of these literals.
fn records_without_valid_literal(
    context: &CheckContext<'_>,
    table: &DatatypeTable,
    range: &NamedNode,
    restriction: &Restriction,
    qualifier: Option<&str>,
) -> Result<Vec<(NamedOrBlankNode, Option<Literal>)>, GatewayError> {
    let mut valid = FxHashSet::default();
    let mut candidates: Vec<(NamedOrBlankNode, Option<Literal>)> = Vec::new();
    for (value, records) in values_of(context, restriction, qualifier)? {
        let literal = match value {
            Term::Literal(literal) => Some(literal),
            _ => None,
        };
        let is_valid = literal
            .as_ref()
            .is_some_and(|literal| table.judge(range.as_ref(), literal) == LiteralVerdict::Valid);
        for record in records {
            if is_valid {
                valid.insert(record);
            } else if !candidates.iter().any(|(candidate, _)| *candidate == record) {
                candidates.push((record, literal.clone()));
            }
        }
    }
    candidates.retain(|(record, _)| !valid.contains(record));
    Ok(candidates)
}

/// The qualifying values of the instances of the restricted class, with the records using them.
fn values_of(
    context: &CheckContext<'_>,
    restriction: &Restriction,
    qualifier: Option<&str>,
) -> Result<Vec<(Term, Vec<NamedOrBlankNode>)>, GatewayError> {
    let mut query = context
        .data_query(["?value", "?record"])
        .distinct()
        .pattern(format!("?record a {} .", SparqlIri(restriction.class.as_ref())))
        .pattern(format!(
            "?record {} ?value .",
            SparqlIri(restriction.property.as_ref())
        ));
    if let Some(qualifier) = qualifier {
        query = query.pattern(qualifier);
    }
    Ok(group_by_value(
        &context.select(&query.order_by(["?value", "?record"]))?,
    ))
}
