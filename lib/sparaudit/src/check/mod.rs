//! The constraint checks.
//!
//! Each check discovers the constraints of the ontologies that apply to the data actually
//! present in the datasets, verifies them and returns its findings.
//! Gateway failures are turned into warning findings: a check never fails as a whole.

mod dangling;
mod datatype;
mod domain;
mod existence;
mod range;
mod restriction;

pub use dangling::DanglingReferences;
pub use datatype::{DatatypePropertyRange, accepted_datatypes};
pub use domain::PropertyDomain;
pub use existence::{UndefinedClasses, UndefinedProperties};
pub use range::ObjectPropertyRange;
pub use restriction::{RestrictionCheck, RestrictionKind};

use crate::error::GatewayError;
use crate::finding::{Finding, FindingCode, FixAction};
use crate::gateway::{self, QueryGateway};
use crate::query::SelectQuery;
use crate::scope::Scope;
use crate::subsumption::SubsumptionResolver;
use oxrdf::{NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use rustc_hash::{FxHashMap, FxHashSet};
use sparesults::QuerySolution;
use std::fmt;
use tracing::warn;
use xsdlex::DatatypeValidators;

/// A family of constraints to verify.
pub trait Check: Send + Sync {
    /// A short stable identifier like `property-domain`.
    fn name(&self) -> &str;

    /// A human readable description for the reports.
    fn description(&self) -> &str;

    /// Verifies the constraints and returns the findings in a reproducible order.
    fn run(&self, context: &CheckContext<'_>) -> Vec<Finding>;

    /// Tries to repair the data for the given findings of this check.
    fn fix(&self, context: &CheckContext<'_>, findings: &[Finding]) -> FixOutcome {
        let _ = (context, findings);
        FixOutcome::default()
    }
}

/// What a fix pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixOutcome {
    /// The triples removed.
    pub fixes: Vec<FixAction>,
    /// Warnings about fixes that could not be applied.
    pub findings: Vec<Finding>,
}

/// Everything a check needs to run.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    scope: &'a Scope,
    gateway: &'a dyn QueryGateway,
    subsumption: &'a SubsumptionResolver,
    validators: &'a DatatypeValidators,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        scope: &'a Scope,
        gateway: &'a dyn QueryGateway,
        subsumption: &'a SubsumptionResolver,
        validators: &'a DatatypeValidators,
    ) -> Self {
        Self {
            scope,
            gateway,
            subsumption,
            validators,
        }
    }

    pub fn scope(&self) -> &'a Scope {
        self.scope
    }

    pub fn gateway(&self) -> &'a dyn QueryGateway {
        self.gateway
    }

    pub fn subsumption(&self) -> &'a SubsumptionResolver {
        self.subsumption
    }

    pub fn validators(&self) -> &'a DatatypeValidators {
        self.validators
    }

    /// A query over the data: the datasets are merged into the default graph
    /// and the ontologies are available as named graphs.
    pub fn data_query(&self, projection: impl IntoIterator<Item = impl Into<String>>) -> SelectQuery {
        SelectQuery::new(projection)
            .from_graphs(self.scope.datasets())
            .from_named_graphs(self.scope.ontologies())
    }

    /// A query over the ontologies merged into the default graph.
    pub fn ontology_query(
        &self,
        projection: impl IntoIterator<Item = impl Into<String>>,
    ) -> SelectQuery {
        SelectQuery::new(projection).from_graphs(self.scope.ontologies())
    }

    pub fn select(&self, query: &SelectQuery) -> Result<Vec<QuerySolution>, GatewayError> {
        gateway::select(self.gateway, query)
    }
}

/// The full catalogue of checks in the order they run.
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(UndefinedClasses),
        Box::new(UndefinedProperties),
        Box::new(PropertyDomain),
        Box::new(ObjectPropertyRange),
        Box::new(DatatypePropertyRange),
        Box::new(RestrictionCheck::new(RestrictionKind::ExactCardinality)),
        Box::new(RestrictionCheck::new(RestrictionKind::MinCardinality)),
        Box::new(RestrictionCheck::new(RestrictionKind::MaxCardinality)),
        Box::new(RestrictionCheck::new(RestrictionKind::AllValuesFrom)),
        Box::new(RestrictionCheck::new(RestrictionKind::SomeValuesFrom)),
        Box::new(DanglingReferences),
    ]
}

/// Turns a gateway failure into a warning.
pub(crate) fn gateway_failure(
    code: FindingCode,
    context: impl fmt::Display,
    error: &GatewayError,
) -> Finding {
    warn!(code = %code, error = %error, "{context}");
    Finding::new(code, format!("{context}: {error}"))
}

/// Tells if one of `types` is `declared` or one of its sub-classes.
///
/// `None` if a super-class lookup failed before a match was found.
/// Each class whose lookup fails is reported once per `reported` set, with the code `family-53`.
pub(crate) fn any_type_subsumed(
    context: &CheckContext<'_>,
    types: &[NamedNode],
    declared: NamedNodeRef<'_>,
    family: &'static str,
    reported: &mut FxHashSet<NamedNode>,
    findings: &mut Vec<Finding>,
) -> Option<bool> {
    let mut undecided = false;
    for kind in types {
        match context
            .subsumption()
            .is_subsumed(context.gateway(), kind.as_ref(), declared)
        {
            Ok(true) => return Some(true),
            Ok(false) => (),
            Err(error) => {
                undecided = true;
                if reported.insert(kind.clone()) {
                    findings.push(
                        gateway_failure(
                            FindingCode::new(family, 53),
                            format!("Failed to look up the super-classes of {kind}"),
                            &error,
                        )
                        .with_subject(kind.clone()),
                    );
                }
            }
        }
    }
    (!undecided).then_some(false)
}

/// The super-classes of all `types`, in first-seen order.
///
/// Failed lookups are skipped, they have already been reported by [`any_type_subsumed`].
pub(crate) fn union_super_classes(
    context: &CheckContext<'_>,
    types: &[NamedNode],
) -> Vec<NamedNode> {
    let mut super_classes = Vec::new();
    for kind in types {
        let Ok(classes) = context
            .subsumption()
            .super_classes(context.gateway(), kind.as_ref())
        else {
            continue;
        };
        for class in classes.iter() {
            if !super_classes.contains(class) {
                super_classes.push(class.clone());
            }
        }
    }
    super_classes
}

/// Groups `?value ?record` solutions by value, keeping the first-seen order.
pub(crate) fn group_by_value(solutions: &[QuerySolution]) -> Vec<(Term, Vec<NamedOrBlankNode>)> {
    let mut positions = FxHashMap::<Term, usize>::default();
    let mut groups: Vec<(Term, Vec<NamedOrBlankNode>)> = Vec::new();
    for solution in solutions {
        let (Some(value), Some(record)) = (
            gateway::term(solution, "value"),
            gateway::record(solution, "record"),
        ) else {
            continue;
        };
        match positions.get(&value) {
            Some(&position) => groups[position].1.push(record),
            None => {
                positions.insert(value.clone(), groups.len());
                groups.push((value, vec![record]));
            }
        }
    }
    groups
}
