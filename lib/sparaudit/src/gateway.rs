//! The contract between the checks and the SPARQL service holding the data.

use crate::error::GatewayError;
use crate::finding::FixAction;
use crate::query::{SelectQuery, SparqlIri};
use oxrdf::vocab::rdfs;
use oxrdf::{Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use sparesults::{
    QueryResultsFormat, QueryResultsParser, QuerySolution, ReaderQueryResultsParserOutput,
};
use std::io::Read;
use tracing::debug;

/// Which side of a class hierarchy [`QueryGateway::class_closure`] walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClosureDirection {
    /// Super-classes.
    Ancestors,
    /// Sub-classes.
    Descendants,
}

/// Access to a SPARQL service.
///
/// Implementations must be usable from several threads at the same time.
pub trait QueryGateway: Send + Sync {
    /// Evaluates a SPARQL SELECT query and returns its solutions in order.
    ///
    /// The graphs to query are given by the `FROM` and `FROM NAMED` clauses of the query.
    fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError>;

    /// Returns the super-classes or sub-classes of `class` declared in the `ontology` graph.
    ///
    /// With `reasoning` the closure is transitive, else only direct relations are returned.
    /// Anonymous class expressions are ignored.
    fn class_closure(
        &self,
        class: NamedNodeRef<'_>,
        ontology: NamedNodeRef<'_>,
        direction: ClosureDirection,
        reasoning: bool,
    ) -> Result<Vec<NamedNode>, GatewayError> {
        let path = format!(
            "{}{}",
            SparqlIri(rdfs::SUB_CLASS_OF),
            if reasoning { "+" } else { "" }
        );
        let pattern = match direction {
            ClosureDirection::Ancestors => format!("{} {path} ?class .", SparqlIri(class)),
            ClosureDirection::Descendants => format!("?class {path} {} .", SparqlIri(class)),
        };
        let query = SelectQuery::new(["?class"])
            .distinct()
            .from_graphs([&ontology.into_owned()])
            .pattern(pattern)
            .filter(format!("isIRI(?class) && ?class != {}", SparqlIri(class)))
            .order_by(["?class"])
            .to_string();
        debug!(query = %query, "evaluating class closure query");
        Ok(self
            .select(&query)?
            .iter()
            .filter_map(|solution| named_node(solution, "class"))
            .collect())
    }

    /// Removes a triple from a dataset.
    fn remove_triple(&self, action: &FixAction) -> Result<(), GatewayError> {
        let _ = action;
        Err(GatewayError::UpdateUnsupported)
    }
}

impl<T: QueryGateway + ?Sized> QueryGateway for &T {
    fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError> {
        (**self).select(query)
    }

    fn class_closure(
        &self,
        class: NamedNodeRef<'_>,
        ontology: NamedNodeRef<'_>,
        direction: ClosureDirection,
        reasoning: bool,
    ) -> Result<Vec<NamedNode>, GatewayError> {
        (**self).class_closure(class, ontology, direction, reasoning)
    }

    fn remove_triple(&self, action: &FixAction) -> Result<(), GatewayError> {
        (**self).remove_triple(action)
    }
}

/// Parses SPARQL query results that must be a list of solutions.
pub fn read_solutions(
    format: QueryResultsFormat,
    reader: impl Read,
) -> Result<Vec<QuerySolution>, GatewayError> {
    let ReaderQueryResultsParserOutput::Solutions(solutions) =
        QueryResultsParser::from_format(format).for_reader(reader)?
    else {
        return Err(GatewayError::NotSolutions);
    };
    Ok(solutions.collect::<Result<_, _>>()?)
}

/// Parses [SPARQL 1.1 Query Results JSON](https://www.w3.org/TR/sparql11-results-json/).
pub fn read_json_solutions(reader: impl Read) -> Result<Vec<QuerySolution>, GatewayError> {
    read_solutions(QueryResultsFormat::Json, reader)
}

/// Sends a query built by a check.
pub(crate) fn select(
    gateway: &dyn QueryGateway,
    query: &SelectQuery,
) -> Result<Vec<QuerySolution>, GatewayError> {
    let query = query.to_string();
    debug!(query = %query, "evaluating query");
    gateway.select(&query)
}

pub(crate) fn named_node(solution: &QuerySolution, variable: &str) -> Option<NamedNode> {
    match solution.get(variable)? {
        Term::NamedNode(node) => Some(node.clone()),
        _ => None,
    }
}

/// A record is any resource that can be the subject of a triple.
pub(crate) fn record(solution: &QuerySolution, variable: &str) -> Option<NamedOrBlankNode> {
    match solution.get(variable)? {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

pub(crate) fn literal(solution: &QuerySolution, variable: &str) -> Option<Literal> {
    match solution.get(variable)? {
        Term::Literal(literal) => Some(literal.clone()),
        _ => None,
    }
}

pub(crate) fn term(solution: &QuerySolution, variable: &str) -> Option<Term> {
    solution.get(variable).cloned()
}

/// Reads an integer binding like the result of a `COUNT`.
pub(crate) fn count(solution: &QuerySolution, variable: &str) -> Option<u64> {
    literal(solution, variable)?.value().parse().ok()
}
