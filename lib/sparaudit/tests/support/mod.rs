#![allow(dead_code)]

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{
    GraphNameRef, NamedNode, NamedNodeRef, NamedOrBlankNode, QuadRef, Term, TermRef,
};
use oxigraph::sparql::SparqlEvaluator;
use oxigraph::sparql::results::QueryResultsFormat;
use oxigraph::store::Store;
use sparaudit::check::Check;
use sparaudit::{
    AuditReport, Auditor, Finding, FixAction, GatewayError, QueryGateway, Scope, SparqlIri,
    read_json_solutions,
};
use sparesults::QuerySolution;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DATA: &str = "http://example.com/data";
pub const OTHER_DATA: &str = "http://example.com/other-data";
pub const ONTOLOGY: &str = "http://example.com/ontology";
pub const OTHER_ONTOLOGY: &str = "http://example.com/other-ontology";

pub const PREFIXES: &str = "@prefix ex: <http://example.com/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
";

/// A gateway evaluating the queries on an in-memory store.
///
/// The results go through the SPARQL JSON serializer and the production parser.
pub struct StoreGateway {
    store: Store,
    queries: AtomicUsize,
}

impl StoreGateway {
    pub fn new() -> Self {
        Self {
            store: Store::new().unwrap(),
            queries: AtomicUsize::new(0),
        }
    }

    /// Loads Turtle (without the prefixes) in a named graph.
    pub fn load(&self, graph: &str, turtle: &str) {
        self.store
            .load_from_slice(
                RdfParser::from_format(RdfFormat::Turtle)
                    .without_named_graphs()
                    .with_default_graph(NamedNode::new(graph).unwrap()),
                format!("{PREFIXES}{turtle}").as_bytes(),
            )
            .unwrap();
    }

    pub fn contains(&self, graph: &str, subject: &str, predicate: &str, object: &str) -> bool {
        self.store
            .contains(QuadRef::new(
                NamedNodeRef::new(subject).unwrap(),
                NamedNodeRef::new(predicate).unwrap(),
                TermRef::from(NamedNodeRef::new(object).unwrap()),
                GraphNameRef::from(NamedNodeRef::new(graph).unwrap()),
            ))
            .unwrap()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl QueryGateway for StoreGateway {
    fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let results = SparqlEvaluator::new()
            .parse_query(query)
            .map_err(|e| GatewayError::Service(format!("{e} in {query}")))?
            .on_store(&self.store)
            .execute()
            .map_err(|e| GatewayError::Service(e.to_string()))?
            .write(Vec::new(), QueryResultsFormat::Json)
            .map_err(|e| GatewayError::Service(e.to_string()))?;
        read_json_solutions(results.as_slice())
    }

    fn remove_triple(&self, action: &FixAction) -> Result<(), GatewayError> {
        let update = format!(
            "DELETE DATA {{ GRAPH {} {{ {} {} {} }} }}",
            SparqlIri(action.dataset.as_ref()),
            SparqlIri(action.subject.as_ref()),
            SparqlIri(action.predicate.as_ref()),
            action.object
        );
        SparqlEvaluator::new()
            .parse_update(&update)
            .map_err(|e| GatewayError::Service(e.to_string()))?
            .on_store(&self.store)
            .execute()
            .map_err(|e| GatewayError::Service(e.to_string()))
    }
}

/// A gateway failing on every query.
pub struct DownGateway;

impl QueryGateway for DownGateway {
    fn select(&self, _: &str) -> Result<Vec<QuerySolution>, GatewayError> {
        Err(GatewayError::Service("503 Service Unavailable".into()))
    }
}

pub fn ex(local: &str) -> NamedNode {
    NamedNode::new(format!("http://example.com/{local}")).unwrap()
}

pub fn record(local: &str) -> NamedOrBlankNode {
    ex(local).into()
}

pub fn term(local: &str) -> Term {
    ex(local).into()
}

pub fn scope() -> Scope {
    Scope::new(
        [NamedNode::new(DATA).unwrap()],
        [NamedNode::new(ONTOLOGY).unwrap()],
    )
}

/// A gateway with the given ontology and data in the default scope graphs.
pub fn gateway(ontology: &str, data: &str) -> StoreGateway {
    let gateway = StoreGateway::new();
    gateway.load(ONTOLOGY, ontology);
    gateway.load(DATA, data);
    gateway
}

pub fn audit(check: impl Check + 'static, gateway: &StoreGateway) -> AuditReport {
    Auditor::new(scope()).with_check(check).run(gateway)
}

/// The findings of a single check on the default scope.
pub fn findings(check: impl Check + 'static, gateway: &StoreGateway) -> Vec<Finding> {
    audit(check, gateway).findings().cloned().collect()
}

pub fn codes(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .map(|finding| finding.code().to_string())
        .collect()
}
