//! Class subsumption lookups with a cache shared by all the checks of a run.

use crate::error::GatewayError;
use crate::gateway::{self, ClosureDirection, QueryGateway};
use crate::query::{SelectQuery, SparqlIri};
use crate::vocab::owl;
use dashmap::DashMap;
use oxrdf::vocab::rdfs;
use oxrdf::{NamedNode, NamedNodeRef};
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::sync::Arc;

/// What is known about a class.
///
/// Each part is filled the first time it is requested.
#[derive(Debug, Clone, Default)]
pub struct SubsumptionEntry {
    ontology: Option<Option<NamedNode>>,
    super_classes: Option<Arc<[NamedNode]>>,
    sub_classes: Option<Arc<[NamedNode]>>,
}

impl SubsumptionEntry {
    /// The ontology declaring the class, `Some(None)` if no ontology does.
    pub fn ontology(&self) -> Option<Option<&NamedNode>> {
        self.ontology.as_ref().map(Option::as_ref)
    }

    pub fn super_classes(&self) -> Option<&[NamedNode]> {
        self.super_classes.as_deref()
    }

    pub fn sub_classes(&self) -> Option<&[NamedNode]> {
        self.sub_classes.as_deref()
    }
}

/// Resolves the owning ontology and the super/sub-class closures of classes.
///
/// Lookups go through a [`QueryGateway`] and are cached for the lifetime of the resolver.
/// The ontologies are assumed not to change while the resolver is alive.
pub struct SubsumptionResolver {
    ontologies: Vec<NamedNode>,
    reasoning: bool,
    cache: DashMap<NamedNode, SubsumptionEntry, FxBuildHasher>,
}

impl SubsumptionResolver {
    /// With `reasoning` the closures are transitive.
    pub fn new(ontologies: impl IntoIterator<Item = NamedNode>, reasoning: bool) -> Self {
        Self {
            ontologies: ontologies.into_iter().collect(),
            reasoning,
            cache: DashMap::default(),
        }
    }

    /// A snapshot of the cached data about a class.
    pub fn cached(&self, class: NamedNodeRef<'_>) -> Option<SubsumptionEntry> {
        self.cache
            .get(&class.into_owned())
            .map(|entry| entry.value().clone())
    }

    /// The first ontology graph (in IRI order) describing `class`.
    pub fn owning_ontology(
        &self,
        gateway: &dyn QueryGateway,
        class: NamedNodeRef<'_>,
    ) -> Result<Option<NamedNode>, GatewayError> {
        let key = class.into_owned();
        if let Some(ontology) = self.cache.get(&key).and_then(|entry| entry.ontology.clone()) {
            return Ok(ontology);
        }
        let ontology = if self.ontologies.is_empty() {
            None
        } else {
            let query = SelectQuery::new(["?ontology"])
                .distinct()
                .from_named_graphs(&self.ontologies)
                .pattern(format!(
                    "GRAPH ?ontology {{ {} ?p ?o . }}",
                    SparqlIri(class)
                ))
                .order_by(["?ontology"])
                .limit(1);
            gateway::select(gateway, &query)?
                .first()
                .and_then(|solution| gateway::named_node(solution, "ontology"))
        };
        self.cache.entry(key).or_default().ontology = Some(ontology.clone());
        Ok(ontology)
    }

    /// All the super-classes of `class`, sorted, without `class` itself.
    pub fn super_classes(
        &self,
        gateway: &dyn QueryGateway,
        class: NamedNodeRef<'_>,
    ) -> Result<Arc<[NamedNode]>, GatewayError> {
        self.closure(gateway, class, ClosureDirection::Ancestors)
    }

    /// All the sub-classes of `class`, sorted, without `class` itself.
    pub fn sub_classes(
        &self,
        gateway: &dyn QueryGateway,
        class: NamedNodeRef<'_>,
    ) -> Result<Arc<[NamedNode]>, GatewayError> {
        self.closure(gateway, class, ClosureDirection::Descendants)
    }

    /// `class` followed by all its sub-classes.
    pub fn class_and_sub_classes(
        &self,
        gateway: &dyn QueryGateway,
        class: NamedNodeRef<'_>,
    ) -> Result<Vec<NamedNode>, GatewayError> {
        let mut classes = vec![class.into_owned()];
        classes.extend(self.sub_classes(gateway, class)?.iter().cloned());
        Ok(classes)
    }

    /// Tells if an instance of `observed` is also an instance of `declared`.
    pub fn is_subsumed(
        &self,
        gateway: &dyn QueryGateway,
        observed: NamedNodeRef<'_>,
        declared: NamedNodeRef<'_>,
    ) -> Result<bool, GatewayError> {
        if observed == declared || is_top_class(declared) {
            return Ok(true);
        }
        Ok(self
            .super_classes(gateway, observed)?
            .iter()
            .any(|class| class.as_ref() == declared))
    }

    fn closure(
        &self,
        gateway: &dyn QueryGateway,
        class: NamedNodeRef<'_>,
        direction: ClosureDirection,
    ) -> Result<Arc<[NamedNode]>, GatewayError> {
        let key = class.into_owned();
        if let Some(classes) = self.cache.get(&key).and_then(|entry| match direction {
            ClosureDirection::Ancestors => entry.super_classes.clone(),
            ClosureDirection::Descendants => entry.sub_classes.clone(),
        }) {
            return Ok(classes);
        }

        // Hierarchies may span several ontologies: each class reached is expanded in its own one.
        let mut seen = FxHashSet::default();
        seen.insert(key.clone());
        let mut found = Vec::new();
        let mut queue = vec![key.clone()];
        while let Some(current) = queue.pop() {
            let Some(ontology) = self.owning_ontology(gateway, current.as_ref())? else {
                continue;
            };
            for related in gateway.class_closure(
                current.as_ref(),
                ontology.as_ref(),
                direction,
                self.reasoning,
            )? {
                if seen.insert(related.clone()) {
                    found.push(related.clone());
                    if self.reasoning {
                        queue.push(related);
                    }
                }
            }
        }
        found.sort();
        let classes: Arc<[NamedNode]> = found.into();

        let mut entry = self.cache.entry(key).or_default();
        match direction {
            ClosureDirection::Ancestors => entry.super_classes = Some(Arc::clone(&classes)),
            ClosureDirection::Descendants => entry.sub_classes = Some(Arc::clone(&classes)),
        }
        Ok(classes)
    }
}

/// Every individual is an instance of these classes.
pub fn is_top_class(class: NamedNodeRef<'_>) -> bool {
    class == owl::THING || class == rdfs::RESOURCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::read_json_solutions;
    use sparesults::QuerySolution;
    use std::sync::Mutex;

    /// Answers the ontology lookup with one graph and closures with a fixed list.
    struct Scripted {
        queries: Mutex<Vec<String>>,
    }

    impl QueryGateway for Scripted {
        fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError> {
            self.queries.lock().unwrap().push(query.to_owned());
            let json = if query.contains("?ontology") {
                r#"{"head":{"vars":["ontology"]},"results":{"bindings":[{"ontology":{"type":"uri","value":"http://example.com/onto"}}]}}"#
            } else if query.contains("<http://example.com/Student> <http://www.w3.org/2000/01/rdf-schema#subClassOf>+") {
                r#"{"head":{"vars":["class"]},"results":{"bindings":[{"class":{"type":"uri","value":"http://example.com/Person"}},{"class":{"type":"uri","value":"http://example.com/Agent"}}]}}"#
            } else {
                r#"{"head":{"vars":["class"]},"results":{"bindings":[]}}"#
            };
            read_json_solutions(json.as_bytes())
        }
    }

    fn iri(value: &str) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(value)
    }

    #[test]
    fn test_super_classes_are_sorted_and_cached() {
        let gateway = Scripted {
            queries: Mutex::new(Vec::new()),
        };
        let resolver = SubsumptionResolver::new([iri("http://example.com/onto").into_owned()], true);
        let student = iri("http://example.com/Student");
        let classes = resolver.super_classes(&gateway, student).unwrap();
        assert_eq!(
            &*classes,
            [
                iri("http://example.com/Agent").into_owned(),
                iri("http://example.com/Person").into_owned()
            ]
        );
        let count = gateway.queries.lock().unwrap().len();
        assert!(
            resolver
                .is_subsumed(&gateway, student, iri("http://example.com/Agent"))
                .unwrap()
        );
        assert!(
            !resolver
                .is_subsumed(&gateway, student, iri("http://example.com/Course"))
                .unwrap()
        );
        assert_eq!(gateway.queries.lock().unwrap().len(), count);
        let entry = resolver.cached(student).unwrap();
        assert_eq!(
            entry.ontology(),
            Some(Some(&iri("http://example.com/onto").into_owned()))
        );
        assert!(entry.sub_classes().is_none());
    }

    #[test]
    fn test_top_classes_always_subsume() {
        let gateway = Scripted {
            queries: Mutex::new(Vec::new()),
        };
        let resolver = SubsumptionResolver::new([], true);
        assert!(
            resolver
                .is_subsumed(&gateway, iri("http://example.com/X"), owl::THING)
                .unwrap()
        );
        assert!(
            resolver
                .is_subsumed(&gateway, iri("http://example.com/X"), rdfs::RESOURCE)
                .unwrap()
        );
        assert!(gateway.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_ontology_means_no_super_class() {
        let gateway = Scripted {
            queries: Mutex::new(Vec::new()),
        };
        let resolver = SubsumptionResolver::new([], true);
        assert!(
            resolver
                .super_classes(&gateway, iri("http://example.com/Student"))
                .unwrap()
                .is_empty()
        );
        assert!(gateway.queries.lock().unwrap().is_empty());
    }
}
