use oxrdf::NamedNode;

/// The dataset and ontology graphs an audit runs against.
///
/// The order of the graphs is kept: it is the order in which they appear in the
/// generated `FROM` and `FROM NAMED` clauses and in the reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    datasets: Vec<NamedNode>,
    ontologies: Vec<NamedNode>,
}

impl Scope {
    pub fn new(
        datasets: impl IntoIterator<Item = NamedNode>,
        ontologies: impl IntoIterator<Item = NamedNode>,
    ) -> Self {
        let mut scope = Self {
            datasets: Vec::new(),
            ontologies: Vec::new(),
        };
        for dataset in datasets {
            if !scope.datasets.contains(&dataset) {
                scope.datasets.push(dataset);
            }
        }
        for ontology in ontologies {
            if !scope.ontologies.contains(&ontology) {
                scope.ontologies.push(ontology);
            }
        }
        scope
    }

    /// The graphs holding the audited records.
    pub fn datasets(&self) -> &[NamedNode] {
        &self.datasets
    }

    /// The graphs holding the ontologies the records are validated against.
    pub fn ontologies(&self) -> &[NamedNode] {
        &self.ontologies
    }
}
