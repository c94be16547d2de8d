//! A small builder for the SPARQL SELECT queries sent by the checks.
//!
//! Every IRI goes through [`SparqlIri`] so that the generated query stays syntactically valid.

use crate::vocab::BUILTIN_NAMESPACES;
use oxrdf::{NamedNode, NamedNodeRef};
use std::fmt::{self, Write};

/// Formats an IRI as a SPARQL `IRIREF`.
///
/// Characters that are not allowed between `<` and `>` are percent-encoded.
///
/// ```
/// use oxrdf::NamedNodeRef;
/// use sparaudit::SparqlIri;
///
/// let iri = NamedNodeRef::new_unchecked("http://example.com/a b>");
/// assert_eq!(SparqlIri(iri).to_string(), "<http://example.com/a%20b%3E>");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SparqlIri<'a>(pub NamedNodeRef<'a>);

impl fmt::Display for SparqlIri<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('<')?;
        for c in self.0.as_str().chars() {
            if c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
                let mut buffer = [0; 4];
                for byte in c.encode_utf8(&mut buffer).bytes() {
                    write!(f, "%{byte:02X}")?;
                }
            } else {
                f.write_char(c)?;
            }
        }
        f.write_char('>')
    }
}

/// A SPARQL SELECT query under construction.
///
/// ```
/// use oxrdf::NamedNode;
/// use sparaudit::SelectQuery;
///
/// let dataset = NamedNode::new("http://example.com/dataset")?;
/// let query = SelectQuery::new(["?class"])
///     .distinct()
///     .from_graphs([&dataset])
///     .pattern("?record a ?class .")
///     .order_by(["?class"]);
/// assert_eq!(
///     query.to_string(),
///     "SELECT DISTINCT ?class\nFROM <http://example.com/dataset>\nWHERE {\n  ?record a ?class .\n}\nORDER BY ?class\n"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    distinct: bool,
    projection: Vec<String>,
    from: Vec<NamedNode>,
    from_named: Vec<NamedNode>,
    patterns: Vec<String>,
    group_by: Vec<String>,
    having: Vec<String>,
    order_by: Vec<String>,
    limit: Option<usize>,
}

impl SelectQuery {
    /// Starts a query projecting the given variables or `(expression AS ?variable)` bindings.
    pub fn new(projection: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            projection: projection.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds graphs to the default graph of the query (`FROM`).
    #[must_use]
    pub fn from_graphs<'a>(mut self, graphs: impl IntoIterator<Item = &'a NamedNode>) -> Self {
        self.from.extend(graphs.into_iter().cloned());
        self
    }

    /// Adds graphs to the named graphs of the query (`FROM NAMED`).
    #[must_use]
    pub fn from_named_graphs<'a>(
        mut self,
        graphs: impl IntoIterator<Item = &'a NamedNode>,
    ) -> Self {
        self.from_named.extend(graphs.into_iter().cloned());
        self
    }

    /// Adds a group graph pattern element to the `WHERE` clause.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Adds a `FILTER` to the `WHERE` clause.
    #[must_use]
    pub fn filter(mut self, expression: impl AsRef<str>) -> Self {
        self.patterns
            .push(format!("FILTER({})", expression.as_ref()));
        self
    }

    #[must_use]
    pub fn group_by(mut self, variables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.group_by.extend(variables.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn having(mut self, expression: impl Into<String>) -> Self {
        self.having.push(expression.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, variables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.order_by.extend(variables.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        if self.projection.is_empty() {
            f.write_char('*')?;
        } else {
            f.write_str(&self.projection.join(" "))?;
        }
        f.write_char('\n')?;
        for graph in &self.from {
            writeln!(f, "FROM {}", SparqlIri(graph.as_ref()))?;
        }
        for graph in &self.from_named {
            writeln!(f, "FROM NAMED {}", SparqlIri(graph.as_ref()))?;
        }
        f.write_str("WHERE {\n")?;
        for pattern in &self.patterns {
            writeln!(f, "  {pattern}")?;
        }
        f.write_str("}\n")?;
        if !self.group_by.is_empty() {
            writeln!(f, "GROUP BY {}", self.group_by.join(" "))?;
        }
        for expression in &self.having {
            writeln!(f, "HAVING ({expression})")?;
        }
        if !self.order_by.is_empty() {
            writeln!(f, "ORDER BY {}", self.order_by.join(" "))?;
        }
        if let Some(limit) = self.limit {
            writeln!(f, "LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// `VALUES ?variable { <a> <b> }`
pub fn values<'a>(variable: &str, iris: impl IntoIterator<Item = NamedNodeRef<'a>>) -> String {
    format!("VALUES {variable} {{ {} }}", iri_list(iris, " "))
}

/// `?variable IN (<a>, <b>)`
pub fn in_list<'a>(variable: &str, iris: impl IntoIterator<Item = NamedNodeRef<'a>>) -> String {
    format!("{variable} IN ({})", iri_list(iris, ", "))
}

/// An expression that is false when `variable` is bound to an RDF, RDFS or OWL vocabulary term.
pub fn not_builtin(variable: &str) -> String {
    BUILTIN_NAMESPACES
        .iter()
        .map(|namespace| format!("!STRSTARTS(STR({variable}), \"{namespace}\")"))
        .collect::<Vec<_>>()
        .join(" && ")
}

fn iri_list<'a>(iris: impl IntoIterator<Item = NamedNodeRef<'a>>, separator: &str) -> String {
    iris.into_iter()
        .map(|iri| SparqlIri(iri).to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
