//! [OWL 2](https://www.w3.org/TR/owl2-rdf-based-semantics/) terms not provided by [`oxrdf::vocab`].

pub mod owl {
    //! [OWL 2](https://www.w3.org/TR/owl2-syntax/) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The OWL namespace.
    pub const NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";

    pub const ALL_VALUES_FROM: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#allValuesFrom");
    pub const ANNOTATION_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#AnnotationProperty");
    pub const CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#cardinality");
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
    pub const DATATYPE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");
    pub const EQUIVALENT_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentClass");
    pub const MAX_CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#maxCardinality");
    pub const MAX_QUALIFIED_CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#maxQualifiedCardinality");
    pub const MIN_CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#minCardinality");
    pub const MIN_QUALIFIED_CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#minQualifiedCardinality");
    pub const OBJECT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
    pub const ON_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#onClass");
    pub const ON_DATA_RANGE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#onDataRange");
    pub const ON_DATATYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#onDatatype");
    pub const ON_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#onProperty");
    pub const QUALIFIED_CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#qualifiedCardinality");
    pub const SOME_VALUES_FROM: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#someValuesFrom");
    /// The class of all individuals.
    pub const THING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Thing");
    pub const WITH_RESTRICTIONS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#withRestrictions");
}

pub mod xsd_facet {
    //! XSD constraining facets used in OWL 2 datatype restrictions.
    use oxrdf::NamedNodeRef;

    pub const PATTERN: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#pattern");
}

/// Namespaces whose properties are vocabulary plumbing rather than data.
pub const BUILTIN_NAMESPACES: [&str; 3] = [
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    "http://www.w3.org/2000/01/rdf-schema#",
    owl::NAMESPACE,
];

/// The XSD namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// [`rdf:PlainLiteral`](https://www.w3.org/TR/rdf-plain-literal/)
pub const RDF_PLAIN_LITERAL: oxrdf::NamedNodeRef<'_> =
    oxrdf::NamedNodeRef::new_unchecked(xsdlex::RDF_PLAIN_LITERAL);
