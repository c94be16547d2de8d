use oxrdf::{Literal, NamedNode, NamedOrBlankNode, Term};
use std::fmt;

/// The severity of a [`Finding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The data could not be fully verified.
    Warning,
    /// The data violates a constraint of the ontologies.
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable identifier of a kind of finding like `OWL-RESTRICTION-MAX-100`.
///
/// Numbers below 100 are warnings, numbers from 100 on are errors.
///
/// ```
/// use sparaudit::{FindingCode, Severity};
///
/// let code = FindingCode::new("OWL-RESTRICTION-MAX", 100);
/// assert_eq!(code.to_string(), "OWL-RESTRICTION-MAX-100");
/// assert_eq!(code.severity(), Severity::Error);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FindingCode {
    family: &'static str,
    number: u16,
}

impl FindingCode {
    #[inline]
    pub const fn new(family: &'static str, number: u16) -> Self {
        Self { family, number }
    }

    #[inline]
    pub const fn family(self) -> &'static str {
        self.family
    }

    #[inline]
    pub const fn number(self) -> u16 {
        self.number
    }

    #[inline]
    pub const fn severity(self) -> Severity {
        if self.number >= 100 {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family, self.number)
    }
}

/// What a constraint expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expected {
    /// A declared domain or range class.
    Class(NamedNode),
    /// A declared datatype range.
    Datatype(NamedNode),
    /// A cardinality bound.
    Cardinality(u64),
    /// The filler of a restriction (a data range or a class expression).
    Filler(NamedNode),
}

/// A warning or an error found by a check.
///
/// Findings are built once with the `with_*` methods and are not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    code: FindingCode,
    message: String,
    dataset: Option<NamedNode>,
    subject: Option<NamedOrBlankNode>,
    property: Option<NamedNode>,
    expected: Option<Expected>,
    observed: Vec<NamedNode>,
    value: Option<Term>,
    invalid_value: Option<Literal>,
    observed_count: Option<u64>,
    super_classes: Vec<NamedNode>,
    affected_records: Vec<NamedOrBlankNode>,
}

impl Finding {
    pub fn new(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            dataset: None,
            subject: None,
            property: None,
            expected: None,
            observed: Vec::new(),
            value: None,
            invalid_value: None,
            observed_count: None,
            super_classes: Vec::new(),
            affected_records: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<NamedNode>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// The construct the finding is about: a class, a property or a record.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<NamedOrBlankNode>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: impl Into<NamedNode>) -> Self {
        self.property = Some(property.into());
        self
    }

    #[must_use]
    pub fn with_expected(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }

    /// The observed types or datatypes.
    #[must_use]
    pub fn with_observed(mut self, observed: impl IntoIterator<Item = NamedNode>) -> Self {
        self.observed.extend(observed);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<Term>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// A literal whose lexical form is not valid for its datatype.
    #[must_use]
    pub fn with_invalid_value(mut self, value: Literal) -> Self {
        self.invalid_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_observed_count(mut self, count: u64) -> Self {
        self.observed_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_super_classes(mut self, classes: impl IntoIterator<Item = NamedNode>) -> Self {
        self.super_classes.extend(classes);
        self
    }

    #[must_use]
    pub fn with_affected_records(
        mut self,
        records: impl IntoIterator<Item = NamedOrBlankNode>,
    ) -> Self {
        self.affected_records.extend(records);
        self
    }

    #[inline]
    pub fn code(&self) -> FindingCode {
        self.code
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn dataset(&self) -> Option<&NamedNode> {
        self.dataset.as_ref()
    }

    #[inline]
    pub fn subject(&self) -> Option<&NamedOrBlankNode> {
        self.subject.as_ref()
    }

    #[inline]
    pub fn property(&self) -> Option<&NamedNode> {
        self.property.as_ref()
    }

    #[inline]
    pub fn expected(&self) -> Option<&Expected> {
        self.expected.as_ref()
    }

    #[inline]
    pub fn observed(&self) -> &[NamedNode] {
        &self.observed
    }

    #[inline]
    pub fn value(&self) -> Option<&Term> {
        self.value.as_ref()
    }

    #[inline]
    pub fn invalid_value(&self) -> Option<&Literal> {
        self.invalid_value.as_ref()
    }

    #[inline]
    pub fn observed_count(&self) -> Option<u64> {
        self.observed_count
    }

    #[inline]
    pub fn super_classes(&self) -> &[NamedNode] {
        &self.super_classes
    }

    #[inline]
    pub fn affected_records(&self) -> &[NamedOrBlankNode] {
        &self.affected_records
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

/// A triple removed from a dataset by a fix pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixAction {
    pub dataset: NamedNode,
    pub subject: NamedNode,
    pub predicate: NamedNode,
    pub object: Term,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_code() {
        assert_eq!(
            FindingCode::new("CHECK-PROPERTY-DOMAIN", 50).severity(),
            Severity::Warning
        );
        assert_eq!(
            FindingCode::new("CHECK-PROPERTY-DOMAIN", 99).severity(),
            Severity::Warning
        );
        assert_eq!(
            FindingCode::new("CHECK-PROPERTY-DOMAIN", 100).severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_builder() {
        let property = NamedNode::new_unchecked("http://example.com/p");
        let record = NamedNode::new_unchecked("http://example.com/r1");
        let finding = Finding::new(FindingCode::new("OWL-RESTRICTION-MAX", 100), "too many")
            .with_property(property.clone())
            .with_expected(Expected::Cardinality(2))
            .with_observed_count(3)
            .with_affected_records([record.clone().into()]);
        assert!(finding.is_error());
        assert_eq!(finding.property(), Some(&property));
        assert_eq!(finding.expected(), Some(&Expected::Cardinality(2)));
        assert_eq!(finding.observed_count(), Some(3));
        assert_eq!(finding.affected_records(), [NamedOrBlankNode::from(record)]);
        assert_eq!(
            finding.to_string(),
            "[error] OWL-RESTRICTION-MAX-100: too many"
        );
    }
}
