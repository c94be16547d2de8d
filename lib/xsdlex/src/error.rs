/// A custom datatype pattern that could not be compiled.
#[derive(Debug, thiserror::Error)]
#[error("Invalid pattern '{pattern}' for datatype <{datatype}>: {source}")]
pub struct PatternError {
    datatype: String,
    pattern: String,
    #[source]
    source: regex::Error,
}

impl PatternError {
    pub(crate) fn new(
        datatype: impl Into<String>,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        Self {
            datatype: datatype.into(),
            pattern: pattern.into(),
            source,
        }
    }

    /// The IRI of the datatype the pattern was declared for.
    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    /// The pattern as it was declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
