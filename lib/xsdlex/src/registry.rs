use crate::binary::*;
use crate::error::PatternError;
use crate::numeric::*;
use crate::temporal::*;
use crate::text::*;
use oxrdf::vocab::{rdf, rdfs, xsd};
use regex::Regex;
use rustc_hash::FxHashMap;

/// The `rdf:PlainLiteral` datatype IRI.
pub const RDF_PLAIN_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#PlainLiteral";

/// A function telling if a lexical form belongs to the lexical space of a datatype.
pub type LexicalCheck = fn(&str) -> bool;

#[derive(Debug, Clone)]
enum Validator {
    Builtin(LexicalCheck),
    /// A pattern declared in an ontology, optionally refining a built-in datatype.
    Pattern {
        pattern: Regex,
        base: Option<LexicalCheck>,
    },
}

impl Validator {
    fn validate(&self, value: &str) -> bool {
        match self {
            Self::Builtin(check) => check(value),
            Self::Pattern { pattern, base } => {
                pattern.is_match(value) && base.is_none_or(|check| check(value))
            }
        }
    }
}

/// Table of lexical validators keyed by datatype IRI.
///
/// ```
/// use xsdlex::DatatypeValidators;
///
/// let validators = DatatypeValidators::new()
///     .with_pattern("http://example.com/zip", r"[0-9]{5}", None)?;
/// assert!(validators.validate("http://example.com/zip", "75001"));
/// assert!(!validators.validate("http://example.com/zip", "7500"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct DatatypeValidators {
    validators: FxHashMap<String, Validator>,
}

impl DatatypeValidators {
    /// Builds the table of built-in XSD and RDF datatypes.
    pub fn new() -> Self {
        let builtins: [(&str, LexicalCheck); 37] = [
            (xsd::BOOLEAN.as_str(), validate_boolean),
            (xsd::BYTE.as_str(), validate_byte),
            (xsd::SHORT.as_str(), validate_short),
            (xsd::INT.as_str(), validate_int),
            (xsd::LONG.as_str(), validate_long),
            (xsd::UNSIGNED_BYTE.as_str(), validate_unsigned_byte),
            (xsd::UNSIGNED_SHORT.as_str(), validate_unsigned_short),
            (xsd::UNSIGNED_INT.as_str(), validate_unsigned_int),
            (xsd::UNSIGNED_LONG.as_str(), validate_unsigned_long),
            (xsd::INTEGER.as_str(), validate_integer),
            (xsd::POSITIVE_INTEGER.as_str(), validate_positive_integer),
            (xsd::NON_NEGATIVE_INTEGER.as_str(), validate_non_negative_integer),
            (xsd::NEGATIVE_INTEGER.as_str(), validate_negative_integer),
            (xsd::NON_POSITIVE_INTEGER.as_str(), validate_non_positive_integer),
            (xsd::DECIMAL.as_str(), validate_decimal),
            (xsd::DOUBLE.as_str(), validate_double),
            (xsd::FLOAT.as_str(), validate_float),
            (xsd::DATE_TIME.as_str(), validate_date_time),
            (xsd::DATE_TIME_STAMP.as_str(), validate_date_time_stamp),
            (xsd::DATE.as_str(), validate_date),
            (xsd::TIME.as_str(), validate_time),
            (xsd::G_YEAR.as_str(), validate_g_year),
            (xsd::G_YEAR_MONTH.as_str(), validate_g_year_month),
            (xsd::DURATION.as_str(), validate_duration),
            (xsd::HEX_BINARY.as_str(), validate_hex_binary),
            (xsd::BASE_64_BINARY.as_str(), validate_base64_binary),
            (xsd::ANY_URI.as_str(), validate_any_uri),
            (xsd::LANGUAGE.as_str(), validate_language),
            (xsd::NAME.as_str(), validate_name),
            (xsd::NC_NAME.as_str(), validate_nc_name),
            (xsd::NMTOKEN.as_str(), validate_nmtoken),
            (xsd::TOKEN.as_str(), validate_token),
            (xsd::NORMALIZED_STRING.as_str(), validate_normalized_string),
            (xsd::STRING.as_str(), validate_string),
            (rdf::XML_LITERAL.as_str(), validate_xml_literal),
            (RDF_PLAIN_LITERAL, validate_plain_literal),
            (rdfs::LITERAL.as_str(), |_| true),
        ];
        Self {
            validators: builtins
                .into_iter()
                .map(|(datatype, check)| (datatype.to_owned(), Validator::Builtin(check)))
                .collect(),
        }
    }

    /// Registers a pattern for a custom datatype and returns the table.
    ///
    /// The pattern is implicitly anchored at both ends like XSD patterns are.
    /// If `base` is a known datatype, values must also belong to its lexical space.
    pub fn with_pattern(
        mut self,
        datatype: impl Into<String>,
        pattern: &str,
        base: Option<&str>,
    ) -> Result<Self, PatternError> {
        self.add_pattern(datatype, pattern, base)?;
        Ok(self)
    }

    /// Registers a pattern for a custom datatype.
    pub fn add_pattern(
        &mut self,
        datatype: impl Into<String>,
        pattern: &str,
        base: Option<&str>,
    ) -> Result<(), PatternError> {
        let datatype = datatype.into();
        let compiled = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| PatternError::new(datatype.clone(), pattern, e))?;
        let base = base.and_then(|base| self.builtin(base));
        self.validators.insert(
            datatype,
            Validator::Pattern {
                pattern: compiled,
                base,
            },
        );
        Ok(())
    }

    /// Returns true if there is a validator for the given datatype.
    pub fn contains(&self, datatype: &str) -> bool {
        self.validators.contains_key(datatype)
    }

    /// Returns the built-in check for the given datatype, if any.
    pub fn builtin(&self, datatype: &str) -> Option<LexicalCheck> {
        match self.validators.get(datatype)? {
            Validator::Builtin(check) => Some(*check),
            Validator::Pattern { .. } => None,
        }
    }

    /// Tells if `value` is in the lexical space of `datatype`.
    ///
    /// Datatypes without a known validator are always valid.
    pub fn validate(&self, datatype: &str, value: &str) -> bool {
        self.validators
            .get(datatype)
            .is_none_or(|validator| validator.validate(value))
    }
}

impl Default for DatatypeValidators {
    fn default() -> Self {
        Self::new()
    }
}
