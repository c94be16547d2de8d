//! Boolean, string-derived, URI and markup lexical spaces.

use oxiri::IriRef;
use oxsdatatypes::Boolean;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::str::{self, FromStr};
use std::sync::LazyLock;

#[expect(clippy::expect_used)]
static LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").expect("valid language tag regex")
});

/// Element used to wrap a literal so that it can be read as an XML fragment.
const WRAPPER: &str = "literal";

/// [`xsd:boolean`](https://www.w3.org/TR/xmlschema11-2/#boolean)
///
/// Only `true`, `false`, `1` and `0` are allowed. The comparison is case-sensitive.
pub fn validate_boolean(value: &str) -> bool {
    Boolean::from_str(value).is_ok()
}

/// [`xsd:anyURI`](https://www.w3.org/TR/xmlschema11-2/#anyURI)
///
/// Relative references are allowed.
pub fn validate_any_uri(value: &str) -> bool {
    IriRef::parse(value).is_ok()
}

/// [`xsd:language`](https://www.w3.org/TR/xmlschema11-2/#language)
pub fn validate_language(value: &str) -> bool {
    LANGUAGE.is_match(value)
}

/// [`xsd:normalizedString`](https://www.w3.org/TR/xmlschema11-2/#normalizedString)
///
/// No carriage return, line feed or tab.
pub fn validate_normalized_string(value: &str) -> bool {
    !value.contains(['\r', '\n', '\t'])
}

/// [`xsd:token`](https://www.w3.org/TR/xmlschema11-2/#token)
///
/// A normalized string without leading or trailing spaces and without consecutive spaces.
pub fn validate_token(value: &str) -> bool {
    validate_normalized_string(value)
        && !value.starts_with(' ')
        && !value.ends_with(' ')
        && !value.contains("  ")
}

/// [`xsd:Name`](https://www.w3.org/TR/xmlschema11-2/#Name)
pub fn validate_name(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

/// [`xsd:NCName`](https://www.w3.org/TR/xmlschema11-2/#NCName)
///
/// A [`xsd:Name`](validate_name) without any colon.
pub fn validate_nc_name(value: &str) -> bool {
    !value.contains(':') && validate_name(value)
}

/// [`xsd:NMTOKEN`](https://www.w3.org/TR/xmlschema11-2/#NMTOKEN)
pub fn validate_nmtoken(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_name_char)
}

/// [`xsd:string`](https://www.w3.org/TR/xmlschema11-2/#string)
///
/// The value is read as an XML fragment: markup it embeds must be well-formed and
/// `&` must start a valid reference.
pub fn validate_string(value: &str) -> bool {
    is_well_formed_fragment(value)
}

/// [`rdf:XMLLiteral`](https://www.w3.org/TR/rdf11-concepts/#section-XMLLiteral)
pub fn validate_xml_literal(value: &str) -> bool {
    is_well_formed_fragment(value)
}

/// [`rdf:PlainLiteral`](https://www.w3.org/TR/rdf-plain-literal/)
///
/// Some text optionally followed by `@` and a language tag.
pub fn validate_plain_literal(value: &str) -> bool {
    match value.rsplit_once('@') {
        Some((_, tag)) => tag.is_empty() || validate_language(tag),
        None => true,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn is_well_formed_fragment(value: &str) -> bool {
    let wrapped = format!("<{WRAPPER}>{value}</{WRAPPER}>");
    let mut reader = Reader::from_str(&wrapped);
    let mut depth = 0_usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if !has_valid_attributes(&start) {
                    return false;
                }
                depth += 1;
            }
            Ok(Event::Empty(start)) => {
                if !has_valid_attributes(&start) {
                    return false;
                }
            }
            Ok(Event::End(_)) => {
                let Some(parent) = depth.checked_sub(1) else {
                    return false;
                };
                depth = parent;
            }
            Ok(Event::Text(text)) => {
                let Ok(text) = str::from_utf8(&text) else {
                    return false;
                };
                if unescape(text).is_err() {
                    return false;
                }
            }
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => (),
            Err(_) => return false,
        }
    }
}

fn has_valid_attributes(start: &BytesStart<'_>) -> bool {
    start
        .attributes()
        .all(|attribute| attribute.is_ok_and(|attribute| attribute.unescape_value().is_ok()))
}
