#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod binary;
mod error;
mod numeric;
mod registry;
mod temporal;
mod text;

pub use crate::binary::{validate_base64_binary, validate_hex_binary};
pub use crate::error::PatternError;
pub use crate::numeric::{
    validate_byte, validate_decimal, validate_double, validate_float, validate_int,
    validate_integer, validate_long, validate_negative_integer, validate_non_negative_integer,
    validate_non_positive_integer, validate_positive_integer, validate_short,
    validate_unsigned_byte, validate_unsigned_int, validate_unsigned_long, validate_unsigned_short,
};
pub use crate::registry::{DatatypeValidators, LexicalCheck, RDF_PLAIN_LITERAL};
pub use crate::temporal::{
    validate_date, validate_date_time, validate_date_time_stamp, validate_duration,
    validate_g_year, validate_g_year_month, validate_time,
};
pub use crate::text::{
    validate_any_uri, validate_boolean, validate_language, validate_name, validate_nc_name,
    validate_nmtoken, validate_normalized_string, validate_plain_literal, validate_string,
    validate_token, validate_xml_literal,
};
