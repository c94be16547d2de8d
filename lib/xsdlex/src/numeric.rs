//! Integer, decimal and floating point lexical spaces.

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

#[expect(clippy::expect_used)]
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").expect("valid decimal regex")
});

#[expect(clippy::expect_used)]
static DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?|INF|-INF|NaN)$")
        .expect("valid double regex")
});

/// Splits an `xsd:integer` lexical form into its sign (`true` if negative) and its digits.
fn split_integer(value: &str) -> Option<(bool, &str)> {
    let (negative, digits) = if let Some(digits) = value.strip_prefix('-') {
        (true, digits)
    } else if let Some(digits) = value.strip_prefix('+') {
        (false, digits)
    } else {
        (false, value)
    };
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some((negative, digits))
}

fn is_zero(digits: &str) -> bool {
    digits.bytes().all(|b| b == b'0')
}

fn signed_in_range<T: FromStr>(value: &str) -> bool {
    split_integer(value).is_some() && value.parse::<T>().is_ok()
}

fn unsigned_in_range<T: FromStr>(value: &str) -> bool {
    match split_integer(value) {
        // "-0" is in the lexical space of unsigned types
        Some((true, digits)) => is_zero(digits),
        Some((false, digits)) => digits.parse::<T>().is_ok(),
        None => false,
    }
}

/// [`xsd:integer`](https://www.w3.org/TR/xmlschema11-2/#integer)
pub fn validate_integer(value: &str) -> bool {
    split_integer(value).is_some()
}

/// [`xsd:byte`](https://www.w3.org/TR/xmlschema11-2/#byte)
pub fn validate_byte(value: &str) -> bool {
    signed_in_range::<i8>(value)
}

/// [`xsd:short`](https://www.w3.org/TR/xmlschema11-2/#short)
pub fn validate_short(value: &str) -> bool {
    signed_in_range::<i16>(value)
}

/// [`xsd:int`](https://www.w3.org/TR/xmlschema11-2/#int)
pub fn validate_int(value: &str) -> bool {
    signed_in_range::<i32>(value)
}

/// [`xsd:long`](https://www.w3.org/TR/xmlschema11-2/#long)
pub fn validate_long(value: &str) -> bool {
    signed_in_range::<i64>(value)
}

/// [`xsd:unsignedByte`](https://www.w3.org/TR/xmlschema11-2/#unsignedByte)
pub fn validate_unsigned_byte(value: &str) -> bool {
    unsigned_in_range::<u8>(value)
}

/// [`xsd:unsignedShort`](https://www.w3.org/TR/xmlschema11-2/#unsignedShort)
pub fn validate_unsigned_short(value: &str) -> bool {
    unsigned_in_range::<u16>(value)
}

/// [`xsd:unsignedInt`](https://www.w3.org/TR/xmlschema11-2/#unsignedInt)
pub fn validate_unsigned_int(value: &str) -> bool {
    unsigned_in_range::<u32>(value)
}

/// [`xsd:unsignedLong`](https://www.w3.org/TR/xmlschema11-2/#unsignedLong)
pub fn validate_unsigned_long(value: &str) -> bool {
    unsigned_in_range::<u64>(value)
}

/// [`xsd:positiveInteger`](https://www.w3.org/TR/xmlschema11-2/#positiveInteger)
pub fn validate_positive_integer(value: &str) -> bool {
    split_integer(value).is_some_and(|(negative, digits)| !negative && !is_zero(digits))
}

/// [`xsd:nonNegativeInteger`](https://www.w3.org/TR/xmlschema11-2/#nonNegativeInteger)
pub fn validate_non_negative_integer(value: &str) -> bool {
    split_integer(value).is_some_and(|(negative, digits)| !negative || is_zero(digits))
}

/// [`xsd:negativeInteger`](https://www.w3.org/TR/xmlschema11-2/#negativeInteger)
pub fn validate_negative_integer(value: &str) -> bool {
    split_integer(value).is_some_and(|(negative, digits)| negative && !is_zero(digits))
}

/// [`xsd:nonPositiveInteger`](https://www.w3.org/TR/xmlschema11-2/#nonPositiveInteger)
pub fn validate_non_positive_integer(value: &str) -> bool {
    split_integer(value).is_some_and(|(negative, digits)| negative || is_zero(digits))
}

/// [`xsd:decimal`](https://www.w3.org/TR/xmlschema11-2/#decimal)
///
/// An exponent is tolerated because some stores write large decimals with one.
pub fn validate_decimal(value: &str) -> bool {
    DECIMAL.is_match(value)
}

/// [`xsd:double`](https://www.w3.org/TR/xmlschema11-2/#double)
pub fn validate_double(value: &str) -> bool {
    DOUBLE.is_match(value)
}

/// [`xsd:float`](https://www.w3.org/TR/xmlschema11-2/#float)
pub fn validate_float(value: &str) -> bool {
    DOUBLE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_bounds() {
        assert!(validate_int("2147483647"));
        assert!(validate_int("-2147483648"));
        assert!(!validate_int("2147483648"));
        assert!(!validate_int("-2147483649"));
        assert!(validate_int("+12"));
        assert!(!validate_int("12.0"));
        assert!(!validate_int(""));
        assert!(!validate_int(" 12"));
    }

    #[test]
    fn test_signed_widths() {
        assert!(validate_byte("127"));
        assert!(!validate_byte("128"));
        assert!(validate_byte("-128"));
        assert!(validate_short("32767"));
        assert!(!validate_short("32768"));
        assert!(validate_long("9223372036854775807"));
        assert!(!validate_long("9223372036854775808"));
    }

    #[test]
    fn test_unsigned_widths() {
        assert!(validate_unsigned_byte("255"));
        assert!(!validate_unsigned_byte("256"));
        assert!(!validate_unsigned_byte("-1"));
        assert!(validate_unsigned_byte("-0"));
        assert!(validate_unsigned_short("65535"));
        assert!(!validate_unsigned_short("65536"));
        assert!(validate_unsigned_int("4294967295"));
        assert!(!validate_unsigned_int("4294967296"));
        assert!(validate_unsigned_long("18446744073709551615"));
        assert!(!validate_unsigned_long("18446744073709551616"));
    }

    #[test]
    fn test_sign_constrained_integers() {
        assert!(validate_positive_integer("1"));
        assert!(validate_positive_integer("123456789012345678901234567890"));
        assert!(!validate_positive_integer("0"));
        assert!(!validate_positive_integer("-1"));
        assert!(validate_non_negative_integer("0"));
        assert!(validate_non_negative_integer("-0"));
        assert!(!validate_non_negative_integer("-3"));
        assert!(validate_negative_integer("-1"));
        assert!(!validate_negative_integer("-0"));
        assert!(!validate_negative_integer("4"));
        assert!(validate_non_positive_integer("0"));
        assert!(validate_non_positive_integer("-99999999999999999999"));
        assert!(!validate_non_positive_integer("1"));
    }

    #[test]
    fn test_decimal() {
        assert!(validate_decimal("1"));
        assert!(validate_decimal("-1.5"));
        assert!(validate_decimal("+.5"));
        assert!(validate_decimal("3."));
        assert!(validate_decimal("1.2E3"));
        assert!(!validate_decimal("."));
        assert!(!validate_decimal("1,5"));
        assert!(!validate_decimal("NaN"));
    }

    #[test]
    fn test_double() {
        assert!(validate_double("1.0e-10"));
        assert!(validate_double("INF"));
        assert!(validate_double("-INF"));
        assert!(validate_double("NaN"));
        assert!(!validate_double("inf"));
        assert!(!validate_double("nan"));
        assert!(!validate_double("1e"));
        assert!(validate_float("-0"));
        assert!(!validate_float("abc"));
    }
}
