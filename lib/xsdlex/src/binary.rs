//! Binary encodings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// [`xsd:hexBinary`](https://www.w3.org/TR/xmlschema11-2/#hexBinary)
///
/// An even number of hexadecimal digits.
pub fn validate_hex_binary(value: &str) -> bool {
    hex::decode(value).is_ok()
}

/// [`xsd:base64Binary`](https://www.w3.org/TR/xmlschema11-2/#base64Binary)
///
/// The value must decode and encode back to itself.
pub fn validate_base64_binary(value: &str) -> bool {
    STANDARD
        .decode(value)
        .is_ok_and(|decoded| STANDARD.encode(decoded) == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_binary() {
        assert!(validate_hex_binary("0FB8"));
        assert!(validate_hex_binary("0fb8"));
        assert!(validate_hex_binary(""));
        assert!(!validate_hex_binary("FB8"));
        assert!(!validate_hex_binary("0G"));
    }

    #[test]
    fn test_base64_binary() {
        assert!(validate_base64_binary("aGVsbG8="));
        assert!(validate_base64_binary(""));
        assert!(!validate_base64_binary("aGVsbG8"));
        assert!(!validate_base64_binary("a GVsbG8="));
        assert!(!validate_base64_binary("!!!!"));
    }
}
