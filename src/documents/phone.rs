// ☎️ Brazilian phone numbers: area code + 8 (landline) or 9 (mobile) digits

use crate::digits::normalize;
use crate::error::{DocumentError, DocumentKind};

pub const LANDLINE_LENGTH: usize = 10;
pub const MOBILE_LENGTH: usize = 11;

pub fn is_valid(raw: &str) -> bool {
    matches!(normalize(raw).len(), LANDLINE_LENGTH | MOBILE_LENGTH)
}

pub fn validate(raw: &str) -> Result<String, DocumentError> {
    let clean = normalize(raw);
    match clean.len() {
        LANDLINE_LENGTH | MOBILE_LENGTH => Ok(clean),
        actual => Err(DocumentError::InvalidLength {
            document: DocumentKind::Phone,
            expected: if actual > LANDLINE_LENGTH {
                MOBILE_LENGTH
            } else {
                LANDLINE_LENGTH
            },
            actual,
        }),
    }
}

/// `(11) 1234-5678` for landlines, `(11) 91234-5678` for mobiles.
/// Any other length is returned as given.
pub fn format(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let clean = normalize(raw);
    match clean.len() {
        LANDLINE_LENGTH => format!("({}) {}-{}", &clean[..2], &clean[2..6], &clean[6..]),
        MOBILE_LENGTH => format!("({}) {}-{}", &clean[..2], &clean[2..7], &clean[7..]),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1133334444", "(11) 3333-4444")]
    #[case("11987654321", "(11) 98765-4321")]
    #[case("(61) 3333-4444", "(61) 3333-4444")]
    #[case("12345", "12345")]
    #[case("", "")]
    fn test_format(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format(input), expected);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("(11) 3333-4444"));
        assert!(is_valid("11 98765 4321"));
        assert!(!is_valid("3333-4444"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_validate_expected_length() {
        match validate("123456789012") {
            Err(DocumentError::InvalidLength { expected, actual, .. }) => {
                assert_eq!(expected, 11);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(validate("(11) 3333-4444").unwrap(), "1133334444");
    }
}
