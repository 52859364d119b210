// 📮 Postal Code (CEP) - 8 digits, displayed as NNNNN-NNN

use crate::digits::normalize;
use crate::error::{DocumentError, DocumentKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LENGTH: usize = 8;

/// Digits before the hyphen
const PREFIX_LENGTH: usize = 5;

/// A validated postal code (always 8 ASCII digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..PREFIX_LENGTH], &self.0[PREFIX_LENGTH..])
    }
}

impl FromStr for PostalCode {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

/// True iff the input has exactly 8 digits once cleaned
pub fn is_valid(raw: &str) -> bool {
    normalize(raw).len() == LENGTH
}

/// Fetch-path guard: anything other than exactly 8 digits is rejected
pub fn validate(raw: &str) -> Result<PostalCode, DocumentError> {
    let clean = normalize(raw);
    if clean.len() != LENGTH {
        return Err(DocumentError::InvalidLength {
            document: DocumentKind::PostalCode,
            expected: LENGTH,
            actual: clean.len(),
        });
    }
    Ok(PostalCode(clean))
}

/// Progressive format used while the user is typing.
///
/// The hyphen is always present: `""` -> `"-"`, `"123"` -> `"123-"`,
/// `"12345"` -> `"12345-"`, `"1234567"` -> `"12345-67"`. Digits past the
/// eighth are dropped.
pub fn format(raw: &str) -> String {
    let clean = normalize(raw);
    let head_end = clean.len().min(PREFIX_LENGTH);
    let tail_end = clean.len().min(LENGTH);
    format!("{}-{}", &clean[..head_end], &clean[head_end..tail_end])
}

/// Display form for stored values: only complete codes are punctuated,
/// anything else is shown exactly as given.
pub fn display(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match validate(raw) {
        Ok(code) => code.to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("01310-100", true)]
    #[case("01310100", true)]
    #[case(" 70.040-010 ", true)]
    #[case("0131010", false)]
    #[case("013101000", false)]
    #[case("", false)]
    #[case("abcdefgh", false)]
    fn test_is_valid(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_valid(input), expected);
    }

    #[rstest]
    #[case("", "-")]
    #[case("1", "1-")]
    #[case("123", "123-")]
    #[case("12345", "12345-")]
    #[case("123456", "12345-6")]
    #[case("1234567", "12345-67")]
    #[case("12345678", "12345-678")]
    #[case("1234567899", "12345-678")]
    #[case("01310-100", "01310-100")]
    #[case("abc", "-")]
    fn test_progressive_format(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format(input), expected);
    }

    #[test]
    fn test_format_round_trip() {
        for code in ["00000000", "01310100", "99999999", "70040010"] {
            let formatted = format(code);
            assert!(is_valid(&formatted));
            assert_eq!(normalize(&formatted), code);
        }
    }

    #[rstest]
    #[case("", "")]
    #[case("01310100", "01310-100")]
    #[case("0131", "0131")]
    #[case("0131-0100", "01310-100")]
    fn test_display(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(display(input), expected);
    }

    #[test]
    fn test_validate_reports_length() {
        let err = validate("0131").unwrap_err();
        assert_eq!(
            err,
            DocumentError::InvalidLength {
                document: DocumentKind::PostalCode,
                expected: 8,
                actual: 4,
            }
        );

        let code = validate("01310-100").unwrap();
        assert_eq!(code.digits(), "01310100");
        assert_eq!(code.to_string(), "01310-100");
    }

    #[test]
    fn test_serde_uses_digits() {
        let code: PostalCode = serde_json::from_str("\"01310-100\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"01310100\"");
        assert!(serde_json::from_str::<PostalCode>("\"123\"").is_err());
    }
}
