// 🏢 Registry Number (CNPJ) - 14 digits protected by two modulo-11 check digits
//
// Layout: NN.NNN.NNN/NNNN-DD
//   - 8 digits: company root
//   - 4 digits: branch (0001 = head office)
//   - 2 digits: check digits

use super::weights::Weights;
use crate::digits::{digit_values, is_repeated, normalize};
use crate::error::{DocumentError, DocumentKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LENGTH: usize = 14;

/// Digits covered by the first check digit
const BASE_LENGTH: usize = 12;

/// A validated registry number (14 digits, both check digits correct)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryNumber(String);

impl RegistryNumber {
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// First 8 digits - shared by every branch of the same company
    pub fn root(&self) -> &str {
        &self.0[..8]
    }

    /// Branch number; "0001" is the head office
    pub fn branch(&self) -> &str {
        &self.0[8..12]
    }

    pub fn is_head_office(&self) -> bool {
        self.branch() == "0001"
    }
}

impl fmt::Display for RegistryNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&punctuate(&self.0))
    }
}

impl FromStr for RegistryNumber {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl TryFrom<String> for RegistryNumber {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)
    }
}

impl From<RegistryNumber> for String {
    fn from(number: RegistryNumber) -> Self {
        number.0
    }
}

// ============================================================================
// CHECK DIGITS
// ============================================================================

/// Check digit for the given digits.
///
/// Weights cycle 2..=9 from the rightmost digit leftwards;
/// `r = sum % 11`, digit = 0 when `r < 2`, otherwise `11 - r`.
pub fn check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip(Weights::new())
        .map(|(&digit, weight)| digit * weight)
        .sum();

    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Both check digits for a 12-digit base, or None if the base is not 12 digits.
pub fn check_digits_for(base: &str) -> Option<(u32, u32)> {
    let clean = normalize(base);
    if clean.len() != BASE_LENGTH {
        return None;
    }

    let mut digits = digit_values(&clean);
    let first = check_digit(&digits);
    digits.push(first);
    let second = check_digit(&digits);
    Some((first, second))
}

fn check_digits_match(clean: &str) -> bool {
    let digits = digit_values(clean);
    let first = check_digit(&digits[..BASE_LENGTH]);
    if digits[BASE_LENGTH] != first {
        return false;
    }
    let second = check_digit(&digits[..BASE_LENGTH + 1]);
    digits[BASE_LENGTH + 1] == second
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Length, repeated-digit and check-digit validation
pub fn validate(raw: &str) -> Result<RegistryNumber, DocumentError> {
    let clean = normalize(raw);

    if clean.len() != LENGTH {
        return Err(DocumentError::InvalidLength {
            document: DocumentKind::RegistryNumber,
            expected: LENGTH,
            actual: clean.len(),
        });
    }

    // 00000000000000, 11111111111111, ... pass the arithmetic but are not issued
    if is_repeated(&clean) || !check_digits_match(&clean) {
        return Err(DocumentError::InvalidCheckDigits {
            document: DocumentKind::RegistryNumber,
        });
    }

    Ok(RegistryNumber(clean))
}

pub fn is_valid(raw: &str) -> bool {
    validate(raw).is_ok()
}

/// 14 digits and not a repeated pattern; check digits are NOT verified
pub fn has_valid_shape(raw: &str) -> bool {
    let clean = normalize(raw);
    clean.len() == LENGTH && !is_repeated(&clean)
}

// ============================================================================
// FORMATTING
// ============================================================================

fn punctuate(clean: &str) -> String {
    format!(
        "{}.{}.{}/{}-{}",
        &clean[0..2],
        &clean[2..5],
        &clean[5..8],
        &clean[8..12],
        &clean[12..14]
    )
}

/// Display form. Incomplete input comes back untouched (not even cleaned);
/// empty input gives an empty string.
pub fn format(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let clean = normalize(raw);
    if clean.len() != LENGTH {
        return raw.to_string();
    }

    punctuate(&clean)
}

/// Mask applied on every keystroke: punctuation appears as soon as the
/// following digit is typed. More than 14 digits leaves the bare digits.
pub fn mask_input(raw: &str) -> String {
    let clean = normalize(raw);
    if clean.len() > LENGTH {
        return clean;
    }

    let mut masked = String::with_capacity(LENGTH + 4);
    for (i, c) in clean.chars().enumerate() {
        match i {
            2 | 5 => masked.push('.'),
            8 => masked.push('/'),
            12 => masked.push('-'),
            _ => {}
        }
        masked.push(c);
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("11222333000181")]
    #[case("11.222.333/0001-81")]
    #[case("00000000000191")]
    #[case("00.000.000/0001-91")]
    #[case("33.000.167/0001-01")]
    #[case("60.746.948/0001-12")]
    fn test_valid_numbers(#[case] input: &str) {
        assert!(is_valid(input), "expected {} to be valid", input);
    }

    #[rstest]
    #[case("11111111111111")]
    #[case("00000000000000")]
    #[case("99999999999999")]
    #[case("11222333000182")]
    #[case("11222333000191")]
    #[case("1122233300018")]
    #[case("112223330001811")]
    #[case("")]
    fn test_invalid_numbers(#[case] input: &str) {
        assert!(!is_valid(input), "expected {} to be invalid", input);
    }

    #[test]
    fn test_validate_error_kinds() {
        assert!(matches!(
            validate("123"),
            Err(DocumentError::InvalidLength { expected: 14, actual: 3, .. })
        ));
        assert!(matches!(
            validate("11111111111111"),
            Err(DocumentError::InvalidCheckDigits { .. })
        ));
        assert!(matches!(
            validate("11222333000180"),
            Err(DocumentError::InvalidCheckDigits { .. })
        ));
    }

    #[test]
    fn test_check_digits_for_base() {
        assert_eq!(check_digits_for("112223330001"), Some((8, 1)));
        assert_eq!(check_digits_for("000000000001"), Some((9, 1)));
        assert_eq!(check_digits_for("1122233300"), None);
    }

    #[test]
    fn test_check_digit_remainder_below_two_is_zero() {
        // [1] -> 1*2 = 2 -> r=2 -> 9
        assert_eq!(check_digit(&[1]), 9);
        // [0] -> sum 0 -> r=0 -> 0
        assert_eq!(check_digit(&[0]), 0);
        // [5, 3] -> 5*3 + 3*2 = 21 -> r=10 -> 1
        assert_eq!(check_digit(&[5, 3]), 1);
        // [6, 0] -> 6*3 = 18 -> r=7 -> 4
        assert_eq!(check_digit(&[6, 0]), 4);
        // [4, 4] -> 4*3 + 4*2 = 20 -> r=9 -> 2
        assert_eq!(check_digit(&[4, 4]), 2);
        // [2, 5] -> 2*3 + 5*2 = 16 -> r=5 -> 6
        assert_eq!(check_digit(&[2, 5]), 6);
        // [4, 0] -> 12 -> r=1 -> 0
        assert_eq!(check_digit(&[4, 0]), 0);
    }

    #[rstest]
    #[case("", "")]
    #[case("123456", "123456")]
    #[case("11222333000181", "11.222.333/0001-81")]
    #[case("00000000000191", "00.000.000/0001-91")]
    #[case("11.222.333/0001-81", "11.222.333/0001-81")]
    #[case("11 222 333 0001 81", "11.222.333/0001-81")]
    #[case("11.222.333/0001", "11.222.333/0001")]
    #[case("112223330001811", "112223330001811")]
    fn test_format(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format(input), expected);
    }

    #[test]
    fn test_format_does_not_check_digits() {
        assert_eq!(format("11111111111111"), "11.111.111/1111-11");
    }

    #[rstest]
    #[case("", "")]
    #[case("1", "1")]
    #[case("12", "12")]
    #[case("123", "12.3")]
    #[case("12345", "12.345")]
    #[case("123456", "12.345.6")]
    #[case("1234567", "12.345.67")]
    #[case("12345678", "12.345.678")]
    #[case("123456789", "12.345.678/9")]
    #[case("12345678901", "12.345.678/901")]
    #[case("123456789012", "12.345.678/9012")]
    #[case("1234567890123", "12.345.678/9012-3")]
    #[case("11222333000181", "11.222.333/0001-81")]
    #[case("12.345.678/9012-3", "12.345.678/9012-3")]
    #[case("112223330001819", "112223330001819")]
    fn test_mask_input(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(mask_input(input), expected);
    }

    #[test]
    fn test_has_valid_shape() {
        assert!(has_valid_shape("11222333000180"));
        assert!(!has_valid_shape("11111111111111"));
        assert!(!has_valid_shape("1122233300018"));
    }

    #[test]
    fn test_registry_number_parts() {
        let number: RegistryNumber = "11.222.333/0001-81".parse().unwrap();
        assert_eq!(number.root(), "11222333");
        assert_eq!(number.branch(), "0001");
        assert!(number.is_head_office());
        assert_eq!(number.to_string(), "11.222.333/0001-81");
        assert_eq!(String::from(number), "11222333000181");
    }
}
