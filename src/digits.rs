// 🔢 Digit Normalizer
// Every document number goes through here before it is validated or formatted.
//
// "11.222.333/0001-81", "11222333000181" and "CNPJ: 11 222 333 0001 81"
// all clean to the same digit string.

/// Remove every character that is not an ASCII digit.
///
/// Total function: empty input (or input with no digits at all) yields an
/// empty string. Non-ASCII digits (Arabic-Indic, full-width, ...) are dropped.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Same as [`normalize`], for values that may be absent.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Numeric values of each digit in an already-normalized string.
pub(crate) fn digit_values(clean: &str) -> Vec<u32> {
    clean.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// True when every digit is the same one ("00000000", "11111111111111").
pub(crate) fn is_repeated(clean: &str) -> bool {
    let mut chars = clean.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("01310-100", "01310100")]
    #[case("11.222.333/0001-81", "11222333000181")]
    #[case("abc", "")]
    #[case("", "")]
    #[case(" 1 2\t3\n", "123")]
    #[case("CEP 🏠 70040-010!", "70040010")]
    #[case("١٢٣٤", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["", "12.345-678", "x1y2z3", "00.000.000/0001-91", "—"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_opt_absent() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("9-9")), "99");
    }

    #[test]
    fn test_is_repeated() {
        assert!(is_repeated("11111111111111"));
        assert!(is_repeated("0"));
        assert!(!is_repeated("11222333000181"));
        assert!(!is_repeated(""));
    }
}
