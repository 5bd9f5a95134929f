// 🔤 Scan Normalizer - raw scanner text → canonical token
//
// Three passes, in order:
//   1. strip the asset-tag URL prefix (once, only at the start)
//   2. trim surrounding whitespace
//   3. keep ASCII letters/digits only, uppercased

use serde::{Deserialize, Serialize};

/// Prefix printed on QR asset tags in front of the equipment number
pub const URL_PREFIX: &str = "https://eqin.centix.com/object/249bq-g0X/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// Untouched input as scanned/typed
    pub raw: String,

    /// Canonical token (uppercase A-Z / 0-9 only, possibly empty)
    pub normalized: String,
}

/// Normalize a scanned value. Never fails; empty input yields an empty token.
pub fn normalize(input: &str) -> NormalizationResult {
    let value = input.strip_prefix(URL_PREFIX).unwrap_or(input);

    NormalizationResult {
        raw: input.to_string(),
        normalized: strip_and_upper(value.trim()),
    }
}

/// Drop every non-alphanumeric ASCII character and uppercase the rest.
///
/// This is pass 3 of [`normalize`] on its own, without the URL-prefix step.
/// Roster identifiers are compared in this form by the matcher.
pub fn strip_and_upper(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_is_uppercased() {
        let result = normalize("idt0001234");
        assert_eq!(result.raw, "idt0001234");
        assert_eq!(result.normalized, "IDT0001234");
    }

    #[test]
    fn test_url_prefix_is_removed() {
        let result = normalize("https://eqin.centix.com/object/249bq-g0X/xy-99");
        assert_eq!(result.normalized, "XY99");
        assert_eq!(result.raw, "https://eqin.centix.com/object/249bq-g0X/xy-99");
    }

    #[test]
    fn test_url_prefix_only_at_start() {
        // Leading whitespace means the prefix is not at position 0
        let result = normalize(" https://eqin.centix.com/object/249bq-g0X/AB1");
        assert_eq!(result.normalized, "HTTPSEQINCENTIXCOMOBJECT249BQG0XAB1");
    }

    #[test]
    fn test_punctuation_and_whitespace_dropped() {
        assert_eq!(normalize("  ab-12 / c.d_3\t").normalized, "AB12CD3");
    }

    #[test]
    fn test_non_ascii_letters_dropped() {
        assert_eq!(normalize("café-1").normalized, "CAF1");
    }

    #[test]
    fn test_empty_input() {
        let result = normalize("");
        assert_eq!(result.raw, "");
        assert_eq!(result.normalized, "");
        assert_eq!(normalize("   ").normalized, "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "IDT-000 1234",
            "https://eqin.centix.com/object/249bq-g0X/xy-99",
            "  lower case  ",
            "ÄÖÜ-42",
            "",
            "!!!",
        ];

        for input in inputs {
            let once = normalize(input);
            let twice = normalize(&once.normalized);
            assert_eq!(twice.normalized, once.normalized, "input: {:?}", input);
        }
    }

    #[test]
    fn test_output_alphabet() {
        let inputs = ["a-b-c", "ß∂ƒ 12 ;;", "\u{1F600}x9", "MiXeD_case-07"];

        for input in inputs {
            let token = normalize(input).normalized;
            assert!(
                token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "unexpected character in {:?}",
                token
            );
        }
    }

    #[test]
    fn test_strip_and_upper_ignores_url_prefix() {
        let stripped = strip_and_upper(URL_PREFIX);
        assert_eq!(stripped, "HTTPSEQINCENTIXCOMOBJECT249BQG0X");
    }
}
