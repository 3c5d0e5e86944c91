// 🔎 Extraction - Pull references and merchant names out of free text
// Bank notes bury the useful tokens inside boilerplate ("Payment to X",
// "(Ref: FT...)"); these helpers dig them out for the tier matchers.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REFERENCE EXTRACTION
// ============================================================================

// Two note layouts carry an embedded reference, checked in this order.
// "Ref:" is deliberately case-sensitive: lowercase "ref" shows up in
// ordinary prose ("see ref below") and must not be captured.
static PAREN_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(Ref:\s*([^)]+)\)").expect("Valid regex"));

static TRAILING_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*Ref:\s*(.+)$").expect("Valid regex"));

/// Extract an embedded reference token from a transaction note
///
/// Supported layouts, first match wins:
/// 1. "Bank transfer (Ref: FT123456789)"
/// 2. "GRAB RIDE | Ref: TXN-9987"
///
/// Returns the trimmed token, or an empty string when no reference is found.
pub fn extract_reference_from_note(note: &str) -> String {
    if let Some(caps) = PAREN_REFERENCE.captures(note) {
        if let Some(token) = caps.get(1) {
            return token.as_str().trim().to_string();
        }
    }

    if let Some(caps) = TRAILING_REFERENCE.captures(note) {
        if let Some(token) = caps.get(1) {
            return token.as_str().trim().to_string();
        }
    }

    String::new()
}

// ============================================================================
// MERCHANT NAME EXTRACTION
// ============================================================================

// Longer phrases first: "PAYMENT TO " must win over "PAYMENT ".
const MERCHANT_PREFIXES: [&str; 6] = [
    "PAYMENT TO ",
    "PURCHASE AT ",
    "PURCHASE FROM ",
    "PAYMENT FOR ",
    "PAYMENT ",
    "PURCHASE ",
];

const DOMAIN_SUFFIXES: [&str; 4] = [".COM", ".VN", ".NET", ".ORG"];

// Trailing city/branch markers that follow the merchant name in card
// descriptors ("STARBUCKS COFFEE HANOI", "CIRCLE K DISTRICT 1")
const LOCATION_WORDS: [&str; 12] = [
    "HANOI", "HCMC", "HCM", "SAIGON", "DANANG", "VIETNAM", "CITY", "DISTRICT",
    "BRANCH", "STORE", "OUTLET", "MALL",
];

/// Heuristically extract a merchant name from a transaction description
///
/// - Uppercase + trim
/// - Strip one leading payment phrase ("PAYMENT TO ", "PURCHASE AT ", ...)
/// - Strip one trailing domain suffix (.COM, .VN, ...)
/// - Keep up to 3 tokens, stopping at store numbers and location words
///
/// Example: "Payment to STARBUCKS COFFEE HANOI" → "STARBUCKS COFFEE"
pub fn extract_merchant_name(description: &str) -> String {
    let mut name = description.trim().to_uppercase();

    for prefix in MERCHANT_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest.to_string();
            break;
        }
    }

    for suffix in DOMAIN_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            name = rest.to_string();
            break;
        }
    }

    let tokens: Vec<&str> = name.split_whitespace().collect();

    let mut kept: Vec<&str> = Vec::new();
    for &token in &tokens {
        if kept.len() == 3 {
            break;
        }
        if is_numeric_token(token) || LOCATION_WORDS.contains(&token) {
            break;
        }
        kept.push(token);
    }

    if kept.is_empty() {
        // Descriptions like "7715 HANOI" still name the merchant better
        // than an empty string would
        return tokens.first().copied().unwrap_or("").to_string();
    }

    kept.join(" ")
}

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_in_parentheses() {
        assert_eq!(
            extract_reference_from_note("Bank transfer (Ref: FT123456789)"),
            "FT123456789"
        );
    }

    #[test]
    fn test_reference_after_pipe() {
        assert_eq!(
            extract_reference_from_note("GRAB RIDE | Ref: TXN-9987"),
            "TXN-9987"
        );
    }

    #[test]
    fn test_reference_parentheses_win_over_pipe() {
        assert_eq!(
            extract_reference_from_note("Transfer (Ref: AAA-1) | Ref: BBB-2"),
            "AAA-1"
        );
    }

    #[test]
    fn test_reference_is_trimmed() {
        assert_eq!(extract_reference_from_note("Wire (Ref:  FT55  )"), "FT55");
        assert_eq!(extract_reference_from_note("Wire | Ref:  FT55  "), "FT55");
    }

    #[test]
    fn test_reference_case_sensitive() {
        assert_eq!(extract_reference_from_note("Wire (ref: FT55)"), "");
        assert_eq!(extract_reference_from_note("Wire | REF: FT55"), "");
    }

    #[test]
    fn test_no_reference() {
        assert_eq!(extract_reference_from_note("Coffee shop purchase"), "");
        assert_eq!(extract_reference_from_note(""), "");
    }

    #[test]
    fn test_merchant_strips_payment_prefix() {
        assert_eq!(
            extract_merchant_name("Payment to STARBUCKS COFFEE"),
            "STARBUCKS COFFEE"
        );
        assert_eq!(extract_merchant_name("PAYMENT TO UBER"), "UBER");
        assert_eq!(extract_merchant_name("Purchase at Amazon.com"), "AMAZON");
    }

    #[test]
    fn test_merchant_strips_domain_suffix() {
        assert_eq!(extract_merchant_name("PURCHASE FROM GRAB.VN"), "GRAB");
        assert_eq!(extract_merchant_name("NETFLIX.COM"), "NETFLIX");
    }

    #[test]
    fn test_merchant_stops_at_location_word() {
        assert_eq!(
            extract_merchant_name("PAYMENT TO STARBUCKS COFFEE HANOI"),
            "STARBUCKS COFFEE"
        );
        assert_eq!(extract_merchant_name("CIRCLE K DISTRICT 1"), "CIRCLE K");
    }

    #[test]
    fn test_merchant_stops_at_numeric_token() {
        assert_eq!(extract_merchant_name("STARBUCKS 12345 HCMC"), "STARBUCKS");
    }

    #[test]
    fn test_merchant_keeps_store_number_tokens() {
        // "#12345" is not purely numeric, so it stays
        assert_eq!(
            extract_merchant_name("PAYMENT TO STARBUCKS #12345"),
            "STARBUCKS #12345"
        );
    }

    #[test]
    fn test_merchant_caps_at_three_tokens() {
        assert_eq!(
            extract_merchant_name("ACME GLOBAL TRADING COMPANY LTD"),
            "ACME GLOBAL TRADING"
        );
    }

    #[test]
    fn test_merchant_falls_back_to_first_token() {
        assert_eq!(extract_merchant_name("7715 HANOI"), "7715");
        assert_eq!(extract_merchant_name("HANOI COFFEE HOUSE"), "HANOI");
    }

    #[test]
    fn test_merchant_empty_description() {
        assert_eq!(extract_merchant_name(""), "");
        assert_eq!(extract_merchant_name("   "), "");
    }
}
