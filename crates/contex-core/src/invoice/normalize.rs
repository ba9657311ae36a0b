//! Text normalization for invoice-style sections.
//!
//! Runs before every other invoice stage; repairs the artifacts OCR leaves
//! in scanned invoices.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Non-breaking and typographic unicode spaces.
    static ref UNICODE_SPACE: Regex =
        Regex::new(r"[\u{00A0}\u{2000}-\u{200B}\u{2028}\u{2029}]").unwrap();

    /// Em and en dashes.
    static ref UNICODE_DASH: Regex = Regex::new(r"[\u{2013}\u{2014}]").unwrap();

    /// Currency codes split by OCR ("U S D" -> "USD").
    static ref SPLIT_USD: Regex = Regex::new(r"(?i)\bU\s+S\s+D\b").unwrap();
    static ref SPLIT_EUR: Regex = Regex::new(r"(?i)\bE\s+U\s+R\b").unwrap();
    static ref SPLIT_GBP: Regex = Regex::new(r"(?i)\bG\s+B\s+P\b").unwrap();
    static ref SPLIT_CAD: Regex = Regex::new(r"(?i)\bC\s+A\s+D\b").unwrap();
    static ref SPLIT_INR: Regex = Regex::new(r"(?i)\bI\s+N\s+R\b").unwrap();

    /// Runs of spaces and tabs.
    static ref SPACE_RUN: Regex = Regex::new(r"[ \t]+").unwrap();
}

/// Normalize invoice text line by line, preserving line boundaries.
pub fn normalize_text(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let line = UNICODE_SPACE.replace_all(line, " ");
            let line = UNICODE_DASH.replace_all(&line, "-");
            let line = SPLIT_USD.replace_all(&line, "USD");
            let line = SPLIT_EUR.replace_all(&line, "EUR");
            let line = SPLIT_GBP.replace_all(&line, "GBP");
            let line = SPLIT_CAD.replace_all(&line, "CAD");
            let line = SPLIT_INR.replace_all(&line, "INR");
            let line = SPACE_RUN.replace_all(&line, " ");
            line.trim().to_string()
        })
        .collect();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_split_currency_codes() {
        let normalized = normalize_text("System Setup 1 5,000.00 U S D 5,000.00");
        assert!(normalized.contains("USD"));
        assert!(!normalized.contains("U S D"));
    }

    #[test]
    fn test_repairs_other_codes_case_insensitively() {
        assert_eq!(normalize_text("100 e u r"), "100 EUR");
        assert_eq!(normalize_text("100 G B P"), "100 GBP");
    }

    #[test]
    fn test_unicode_spaces_and_dashes() {
        let normalized = normalize_text("Total\u{00A0}Due \u{2014} 1,000");
        assert_eq!(normalized, "Total Due - 1,000");
    }

    #[test]
    fn test_preserves_line_boundaries() {
        let normalized = normalize_text("  a   b  \n  c  ");
        assert_eq!(normalized, "a b\nc");
    }
}
