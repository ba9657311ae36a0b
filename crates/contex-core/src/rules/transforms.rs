//! Value transforms applied to raw rule matches.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::FieldValue;

/// Named transform attached to an extraction rule.
///
/// A closed enum dispatched by tag, so the rule catalog stays a plain data
/// table with no function injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Best-effort natural-language date to ISO 8601.
    NormalizeDate,
    /// Money string to a decimal amount.
    ParseMoney,
    /// Currency symbol/word to a 3-letter code.
    NormalizeCurrency,
    /// The rule matching at all means "true".
    Presence,
    /// Plain decimal number (SLA percentages).
    ParseFloat,
}

impl Transform {
    /// Apply the transform to the raw matched substring.
    ///
    /// `None` means the match could not be turned into a value; the caller
    /// keeps scanning for a usable match.
    pub fn apply(&self, raw: &str) -> Option<FieldValue> {
        match self {
            Transform::NormalizeDate => Some(FieldValue::Text(normalize_date(raw))),
            Transform::ParseMoney => parse_money(raw).map(FieldValue::Number),
            Transform::NormalizeCurrency => Some(FieldValue::Text(normalize_currency(raw))),
            Transform::Presence => Some(FieldValue::Bool(true)),
            Transform::ParseFloat => Decimal::from_str(raw.trim()).ok().map(FieldValue::Number),
        }
    }
}

/// Normalize a date string to ISO 8601, passing the input through unchanged
/// when it cannot be parsed.
pub fn normalize_date(raw: &str) -> String {
    match parse_date_loose(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

/// Best-effort parse of the date formats contracts actually use:
/// "January 15, 2024", "Jan 15 2024", "01/15/2024", "1-15-24", "2024-01-15",
/// "15 January 2024", and bare "March 2024" (first of the month).
pub fn parse_date_loose(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_date_input(raw);
    if cleaned.is_empty() {
        return None;
    }

    const FORMATS: &[&str] = &[
        "%B %d %Y",
        "%b %d %Y",
        "%m/%d/%Y",
        "%m/%d/%y",
        "%m-%d-%Y",
        "%m-%d-%y",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d %B %Y",
        "%d %b %Y",
    ];

    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }

    // Month-year only ("March 2024") resolves to the first of the month.
    let mut parts = cleaned.split_whitespace();
    if let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) {
        let with_day = format!("{} 1 {}", month, year);
        for format in ["%B %d %Y", "%b %d %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&with_day, format) {
                return Some(date);
            }
        }
    }

    None
}

/// Strip commas, ordinal suffixes ("15th") and extra whitespace before
/// format matching.
fn clean_date_input(raw: &str) -> String {
    let no_commas = raw.replace(',', " ");
    let mut out = String::with_capacity(no_commas.len());

    for token in no_commas.split_whitespace() {
        let token = token
            .strip_suffix("st")
            .or_else(|| token.strip_suffix("nd"))
            .or_else(|| token.strip_suffix("rd"))
            .or_else(|| token.strip_suffix("th"))
            .filter(|stem| stem.chars().all(|c| c.is_ascii_digit()) && !stem.is_empty())
            .unwrap_or(token);

        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }

    out
}

/// Parse a money string, stripping currency symbols, thousands separators
/// and spacing. Non-numeric input yields no value.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Map a currency symbol or word to its 3-letter code; unrecognized tokens
/// pass through uppercased.
pub fn normalize_currency(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "$" => "USD".to_string(),
        "€" => "EUR".to_string(),
        "£" => "GBP".to_string(),
        "₹" => "INR".to_string(),
        "¥" => "JPY".to_string(),
        "dollars" => "USD".to_string(),
        "euros" => "EUR".to_string(),
        "pounds" => "GBP".to_string(),
        "rupees" => "INR".to_string(),
        _ => raw.trim().to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_currency_table() {
        assert_eq!(normalize_currency("$"), "USD");
        assert_eq!(normalize_currency("€"), "EUR");
        assert_eq!(normalize_currency("£"), "GBP");
        assert_eq!(normalize_currency("₹"), "INR");
        assert_eq!(normalize_currency("¥"), "JPY");
        assert_eq!(normalize_currency("Dollars"), "USD");
        assert_eq!(normalize_currency("EUR"), "EUR");
        // Unrecognized tokens pass through uppercased.
        assert_eq!(normalize_currency("chf"), "CHF");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$1,000.50"), Decimal::from_str("1000.50").ok());
        assert_eq!(parse_money("€2,500"), Decimal::from_str("2500").ok());
        assert_eq!(parse_money("11,000.00"), Decimal::from_str("11000.00").ok());
        assert_eq!(parse_money("n/a"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn test_date_formats_normalize_to_iso() {
        assert_eq!(normalize_date("January 15, 2024"), "2024-01-15");
        assert_eq!(normalize_date("01/15/2024"), "2024-01-15");
        assert_eq!(normalize_date("Jan 15 2024"), "2024-01-15");
        assert_eq!(normalize_date("15 January 2024"), "2024-01-15");
        assert_eq!(normalize_date("2024-01-15"), "2024-01-15");
        assert_eq!(normalize_date("December 15, 2024"), "2024-12-15");
    }

    #[test]
    fn test_ordinal_day_and_month_year() {
        assert_eq!(normalize_date("15th January 2024"), "2024-01-15");
        assert_eq!(normalize_date("March, 2024"), "2024-03-01");
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        assert_eq!(normalize_date("upon signature"), "upon signature");
    }

    #[test]
    fn test_presence_transform() {
        assert_eq!(
            Transform::Presence.apply("auto-renewal"),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn test_float_transform() {
        assert_eq!(
            Transform::ParseFloat.apply("99.9"),
            Some(FieldValue::Number(Decimal::from_str("99.9").unwrap()))
        );
        assert_eq!(Transform::ParseFloat.apply("always"), None);
    }
}
