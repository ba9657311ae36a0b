//! Shared regex patterns for the invoice subsystem.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Money amount in either symbol-prefixed ("$1,234.56") or
    /// code-suffixed ("1,234.56 USD") form.
    ///
    /// Groups: 1 = prefix symbol, 2 = prefix amount, 3 = suffix amount,
    /// 4 = suffix currency code.
    pub static ref MONEY: Regex = Regex::new(
        r"(?:([$€£₹¥])\s?(\d{1,3}(?:[, \u{00A0}]\d{3})*(?:\.\d{1,2})?)|(\d{1,3}(?:[, \u{00A0}]\d{3})*(?:\.\d{1,2})?)\s?(USD|EUR|GBP|INR|CAD))"
    ).unwrap();

    /// Table header variants, in detection order.
    pub static ref TABLE_HEADERS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:description|item)\s+(?:qty|quantity)\s+(?:unit\s+price|price)\s+(?:currency)?\s*(?:total|amount)").unwrap(),
        Regex::new(r"(?i)description\s+quantity\s+unit\s+price\s+currency\s+total").unwrap(),
        Regex::new(r"(?i)item\s+qty\s+price\s+total").unwrap(),
    ];

    /// Single-line row variants, tried in order against each trimmed line.
    pub static ref SINGLE_LINE_ROWS: Vec<Regex> = vec![
        // "System Setup 1 5,000.00 USD 5,000.00"
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50}?)\s+(?P<qty>\d+(?:\s*×\s*)?(?:\d+)?)\s+(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<cur>[A-Z]{3})\s+(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
        // "Staff Training 2×$1,500 USD 3,000.00"
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50}?)\s+(?P<qty>\d+)×\$(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<cur>[A-Z]{3})\s+(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
        // Description | Qty | Unit Price | Currency | Total
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50}?)\s+(?P<qty>\d+(?:\s+\w+)?)\s+(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<cur>[A-Z]{3})?\s*(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
        // Description | Qty | Price | Total (no explicit currency)
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50}?)\s+(?P<qty>\d+(?:\s+\w+)?)\s+(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
        // Rows with currency symbols
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50}?)\s+(?P<qty>\d+(?:\s+\w+)?)\s+[$€£₹]?(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s*(?P<cur>[A-Z]{3})?\s*[$€£₹]?(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
    ];

    /// Headerless fallback row variants.
    pub static ref FALLBACK_ROWS: Vec<Regex> = vec![
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50})\s+(?P<qty>\d+)\s+(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<cur>[A-Z]{3})\s+(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
        Regex::new(r"^(?P<desc>[A-Za-z][\w\s&(),.-]{3,50})\s+(?P<qty>\d+)×\$(?P<price>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s+(?P<cur>[A-Z]{3})\s+(?P<total>\d{1,3}(?:,\d{3})*(?:\.\d{2})?)$").unwrap(),
    ];

    /// Multi-line row field validators (one field per line).
    pub static ref ROW_QTY: Regex = Regex::new(r"^(\d+)(?:\s+(\w+))?$").unwrap();
    pub static ref ROW_AMOUNT: Regex = Regex::new(r"^\d{1,3}(?:,\d{3})*(?:\.\d{2})?$").unwrap();
    pub static ref ROW_CURRENCY: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    /// A line that cannot start a multi-line row.
    pub static ref ROW_NON_DESC: Regex = Regex::new(r"^(\d+|USD|EUR|GBP|[$€£])").unwrap();

    /// Explicit total keywords, in priority order, with the confidence each
    /// carries. The bare "total" form uses a word boundary so "subtotal"
    /// never matches it.
    pub static ref EXPLICIT_TOTALS: Vec<(Regex, f32)> = vec![
        (Regex::new(r"(?i)total\s+due\s*(?:\([^)]+\))?\s*:").unwrap(), 0.95),
        (Regex::new(r"(?i)amount\s+due\s*:").unwrap(), 0.9),
        (Regex::new(r"(?i)grand\s*total\s*:").unwrap(), 0.9),
        (Regex::new(r"(?i)\btotal\s*:").unwrap(), 0.85),
    ];

    pub static ref CONTRACT_VALUE_KW: Regex = Regex::new(r"(?i)contract\s+value\s*:").unwrap();
    pub static ref SUBTOTAL_KW: Regex = Regex::new(r"(?i)subtotal\s*:").unwrap();

    /// "Net N days" wordings with decreasing confidence.
    pub static ref NET_TERMS: Vec<(Regex, f32)> = vec![
        (Regex::new(r"(?i)payment\s+due\s*:\s*net\s+(\d+)\s+days?").unwrap(), 0.9),
        (Regex::new(r"(?i)net\s+(\d+)\s+days?\s+from\s+invoice").unwrap(), 0.9),
        (Regex::new(r"(?i)net\s+(\d+)").unwrap(), 0.8),
    ];

    /// Late-fee percentage per month.
    pub static ref LATE_FEE_RATE: Vec<(Regex, f32)> = vec![
        (Regex::new(r"(?i)late\s+fee\s*:\s*(\d+(?:\.\d+)?)\s*%\s*per\s+month").unwrap(), 0.9),
        (Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*%\s*per\s+month\s+(?:on\s+)?(?:overdue|late)").unwrap(), 0.85),
    ];

    /// Flat late-fee amount.
    pub static ref LATE_FEE_AMOUNT: Regex =
        Regex::new(r"(?i)late\s+fee\s*:\s*\$?(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)").unwrap();

    /// "Payment Method: ..." line.
    pub static ref PAYMENT_METHOD_LINE: Regex =
        Regex::new(r"(?i)payment\s+method\s*:\s*([^.\n]+)").unwrap();

    /// One-time agreement indicators.
    pub static ref ONE_TIME_LANGUAGE: Regex = Regex::new(r"(?i)\bone[-\s]?time\b").unwrap();
    pub static ref ONE_TIME_TOTAL: Regex =
        Regex::new(r"(?i)total\s+due\s*\(\s*one[-\s]?time\s*\)").unwrap();
    /// Line-item descriptions typical of one-off engagements.
    pub static ref ONE_TIME_ITEM: Regex = Regex::new(r"(?i)\b(setup|migration|training)\b").unwrap();

    /// Header words that disqualify a row description.
    pub static ref HEADER_WORD: Regex =
        Regex::new(r"(?i)\b(description|qty|quantity|price|total|currency)\b").unwrap();
}

/// Currency symbol/code token from a `MONEY` match to a 3-letter code, plus
/// the amount string.
pub fn money_parts<'t>(caps: &regex::Captures<'t>) -> Option<(String, &'t str)> {
    if let (Some(symbol), Some(amount)) = (caps.get(1), caps.get(2)) {
        return Some((symbol_to_code(symbol.as_str()), amount.as_str()));
    }
    if let (Some(amount), Some(code)) = (caps.get(3), caps.get(4)) {
        return Some((code.as_str().to_string(), amount.as_str()));
    }
    None
}

/// Map a currency symbol to its code; codes pass through.
pub fn symbol_to_code(token: &str) -> String {
    match token {
        "$" => "USD".to_string(),
        "€" => "EUR".to_string(),
        "£" => "GBP".to_string(),
        "₹" => "INR".to_string(),
        "¥" => "JPY".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_prefix_and_suffix_forms() {
        let caps = MONEY.captures("$1,234.56").unwrap();
        assert_eq!(money_parts(&caps), Some(("USD".to_string(), "1,234.56")));

        let caps = MONEY.captures("11,000.00 USD").unwrap();
        assert_eq!(money_parts(&caps), Some(("USD".to_string(), "11,000.00")));
    }

    #[test]
    fn test_bare_total_excludes_subtotal() {
        let (bare_total, _) = &EXPLICIT_TOTALS[3];
        assert!(bare_total.is_match("Total: 5,000.00 USD"));
        assert!(!bare_total.is_match("Subtotal: 5,000.00 USD"));
    }

    #[test]
    fn test_table_header_variants() {
        assert!(TABLE_HEADERS
            .iter()
            .any(|p| p.is_match("Description Qty Unit Price Currency Total")));
        assert!(TABLE_HEADERS.iter().any(|p| p.is_match("Item Qty Price Total")));
    }

    #[test]
    fn test_one_time_total_marker() {
        assert!(ONE_TIME_TOTAL.is_match("Total Due (One-Time): 11,000.00 USD"));
        assert!(!ONE_TIME_TOTAL.is_match("Total Due: 11,000.00 USD"));
    }
}
