//! Line-item extraction from invoice-style tables.
//!
//! Three competing strategies: single-line rows after a detected header,
//! multi-line rows (one field per line) after a detected header, and a
//! headerless scan over the whole document. Candidate rows are
//! cross-validated against `quantity x unit_price ~= line_total`.

use std::str::FromStr;

use regex::Captures;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::{DocumentText, Evidence, EvidenceSource, LineItem};

use super::patterns::{
    money_parts, FALLBACK_ROWS, HEADER_WORD, MONEY, ROW_AMOUNT, ROW_CURRENCY, ROW_NON_DESC,
    ROW_QTY, SINGLE_LINE_ROWS, TABLE_HEADERS,
};

/// Validated line items plus the evidence for where they came from.
#[derive(Debug)]
pub struct LineItemExtraction {
    pub items: Vec<LineItem>,
    pub evidence: Evidence,
}

/// Tolerance for the single-line and headerless parsers.
fn loose_tolerance() -> Decimal {
    Decimal::new(5, 2)
}

/// Tolerance for the multi-line parser. Deliberately stricter than the
/// single-line tolerance; both values are preserved as-is for compatibility.
fn strict_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Extract and validate line items from the normalized document.
pub fn extract(
    doc: &DocumentText,
    scan_window: usize,
) -> Result<Option<LineItemExtraction>, ExtractionError> {
    let header = TABLE_HEADERS.iter().find_map(|p| p.find(doc.text()));

    let (candidates, evidence) = match header {
        Some(header) => {
            let section = doc.window(header.end(), scan_window);

            let mut items = parse_single_line_rows(section);
            if items.is_empty() {
                items = parse_multi_line_rows(section);
            }

            let snippet: String = section
                .chars()
                .take(200)
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect();

            (
                items,
                Evidence {
                    page: doc.page_at(header.start()),
                    snippet: snippet.trim().to_string(),
                    source: EvidenceSource::Rule,
                },
            )
        }
        None => {
            debug!("no table header found, trying headerless row scan");
            (
                parse_fallback_rows(doc.text()),
                Evidence {
                    page: 1,
                    snippet: "line items extracted without headers".to_string(),
                    source: EvidenceSource::Rule,
                },
            )
        }
    };

    let items = validate_items(candidates);
    if items.is_empty() {
        Ok(None)
    } else {
        debug!(count = items.len(), "extracted line items");
        Ok(Some(LineItemExtraction { items, evidence }))
    }
}

/// Rows with every field on one line, scanned over the first 20 lines after
/// the header.
fn parse_single_line_rows(section: &str) -> Vec<LineItem> {
    let mut items = Vec::new();

    for line in section.lines().take(20) {
        let line = line.trim();
        if line.len() < 10 {
            continue;
        }

        for pattern in SINGLE_LINE_ROWS.iter() {
            if let Some(caps) = pattern.captures(line) {
                if let Some(item) = row_from_captures(&caps, line, loose_tolerance()) {
                    items.push(item);
                    break;
                }
            }
        }
    }

    items
}

/// Rows spread across five consecutive lines:
/// description / quantity / unit price / currency / total.
fn parse_multi_line_rows(section: &str) -> Vec<LineItem> {
    let lines: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut items = Vec::new();
    let mut i = 0;

    while i + 4 < lines.len() {
        let candidate = lines[i];
        let lower = candidate.to_lowercase();

        let looks_like_description = !ROW_NON_DESC.is_match(candidate)
            && candidate.len() > 5
            && !lower.contains("total due")
            && !lower.contains("payment")
            && !lower.contains("terms");

        if looks_like_description {
            if let Some(item) = multi_line_sequence(&lines, i) {
                items.push(item);
                i += 5;
                continue;
            }
        }

        i += 1;
    }

    items
}

/// Try to read one multi-line row starting at `start`.
fn multi_line_sequence(lines: &[&str], start: usize) -> Option<LineItem> {
    let qty_caps = ROW_QTY.captures(lines[start + 1])?;
    let price_line = lines[start + 2];
    let currency_line = lines[start + 3];
    let total_line = lines[start + 4];

    if !ROW_AMOUNT.is_match(price_line)
        || !ROW_CURRENCY.is_match(currency_line)
        || !ROW_AMOUNT.is_match(total_line)
    {
        return None;
    }

    let quantity = qty_caps.get(1)?.as_str().to_string();
    let qty_unit = qty_caps.get(2).map(|m| m.as_str().to_string());
    let unit_price = parse_amount(price_line)?;
    let line_total = parse_amount(total_line)?;

    let qty = Decimal::from_str(&quantity).ok()?;
    if !within_tolerance(qty, unit_price, line_total, strict_tolerance()) {
        return None;
    }

    Some(LineItem {
        description: lines[start].to_string(),
        quantity,
        qty_unit,
        unit_price,
        currency: currency_line.to_string(),
        line_total,
    })
}

/// Headerless scan over every line of the document.
fn parse_fallback_rows(text: &str) -> Vec<LineItem> {
    let mut items = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.len() < 10 {
            continue;
        }

        for pattern in FALLBACK_ROWS.iter() {
            if let Some(caps) = pattern.captures(line) {
                if let Some(item) = row_from_captures(&caps, line, loose_tolerance()) {
                    items.push(item);
                    break;
                }
            }
        }
    }

    items
}

/// Build a line item from a row match, resolving multiplier quantities,
/// missing currencies, and the quantity/price/total consistency check.
fn row_from_captures(caps: &Captures<'_>, line: &str, tolerance: Decimal) -> Option<LineItem> {
    let description = caps.name("desc")?.as_str().trim().to_string();

    // Header rows look like items to the looser patterns.
    if HEADER_WORD.is_match(&description) {
        return None;
    }

    let qty_raw = caps.name("qty")?.as_str();
    let mut price_raw = caps.name("price").map(|m| m.as_str().to_string());

    // "2×$1,500" style quantities embed the unit price.
    let (quantity, qty_unit) = if qty_raw.contains('×') {
        let mut parts = qty_raw.splitn(2, '×');
        let quantity = parts.next().unwrap_or("").trim().to_string();
        let embedded = parts.next().unwrap_or("").trim();
        if let Some(stripped) = embedded.strip_prefix('$') {
            price_raw = Some(stripped.to_string());
        }
        (quantity, None)
    } else {
        let mut parts = qty_raw.split_whitespace();
        let quantity = parts.next().unwrap_or(qty_raw).to_string();
        let unit: Vec<&str> = parts.collect();
        let qty_unit = if unit.is_empty() {
            None
        } else {
            Some(unit.join(" "))
        };
        (quantity, qty_unit)
    };

    let unit_price = parse_amount(&price_raw?)?;
    let line_total = parse_amount(caps.name("total")?.as_str())?;

    let currency = match caps.name("cur") {
        Some(cur) => cur.as_str().to_string(),
        None => MONEY
            .captures(line)
            .and_then(|c| money_parts(&c))
            .map(|(code, _)| code)
            .unwrap_or_else(|| "USD".to_string()),
    };

    // Validate qty x price against the stated total when the quantity is
    // numeric; non-numeric quantities are kept as-is.
    let numeric: String = quantity
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if let Ok(qty) = Decimal::from_str(&numeric) {
        if !within_tolerance(qty, unit_price, line_total, tolerance) {
            debug!(
                description,
                %qty,
                %unit_price,
                %line_total,
                "line item failed consistency check"
            );
            return None;
        }
    }

    Some(LineItem {
        description,
        quantity,
        qty_unit,
        unit_price,
        currency,
        line_total,
    })
}

/// Range sanity over the candidate set.
fn validate_items(items: Vec<LineItem>) -> Vec<LineItem> {
    let max_unit_price = Decimal::from(1_000_000);
    let max_line_total = Decimal::from(10_000_000);
    let max_quantity = Decimal::from(10_000);

    items
        .into_iter()
        .filter(|item| {
            if item.description.trim().len() < 3 {
                return false;
            }
            if item.unit_price < Decimal::ZERO || item.unit_price > max_unit_price {
                return false;
            }
            if item.line_total < Decimal::ZERO || item.line_total > max_line_total {
                return false;
            }
            if let Ok(qty) = Decimal::from_str(&item.quantity) {
                if qty < Decimal::ZERO || qty > max_quantity {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Relative divergence between the stated total and qty x unit_price.
fn within_tolerance(qty: Decimal, unit_price: Decimal, total: Decimal, tolerance: Decimal) -> bool {
    let expected = qty * unit_price;
    let denom = expected.max(total);
    if denom.is_zero() {
        return true;
    }
    ((total - expected).abs() / denom) <= tolerance
}

/// Comma-separated amount to Decimal.
fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn doc(text: &str) -> DocumentText {
        DocumentText::from_text(text)
    }

    fn items(text: &str) -> Vec<LineItem> {
        extract(&doc(text), 1500)
            .unwrap()
            .map(|e| e.items)
            .unwrap_or_default()
    }

    const TABLE: &str = "Description Quantity Unit Price Currency Total\n\
        System Setup 1 5,000.00 USD 5,000.00\n\
        Data Migration 1 3,000.00 USD 3,000.00\n\
        Staff Training 2×$1,500 USD 3,000.00\n";

    #[test]
    fn test_single_line_table() {
        let items = items(TABLE);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].description, "System Setup");
        assert_eq!(items[0].quantity, "1");
        assert_eq!(items[0].unit_price, Decimal::from_str("5000.00").unwrap());
        assert_eq!(items[0].currency, "USD");

        // Multiplier row: embedded unit price.
        assert_eq!(items[2].quantity, "2");
        assert_eq!(items[2].unit_price, Decimal::from_str("1500").unwrap());
        assert_eq!(items[2].line_total, Decimal::from_str("3000.00").unwrap());
    }

    #[test]
    fn test_multi_line_table() {
        let text = "Item Qty Price Total\n\
            Consulting Services\n3\n1,000.00\nUSD\n3,000.00\n";
        let items = items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Consulting Services");
        assert_eq!(items[0].quantity, "3");
        assert_eq!(items[0].currency, "USD");
    }

    #[test]
    fn test_headerless_fallback() {
        let text = "Some preamble about the engagement.\n\
            Implementation Work 2 500.00 USD 1,000.00\n";
        let items = items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Implementation Work");
    }

    #[test]
    fn test_divergent_row_rejected() {
        // 2 x 100 = 200 vs stated 150: 33%+ divergence must not survive.
        let text = "Item Qty Price Total\nBroken Widget Row 2 100.00 USD 150.00\n";
        assert!(items(text).is_empty());
    }

    #[test]
    fn test_small_rounding_divergence_allowed() {
        // 3 x 33.33 = 99.99 vs stated 100.00, well within 5%.
        let text = "Item Qty Price Total\nHourly Support Block 3 33.33 USD 100.00\n";
        assert_eq!(items(text).len(), 1);
    }

    #[test]
    fn test_range_validation() {
        // unit price above 1,000,000 is discarded.
        let text = "Item Qty Price Total\nEnormous Thing 1 2,000,000.00 USD 2,000,000.00\n";
        assert!(items(text).is_empty());
    }

    #[test]
    fn test_header_echo_not_an_item() {
        let text = "Description Quantity Unit Price Currency Total\n\
            Description 1 100.00 USD 100.00\n";
        assert!(items(text).is_empty());
    }

    #[test]
    fn test_missing_currency_defaults_to_usd() {
        let text = "Item Qty Price Total\nRouter Install 2 100.00 200.00\n";
        let items = items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].currency, "USD");
    }

    #[test]
    fn test_evidence_points_at_table() {
        let extraction = extract(&doc(TABLE), 1500).unwrap().unwrap();
        assert_eq!(extraction.evidence.page, 1);
        assert!(extraction.evidence.snippet.contains("System Setup"));
    }
}
