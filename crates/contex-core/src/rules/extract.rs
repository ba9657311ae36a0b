//! Single-rule field extraction over the full document text.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::trace;

use crate::models::{DocumentText, Evidence, EvidenceSource, ExtractedField, FieldValue};

use super::catalog::ExtractionRule;
use super::transforms::parse_money;

lazy_static! {
    /// The amount after "=" in "Annual Contract Value: $X + $Y = $Z".
    static ref ACV_EQUALS: Regex = Regex::new(r"=\s*\$?([\d,]+(?:\.\d{2})?)").unwrap();
}

/// Apply one rule to the document.
///
/// Alternatives are consulted in declaration order; the first match (in
/// document order) that produces a value wins and later alternatives are not
/// consulted. A match whose transform yields nothing is skipped so one
/// garbled occurrence does not erase a later clean one. No match is a normal
/// outcome, not an error.
pub fn extract_field(doc: &DocumentText, rule: &ExtractionRule) -> Option<ExtractedField> {
    for pattern in &rule.alternatives {
        for caps in pattern.captures_iter(doc.text()) {
            let full = caps.get(0).expect("capture 0 always present");
            let raw = caps.get(1).map(|g| g.as_str()).unwrap_or(full.as_str());

            let value = match rule.transform {
                Some(transform) => match transform.apply(raw) {
                    Some(value) => value,
                    None => continue,
                },
                None => FieldValue::Text(raw.to_string()),
            };

            let (value, mut confidence) = if rule.name == "contract_value" {
                // Inspect through the end of the line so trailing context
                // like "+ $Y = $Z" or a cadence word is visible.
                let line_end = doc.text()[full.end()..]
                    .find('\n')
                    .map(|i| full.end() + i)
                    .unwrap_or(doc.text().len());
                score_contract_value(&doc.text()[full.start()..line_end], value, rule.base_confidence)
            } else {
                (value, rule.base_confidence)
            };

            // Exact matches carry more signal than matches buried in context.
            if full.as_str().trim() == value.comparable() {
                confidence += 0.1;
            }

            trace!(rule = rule.name, confidence, "rule matched");

            return Some(ExtractedField::new(
                value,
                confidence.min(1.0),
                Evidence {
                    page: doc.page_at(full.start()),
                    snippet: doc.snippet_around(full.start(), full.end()),
                    source: EvidenceSource::Rule,
                },
            ));
        }
    }

    None
}

/// Contract-value confidence overrides.
///
/// "Annual Contract Value: $X + $Y = $Z" takes the post-equals amount;
/// monthly amounts are annualized (x12) at reduced confidence; explicit
/// annual/total context scores highest.
fn score_contract_value(matched: &str, value: FieldValue, base: f32) -> (FieldValue, f32) {
    let context = matched.to_lowercase();

    if context.contains("annual contract value") && context.contains('=') {
        if let Some(caps) = ACV_EQUALS.captures(matched) {
            if let Some(amount) = parse_money(&caps[1]) {
                return (FieldValue::Number(amount), 0.9);
            }
        }
    }

    if context.contains("monthly") {
        if let FieldValue::Number(amount) = value {
            return (FieldValue::Number(amount * Decimal::from(12)), 0.75);
        }
        return (value, 0.75);
    }

    if context.contains("annual") || context.contains("total") {
        (value, 0.9)
    } else {
        (value, base.max(0.85))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::rules::catalog::PatternCatalog;

    fn doc(text: &str) -> DocumentText {
        DocumentText::from_text(text)
    }

    fn extract(text: &str, name: &str) -> Option<ExtractedField> {
        let catalog = PatternCatalog::standard();
        extract_field(&doc(text), catalog.get(name).unwrap())
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(extract("nothing relevant here", "sla_uptime").is_none());
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        let catalog = PatternCatalog::standard();
        let text = "Effective Date: January 15, 2024\nUSD 99.9% uptime\nNet 30 days";
        for rule in catalog.rules() {
            if let Some(field) = extract_field(&doc(text), rule) {
                assert!((0.0..=1.0).contains(&field.confidence), "{}", rule.name);
            }
        }
    }

    #[test]
    fn test_first_alternative_wins() {
        // Both the labeled pattern (alt 1) and the bare "net N" pattern
        // (alt 2) are present; the labeled one is declared first.
        let field = extract(
            "Payment Terms: quarterly invoices\nNet 30 days",
            "payment_terms",
        )
        .unwrap();
        assert_eq!(
            field.value.as_text().unwrap().trim(),
            "quarterly invoices"
        );
    }

    #[test]
    fn test_date_rule_normalizes_to_iso() {
        let field = extract("Effective Date: January 15, 2024", "effective_date").unwrap();
        assert_eq!(field.value, FieldValue::Text("2024-01-15".into()));
        assert_eq!(field.evidence.source, EvidenceSource::Rule);
    }

    #[test]
    fn test_exact_match_boost() {
        // Bare "USD" matches its rule exactly after normalization.
        let field = extract("USD", "currency").unwrap();
        assert!((field.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_contract_value_total_context() {
        let field = extract("Total Contract Value: $50,000.00", "contract_value").unwrap();
        assert_eq!(
            field.value.as_number(),
            Some(Decimal::from_str("50000.00").unwrap())
        );
        assert!((field.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_contract_value_monthly_is_annualized() {
        let field = extract("Monthly Fee: $1,000.00", "contract_value").unwrap();
        assert_eq!(
            field.value.as_number(),
            Some(Decimal::from_str("12000.00").unwrap())
        );
        assert!((field.confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_contract_value_acv_equals_takes_final_amount() {
        let field = extract(
            "Annual Contract Value: $10,000 + $2,000 = $12,000.00",
            "contract_value",
        )
        .unwrap();
        assert_eq!(
            field.value.as_number(),
            Some(Decimal::from_str("12000.00").unwrap())
        );
    }

    #[test]
    fn test_evidence_snippet_bounded() {
        let text = format!("{} Effective Date: 01/15/2024 {}", "a".repeat(300), "b".repeat(300));
        let field = extract(&text, "effective_date").unwrap();
        assert!(field.evidence.snippet.chars().count() <= 200);
    }
}
