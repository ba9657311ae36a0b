//! One-time agreement detection and not-applicable marking.
//!
//! A document representing a single invoice-like transaction has no
//! renewal/termination machinery; marking those fields "N/A" keeps the gap
//! analyzer from penalizing their absence.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{DocumentText, Evidence, EvidenceSource, ExtractedField, FieldValue, LineItem};

use super::patterns::{ONE_TIME_ITEM, ONE_TIME_LANGUAGE, ONE_TIME_TOTAL};
use super::totals::StageFields;

/// Fields that only make sense for recurring agreements.
const RECURRING_ONLY_FIELDS: &[&str] = &[
    "auto_renewal",
    "renewal_term",
    "notice_period",
    "termination_date",
    "billing_frequency",
];

/// Whether the document reads as a one-time transaction.
pub fn is_one_time(doc: &DocumentText, line_items: &[LineItem]) -> bool {
    if ONE_TIME_TOTAL.is_match(doc.text()) || ONE_TIME_LANGUAGE.is_match(doc.text()) {
        return true;
    }

    line_items
        .iter()
        .any(|item| ONE_TIME_ITEM.is_match(&item.description) && item.line_total > Decimal::ZERO)
}

/// Produce "N/A" markers for recurring-only fields when one-time indicators
/// are present. Markers are merged with fill-if-absent semantics, so fields
/// that were actually extracted keep their real values.
pub fn mark(doc: &DocumentText, line_items: &[LineItem]) -> StageFields {
    if !is_one_time(doc, line_items) {
        return StageFields::new();
    }

    let evidence = ONE_TIME_TOTAL
        .find(doc.text())
        .or_else(|| ONE_TIME_LANGUAGE.find(doc.text()))
        .map(|m| Evidence {
            page: doc.page_at(m.start()),
            snippet: doc.snippet_around(m.start(), m.end()),
            source: EvidenceSource::Rule,
        })
        .unwrap_or(Evidence {
            page: 1,
            snippet: "one-off line items present".to_string(),
            source: EvidenceSource::Rule,
        });

    debug!("one-time agreement detected, marking recurring-only fields N/A");

    RECURRING_ONLY_FIELDS
        .iter()
        .map(|name| {
            (
                name.to_string(),
                ExtractedField::new(
                    FieldValue::Text("N/A".to_string()),
                    0.95,
                    evidence.clone(),
                ),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> DocumentText {
        DocumentText::from_text(text)
    }

    fn item(description: &str, total: i64) -> LineItem {
        LineItem {
            description: description.to_string(),
            quantity: "1".into(),
            qty_unit: None,
            unit_price: Decimal::from(total),
            currency: "USD".into(),
            line_total: Decimal::from(total),
        }
    }

    #[test]
    fn test_explicit_language() {
        assert!(is_one_time(&doc("This is a one-time engagement."), &[]));
        assert!(is_one_time(&doc("Total Due (One-Time): 500.00 USD"), &[]));
        assert!(!is_one_time(&doc("renews annually"), &[]));
    }

    #[test]
    fn test_one_off_items_trigger_detection() {
        assert!(is_one_time(&doc(""), &[item("System Setup", 5000)]));
        assert!(is_one_time(&doc(""), &[item("Staff Training", 3000)]));
        assert!(!is_one_time(&doc(""), &[item("Hosting subscription", 100)]));
    }

    #[test]
    fn test_markers_cover_recurring_fields() {
        let fields = mark(&doc("Total Due (One-Time): 500.00 USD"), &[]);
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names.len(), 5);
        for name in RECURRING_ONLY_FIELDS {
            assert!(names.contains(name));
        }
        for (_, field) in &fields {
            assert!(field.value.is_not_applicable());
            assert!((field.confidence - 0.95).abs() < 1e-6);
        }
    }

    #[test]
    fn test_no_markers_for_recurring_contract() {
        assert!(mark(&doc("billed monthly with auto-renewal"), &[]).is_empty());
    }
}
