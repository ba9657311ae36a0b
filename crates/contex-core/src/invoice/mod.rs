//! The invoice subsystem: a sequence of Result-returning stages over
//! normalized text, merged into the standard field map with an explicit
//! precedence order.

pub mod line_items;
pub mod normalize;
pub mod one_time;
pub mod patterns;
pub mod payment;
pub mod totals;

use tracing::warn;

use crate::models::config::ExtractionConfig;
use crate::models::{
    DocumentText, Evidence, EvidenceSource, ExtractedField, FieldMap, FieldValue, LineItem, Page,
};
use crate::rules::PatternCatalog;

pub use normalize::normalize_text;
pub use totals::StageFields;

/// Invoice-specific field names that belong to the core schema; everything
/// else the subsystem produces is folded into `additional_fields`.
const CORE_INVOICE_FIELDS: &[&str] = &[
    "line_items",
    "total_amount",
    "total_amount_currency",
    "total_due_amount",
    "total_due_currency",
    "payment_net_days",
    "payment_methods",
    "late_fee_percentage",
    "late_fee_amount",
    "late_fee_cadence",
];

/// Multi-stage extractor for invoice-style content.
pub struct InvoiceExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> InvoiceExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Run all stages over the pages.
    ///
    /// A failing stage is logged and contributes nothing; sibling stages
    /// still run, so the result degrades to fewer fields rather than
    /// aborting the document.
    pub fn extract(&self, pages: &[Page]) -> FieldMap {
        let normalized: Vec<Page> = pages
            .iter()
            .map(|p| Page {
                number: p.number,
                text: normalize_text(&p.text),
            })
            .collect();
        let doc = DocumentText::from_pages(&normalized);

        let mut fields = FieldMap::new();

        let extraction = match line_items::extract(&doc, self.config.table_scan_window) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(stage = "line_items", error = %e, "invoice stage failed");
                None
            }
        };
        if let Some(extraction) = &extraction {
            fields.insert(
                "line_items".to_string(),
                ExtractedField::new(
                    FieldValue::Items(extraction.items.clone()),
                    0.9,
                    extraction.evidence.clone(),
                ),
            );
        }
        let items: &[LineItem] = extraction
            .as_ref()
            .map(|e| e.items.as_slice())
            .unwrap_or(&[]);

        match totals::extract(&doc, self.config.money_window, items) {
            Ok(stage) => fields.extend(stage),
            Err(e) => warn!(stage = "totals", error = %e, "invoice stage failed"),
        }

        match payment::extract_terms(&doc) {
            Ok(stage) => fields.extend(stage),
            Err(e) => warn!(stage = "payment_terms", error = %e, "invoice stage failed"),
        }

        match payment::extract_methods(&doc) {
            Ok(stage) => fields.extend(stage),
            Err(e) => warn!(stage = "payment_methods", error = %e, "invoice stage failed"),
        }

        for (name, field) in one_time::mark(&doc, items) {
            fields.entry(name).or_insert(field);
        }

        fields
    }
}

/// Merge invoice fields into the standard field map.
///
/// Precedence, in order:
/// 1. `total_due_amount`/`total_due_currency` always win;
/// 2. every other core-schema field (including `contract_value` and
///    `currency`) fills only when standard extraction left it absent;
/// 3. names outside the core schema fold into one `additional_fields` map
///    entry at confidence 0.8.
pub fn merge_into(standard: &mut FieldMap, invoice: FieldMap, catalog: &PatternCatalog) {
    let mut additional = std::collections::BTreeMap::new();
    let mut additional_page = 1;

    for (name, field) in invoice {
        if name == "total_due_amount" || name == "total_due_currency" {
            standard.insert(name, field);
        } else if catalog.contains(&name) || CORE_INVOICE_FIELDS.contains(&name.as_str()) {
            standard.entry(name).or_insert(field);
        } else {
            additional_page = field.evidence.page;
            additional.insert(name, field.value);
        }
    }

    if !additional.is_empty() {
        standard.insert(
            "additional_fields".to_string(),
            ExtractedField::new(
                FieldValue::Map(additional),
                0.8,
                Evidence {
                    page: additional_page,
                    snippet: "supplementary invoice fields".to_string(),
                    source: EvidenceSource::Rule,
                },
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn field(value: FieldValue, confidence: f32) -> ExtractedField {
        ExtractedField::new(
            value,
            confidence,
            Evidence {
                page: 1,
                snippet: String::new(),
                source: EvidenceSource::Rule,
            },
        )
    }

    #[test]
    fn test_merge_fills_absent_contract_value_only() {
        let catalog = PatternCatalog::standard();

        let mut standard = FieldMap::new();
        standard.insert(
            "contract_value".to_string(),
            field(FieldValue::Number(Decimal::from(50_000)), 0.9),
        );

        let mut invoice = FieldMap::new();
        invoice.insert(
            "contract_value".to_string(),
            field(FieldValue::Number(Decimal::from(11_000)), 0.9),
        );
        invoice.insert(
            "currency".to_string(),
            field(FieldValue::Text("USD".into()), 0.9),
        );

        merge_into(&mut standard, invoice, &catalog);

        // Standard extraction keeps its contract value; the absent currency
        // is filled.
        assert_eq!(
            standard["contract_value"].value.as_number(),
            Some(Decimal::from(50_000))
        );
        assert_eq!(standard["currency"].value.as_text(), Some("USD"));
    }

    #[test]
    fn test_merge_total_due_always_overrides() {
        let catalog = PatternCatalog::standard();

        let mut standard = FieldMap::new();
        standard.insert(
            "total_due_amount".to_string(),
            field(FieldValue::Number(Decimal::from(1)), 0.5),
        );

        let mut invoice = FieldMap::new();
        invoice.insert(
            "total_due_amount".to_string(),
            field(FieldValue::Number(Decimal::from(11_000)), 0.95),
        );

        merge_into(&mut standard, invoice, &catalog);

        assert_eq!(
            standard["total_due_amount"].value.as_number(),
            Some(Decimal::from(11_000))
        );
    }

    #[test]
    fn test_merge_folds_unknown_names() {
        let catalog = PatternCatalog::standard();
        let mut standard = FieldMap::new();

        let mut invoice = FieldMap::new();
        invoice.insert(
            "subtotal".to_string(),
            field(FieldValue::Number(Decimal::from(4_000)), 0.8),
        );
        invoice.insert(
            "payment_due_terms".to_string(),
            field(FieldValue::Text("Net 15 days".into()), 0.9),
        );

        merge_into(&mut standard, invoice, &catalog);

        assert!(!standard.contains_key("subtotal"));
        let folded = &standard["additional_fields"];
        assert!((folded.confidence - 0.8).abs() < 1e-6);
        match &folded.value {
            FieldValue::Map(map) => {
                assert_eq!(map.len(), 2);
                assert!(map.contains_key("subtotal"));
                assert!(map.contains_key("payment_due_terms"));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_extractor_runs_all_stages() {
        let config = ExtractionConfig::default();
        let extractor = InvoiceExtractor::new(&config);

        let pages = vec![Page {
            number: 1,
            text: "Description Quantity Unit Price Currency Total\n\
                System Setup 1 5,000.00 U S D 5,000.00\n\
                Total Due (One-Time): 5,000.00 USD\n\
                Payment Due: Net 15 days\n\
                Payment Method: Wire Transfer\n"
                .to_string(),
        }];

        let fields = extractor.extract(&pages);

        assert!(fields.contains_key("line_items"));
        assert!(fields.contains_key("total_amount"));
        assert!(fields.contains_key("payment_net_days"));
        assert!(fields.contains_key("payment_methods"));
        // One-time markers fill the recurring-only fields.
        assert!(fields["auto_renewal"].value.is_not_applicable());
        // The OCR-split currency code was repaired before row parsing.
        match &fields["line_items"].value {
            FieldValue::Items(items) => assert_eq!(items[0].currency, "USD"),
            other => panic!("expected items, got {:?}", other),
        }
    }
}
