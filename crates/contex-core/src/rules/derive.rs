//! Derivation of fields from other already-extracted fields.

use chrono::Months;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::{Evidence, EvidenceSource, ExtractedField, FieldMap, FieldValue};

use super::transforms::parse_date_loose;

lazy_static! {
    /// Integer + unit inside a contract-term phrase ("12 months", "2-year").
    static ref TERM_SPAN: Regex = Regex::new(r"(?i)(\d+)[-\s]*(month|year)s?").unwrap();
}

/// Derive `termination_date` from `effective_date` + `contract_term`.
///
/// Runs once per document and only when termination_date was not extracted
/// directly. Uses calendar-correct month arithmetic. Any parse failure means
/// no field is produced; derivation never errors.
pub fn derive_termination_date(fields: &FieldMap) -> Option<ExtractedField> {
    if fields.contains_key("termination_date") {
        return None;
    }

    let effective = fields.get("effective_date")?;
    let term = fields.get("contract_term")?;

    let effective_text = effective.value.as_text()?;
    let term_text = term.value.as_text()?;

    let caps = TERM_SPAN.captures(term_text)?;
    let count: u32 = caps[1].parse().ok()?;
    let months = if caps[2].eq_ignore_ascii_case("year") {
        count.checked_mul(12)?
    } else {
        count
    };

    let start = parse_date_loose(effective_text)?;
    let end = start.checked_add_months(Months::new(months))?;

    debug!(
        effective = effective_text,
        term = term_text,
        derived = %end,
        "derived termination date"
    );

    Some(ExtractedField::new(
        FieldValue::Text(end.format("%Y-%m-%d").to_string()),
        0.75,
        Evidence {
            page: effective.evidence.page,
            snippet: format!(
                "Derived from effective date {} + contract term {}",
                effective_text, term_text
            ),
            source: EvidenceSource::Derived,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_with(effective: &str, term: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        let evidence = Evidence {
            page: 2,
            snippet: String::new(),
            source: EvidenceSource::Rule,
        };
        fields.insert(
            "effective_date".into(),
            ExtractedField::new(FieldValue::Text(effective.into()), 0.7, evidence.clone()),
        );
        fields.insert(
            "contract_term".into(),
            ExtractedField::new(FieldValue::Text(term.into()), 0.7, evidence),
        );
        fields
    }

    #[test]
    fn test_twelve_months() {
        let field = derive_termination_date(&fields_with("2024-01-01", "12 months")).unwrap();
        assert_eq!(field.value, FieldValue::Text("2025-01-01".into()));
        assert!((field.confidence - 0.75).abs() < 1e-6);
        assert_eq!(field.evidence.source, EvidenceSource::Derived);
        assert_eq!(field.evidence.page, 2);
    }

    #[test]
    fn test_two_years() {
        let field = derive_termination_date(&fields_with("2024-01-01", "2 years")).unwrap();
        assert_eq!(field.value, FieldValue::Text("2026-01-01".into()));
    }

    #[test]
    fn test_hyphenated_term() {
        let field = derive_termination_date(&fields_with("2024-03-31", "6-month")).unwrap();
        assert_eq!(field.value, FieldValue::Text("2024-09-30".into()));
    }

    #[test]
    fn test_month_end_clamps() {
        let field = derive_termination_date(&fields_with("2024-01-31", "1 month")).unwrap();
        // February has no 31st; calendar arithmetic clamps.
        assert_eq!(field.value, FieldValue::Text("2024-02-29".into()));
    }

    #[test]
    fn test_unparseable_term_yields_nothing() {
        assert!(derive_termination_date(&fields_with("2024-01-01", "perpetual")).is_none());
    }

    #[test]
    fn test_existing_termination_date_wins() {
        let mut fields = fields_with("2024-01-01", "12 months");
        fields.insert(
            "termination_date".into(),
            ExtractedField::new(
                FieldValue::Text("2024-06-30".into()),
                0.65,
                Evidence {
                    page: 1,
                    snippet: String::new(),
                    source: EvidenceSource::Rule,
                },
            ),
        );
        assert!(derive_termination_date(&fields).is_none());
    }
}
