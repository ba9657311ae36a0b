//! Payment-terms, late-fee, and payment-method extraction.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::{DocumentText, Evidence, EvidenceSource, ExtractedField, FieldValue};

use super::patterns::{LATE_FEE_AMOUNT, LATE_FEE_RATE, NET_TERMS, PAYMENT_METHOD_LINE};
use super::totals::StageFields;

/// Extract "net N days" terms and late-fee details.
///
/// Late-fee cadence is recorded as its own field and never feeds
/// `billing_frequency`: a late-fee percentage is not a recurring billing
/// schedule.
pub fn extract_terms(doc: &DocumentText) -> Result<StageFields, ExtractionError> {
    let mut fields = StageFields::new();

    for (pattern, confidence) in NET_TERMS.iter() {
        let Some(caps) = pattern.captures(doc.text()) else {
            continue;
        };
        let full = caps.get(0).expect("capture 0 always present");
        let Ok(days) = caps[1].parse::<u32>() else {
            continue;
        };

        let evidence = Evidence {
            page: doc.page_at(full.start()),
            snippet: doc.snippet_around(full.start(), full.end()),
            source: EvidenceSource::Rule,
        };

        fields.push((
            "payment_net_days".to_string(),
            ExtractedField::new(FieldValue::Number(days.into()), *confidence, evidence.clone()),
        ));
        fields.push((
            "payment_due_terms".to_string(),
            ExtractedField::new(
                FieldValue::Text(format!("Net {} days", days)),
                *confidence,
                evidence.clone(),
            ),
        ));
        fields.push((
            "payment_terms".to_string(),
            ExtractedField::new(
                FieldValue::Text(full.as_str().trim().to_string()),
                *confidence,
                evidence,
            ),
        ));
        break;
    }

    extract_late_fee(doc, &mut fields);

    Ok(fields)
}

fn extract_late_fee(doc: &DocumentText, fields: &mut StageFields) {
    for (pattern, confidence) in LATE_FEE_RATE.iter() {
        let Some(caps) = pattern.captures(doc.text()) else {
            continue;
        };
        let full = caps.get(0).expect("capture 0 always present");
        let Ok(percent) = Decimal::from_str(&caps[1]) else {
            continue;
        };

        let evidence = Evidence {
            page: doc.page_at(full.start()),
            snippet: doc.snippet_around(full.start(), full.end()),
            source: EvidenceSource::Rule,
        };

        fields.push((
            "late_fee_percentage".to_string(),
            ExtractedField::new(
                FieldValue::Number(percent / Decimal::from(100)),
                *confidence,
                evidence.clone(),
            ),
        ));
        fields.push((
            "late_fee_cadence".to_string(),
            ExtractedField::new(FieldValue::Text("monthly".to_string()), *confidence, evidence),
        ));
        return;
    }

    if let Some(caps) = LATE_FEE_AMOUNT.captures(doc.text()) {
        let full = caps.get(0).expect("capture 0 always present");
        let cleaned: String = caps[1].chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
        if let Ok(amount) = Decimal::from_str(&cleaned) {
            fields.push((
                "late_fee_amount".to_string(),
                ExtractedField::new(
                    FieldValue::Number(amount),
                    0.8,
                    Evidence {
                        page: doc.page_at(full.start()),
                        snippet: doc.snippet_around(full.start(), full.end()),
                        source: EvidenceSource::Rule,
                    },
                ),
            ));
        }
    }
}

/// Extract accepted payment methods from a "Payment Method:" line.
pub fn extract_methods(doc: &DocumentText) -> Result<StageFields, ExtractionError> {
    let Some(caps) = PAYMENT_METHOD_LINE.captures(doc.text()) else {
        return Ok(StageFields::new());
    };
    let full = caps.get(0).expect("capture 0 always present");
    let listed = caps[1].to_lowercase();

    const KEYWORDS: &[(&str, &str)] = &[
        ("wire transfer", "Wire Transfer"),
        ("wire", "Wire Transfer"),
        ("ach", "ACH"),
        ("credit card", "Credit Card"),
        ("bank transfer", "Bank Transfer"),
        ("check", "Check"),
        ("cash", "Cash"),
    ];

    let mut methods: Vec<String> = Vec::new();
    for (keyword, canonical) in KEYWORDS {
        if listed.contains(keyword) && !methods.iter().any(|m| m == canonical) {
            methods.push(canonical.to_string());
        }
    }

    if methods.is_empty() {
        return Ok(StageFields::new());
    }

    debug!(?methods, "payment methods recognized");

    Ok(vec![(
        "payment_methods".to_string(),
        ExtractedField::new(
            FieldValue::List(methods),
            0.9,
            Evidence {
                page: doc.page_at(full.start()),
                snippet: doc.snippet_around(full.start(), full.end()),
                source: EvidenceSource::Rule,
            },
        ),
    )])
}
