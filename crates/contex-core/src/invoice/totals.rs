//! Total and contract-value extraction.
//!
//! Explicit total keywords are searched in priority order; when none hit,
//! the total is computed by summing validated line items. For one-time
//! agreements the total is mirrored into `contract_value`/`currency` unless
//! standard extraction already produced them (see the merge precedence in
//! `invoice::merge_into`).

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::{DocumentText, Evidence, EvidenceSource, ExtractedField, FieldValue, LineItem};

use super::patterns::{money_parts, CONTRACT_VALUE_KW, EXPLICIT_TOTALS, MONEY, SUBTOTAL_KW};

/// Named fields produced by one invoice stage.
pub type StageFields = Vec<(String, ExtractedField)>;

struct FoundTotal {
    amount: Decimal,
    currency: String,
    confidence: f32,
    evidence: Evidence,
}

/// Extract totals, the explicit contract value, and the subtotal.
pub fn extract(
    doc: &DocumentText,
    money_window: usize,
    line_items: &[LineItem],
) -> Result<StageFields, ExtractionError> {
    let mut fields = StageFields::new();

    let mut total = find_explicit_total(doc, money_window);

    // Fallback: sum validated line items when no keyword produced a total.
    if total.is_none() && !line_items.is_empty() {
        let sum: Decimal = line_items.iter().map(|i| i.line_total).sum();
        if sum > Decimal::ZERO {
            let currency = line_items
                .iter()
                .map(|i| i.currency.as_str())
                .next()
                .unwrap_or("USD")
                .to_string();
            debug!(%sum, currency, "total computed from line items");
            total = Some(FoundTotal {
                amount: sum.round_dp(2),
                currency,
                confidence: 0.8,
                evidence: Evidence {
                    page: 1,
                    snippet: "computed from line items".to_string(),
                    source: EvidenceSource::Rule,
                },
            });
        }
    }

    if let Some(total) = &total {
        fields.push((
            "total_amount".to_string(),
            ExtractedField::new(
                FieldValue::Number(total.amount),
                total.confidence,
                total.evidence.clone(),
            ),
        ));
        fields.push((
            "total_amount_currency".to_string(),
            ExtractedField::new(
                FieldValue::Text(total.currency.clone()),
                total.confidence,
                total.evidence.clone(),
            ),
        ));
    }

    // Explicit contract value has its own keyword.
    let explicit_value = find_keyword_amount(doc, &CONTRACT_VALUE_KW, money_window);
    if let Some((amount, currency, evidence)) = &explicit_value {
        fields.push((
            "contract_value_total".to_string(),
            ExtractedField::new(FieldValue::Number(*amount), 0.9, evidence.clone()),
        ));
        fields.push((
            "contract_value_total_currency".to_string(),
            ExtractedField::new(FieldValue::Text(currency.clone()), 0.9, evidence.clone()),
        ));
    }

    // One-time default: the total stands in for the contract value.
    if let (Some(total), None) = (&total, &explicit_value) {
        let evidence = Evidence {
            page: total.evidence.page,
            snippet: "derived from total amount for one-time agreement".to_string(),
            source: EvidenceSource::Rule,
        };
        fields.push((
            "contract_value".to_string(),
            ExtractedField::new(FieldValue::Number(total.amount), 0.9, evidence.clone()),
        ));
        fields.push((
            "currency".to_string(),
            ExtractedField::new(FieldValue::Text(total.currency.clone()), 0.9, evidence),
        ));
    }

    // The due-amount pair is always populated when any total exists; it has
    // final priority in the merge.
    if let Some(total) = &total {
        fields.push((
            "total_due_amount".to_string(),
            ExtractedField::new(
                FieldValue::Number(total.amount),
                total.confidence,
                total.evidence.clone(),
            ),
        ));
        fields.push((
            "total_due_currency".to_string(),
            ExtractedField::new(
                FieldValue::Text(total.currency.clone()),
                total.confidence,
                total.evidence.clone(),
            ),
        ));
    }

    // Subtotal is kept separately and never promoted to a contract value.
    if let Some((amount, _, evidence)) = find_keyword_amount(doc, &SUBTOTAL_KW, money_window) {
        fields.push((
            "subtotal".to_string(),
            ExtractedField::new(FieldValue::Number(amount), 0.8, evidence),
        ));
    }

    Ok(validate_amounts(fields))
}

/// First total keyword (in priority order) with a money amount in its
/// lookahead window.
fn find_explicit_total(doc: &DocumentText, money_window: usize) -> Option<FoundTotal> {
    for (pattern, confidence) in EXPLICIT_TOTALS.iter() {
        let Some(keyword) = pattern.find(doc.text()) else {
            continue;
        };

        let window = doc.window(keyword.end(), money_window);
        if let Some(caps) = MONEY.captures(window) {
            if let Some((currency, amount_str)) = money_parts(&caps) {
                if let Some(amount) = parse_amount(amount_str) {
                    let evidence = Evidence {
                        page: doc.page_at(keyword.start()),
                        snippet: doc.snippet_around(keyword.start(), keyword.end()),
                        source: EvidenceSource::Rule,
                    };
                    return Some(FoundTotal {
                        amount,
                        currency,
                        confidence: *confidence,
                        evidence,
                    });
                }
            }
        }
    }

    None
}

/// Money amount in the lookahead window after a keyword match.
fn find_keyword_amount(
    doc: &DocumentText,
    keyword: &Regex,
    money_window: usize,
) -> Option<(Decimal, String, Evidence)> {
    let found = keyword.find(doc.text())?;
    let window = doc.window(found.end(), money_window);
    let caps = MONEY.captures(window)?;
    let (currency, amount_str) = money_parts(&caps)?;
    let amount = parse_amount(amount_str)?;

    Some((
        amount,
        currency,
        Evidence {
            page: doc.page_at(found.start()),
            snippet: doc.snippet_around(found.start(), found.end()),
            source: EvidenceSource::Rule,
        },
    ))
}

/// Drop numeric totals outside the plausible range [1, 100,000,000].
fn validate_amounts(fields: StageFields) -> StageFields {
    let min = Decimal::ONE;
    let max = Decimal::from(100_000_000);

    fields
        .into_iter()
        .filter(|(name, field)| match field.value.as_number() {
            Some(amount) if amount < min || amount > max => {
                warn!(field = name.as_str(), %amount, "implausible total discarded");
                false
            }
            _ => true,
        })
        .collect()
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Decimal::from_str(&cleaned).ok()
}
