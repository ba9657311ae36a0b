//! Weighted completeness scoring.

use crate::models::{ConfidenceSummary, FieldMap, Gap, GapSeverity};
use crate::rules::FieldLists;

const FINANCIAL_FIELDS: &[&str] = &[
    "contract_value",
    "total_amount",
    "currency",
    "payment_terms",
    "billing_frequency",
    "line_items",
];
const PARTY_FIELDS: &[&str] = &["party_1_name", "party_2_name"];
const PAYMENT_FIELDS: &[&str] = &[
    "payment_terms",
    "payment_net_days",
    "payment_methods",
    "late_fee_percentage",
    "billing_frequency",
    "notice_period",
];
const SLA_FIELDS: &[&str] = &["sla_uptime", "support_hours", "liability_cap"];

/// Confidence at or above which a field counts toward a category's
/// confidence ratio.
const CONFIDENT: f32 = 0.6;

/// Converts the field map and gaps into a single 0-100 score.
pub struct ScoreCalculator<'a> {
    lists: &'a FieldLists,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(lists: &'a FieldLists) -> Self {
        Self { lists }
    }

    /// Weighted categories (30/25/20/15), a 10-point completeness bonus,
    /// and per-gap penalties; clamped to [0, 100].
    pub fn score(&self, fields: &FieldMap, gaps: &[Gap], summary: &ConfidenceSummary) -> f32 {
        let mut score = 0.0;

        score += category_score(fields, FINANCIAL_FIELDS, 30.0);
        score += category_score(fields, PARTY_FIELDS, 25.0);
        score += category_score(fields, PAYMENT_FIELDS, 20.0);
        score += category_score(fields, SLA_FIELDS, 15.0);

        if summary.total_fields > 0 {
            let listed = (self.lists.required.len() + self.lists.important.len()).max(1);
            let completeness = summary.high_confidence_count as f32 / listed as f32;
            score += 10.0 * completeness.min(1.0);
        }

        let high = gaps.iter().filter(|g| g.severity == GapSeverity::High).count();
        let medium = gaps
            .iter()
            .filter(|g| g.severity == GapSeverity::Medium)
            .count();

        score -= high as f32 * 5.0;
        score -= medium as f32 * 2.0;

        score.clamp(0.0, 100.0)
    }
}

/// `max_points x (0.6 x presence_ratio + 0.4 x confidence_ratio)`.
fn category_score(fields: &FieldMap, category: &[&str], max_points: f32) -> f32 {
    if category.is_empty() {
        return 0.0;
    }

    let present = category
        .iter()
        .filter(|name| fields.contains_key(**name))
        .count();
    let confident = category
        .iter()
        .filter(|name| {
            fields
                .get(**name)
                .map(|f| f.confidence >= CONFIDENT)
                .unwrap_or(false)
        })
        .count();

    let presence_ratio = present as f32 / category.len() as f32;
    let confidence_ratio = confident as f32 / category.len() as f32;

    max_points * (presence_ratio * 0.6 + confidence_ratio * 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExtractionConfig;
    use crate::models::{Evidence, EvidenceSource, ExtractedField, FieldValue};

    fn field(confidence: f32) -> ExtractedField {
        ExtractedField::new(
            FieldValue::Text("value".into()),
            confidence,
            Evidence {
                page: 1,
                snippet: String::new(),
                source: EvidenceSource::Rule,
            },
        )
    }

    fn full_field_map() -> FieldMap {
        let mut fields = FieldMap::new();
        for name in FINANCIAL_FIELDS
            .iter()
            .chain(PARTY_FIELDS)
            .chain(PAYMENT_FIELDS)
            .chain(SLA_FIELDS)
        {
            fields.insert(name.to_string(), field(0.9));
        }
        fields
    }

    #[test]
    fn test_empty_input_clamps_to_zero() {
        let lists = FieldLists::default();
        let config = ExtractionConfig::default();
        let fields = FieldMap::new();
        let gaps = crate::analysis::GapAnalyzer::new(&lists, &config).analyze(&fields);
        let summary = ConfidenceSummary::from_fields(&fields, 0.6);

        // 5 high gaps (-25) + 9 medium gaps (-18) against zero points.
        let score = ScoreCalculator::new(&lists).score(&fields, &gaps, &summary);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_all_present_high_confidence_is_bounded() {
        let lists = FieldLists::default();
        let fields = full_field_map();
        let summary = ConfidenceSummary::from_fields(&fields, 0.6);

        let score = ScoreCalculator::new(&lists).score(&fields, &[], &summary);
        assert!(score > 90.0);
        assert!(score <= 100.0);
    }

    #[test]
    fn test_category_weights() {
        let mut fields = FieldMap::new();
        for name in PARTY_FIELDS {
            fields.insert(name.to_string(), field(0.9));
        }

        // Full party category alone: 25 points.
        assert!((category_score(&fields, PARTY_FIELDS, 25.0) - 25.0).abs() < 1e-4);
        assert_eq!(category_score(&fields, SLA_FIELDS, 15.0), 0.0);
    }

    #[test]
    fn test_presence_without_confidence_scores_partially() {
        let mut fields = FieldMap::new();
        fields.insert("party_1_name".to_string(), field(0.3));
        fields.insert("party_2_name".to_string(), field(0.3));

        // Present (0.6 weight) but below the confidence bar (0.4 weight).
        let score = category_score(&fields, PARTY_FIELDS, 25.0);
        assert!((score - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_score_stays_in_range_for_arbitrary_gap_lists() {
        let lists = FieldLists::default();
        let fields = full_field_map();
        let summary = ConfidenceSummary::from_fields(&fields, 0.6);

        let many_gaps: Vec<Gap> = (0..100)
            .map(|i| Gap {
                field: format!("f{}", i),
                reason: crate::models::GapReason::Missing,
                severity: if i % 2 == 0 {
                    GapSeverity::High
                } else {
                    GapSeverity::Medium
                },
            })
            .collect();

        let calculator = ScoreCalculator::new(&lists);
        for gaps in [&[][..], &many_gaps[..]] {
            let score = calculator.score(&fields, gaps, &summary);
            assert!((0.0..=100.0).contains(&score));
        }
    }
}
