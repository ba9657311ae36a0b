//! Gap analysis: missing and low-confidence required/important fields.

use crate::models::config::ExtractionConfig;
use crate::models::{EvidenceSource, FieldMap, Gap, GapReason, GapSeverity};
use crate::rules::FieldLists;

/// Compares the final field map against the required/important lists.
pub struct GapAnalyzer<'a> {
    lists: &'a FieldLists,
    config: &'a ExtractionConfig,
}

impl<'a> GapAnalyzer<'a> {
    pub fn new(lists: &'a FieldLists, config: &'a ExtractionConfig) -> Self {
        Self { lists, config }
    }

    /// Identify gaps. Fields marked "N/A" are deliberately not applicable
    /// and never flagged; derived values must clear a stricter confidence
    /// bar before being trusted.
    pub fn analyze(&self, fields: &FieldMap) -> Vec<Gap> {
        let mut gaps = Vec::new();
        self.check_list(fields, &self.lists.required, GapSeverity::High, &mut gaps);
        self.check_list(fields, &self.lists.important, GapSeverity::Medium, &mut gaps);
        gaps
    }

    fn check_list(
        &self,
        fields: &FieldMap,
        list: &[&'static str],
        severity: GapSeverity,
        gaps: &mut Vec<Gap>,
    ) {
        for name in list {
            match fields.get(*name) {
                None => gaps.push(Gap {
                    field: name.to_string(),
                    reason: GapReason::Missing,
                    severity,
                }),
                Some(field) => {
                    if field.value.is_not_applicable() {
                        continue;
                    }

                    let threshold = if field.evidence.source == EvidenceSource::Derived {
                        self.config.derived_confidence_threshold
                    } else {
                        self.config.low_confidence_threshold
                    };

                    if field.confidence < threshold {
                        gaps.push(Gap {
                            field: name.to_string(),
                            reason: GapReason::LowConfidence,
                            severity,
                        });
                    }
                }
            }
        }
    }
}
