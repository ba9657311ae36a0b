//! Data model for extracted contract records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single page of acquired document text.
///
/// Pages are created once during text acquisition and never mutated. Page
/// numbers are 1-based and contiguous per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed).
    pub number: u32,

    /// Normalized page text.
    pub text: String,
}

/// The value of an extracted field.
///
/// A closed sum type so downstream gap/scoring code can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean presence flag (confidentiality, auto-renewal, ...).
    Bool(bool),
    /// Numeric value (amounts, day counts, percentages).
    Number(Decimal),
    /// Free text (names, dates in ISO form, terms).
    Text(String),
    /// Structured invoice line items.
    Items(Vec<LineItem>),
    /// A list of canonical names (payment methods).
    List(Vec<String>),
    /// Nested mapping (the folded `additional_fields` entry).
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Text form used when comparing a raw match against the final value.
    pub fn comparable(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            _ => String::new(),
        }
    }

    /// Whether the field carries the not-applicable placeholder.
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s == "N/A")
    }

    /// Numeric value, if this variant is numeric.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if this variant is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Direct pattern match.
    Rule,
    /// Inferred from other extracted fields.
    Derived,
}

/// The page and text snippet supporting an extracted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Page number the match was found on.
    pub page: u32,

    /// Context snippet around the match (at most 200 characters).
    pub snippet: String,

    /// Whether the value was matched or derived.
    pub source: EvidenceSource,
}

/// An extracted field with its confidence and supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Extracted value.
    pub value: FieldValue,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Supporting evidence.
    pub evidence: Evidence,
}

impl ExtractedField {
    /// Create a field with clamped confidence.
    pub fn new(value: FieldValue, confidence: f32, evidence: Evidence) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            evidence,
        }
    }
}

/// One row of a priced invoice table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity as it appeared in the document (may be non-numeric).
    pub quantity: String,

    /// Unit of the quantity, when present ("hours", "licenses", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty_unit: Option<String>,

    /// Price per unit.
    pub unit_price: Decimal,

    /// 3-letter currency code.
    pub currency: String,

    /// Total for the row.
    pub line_total: Decimal,
}

/// Why a field was flagged as a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    Missing,
    LowConfidence,
}

/// How severe a gap is, determined by list membership alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    High,
    Medium,
    Low,
}

/// A required/important field that is absent or below its confidence bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub field: String,
    pub reason: GapReason,
    pub severity: GapSeverity,
}

/// Aggregate confidence statistics over the final field map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// Mean confidence across all fields.
    pub average: f32,

    /// Fields below the low-confidence threshold.
    pub low_count: usize,

    /// Fields at or above the low-confidence threshold.
    pub high_confidence_count: usize,

    /// Total fields in the map.
    pub total_fields: usize,
}

impl ConfidenceSummary {
    /// Compute the summary once from a finished field map.
    pub fn from_fields(fields: &FieldMap, low_threshold: f32) -> Self {
        if fields.is_empty() {
            return Self::default();
        }

        let confidences: Vec<f32> = fields.values().map(|f| f.confidence).collect();
        let low_count = confidences.iter().filter(|c| **c < low_threshold).count();

        Self {
            average: confidences.iter().sum::<f32>() / confidences.len() as f32,
            low_count,
            high_confidence_count: confidences.len() - low_count,
            total_fields: confidences.len(),
        }
    }
}

/// Metadata about a single processing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Whether OCR was used on at least one page.
    pub ocr_used: bool,

    /// Wall-clock duration of the pipeline run in milliseconds.
    pub duration_ms: u64,

    /// Error message, when the caller chose to persist a failed run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Field map keyed by field name.
pub type FieldMap = BTreeMap<String, ExtractedField>;

/// The full result record for one processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Acquired pages.
    pub pages: Vec<Page>,

    /// Extracted fields.
    pub fields: FieldMap,

    /// Gap analysis result.
    pub gaps: Vec<Gap>,

    /// Confidence statistics.
    pub confidence_summary: ConfidenceSummary,

    /// Completeness score (0 - 100).
    pub overall_score: f32,

    /// Processing metadata.
    pub processing: ProcessingMetadata,
}

impl ContractRecord {
    /// Validated line items, when any were extracted.
    pub fn line_items(&self) -> Option<&[LineItem]> {
        match self.fields.get("line_items").map(|f| &f.value) {
            Some(FieldValue::Items(items)) => Some(items),
            _ => None,
        }
    }
}

/// Joined document text with page-boundary offsets.
///
/// Extraction runs over the whole document at once; byte offsets of matches
/// are mapped back to page numbers through this index.
#[derive(Debug, Clone)]
pub struct DocumentText {
    text: String,
    /// Exclusive end offset of each page within `text`, paired with its number.
    bounds: Vec<(usize, u32)>,
}

impl DocumentText {
    /// Join normalized pages with newlines and record page boundaries.
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut text = String::new();
        let mut bounds = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(&page.text);
            bounds.push((text.len(), page.number));
        }

        Self { text, bounds }
    }

    /// Build directly from pre-joined text as a single page.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let bounds = vec![(text.len(), 1)];
        Self { text, bounds }
    }

    /// The joined document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Page number containing the given byte offset.
    pub fn page_at(&self, offset: usize) -> u32 {
        self.bounds
            .iter()
            .find(|(end, _)| offset < *end)
            .or_else(|| self.bounds.last())
            .map(|(_, page)| *page)
            .unwrap_or(1)
    }

    /// Evidence snippet around a match: 50 characters of context on each
    /// side, newlines flattened, truncated to 200 characters.
    pub fn snippet_around(&self, start: usize, end: usize) -> String {
        let from = floor_char_boundary(&self.text, start.saturating_sub(50));
        let to = floor_char_boundary(&self.text, (end + 50).min(self.text.len()));

        let flat: String = self.text[from..to]
            .chars()
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();

        flat.trim().chars().take(200).collect()
    }

    /// Fixed-size lookahead window starting at `start`, clamped to character
    /// boundaries.
    pub fn window(&self, start: usize, len: usize) -> &str {
        let from = floor_char_boundary(&self.text, start.min(self.text.len()));
        let to = floor_char_boundary(&self.text, (start + len).min(self.text.len()));
        &self.text[from..to]
    }
}

/// Largest char boundary at or below `index`.
pub(crate) fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
