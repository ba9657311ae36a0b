//! End-to-end pipeline: acquisition, extraction, derivation, gap analysis,
//! and scoring in one call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::analysis::{GapAnalyzer, ScoreCalculator};
use crate::error::Result;
use crate::invoice::{merge_into, InvoiceExtractor};
use crate::models::{
    ConfidenceSummary, ContractRecord, DocumentText, FieldMap, Page, PipelineConfig,
    ProcessingMetadata,
};
use crate::ocr::OcrBackend;
use crate::pdf::TextAcquisition;
use crate::rules::{derive_termination_date, extract_field, FieldLists, PatternCatalog};

/// Cooperative cancellation flag, checked between pages during acquisition.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Per-call options: OCR backend, cancellation, progress reporting.
#[derive(Default)]
pub struct ProcessOptions<'a> {
    /// OCR backend for scanned pages; without one, short pages keep their
    /// embedded text.
    pub ocr: Option<&'a dyn OcrBackend>,

    /// Cancellation token checked between pages.
    pub cancel: Option<&'a CancelToken>,

    /// Progress callback invoked at coarse milestones (percentage, label).
    pub progress: Option<&'a (dyn Fn(u8, &str) + Sync)>,
}

/// The extraction-and-scoring pipeline.
///
/// The catalog and field lists are immutable, injected configuration; one
/// pipeline may serve any number of concurrent documents since every call
/// owns its own working state.
pub struct Pipeline {
    catalog: PatternCatalog,
    lists: FieldLists,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(catalog: PatternCatalog, lists: FieldLists, config: PipelineConfig) -> Self {
        Self {
            catalog,
            lists,
            config,
        }
    }

    /// Pipeline with the standard catalog, field lists, and defaults.
    pub fn standard() -> Self {
        Self::new(
            PatternCatalog::standard(),
            FieldLists::default(),
            PipelineConfig::default(),
        )
    }

    /// Standard catalog and lists with a custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self::new(PatternCatalog::standard(), FieldLists::default(), config)
    }

    /// Process a document from raw bytes.
    ///
    /// Acquisition failure (unreadable document, cancellation) is fatal and
    /// propagated; everything downstream degrades to fewer fields instead
    /// of failing.
    pub fn process_document(
        &self,
        data: &[u8],
        opts: &ProcessOptions<'_>,
    ) -> Result<ContractRecord> {
        let start = Instant::now();

        let acquisition = TextAcquisition::new(&self.config.acquisition);
        let acquired = acquisition.acquire(data, opts.ocr, opts.cancel)?;
        emit(opts, 30, "text acquired");

        let mut record = self.analyze(acquired.pages, acquired.ocr_used, opts);
        record.processing.duration_ms = start.elapsed().as_millis() as u64;
        Ok(record)
    }

    /// Process already-acquired pages (plain-text inputs, tests).
    pub fn process_pages(
        &self,
        pages: Vec<Page>,
        ocr_used: bool,
        opts: &ProcessOptions<'_>,
    ) -> ContractRecord {
        let start = Instant::now();
        emit(opts, 30, "text acquired");

        let mut record = self.analyze(pages, ocr_used, opts);
        record.processing.duration_ms = start.elapsed().as_millis() as u64;
        record
    }

    /// Process a single block of plain text as a one-page document.
    pub fn process_text(&self, text: &str, opts: &ProcessOptions<'_>) -> ContractRecord {
        let page = Page {
            number: 1,
            text: crate::pdf::normalize_page_text(text),
        };
        self.process_pages(vec![page], false, opts)
    }

    fn analyze(&self, pages: Vec<Page>, ocr_used: bool, opts: &ProcessOptions<'_>) -> ContractRecord {
        let doc = DocumentText::from_pages(&pages);

        // Standard rule-based fields first.
        let mut fields = FieldMap::new();
        for rule in self.catalog.rules() {
            if let Some(field) = extract_field(&doc, rule) {
                fields.insert(rule.name.to_string(), field);
            }
        }

        // Invoice subsystem, merged under its precedence rules.
        let invoice = InvoiceExtractor::new(&self.config.extraction).extract(&pages);
        merge_into(&mut fields, invoice, &self.catalog);

        // Derived fields only where the target is still absent.
        if let Some(derived) = derive_termination_date(&fields) {
            fields.insert("termination_date".to_string(), derived);
        }

        emit(opts, 70, "fields analyzed");

        let gaps = GapAnalyzer::new(&self.lists, &self.config.extraction).analyze(&fields);
        let confidence_summary = ConfidenceSummary::from_fields(
            &fields,
            self.config.extraction.low_confidence_threshold,
        );
        let overall_score =
            ScoreCalculator::new(&self.lists).score(&fields, &gaps, &confidence_summary);

        emit(opts, 100, "scoring complete");

        info!(
            fields = fields.len(),
            gaps = gaps.len(),
            score = overall_score,
            "document analyzed"
        );

        ContractRecord {
            pages,
            fields,
            gaps,
            confidence_summary,
            overall_score,
            processing: ProcessingMetadata {
                ocr_used,
                duration_ms: 0,
                error_message: None,
            },
        }
    }
}

fn emit(opts: &ProcessOptions<'_>, percent: u8, label: &str) {
    if let Some(progress) = opts.progress {
        progress(percent, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_roundtrip() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_progress_milestones_in_order() {
        use std::sync::Mutex;

        let pipeline = Pipeline::standard();
        let seen: Mutex<Vec<(u8, String)>> = Mutex::new(Vec::new());
        let progress = |percent: u8, label: &str| {
            seen.lock().unwrap().push((percent, label.to_string()));
        };

        pipeline.process_text(
            "Client: Acme Corp\nNet 30 days",
            &ProcessOptions {
                progress: Some(&progress),
                ..Default::default()
            },
        );

        let seen = seen.into_inner().unwrap();
        let percents: Vec<u8> = seen.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![30, 70, 100]);
        assert_eq!(seen[2].1, "scoring complete");
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let record = Pipeline::standard().process_text("", &ProcessOptions::default());
        assert_eq!(record.overall_score, 0.0);
        assert!(!record.processing.ocr_used);
        assert_eq!(record.pages.len(), 1);
    }
}
