//! Core library for contract data extraction.
//!
//! This crate provides:
//! - Text acquisition from PDFs with a per-page OCR fallback decision
//! - A read-only catalog of named pattern rules with confidence scoring
//! - An invoice sub-pipeline (line items, totals, payment terms)
//! - Derivation of missing fields from related ones
//! - Gap analysis and a weighted 0-100 completeness score

pub mod analysis;
pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod rules;

pub use error::{ContexError, ExtractionError, OcrError, PdfError, Result};
pub use models::{
    ConfidenceSummary, ContractRecord, DocumentText, Evidence, EvidenceSource, ExtractedField,
    FieldMap, FieldValue, Gap, GapReason, GapSeverity, LineItem, Page, PipelineConfig,
    ProcessingMetadata,
};
pub use ocr::{OcrBackend, ScanPreprocessor};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfExtractor, TextAcquisition};
pub use pipeline::{CancelToken, Pipeline, ProcessOptions};
pub use rules::{FieldLists, PatternCatalog};
