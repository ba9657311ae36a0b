//! Data models for the extraction pipeline.

pub mod config;
pub mod record;

pub use config::{AcquisitionConfig, ExtractionConfig, PipelineConfig};
pub use record::{
    ConfidenceSummary, ContractRecord, DocumentText, Evidence, EvidenceSource, ExtractedField,
    FieldMap, FieldValue, Gap, GapReason, GapSeverity, LineItem, Page, ProcessingMetadata,
};
