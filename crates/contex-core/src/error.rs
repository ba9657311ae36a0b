//! Error types for the contex-core library.

use thiserror::Error;

/// Main error type for the contex library.
#[derive(Error, Debug)]
pub enum ContexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Processing was cancelled by the caller.
    #[error("processing cancelled")]
    Cancelled,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF document.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract a page image from the PDF.
    #[error("failed to extract page image: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to the OCR fallback path.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised inside individual extraction stages.
///
/// These are caught and logged at the stage boundary; a failed stage
/// contributes no fields while sibling stages still run.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// An invoice sub-stage failed.
    #[error("stage {stage} failed: {reason}")]
    Stage { stage: &'static str, reason: String },

    /// Failed to parse a value out of matched text.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },
}

/// Result type for the contex library.
pub type Result<T> = std::result::Result<T, ContexError>;
