//! PDF processing: document access and page-text acquisition.

mod acquisition;
mod extractor;

pub use acquisition::{normalize_page_text, AcquiredDocument, TextAcquisition};
pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
