//! OCR fallback for scanned pages.

#[cfg(feature = "native")]
mod engine;
mod preprocessing;

#[cfg(feature = "native")]
pub use engine::PureOcrEngine;
pub use preprocessing::ScanPreprocessor;

use image::GrayImage;

use crate::error::OcrError;

/// Text recognition over a preprocessed page image.
///
/// A trait seam so acquisition can run with any engine, and tests can
/// inject a stub instead of loading models.
pub trait OcrBackend: Send + Sync {
    /// Recognize the text of one page image, in reading order.
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}
