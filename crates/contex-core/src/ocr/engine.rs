//! OCR engine backed by `pure-onnx-ocr` (pure Rust, no external runtime).

use std::path::Path;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use crate::error::OcrError;

use super::OcrBackend;

/// Text recognition engine for scanned pages.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl PureOcrEngine {
    /// Create an engine from model files in a directory. Expects
    /// `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("loaded OCR engine from {}", model_dir.display());

        Ok(Self { engine })
    }
}

impl OcrBackend for PureOcrEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let dynamic = DynamicImage::ImageLuma8(image.clone());

        let regions = self
            .engine
            .run_from_image(&dynamic)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!(count = regions.len(), "recognized text regions");

        // Sort into reading order: rows of ~20px, left to right within a row.
        let mut lines: Vec<(i64, f64, String)> = regions
            .iter()
            .map(|region| {
                let (x, y) = region_origin(&region.bounding_box);
                ((y / 20.0) as i64, x, region.text.replace("[UNK]", " "))
            })
            .collect();

        lines.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        Ok(lines
            .into_iter()
            .map(|(_, _, text)| text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Top-left corner of a detected region's polygon.
fn region_origin(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;

    for coord in polygon.exterior().coords() {
        min_x = min_x.min(coord.x);
        min_y = min_y.min(coord.y);
    }

    (min_x, min_y)
}
