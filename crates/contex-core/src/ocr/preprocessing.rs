//! Scan preprocessing ahead of recognition: grayscale, denoise, binarize.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::error::OcrError;

/// Prepares a rendered page for OCR.
pub struct ScanPreprocessor;

impl ScanPreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Grayscale conversion, 3x3 median denoising, then binarization with
    /// an automatically chosen (Otsu) threshold.
    pub fn prepare(&self, image: &DynamicImage) -> Result<GrayImage, OcrError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage("empty image".to_string()));
        }

        let denoised = median_filter_3x3(&gray);
        let threshold = otsu_threshold(&denoised);
        debug!(width, height, threshold, "binarizing scanned page");

        let mut binary = GrayImage::new(width, height);
        for (x, y, pixel) in denoised.enumerate_pixels() {
            let value = if pixel[0] > threshold { 255 } else { 0 };
            binary.put_pixel(x, y, Luma([value]));
        }

        Ok(binary)
    }
}

impl Default for ScanPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 3x3 median filter; border pixels are copied through.
fn median_filter_3x3(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = image.clone();

    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut window = [0u8; 9];
            let mut i = 0;
            for dy in 0..3 {
                for dx in 0..3 {
                    window[i] = image.get_pixel(x + dx - 1, y + dy - 1)[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            output.put_pixel(x, y, Luma([window[4]]));
        }
    }

    output
}

/// Otsu's method: the threshold maximizing between-class variance of the
/// intensity histogram.
fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = (image.width() as u64) * (image.height() as u64);
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, count)| value as f64 * *count as f64)
        .sum();

    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_threshold = 0u8;

    for value in 0..256usize {
        background_count += histogram[value];
        if background_count == 0 {
            continue;
        }

        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }

        background_sum += value as f64 * histogram[value] as f64;

        let mean_background = background_sum / background_count as f64;
        let mean_foreground = (weighted_sum - background_sum) / foreground_count as f64;
        let difference = mean_background - mean_foreground;
        let variance =
            background_count as f64 * foreground_count as f64 * difference * difference;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Half dark, half light image with a little noise.
    fn bimodal_image() -> GrayImage {
        let mut image = GrayImage::new(20, 20);
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            pixel[0] = if x < 10 { 30 } else { 220 };
        }
        image.put_pixel(5, 5, Luma([210]));
        image.put_pixel(15, 15, Luma([40]));
        image
    }

    #[test]
    fn test_otsu_separates_bimodal_histogram() {
        let threshold = otsu_threshold(&bimodal_image());
        assert!(threshold >= 30 && threshold < 220);
    }

    #[test]
    fn test_prepare_produces_binary_output() {
        let image = DynamicImage::ImageLuma8(bimodal_image());
        let binary = ScanPreprocessor::new().prepare(&image).unwrap();
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_median_filter_removes_speckle() {
        let mut image = GrayImage::new(9, 9);
        for (_, _, pixel) in image.enumerate_pixels_mut() {
            pixel[0] = 200;
        }
        image.put_pixel(4, 4, Luma([0]));

        let filtered = median_filter_3x3(&image);
        assert_eq!(filtered.get_pixel(4, 4)[0], 200);
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = DynamicImage::new_luma8(0, 0);
        assert!(ScanPreprocessor::new().prepare(&image).is_err());
    }
}
