//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the contex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Text acquisition configuration.
    pub acquisition: AcquisitionConfig,

    /// Extraction and analysis configuration.
    pub extraction: ExtractionConfig,
}

/// Text acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Minimum trimmed text length for a page to count as digital; shorter
    /// pages go through the OCR fallback.
    pub min_text_length: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            max_pages: 0,
        }
    }
}

/// Extraction and analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Confidence below which a present field is flagged as a gap.
    pub low_confidence_threshold: f32,

    /// Stricter bar applied to derived values before they are trusted.
    pub derived_confidence_threshold: f32,

    /// How far past a detected table header line items are scanned, in
    /// characters.
    pub table_scan_window: usize,

    /// Lookahead window after a total keyword for the money amount, in
    /// characters.
    pub money_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.6,
            derived_confidence_threshold: 0.7,
            table_scan_window: 1500,
            money_window: 120,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.acquisition.min_text_length, 100);
        assert_eq!(config.extraction.table_scan_window, 1500);
        assert_eq!(config.extraction.money_window, 120);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"acquisition": {"max_pages": 5}}"#).unwrap();
        assert_eq!(config.acquisition.max_pages, 5);
        assert_eq!(config.acquisition.min_text_length, 100);
        assert_eq!(config.extraction.low_confidence_threshold, 0.6);
    }
}
