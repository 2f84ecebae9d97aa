//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the bcert pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BcertConfig {
    /// OCR service configuration.
    pub ocr: OcrConfig,

    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,

    /// Chart rendering configuration.
    pub report: ReportConfig,
}

/// Text detection feature requested from the OCR service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionFeature {
    /// Sparse text detection, suited to photos and forms.
    #[default]
    TextDetection,
    /// Dense document text detection.
    DocumentTextDetection,
}

impl DetectionFeature {
    /// Feature name as the service expects it.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            DetectionFeature::TextDetection => "TEXT_DETECTION",
            DetectionFeature::DocumentTextDetection => "DOCUMENT_TEXT_DETECTION",
        }
    }
}

/// OCR service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Base URL of the Vision API.
    pub endpoint: String,

    /// Path to the credentials file: a service-account key, or JSON with
    /// `api_key` or `access_token`.
    pub credentials_path: Option<PathBuf>,

    /// Detection feature to request.
    pub feature: DetectionFeature,

    /// Language hints passed with each request.
    pub language_hints: Vec<String>,

    /// Request timeout in seconds. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            credentials_path: None,
            feature: DetectionFeature::default(),
            language_hints: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// How PDF pages are turned into images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterizerKind {
    /// Render pages with poppler's `pdftoppm`.
    #[default]
    Pdftoppm,
    /// Use the scanned image embedded in each page.
    Embedded,
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Rasterizer implementation.
    pub rasterizer: RasterizerKind,

    /// DPI for rendering PDF pages to images.
    pub dpi: u32,

    /// Maximum pages to render per PDF (0 = unlimited).
    pub max_pages: usize,

    /// Name or path of the `pdftoppm` executable.
    pub pdftoppm_path: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerKind::default(),
            dpi: 200,
            max_pages: 0,
            pdftoppm_path: "pdftoppm".to_string(),
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Abort the whole batch on the first failing document.
    pub strict: bool,
}

/// Chart rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Width in characters of the longest terminal bar.
    pub chart_width: usize,

    /// PNG chart width in pixels.
    pub png_width: u32,

    /// PNG chart height in pixels.
    pub png_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            chart_width: 50,
            png_width: 1000,
            png_height: 600,
        }
    }
}

impl BcertConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BcertConfig =
            serde_json::from_str(r#"{"pdf": {"dpi": 300}, "batch": {"strict": true}}"#).unwrap();

        assert_eq!(config.pdf.dpi, 300);
        assert_eq!(config.pdf.rasterizer, RasterizerKind::Pdftoppm);
        assert!(config.batch.strict);
        assert_eq!(config.ocr.endpoint, "https://vision.googleapis.com");
        assert_eq!(config.ocr.timeout_secs, None);
    }

    #[test]
    fn test_feature_names() {
        let config: OcrConfig =
            serde_json::from_str(r#"{"feature": "document_text_detection"}"#).unwrap();
        assert_eq!(config.feature.as_api_str(), "DOCUMENT_TEXT_DETECTION");
        assert_eq!(DetectionFeature::default().as_api_str(), "TEXT_DETECTION");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BcertConfig::default();
        config.ocr.language_hints = vec!["en".to_string()];
        config.pdf.rasterizer = RasterizerKind::Embedded;
        config.save(&path).unwrap();

        let loaded = BcertConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language_hints, vec!["en".to_string()]);
        assert_eq!(loaded.pdf.rasterizer, RasterizerKind::Embedded);
    }
}
