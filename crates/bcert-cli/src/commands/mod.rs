//! CLI subcommands and the options they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod report;

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing::debug;

use bcert_core::models::config::{BcertConfig, DetectionFeature, OcrConfig, PdfConfig, RasterizerKind};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bcert")
        .join("config.json")
}

/// Load the configuration from `path`, else the default file if present, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<BcertConfig> {
    if let Some(path) = path {
        return Ok(BcertConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(BcertConfig::from_file(&default_path)?)
    } else {
        Ok(BcertConfig::default())
    }
}

/// OCR service options.
#[derive(Args, Debug, Default)]
pub struct OcrArgs {
    /// Credentials file (service-account key, or JSON with api_key or access_token)
    #[arg(long, env = "BCERT_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Vision API base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Use dense document text detection
    #[arg(long)]
    document_mode: bool,

    /// Language hint for recognition (repeatable)
    #[arg(long = "language-hint")]
    language_hints: Vec<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl OcrArgs {
    /// Override configuration values with the ones given on the command line.
    pub fn apply(&self, config: &mut OcrConfig) {
        if let Some(credentials) = &self.credentials {
            config.credentials_path = Some(credentials.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.document_mode {
            config.feature = DetectionFeature::DocumentTextDetection;
        }
        if !self.language_hints.is_empty() {
            config.language_hints = self.language_hints.clone();
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RasterizerArg {
    /// Render pages with pdftoppm
    Pdftoppm,
    /// Use the image embedded in each page
    Embedded,
}

impl From<RasterizerArg> for RasterizerKind {
    fn from(arg: RasterizerArg) -> Self {
        match arg {
            RasterizerArg::Pdftoppm => RasterizerKind::Pdftoppm,
            RasterizerArg::Embedded => RasterizerKind::Embedded,
        }
    }
}

/// PDF rendering options.
#[derive(Args, Debug, Default)]
pub struct PdfArgs {
    /// How PDF pages are turned into images
    #[arg(long, value_enum)]
    rasterizer: Option<RasterizerArg>,

    /// Rendering resolution for PDF pages
    #[arg(long)]
    dpi: Option<u32>,

    /// Maximum pages per PDF (0 = all)
    #[arg(long)]
    max_pages: Option<usize>,
}

impl PdfArgs {
    pub fn apply(&self, config: &mut PdfConfig) {
        if let Some(rasterizer) = self.rasterizer {
            config.rasterizer = rasterizer.into();
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
    }
}
