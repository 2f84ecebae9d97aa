//! Document discovery and conversion into page images.

mod pdf;

pub use pdf::{EmbeddedImageRasterizer, PdfRasterizer, PdftoppmRasterizer};

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BcertError, ConversionError, Result};
use crate::models::config::{PdfConfig, RasterizerKind};

/// Kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A single JPEG image.
    Image,
    /// A PDF whose pages are rendered to images.
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(DocumentKind::Image),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Which documents to pick up from a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFilter {
    /// `*.jpg` / `*.jpeg` images.
    #[default]
    Jpg,
    /// `*.pdf` documents.
    Pdf,
    /// Both images and PDFs.
    All,
}

impl FormatFilter {
    pub fn accepts(&self, kind: DocumentKind) -> bool {
        matches!(
            (self, kind),
            (FormatFilter::All, _)
                | (FormatFilter::Jpg, DocumentKind::Image)
                | (FormatFilter::Pdf, DocumentKind::Pdf)
        )
    }
}

/// A document queued for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl Document {
    /// Create a document from a path, detecting its kind by extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = DocumentKind::from_path(&path)?;
        Some(Self { path, kind })
    }
}

/// Encoded image of one page, ready to be sent for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Page number (1-indexed).
    pub page: u32,
    /// Encoded image bytes (JPEG for rendered pages).
    pub data: Vec<u8>,
}

/// List the documents directly inside `folder` that match `filter`.
///
/// Subdirectories are not traversed. The order is the glob order, which is
/// lexicographic by path.
pub fn discover(folder: &Path, filter: FormatFilter) -> Result<Vec<Document>> {
    if !folder.is_dir() {
        return Err(BcertError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", folder.display()),
        )));
    }

    let pattern = Path::new(&glob::Pattern::escape(&folder.to_string_lossy())).join("*");
    let pattern = pattern.to_string_lossy();

    let documents: Vec<Document> = glob(&pattern)
        .map_err(|e| BcertError::Config(format!("invalid folder pattern: {}", e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry {}: {}", e.path().display(), e.error());
                None
            }
        })
        .filter(|path| path.is_file())
        .filter_map(Document::from_path)
        .filter(|doc| filter.accepts(doc.kind))
        .collect();

    debug!(
        "Found {} documents in {} ({:?})",
        documents.len(),
        folder.display(),
        filter
    );
    Ok(documents)
}

/// Turns documents into page images.
pub struct DocumentLoader {
    rasterizer: Box<dyn PdfRasterizer>,
}

impl DocumentLoader {
    /// Create a loader that renders PDFs with the given rasterizer.
    pub fn new(rasterizer: Box<dyn PdfRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Create a loader with the rasterizer selected in the configuration.
    pub fn from_config(config: &PdfConfig) -> Self {
        let rasterizer: Box<dyn PdfRasterizer> = match config.rasterizer {
            RasterizerKind::Pdftoppm => Box::new(
                PdftoppmRasterizer::new(&config.pdftoppm_path)
                    .with_dpi(config.dpi)
                    .with_max_pages(config.max_pages),
            ),
            RasterizerKind::Embedded => {
                Box::new(EmbeddedImageRasterizer::new().with_max_pages(config.max_pages))
            }
        };
        Self::new(rasterizer)
    }

    /// Load the page images of a document, in page order.
    ///
    /// An image yields exactly one page holding the file's bytes. A PDF yields
    /// one page per rendered page, possibly none.
    pub fn load(&self, document: &Document) -> Result<Vec<PageImage>> {
        match document.kind {
            DocumentKind::Image => {
                let data = fs::read(&document.path)?;
                Ok(vec![PageImage { page: 1, data }])
            }
            DocumentKind::Pdf => {
                let pages = self.rasterizer.render(&document.path)?;
                debug!(
                    "Rendered {} pages from {}",
                    pages.len(),
                    document.path.display()
                );
                Ok(pages)
            }
        }
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::from_config(&PdfConfig::default())
    }
}

/// Map an I/O failure during conversion to a conversion error.
fn conversion_io(context: &str, err: std::io::Error) -> ConversionError {
    ConversionError::Render(format!("{}: {}", context, err))
}
