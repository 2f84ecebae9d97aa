//! Text recognition through a remote OCR service.

mod credentials;
mod service_account;
mod vision;

pub use credentials::Credentials;
pub use service_account::ServiceAccountKey;
pub use vision::VisionClient;

use async_trait::async_trait;

use crate::error::OcrError;
use crate::loader::PageImage;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Turns a page image into unstructured text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the full text of a page.
    ///
    /// Returns an empty string when the service finds no text.
    async fn recognize(&self, page: &PageImage) -> Result<String>;
}
