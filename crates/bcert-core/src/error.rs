//! Error types for the bcert-core library.

use thiserror::Error;

/// Main error type for the bcert library.
#[derive(Error, Debug)]
pub enum BcertError {
    /// Document conversion error (PDF parsing or page rendering).
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// OCR service error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Date parsing error in the reporting view.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A document in a batch failed.
    #[error("failed to process {}: {source}", .path.display())]
    Document {
        path: std::path::PathBuf,
        #[source]
        source: Box<BcertError>,
    },
}

/// Errors raised while turning a document into page images.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Rendering a page to an image failed.
    #[error("failed to render pages: {0}")]
    Render(String),

    /// An external rendering tool could not be executed.
    #[error("rendering tool not available: {0}")]
    MissingTool(String),
}

/// Errors related to the remote text-recognition service.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Credentials are missing or unusable.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service reported an error for the request.
    #[error("service error: {message}")]
    Service { message: String },

    /// The service response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised when deriving the year of birth from the result table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Date of birth is empty.
    #[error("row {row}: date of birth is empty")]
    EmptyDate { row: usize },

    /// Date of birth is not a recognizable date.
    #[error("row {row}: unrecognized date of birth {value:?}")]
    InvalidDate { row: usize, value: String },
}

/// Result type for the bcert library.
pub type Result<T> = std::result::Result<T, BcertError>;
