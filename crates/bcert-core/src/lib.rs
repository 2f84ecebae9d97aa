//! Core library for birth certificate OCR processing.
//!
//! This crate provides:
//! - Document discovery and PDF page rasterization
//! - A client for the Google Cloud Vision text detection API
//! - Label-based extraction of Name, Date of Birth, and Place of Birth
//! - Batch aggregation into a result table
//! - Births-per-year reporting

pub mod batch;
pub mod error;
pub mod extract;
pub mod loader;
pub mod models;
pub mod ocr;
pub mod report;

pub use batch::{BatchMode, BatchOutcome, BatchProcessor, DocumentFailure};
pub use error::{BcertError, ConversionError, OcrError, ParseError, Result};
pub use extract::{CertificateExtractor, RecordExtractor, extract_fields};
pub use loader::{Document, DocumentKind, DocumentLoader, FormatFilter, PageImage, discover};
pub use models::{BcertConfig, FieldName, FieldRecord, ResultTable};
pub use ocr::{Credentials, TextRecognizer, VisionClient};
pub use report::{BirthsPerYear, birth_years, parse_birth_date};
