//! Batch processing: folder of documents in, result table out.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{BcertError, Result};
use crate::extract::{CertificateExtractor, RecordExtractor};
use crate::loader::{Document, DocumentLoader, FormatFilter, discover};
use crate::models::record::FieldRecord;
use crate::models::table::ResultTable;
use crate::ocr::TextRecognizer;

/// What to do when a document fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// Abort the whole run on the first failure; no table is produced.
    Strict,
    /// Record the failure and continue with the next document.
    #[default]
    Lenient,
}

/// A document that could not be processed.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One row per successfully processed document.
    pub table: ResultTable,
    /// Source path of each row, aligned with the table rows.
    pub sources: Vec<PathBuf>,
    /// Documents that failed (lenient mode only).
    pub failures: Vec<DocumentFailure>,
}

/// Drives loading, recognition, and extraction for each document in turn.
pub struct BatchProcessor<R> {
    loader: DocumentLoader,
    recognizer: R,
    extractor: CertificateExtractor,
    mode: BatchMode,
}

impl<R: TextRecognizer> BatchProcessor<R> {
    pub fn new(loader: DocumentLoader, recognizer: R) -> Self {
        Self {
            loader,
            recognizer,
            extractor: CertificateExtractor::new(),
            mode: BatchMode::default(),
        }
    }

    /// Set the failure mode.
    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Recognize the full text of a document.
    ///
    /// Page texts are joined in page order. A document without pages yields
    /// an empty string.
    pub async fn recognize_document(&self, document: &Document) -> Result<String> {
        let pages = self.loader.load(document)?;

        let mut text = String::new();
        for page in &pages {
            let page_text = self.recognizer.recognize(page).await?;
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&page_text);
        }

        debug!(
            "{}: {} pages, {} characters",
            document.path.display(),
            pages.len(),
            text.len()
        );
        Ok(text)
    }

    /// Load, recognize, and extract a single document.
    pub async fn process_document(&self, document: &Document) -> Result<FieldRecord> {
        let text = self.recognize_document(document).await?;
        Ok(self.extractor.extract(&text))
    }

    /// Process every matching document in a folder.
    pub async fn run(&self, folder: &Path, filter: FormatFilter) -> Result<BatchOutcome> {
        let documents = discover(folder, filter)?;
        self.run_documents(&documents, |_, _| {}).await
    }

    /// Process the given documents in order.
    ///
    /// `on_done` is called after each document with its index and the
    /// document itself, whether it succeeded or not.
    pub async fn run_documents<F>(&self, documents: &[Document], mut on_done: F) -> Result<BatchOutcome>
    where
        F: FnMut(usize, &Document),
    {
        let mut outcome = BatchOutcome::default();

        for (index, document) in documents.iter().enumerate() {
            info!("Processing {}", document.path.display());

            match self.process_document(document).await {
                Ok(record) => {
                    outcome.table.push(record);
                    outcome.sources.push(document.path.clone());
                }
                Err(e) => match self.mode {
                    BatchMode::Strict => {
                        error!("Failed to process {}: {}", document.path.display(), e);
                        return Err(BcertError::Document {
                            path: document.path.clone(),
                            source: Box::new(e),
                        });
                    }
                    BatchMode::Lenient => {
                        warn!("Failed to process {}: {}", document.path.display(), e);
                        outcome.failures.push(DocumentFailure {
                            path: document.path.clone(),
                            error: e.to_string(),
                        });
                    }
                },
            }

            on_done(index, document);
        }

        info!(
            "Batch complete: {} rows, {} failures",
            outcome.table.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
