//! Turning uploaded files into page-level text.
//!
//! This module provides the [`Extractor`] trait and three implementations:
//!
//! - [`PdfExtractor`]: text-bearing PDFs, one page per PDF page
//! - [`PlainTextExtractor`]: UTF-8 text, pages separated by form feeds
//! - [`ExtensionExtractor`]: picks one of the above from the file extension

use std::io::Write;

use tracing::debug;

use crate::document::{Document, Page, UploadedFile};
use crate::error::{RagError, Result};

/// Page separator emitted by PDF text extraction and honoured in text files.
pub const PAGE_BREAK: char = '\u{000C}';

/// A strategy for turning a raw file into a [`Document`].
///
/// Extraction is CPU-bound and synchronous; the ingestion pipeline runs it on
/// blocking worker threads. A failure only affects the file being extracted.
pub trait Extractor: Send + Sync {
    /// Extract the pages of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the payload cannot be parsed or
    /// carries no text at all.
    fn extract(&self, file: &UploadedFile) -> Result<Document>;
}

/// Split extracted text on [`PAGE_BREAK`], dropping pages with no visible text.
///
/// Page indices keep their original position, so a blank page 2 leaves a gap
/// between pages 1 and 3.
pub fn split_pages(text: &str) -> Vec<Page> {
    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| Page { index, text: page.to_string() })
        .collect()
}

fn into_document(file: &UploadedFile, text: &str) -> Result<Document> {
    let pages = split_pages(text);
    if pages.is_empty() {
        return Err(RagError::extraction(&file.name, "no extractable text"));
    }
    debug!(document = %file.name, page_count = pages.len(), "extracted document");
    Ok(Document::new(&file.name, pages))
}

/// Extracts text from PDF files with `pdf-extract`.
///
/// The bytes are written to a temporary file for the duration of the
/// extraction. The file is removed when its guard drops, whether extraction
/// succeeds, fails, or unwinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new `PdfExtractor`.
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, file: &UploadedFile) -> Result<Document> {
        let mut temp = tempfile::Builder::new()
            .prefix("docqa-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| {
                RagError::extraction(&file.name, format!("failed to create temporary file: {e}"))
            })?;
        temp.write_all(&file.bytes).and_then(|()| temp.flush()).map_err(|e| {
            RagError::extraction(&file.name, format!("failed to write temporary file: {e}"))
        })?;

        let text = pdf_extract::extract_text(temp.path()).map_err(|e| {
            RagError::extraction(&file.name, format!("failed to extract PDF text: {e}"))
        })?;

        into_document(file, &text)
    }
}

/// Extracts UTF-8 text files. Form feeds start a new page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    /// Create a new `PlainTextExtractor`.
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PlainTextExtractor {
    fn extract(&self, file: &UploadedFile) -> Result<Document> {
        let text = std::str::from_utf8(&file.bytes)
            .map_err(|e| RagError::extraction(&file.name, format!("invalid UTF-8: {e}")))?;
        into_document(file, text)
    }
}

/// Dispatches on the file extension: `.pdf` to [`PdfExtractor`], `.txt` and
/// `.md` to [`PlainTextExtractor`]. Anything else is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionExtractor {
    pdf: PdfExtractor,
    text: PlainTextExtractor,
}

impl ExtensionExtractor {
    /// Create a new `ExtensionExtractor`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extractor for ExtensionExtractor {
    fn extract(&self, file: &UploadedFile) -> Result<Document> {
        match file.extension().as_deref() {
            Some("pdf") => self.pdf.extract(file),
            Some("txt" | "md") => self.text.extract(file),
            Some(other) => {
                Err(RagError::extraction(&file.name, format!("unsupported format '.{other}'")))
            }
            None => Err(RagError::extraction(&file.name, "unsupported format (no extension)")),
        }
    }
}
