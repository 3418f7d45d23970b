//! Data types for uploaded files, extracted documents, chunks, and search results.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A raw document blob as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name, used for format detection and error reports.
    pub name: String,
    /// The raw bytes of the file.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file from a name and its bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    /// Lowercased file extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
    }
}

/// A single page of extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Zero-based position of the page in its document.
    pub index: usize,
    /// The page text.
    pub text: String,
}

/// An extracted document: an ordered sequence of pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// File name the document was extracted from.
    pub name: String,
    /// Pages in reading order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document with a fresh random ID.
    pub fn new(name: impl Into<String>, pages: Vec<Page>) -> Self {
        Self { id: uuid::Uuid::new_v4().to_string(), name: name.into(), pages }
    }

    /// Total number of characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// A bounded span of cleaned page text, the unit of retrieval.
///
/// `start_offset` and `length` are counted in chars of the cleaned page text.
/// `start_offset` points at the first char of `text`, including any overlap
/// carried over from the previous chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The file name of the parent [`Document`].
    pub document_name: String,
    /// Zero-based page index within the parent document.
    pub page: usize,
    /// Char offset of `text` within the cleaned page text.
    pub start_offset: usize,
    /// Length of `text` in chars.
    pub length: usize,
    /// Key-value metadata (`source`, `page`, `chunk_index`).
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Char offset one past the end of this chunk in the page text.
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

/// A [`Chunk`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// The chunk.
    pub chunk: Chunk,
    /// The vector embedding for the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`EmbeddedChunk`] paired with a similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: EmbeddedChunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

impl SearchResult {
    /// The text of the retrieved chunk.
    pub fn text(&self) -> &str {
        &self.chunk.chunk.text
    }
}
