//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text on a priority list of separators (paragraph break, line break,
//! space, then anywhere) and links consecutive chunks with a fixed overlap.

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separators tried in order, most structurally significant first.
///
/// The empty separator means "split anywhere" and guarantees termination.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and position metadata but no
/// embeddings. Embeddings are attached later by the ingestion pipeline.
pub trait Chunker: Send + Sync {
    /// Split every page of a document into chunks.
    ///
    /// Pages are chunked independently; no chunk spans a page boundary.
    /// Returns an empty `Vec` if all pages are empty.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// A piece of chunked text and where it sits in the source, in chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// The chunk text, including the overlap carried from the previous span.
    pub text: String,
    /// Char offset of `text` in the source.
    pub start_offset: usize,
    /// Length of `text` in chars.
    pub length: usize,
}

/// Splits text recursively by separator priority, then merges the pieces
/// into overlap-linked chunks.
///
/// Every chunk after the first begins with the last `chunk_overlap` chars of
/// the previous chunk, and no chunk is longer than `chunk_size` chars. The only
/// exception is a token longer than `chunk_size` that no configured separator
/// can break, which is emitted whole. With the default separators that cannot
/// happen. When a custom separator list leaves a token that fits `chunk_size`
/// but not the body budget, the carried overlap is shortened to keep the chunk
/// within `chunk_size`.
///
/// Chunk IDs are generated as `{document_id}_{page}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the [`DEFAULT_SEPARATORS`].
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters repeated from the previous chunk
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Create a chunker from the sizes in a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list. Order is priority, most significant first.
    ///
    /// Leaving out the empty separator allows oversized atomic chunks.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum chunk length in chars.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in chars.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlap-linked spans.
    pub fn split(&self, text: &str) -> Vec<TextSpan> {
        // Later chunks spend `chunk_overlap` chars on carried context, so no
        // piece may be longer than what is left.
        let body_budget = self.chunk_size - self.chunk_overlap;
        let mut pieces = Vec::new();
        split_pieces(text, &self.separators, body_budget, &mut pieces);

        let mut spans: Vec<TextSpan> = Vec::new();
        let mut body = String::new();
        let mut body_len = 0;
        let mut body_start = 0;
        let mut cursor = 0;

        for piece in pieces {
            let piece_len = char_len(piece);
            let budget = if spans.is_empty() { self.chunk_size } else { body_budget };
            if body_len > 0 && body_len + piece_len > budget {
                let span = self.link(spans.last(), &body, body_start, body_len);
                spans.push(span);
                body.clear();
                body_len = 0;
                body_start = cursor;
            }
            body.push_str(piece);
            body_len += piece_len;
            cursor += piece_len;
        }

        if body_len > 0 {
            let span = self.link(spans.last(), &body, body_start, body_len);
            spans.push(span);
        }

        spans
    }

    /// Prefix `body` with the tail of the previous span.
    fn link(
        &self,
        previous: Option<&TextSpan>,
        body: &str,
        body_start: usize,
        body_len: usize,
    ) -> TextSpan {
        let Some(previous) = previous else {
            return TextSpan { text: body.to_string(), start_offset: body_start, length: body_len };
        };

        // An atomic piece longer than the body budget shrinks the carry so the
        // chunk still fits; only a piece longer than `chunk_size` gets none.
        let carried = self
            .chunk_overlap
            .min(previous.length)
            .min(self.chunk_size.saturating_sub(body_len));
        let mut text: String = previous.text.chars().skip(previous.length - carried).collect();
        text.push_str(body);
        TextSpan { text, start_offset: body_start - carried, length: carried + body_len }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &document.pages {
            for (i, span) in self.split(&page.text).into_iter().enumerate() {
                let metadata = [
                    ("source".to_string(), document.name.clone()),
                    ("page".to_string(), page.index.to_string()),
                    ("chunk_index".to_string(), i.to_string()),
                ]
                .into_iter()
                .collect();

                chunks.push(Chunk {
                    id: format!("{}_{}_{i}", document.id, page.index),
                    text: span.text,
                    document_id: document.id.clone(),
                    document_name: document.name.clone(),
                    page: page.index,
                    start_offset: span.start_offset,
                    length: span.length,
                    metadata,
                });
            }
        }

        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Break `text` into pieces of at most `budget` chars, trying separators in
/// order. Pieces are contiguous slices, so concatenating them gives `text`
/// back.
fn split_pieces<'a>(text: &'a str, separators: &[String], budget: usize, pieces: &mut Vec<&'a str>) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= budget {
        pieces.push(text);
        return;
    }

    let Some((separator, remaining)) = separators.split_first() else {
        // Nothing left to split on: keep the atomic token whole.
        pieces.push(text);
        return;
    };

    if separator.is_empty() {
        split_anywhere(text, budget, pieces);
        return;
    }

    if !text.contains(separator.as_str()) {
        split_pieces(text, remaining, budget, pieces);
        return;
    }

    for segment in split_keeping_separator(text, separator) {
        split_pieces(segment, remaining, budget, pieces);
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Cut text into windows of `size` chars, respecting char boundaries.
fn split_anywhere<'a>(text: &'a str, size: usize, pieces: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;

    for (i, _) in text.char_indices() {
        if count == size {
            pieces.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }
}
