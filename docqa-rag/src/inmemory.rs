//! In-memory vector index using exhaustive similarity search.
//!
//! This module provides [`InMemoryVectorIndex`], a brute-force index backed by
//! a `Vec`. It scores every chunk on each query, which is plenty for the few
//! thousand chunks a handful of uploaded documents produce.

use tracing::debug;

use crate::document::{EmbeddedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::index::{SimilarityMetric, VectorIndex};

/// A read-only in-memory index scored with a fixed [`SimilarityMetric`].
#[derive(Debug, Clone)]
pub struct InMemoryVectorIndex {
    metric: SimilarityMetric,
    dimensions: usize,
    entries: Vec<EmbeddedChunk>,
}

impl InMemoryVectorIndex {
    /// Build an index from a complete set of embedded chunks.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndexError`] if `chunks` is empty
    /// - [`RagError::IndexError`] if the first embedding is empty
    /// - [`RagError::DimensionMismatch`] if the embeddings differ in length
    pub fn build(metric: SimilarityMetric, chunks: Vec<EmbeddedChunk>) -> Result<Self> {
        let Some(first) = chunks.first() else {
            return Err(RagError::EmptyIndexError);
        };

        let dimensions = first.embedding.len();
        if dimensions == 0 {
            return Err(RagError::IndexError(format!(
                "chunk '{}' has an empty embedding",
                first.chunk.id
            )));
        }
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            });
        }

        debug!(chunk_count = chunks.len(), dimensions, ?metric, "built vector index");
        Ok(Self { metric, dimensions, entries: chunks })
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.score(&entry.embedding, query)))
            .collect();

        // Stable sort: equal scores stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.entries[i].clone(), score })
            .collect())
    }
}
