//! Vector index trait for nearest-neighbour search over embedded chunks.

use serde::{Deserialize, Serialize};

use crate::document::{EmbeddedChunk, SearchResult};
use crate::error::Result;

/// How similarity between two vectors is scored. Higher is more similar.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine of the angle between the vectors, in `[-1, 1]`.
    #[default]
    Cosine,
    /// Raw inner product. Equivalent to cosine for unit-length embeddings.
    DotProduct,
}

impl SimilarityMetric {
    /// Score two vectors of equal length.
    ///
    /// Cosine returns 0.0 if either vector has zero magnitude.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        match self {
            Self::DotProduct => dot,
            Self::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                dot / (norm_a * norm_b)
            }
        }
    }
}

/// An immutable, searchable set of embedded chunks.
///
/// Indexes are built once from a complete batch and never mutated. Adding
/// documents means building a new index from the union of
/// [`entries`](VectorIndex::entries) and the new chunks. Since nothing
/// mutates an index after construction, searches need no locking.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorIndex, SimilarityMetric, VectorIndex};
///
/// let index = InMemoryVectorIndex::build(SimilarityMetric::Cosine, embedded_chunks)?;
/// let results = index.search(&query_embedding, 4)?;
/// ```
pub trait VectorIndex: Send + Sync {
    /// The metric fixed at build time.
    fn metric(&self) -> SimilarityMetric;

    /// Dimensionality shared by every vector in the index.
    fn dimensions(&self) -> usize;

    /// Every indexed chunk, in insertion order.
    fn entries(&self) -> &[EmbeddedChunk];

    /// Number of indexed chunks.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the index holds no chunks. Built indexes never are.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return at most `top_k` chunks most similar to `query`.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if `query` does not have [`dimensions`](VectorIndex::dimensions) entries.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
