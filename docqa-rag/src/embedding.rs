//! Embedding capability: text in, fixed-dimension vector out.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that maps text to vectors of a fixed dimensionality.
///
/// Every vector returned during one index lifetime must have
/// [`dimensions`](EmbeddingProvider::dimensions) entries; the index refuses
/// to build from mixed dimensions. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; providers with a native
/// batch endpoint should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("What is the refund policy?").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Check that a batch response has one vector per input, each of the
/// provider's dimensionality.
pub(crate) fn check_batch(
    provider: &dyn EmbeddingProvider,
    expected_len: usize,
    embeddings: &[Vec<f32>],
) -> Result<()> {
    if embeddings.len() != expected_len {
        return Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: format!("expected {expected_len} embeddings, got {}", embeddings.len()),
        });
    }
    let dimensions = provider.dimensions();
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: bad.len() });
    }
    Ok(())
}
