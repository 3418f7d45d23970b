//! Retrieval-augmented answering over the ingested documents.
//!
//! The [`RetrievalOrchestrator`] owns the current index and composes answers:
//! embed the question, pull the top-k chunks, assemble a bounded context and
//! hand it to a [`GenerationProvider`] together with the caller's history.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RetrievalOrchestrator, record_exchange};
//!
//! let mut orchestrator = RetrievalOrchestrator::builder()
//!     .pipeline(pipeline)
//!     .generation_provider(Arc::new(generator))
//!     .build()?;
//!
//! orchestrator.ingest(files).await?;
//! let answer = orchestrator.answer("What is the refund policy?", &history).await?;
//! record_exchange(&mut history, "What is the refund policy?", &answer);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::conversation::ConversationTurn;
use crate::document::{EmbeddedChunk, SearchResult, UploadedFile};
use crate::error::{RagError, Result};
use crate::generation::{GenerationProvider, GenerationRequest};
use crate::index::VectorIndex;
use crate::inmemory::InMemoryVectorIndex;
use crate::pipeline::{IngestionPipeline, IngestionReport};

/// System instruction sent with every question.
pub const GROUNDING_INSTRUCTION: &str = "Answer the question based solely on the provided \
context. If the answer is not available in the context, respond that you do not know and \
that more information is required.";

/// Answer returned while no documents have been indexed.
pub const UNREADY_REFUSAL: &str = "I do not know. No documents have been processed yet, so I \
need more information before I can answer.";

/// Placed between consecutive chunk texts in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Whether the orchestrator can answer questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorState {
    /// No index: nothing has been ingested, or nothing ingested was usable.
    Unready,
    /// An index is built and questions are answered from it.
    Ready,
}

/// A generated answer and the chunks it was grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    /// The generated text, verbatim.
    pub answer: String,
    /// Retrieved chunks by descending score. Empty for the unready refusal.
    pub sources: Vec<SearchResult>,
}

/// Concatenate retrieved chunk texts in the given order, separated by
/// [`CONTEXT_SEPARATOR`], without exceeding `max_chars` chars.
///
/// A chunk that would overflow the budget is cut to fit and nothing after it
/// is added.
pub fn assemble_context(results: &[SearchResult], max_chars: usize) -> String {
    let separator_len = CONTEXT_SEPARATOR.chars().count();
    let mut context = String::new();
    let mut used = 0;

    for result in results {
        let gap = if context.is_empty() { 0 } else { separator_len };
        let remaining = max_chars.saturating_sub(used + gap);
        if remaining == 0 {
            break;
        }
        if gap > 0 {
            context.push_str(CONTEXT_SEPARATOR);
        }

        let text = result.text();
        let len = text.chars().count();
        if len <= remaining {
            context.push_str(text);
            used += gap + len;
        } else {
            context.extend(text.chars().take(remaining));
            break;
        }
    }

    context
}

/// Answers questions from the indexed documents.
///
/// Starts [`Unready`](OrchestratorState::Unready). A successful
/// [`ingest`](Self::ingest) that yields at least one chunk makes it
/// [`Ready`](OrchestratorState::Ready). Answering borrows `&self` and the
/// index is immutable, so questions never contend with each other; ingestion
/// needs `&mut self`.
pub struct RetrievalOrchestrator {
    pipeline: IngestionPipeline,
    generation_provider: Arc<dyn GenerationProvider>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl RetrievalOrchestrator {
    /// Create a new [`RetrievalOrchestratorBuilder`].
    pub fn builder() -> RetrievalOrchestratorBuilder {
        RetrievalOrchestratorBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        self.pipeline.config()
    }

    /// Return the current state.
    pub fn state(&self) -> OrchestratorState {
        if self.index.is_some() { OrchestratorState::Ready } else { OrchestratorState::Unready }
    }

    /// Whether questions are answered from an index.
    pub fn is_ready(&self) -> bool {
        self.state() == OrchestratorState::Ready
    }

    /// Number of indexed chunks (0 when unready).
    pub fn chunk_count(&self) -> usize {
        self.index.as_ref().map_or(0, |index| index.len())
    }

    /// Return the current index, if any.
    pub fn index(&self) -> Option<&Arc<dyn VectorIndex>> {
        self.index.as_ref()
    }

    /// Ingest a batch of files and rebuild the index from the union of the
    /// chunks already indexed and the new ones.
    ///
    /// If the union is empty the orchestrator stays unready; that is not an
    /// error. Failed files are listed in the returned report.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error if the embedding provider rejects the
    /// batch, or [`RagError::DimensionMismatch`] if the new vectors do not
    /// match the existing index. The current state is left untouched in both
    /// cases.
    pub async fn ingest(&mut self, files: Vec<UploadedFile>) -> Result<IngestionReport> {
        let report = self.pipeline.ingest(files).await?;
        self.rebuild(&report.chunks)?;
        Ok(report)
    }

    fn rebuild(&mut self, new_chunks: &[EmbeddedChunk]) -> Result<()> {
        let mut union: Vec<EmbeddedChunk> =
            self.index.as_ref().map(|index| index.entries().to_vec()).unwrap_or_default();
        union.extend_from_slice(new_chunks);

        match InMemoryVectorIndex::build(self.config().metric, union) {
            Ok(index) => {
                info!(chunk_count = index.len(), "index rebuilt");
                self.index = Some(Arc::new(index));
                Ok(())
            }
            Err(RagError::EmptyIndexError) => {
                warn!("no documents could be processed; staying unready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "index rebuild failed");
                Err(e)
            }
        }
    }

    /// Embed `query` and return the top-k chunks. Empty when unready.
    ///
    /// # Errors
    ///
    /// Returns the embedding provider's error, or
    /// [`RagError::DimensionMismatch`] if the query vector does not match the
    /// index.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let Some(index) = &self.index else {
            return Ok(Vec::new());
        };
        self.search(index.as_ref(), query).await
    }

    async fn search(&self, index: &dyn VectorIndex, query: &str) -> Result<Vec<SearchResult>> {
        let provider = self.pipeline.embedding_provider();
        let query_embedding = provider.embed(query).await.map_err(|e| {
            error!(provider = provider.name(), error = %e, "embedding failed during query");
            e
        })?;
        index.search(&query_embedding, self.config().top_k)
    }

    /// Answer `query` from the indexed documents.
    ///
    /// Returns the generated text verbatim, or [`UNREADY_REFUSAL`] without
    /// contacting any provider when nothing is indexed. The caller owns
    /// `history` and appends the new exchange itself (see
    /// [`record_exchange`](crate::record_exchange)).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationError`] if generation fails; no answer is
    /// fabricated in that case. Query embedding errors are propagated as-is.
    pub async fn answer(&self, query: &str, history: &[ConversationTurn]) -> Result<String> {
        self.answer_with_sources(query, history).await.map(|result| result.answer)
    }

    /// Like [`answer`](Self::answer), but also returns the retrieved chunks.
    pub async fn answer_with_sources(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> Result<RetrievalResult> {
        let Some(index) = &self.index else {
            info!("no index built; refusing to answer");
            return Ok(RetrievalResult { answer: UNREADY_REFUSAL.to_string(), sources: Vec::new() });
        };

        let sources = self.search(index.as_ref(), query).await?;
        let context = assemble_context(&sources, self.config().max_context_chars);

        let request = GenerationRequest {
            instruction: GROUNDING_INSTRUCTION,
            history,
            context: &context,
            query,
        };
        let answer = self.generation_provider.generate(&request).await.map_err(|e| {
            error!(provider = self.generation_provider.name(), error = %e, "generation failed");
            e
        })?;

        info!(
            source_count = sources.len(),
            context_chars = context.chars().count(),
            history_turns = history.len(),
            "answered question"
        );
        Ok(RetrievalResult { answer, sources })
    }
}

/// Builder for constructing a [`RetrievalOrchestrator`].
///
/// `pipeline` and `generation_provider` are required; `index` installs a
/// prebuilt index and starts the orchestrator ready.
#[derive(Default)]
pub struct RetrievalOrchestratorBuilder {
    pipeline: Option<IngestionPipeline>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl RetrievalOrchestratorBuilder {
    /// Set the ingestion pipeline (which also supplies the config and the
    /// embedding provider used for questions).
    pub fn pipeline(mut self, pipeline: IngestionPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Start from a prebuilt index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`RetrievalOrchestrator`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, or
    /// if the prebuilt index is empty or its dimensionality differs from the
    /// embedding provider's.
    pub fn build(self) -> Result<RetrievalOrchestrator> {
        let pipeline = self
            .pipeline
            .ok_or_else(|| RagError::ConfigError("pipeline is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::ConfigError("generation_provider is required".to_string()))?;

        if let Some(index) = &self.index {
            if index.is_empty() {
                return Err(RagError::ConfigError("prebuilt index is empty".to_string()));
            }
            let expected = pipeline.embedding_provider().dimensions();
            if index.dimensions() != expected {
                return Err(RagError::ConfigError(format!(
                    "prebuilt index has {} dimensions, embedding provider produces {expected}",
                    index.dimensions()
                )));
            }
        }

        Ok(RetrievalOrchestrator { pipeline, generation_provider, index: self.index })
    }
}
