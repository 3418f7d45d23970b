//! Batch ingestion: extract → clean → chunk → embed.
//!
//! The [`IngestionPipeline`] turns a batch of [`UploadedFile`]s into embedded
//! chunks ready for indexing. Documents are prepared independently on
//! blocking worker threads; a document that fails is recorded in the
//! [`IngestionReport`] and the rest of the batch carries on. Embedding starts
//! only once every document has been prepared.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{IngestionPipeline, RagConfig, UploadedFile};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let report = pipeline.ingest(vec![UploadedFile::new("handbook.pdf", bytes)]).await?;
//! for (name, reason) in report.failures() {
//!     eprintln!("skipped {name}: {reason}");
//! }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::cleaning::clean;
use crate::config::RagConfig;
use crate::document::{Chunk, EmbeddedChunk, UploadedFile};
use crate::embedding::{EmbeddingProvider, check_batch};
use crate::error::{RagError, Result};
use crate::extraction::{ExtensionExtractor, Extractor};

/// What happened to one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The file was extracted and chunked.
    Ingested {
        /// File name.
        name: String,
        /// ID assigned to the extracted document.
        document_id: String,
        /// Number of non-empty pages.
        pages: usize,
        /// Number of chunks produced.
        chunks: usize,
    },
    /// The file was skipped.
    Failed {
        /// File name.
        name: String,
        /// Why the file could not be used.
        reason: String,
    },
}

impl DocumentOutcome {
    /// The file name this outcome is about.
    pub fn name(&self) -> &str {
        match self {
            Self::Ingested { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    /// Whether the file contributed chunks.
    pub fn is_ingested(&self) -> bool {
        matches!(self, Self::Ingested { .. })
    }
}

/// Per-document outcomes of a batch plus the embedded chunks it produced.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    /// One outcome per input file, in input order.
    pub outcomes: Vec<DocumentOutcome>,
    /// Embedded chunks from every successful file, in input order.
    pub chunks: Vec<EmbeddedChunk>,
}

impl IngestionReport {
    /// Number of files that contributed chunks.
    pub fn ingested_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ingested()).count()
    }

    /// `(file name, reason)` for every skipped file.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DocumentOutcome::Failed { name, reason } => Some((name.as_str(), reason.as_str())),
                DocumentOutcome::Ingested { .. } => None,
            })
            .collect()
    }

    /// Whether the batch produced no chunks at all.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// A document that made it through extraction, cleaning and chunking.
struct PreparedDocument {
    document_id: String,
    pages: usize,
    chunks: Vec<Chunk>,
}

fn prepare(
    extractor: &dyn Extractor,
    chunker: &dyn Chunker,
    file: &UploadedFile,
) -> Result<PreparedDocument> {
    let mut document = extractor.extract(file)?;
    for page in &mut document.pages {
        page.text = clean(&page.text);
    }
    document.pages.retain(|page| !page.text.is_empty());

    let chunks = chunker.chunk(&document);
    if chunks.is_empty() {
        return Err(RagError::extraction(&file.name, "no text left after cleaning"));
    }

    Ok(PreparedDocument { document_id: document.id, pages: document.pages.len(), chunks })
}

/// The ingestion driver.
///
/// Construct one via [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    config: RagConfig,
    extractor: Arc<dyn Extractor>,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Ingest a batch of files.
    ///
    /// Per-file failures (unsupported format, unparsable payload, no text)
    /// are reported in [`IngestionReport::outcomes`] and never abort the
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] or [`RagError::DimensionMismatch`]
    /// if the embedding provider rejects the batch. No partial report is
    /// returned in that case.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<IngestionReport> {
        let file_count = files.len();

        // 1. Extract, clean and chunk every file on a blocking worker
        let tasks = files.into_iter().map(|file| {
            let extractor = Arc::clone(&self.extractor);
            let chunker = Arc::clone(&self.chunker);
            let name = file.name.clone();
            let handle =
                tokio::task::spawn_blocking(move || prepare(extractor.as_ref(), chunker.as_ref(), &file));
            async move { (name, handle.await) }
        });
        let prepared = join_all(tasks).await;

        // 2. Sort outcomes; every worker has joined at this point
        let mut outcomes = Vec::with_capacity(file_count);
        let mut pending = Vec::new();
        for (name, joined) in prepared {
            match joined {
                Ok(Ok(document)) => {
                    info!(
                        document = %name,
                        page_count = document.pages,
                        chunk_count = document.chunks.len(),
                        "prepared document"
                    );
                    outcomes.push(DocumentOutcome::Ingested {
                        name,
                        document_id: document.document_id,
                        pages: document.pages,
                        chunks: document.chunks.len(),
                    });
                    pending.extend(document.chunks);
                }
                Ok(Err(e)) => {
                    warn!(document = %name, error = %e, "skipping document");
                    outcomes.push(DocumentOutcome::Failed { name, reason: e.to_string() });
                }
                Err(e) => {
                    warn!(document = %name, error = %e, "extraction worker aborted");
                    outcomes
                        .push(DocumentOutcome::Failed { name, reason: format!("extraction aborted: {e}") });
                }
            }
        }

        // 3. Embed everything that survived
        let chunks = self.embed(pending).await?;

        let report = IngestionReport { outcomes, chunks };
        info!(
            file_count,
            ingested = report.ingested_count(),
            failed = file_count - report.ingested_count(),
            chunk_count = report.chunks.len(),
            "ingestion batch completed"
        );
        Ok(report)
    }

    /// Attach embeddings to `chunks`, keeping their order.
    async fn embed(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let provider = &self.embedding_provider;
        let embeddings: Vec<Vec<Vec<f32>>> =
            stream::iter(chunks.chunks(self.config.embedding_batch_size))
                .map(|batch| async move {
                    let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
                    let embeddings = provider.embed_batch(&texts).await.map_err(|e| {
                        error!(provider = provider.name(), error = %e, "embedding failed during ingestion");
                        e
                    })?;
                    check_batch(provider.as_ref(), texts.len(), &embeddings)?;
                    Ok::<_, RagError>(embeddings)
                })
                .buffered(self.config.embedding_concurrency)
                .try_collect()
                .await?;

        Ok(chunks
            .into_iter()
            .zip(embeddings.into_iter().flatten())
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect())
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// `config` and `embedding_provider` are required. The extractor defaults to
/// [`ExtensionExtractor`] and the chunker to a [`RecursiveChunker`] sized from
/// the config.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    extractor: Option<Arc<dyn Extractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document extractor.
    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the [`IngestionPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::from_config(&config)?),
        };
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(ExtensionExtractor::new()));

        Ok(IngestionPipeline { config, extractor, chunker, embedding_provider })
    }
}
