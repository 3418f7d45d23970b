//! # docqa-rag
//!
//! Grounded question answering over a batch of uploaded documents.
//!
//! Ingestion runs extract → clean → chunk → embed for every file, isolating
//! per-file failures, and builds an immutable vector index once the whole
//! batch has joined. Questions are answered by embedding the query, pulling
//! the top-k chunks, and asking a generation provider to answer from that
//! context only.
//!
//! | Stage | Types |
//! |-------|-------|
//! | Extract | [`Extractor`], [`PdfExtractor`], [`PlainTextExtractor`], [`ExtensionExtractor`] |
//! | Clean | [`clean`] |
//! | Chunk | [`Chunker`], [`RecursiveChunker`] |
//! | Embed | [`EmbeddingProvider`] |
//! | Index | [`VectorIndex`], [`InMemoryVectorIndex`] |
//! | Answer | [`RetrievalOrchestrator`], [`GenerationProvider`] |
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIEmbeddingProvider`] and
//!   [`openai::OpenAIGenerationProvider`] over `reqwest`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{IngestionPipeline, RagConfig, RetrievalOrchestrator, UploadedFile};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .build()?;
//! let mut orchestrator = RetrievalOrchestrator::builder()
//!     .pipeline(pipeline)
//!     .generation_provider(Arc::new(generator))
//!     .build()?;
//!
//! let report = orchestrator.ingest(vec![UploadedFile::new("terms.pdf", bytes)]).await?;
//! let answer = orchestrator.answer("What is the refund policy?", &[]).await?;
//! ```

pub mod chunking;
pub mod cleaning;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod inmemory;
pub mod orchestrator;
pub mod pipeline;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, DEFAULT_SEPARATORS, RecursiveChunker, TextSpan};
pub use cleaning::clean;
pub use config::{RagConfig, RagConfigBuilder};
pub use conversation::{ConversationTurn, Role, record_exchange};
pub use document::{Chunk, Document, EmbeddedChunk, Page, SearchResult, UploadedFile};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extraction::{ExtensionExtractor, Extractor, PdfExtractor, PlainTextExtractor};
pub use generation::{GenerationProvider, GenerationRequest};
pub use index::{SimilarityMetric, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
pub use orchestrator::{
    GROUNDING_INSTRUCTION, OrchestratorState, RetrievalOrchestrator, RetrievalOrchestratorBuilder,
    RetrievalResult, UNREADY_REFUSAL, assemble_context,
};
pub use pipeline::{DocumentOutcome, IngestionPipeline, IngestionPipelineBuilder, IngestionReport};
