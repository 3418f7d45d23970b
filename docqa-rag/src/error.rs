//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// A single document could not be turned into text.
    ///
    /// Non-fatal during batch ingestion: the pipeline records it as a failed
    /// document and moves on.
    #[error("Extraction error ({document}): {message}")]
    ExtractionError {
        /// Name of the document that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingestion produced no chunks, so there is nothing to index.
    #[error("No documents usable: the index would be empty")]
    EmptyIndexError,

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation provider failed or timed out.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality the index was built with.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// An error in the vector index.
    #[error("Index error: {0}")]
    IndexError(String),
}

impl RagError {
    /// Shorthand for an [`RagError::ExtractionError`].
    pub fn extraction(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionError { document: document.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
