//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docqa_rag::{
    ConversationTurn, EmbeddingProvider, GenerationProvider, GenerationRequest, IngestionPipeline,
    RagConfig, RagError, Result, RetrievalOrchestrator, UploadedFile,
};

pub const DIMENSIONS: usize = 64;

/// Answer returned by [`KeywordGenerator`] when the context lacks the keyword.
pub const I_DO_NOT_KNOW: &str = "I do not know. The documents do not contain that information.";

fn bucket(word: &str) -> usize {
    let hash = word.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    (hash % DIMENSIONS as u64) as usize
}

/// Bag-of-words embeddings: every lowercase word bumps one hashed bucket.
///
/// Texts sharing words end up close under cosine similarity.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            v[bucket(&word)] += 1.0;
        }
        v
    }

    pub fn total_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    fn name(&self) -> &str {
        "bag-of-words"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// An embedding provider whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "failing".into(), message: "quota exceeded".into() })
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// What a generator was asked.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub instruction: String,
    pub history: Vec<ConversationTurn>,
    pub context: String,
    pub query: String,
}

/// Answers with a canned reply when the context mentions the keyword, and
/// with [`I_DO_NOT_KNOW`] otherwise. Records every request.
pub struct KeywordGenerator {
    keyword: String,
    reply: String,
    pub calls: AtomicUsize,
    pub last: Mutex<Option<RecordedRequest>>,
}

impl KeywordGenerator {
    pub fn new(keyword: &str, reply: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for KeywordGenerator {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(RecordedRequest {
            instruction: request.instruction.to_string(),
            history: request.history.to_vec(),
            context: request.context.to_string(),
            query: request.query.to_string(),
        });

        if request.context.to_lowercase().contains(&self.keyword) {
            Ok(self.reply.clone())
        } else {
            Ok(I_DO_NOT_KNOW.to_string())
        }
    }
}

/// A generator that always fails, as a provider outage would.
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl GenerationProvider for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::GenerationError { provider: "failing".into(), message: "timed out".into() })
    }
}

pub fn text_file(name: &str, text: &str) -> UploadedFile {
    UploadedFile::new(name, text.as_bytes().to_vec())
}

pub fn small_config() -> RagConfig {
    RagConfig::builder().chunk_size(200).chunk_overlap(40).top_k(2).build().unwrap()
}

pub fn pipeline(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> IngestionPipeline {
    IngestionPipeline::builder().config(config).embedding_provider(embedder).build().unwrap()
}

pub fn orchestrator(
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
) -> RetrievalOrchestrator {
    RetrievalOrchestrator::builder()
        .pipeline(pipeline(small_config(), embedder))
        .generation_provider(generator)
        .build()
        .unwrap()
}
