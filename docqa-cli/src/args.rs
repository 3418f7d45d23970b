//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use docqa_rag::RagConfig;
use docqa_rag::openai::{DEFAULT_CHAT_MODEL, DEFAULT_TEMPERATURE, SUPPORTED_CHAT_MODELS};

/// Ask questions about PDF and text documents.
#[derive(Debug, Parser)]
#[command(name = "docqa", version, about)]
pub struct Args {
    /// PDF, text or Markdown files to ingest
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Chat model used to answer questions
    #[arg(
        long,
        env = "DOCQA_MODEL",
        default_value = DEFAULT_CHAT_MODEL,
        value_parser = PossibleValuesParser::new(SUPPORTED_CHAT_MODELS),
    )]
    pub model: String,

    /// Sampling temperature. Accepts the provider's full 0 to 2 range; values
    /// above 1 make answers noticeably less literal
    #[arg(long, env = "DOCQA_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE, value_parser = parse_temperature)]
    pub temperature: f32,

    /// Embedding model (defaults to the provider's)
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = 4)]
    pub top_k: usize,

    /// Upper bound on the context handed to the model, in characters
    #[arg(long, default_value_t = 8000)]
    pub max_context_chars: usize,

    /// Print the retrieved chunks under every answer
    #[arg(long)]
    pub show_sources: bool,
}

impl Args {
    /// Build and validate the pipeline configuration from the flags.
    pub fn rag_config(&self) -> docqa_rag::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .max_context_chars(self.max_context_chars)
            .build()
    }
}

fn parse_temperature(value: &str) -> Result<f32, String> {
    let temperature: f32 = value.parse().map_err(|e| format!("not a number: {e}"))?;
    if (0.0..=2.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(format!("{temperature} is outside 0..=2"))
    }
}
