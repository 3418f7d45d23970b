use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docqa_cli::{Args, load_files, run_chat};
use docqa_rag::openai::{OpenAIEmbeddingProvider, OpenAIGenerationProvider};
use docqa_rag::{IngestionPipeline, RetrievalOrchestrator};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("docqa_cli=info,docqa_rag=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (for OPENAI_API_KEY).
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = args.rag_config()?;

    let mut embedder = OpenAIEmbeddingProvider::from_env()?;
    if let Some(model) = &args.embedding_model {
        embedder = embedder.with_model(model);
    }
    let generator = OpenAIGenerationProvider::from_env()?
        .with_model(&args.model)
        .with_temperature(args.temperature);

    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .build()?;
    let mut orchestrator = RetrievalOrchestrator::builder()
        .pipeline(pipeline)
        .generation_provider(Arc::new(generator))
        .build()?;

    let loaded = load_files(&args.files).await;
    for (path, reason) in &loaded.unreadable {
        println!("  {}: skipped ({reason})", path.display());
    }
    println!("Processing {} file(s)...", loaded.files.len());
    let report = orchestrator.ingest(loaded.files).await.context("ingestion failed")?;

    for outcome in &report.outcomes {
        match outcome {
            docqa_rag::DocumentOutcome::Ingested { name, pages, chunks, .. } => {
                println!("  {name}: {pages} page(s), {chunks} chunk(s)");
            }
            docqa_rag::DocumentOutcome::Failed { name, reason } => {
                println!("  {name}: skipped ({reason})");
            }
        }
    }
    if !orchestrator.is_ready() {
        println!("No document could be processed; every answer will be a refusal.");
    }

    run_chat(&orchestrator, args.show_sources).await
}
