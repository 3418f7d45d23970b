//! End-to-end tests for ingestion, the ready/unready states and answering.

mod common;

use std::sync::Arc;

use common::*;
use docqa_rag::{
    ConversationTurn, GROUNDING_INSTRUCTION, OrchestratorState, RagError, UNREADY_REFUSAL,
    UploadedFile, assemble_context, record_exchange,
};

const SHIPPING: &str = "Orders ship within two business days. Shipping is free for orders \
over fifty dollars. International shipping takes up to three weeks.";

const REFUNDS: &str = "Refunds are issued within thirty days of purchase. A refund requires \
the original receipt.";

#[tokio::test]
async fn unready_orchestrator_refuses_without_calling_providers() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("refund", "unused"));
    let orchestrator = orchestrator(embedder.clone(), generator.clone());

    assert_eq!(orchestrator.state(), OrchestratorState::Unready);
    let answer = orchestrator.answer("What is the refund policy?", &[]).await.unwrap();

    assert_eq!(answer, UNREADY_REFUSAL);
    assert_eq!(generator.call_count(), 0);
    assert_eq!(embedder.total_calls(), 0);
}

#[tokio::test]
async fn ingesting_only_failures_stays_unready() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("refund", "unused"));
    let mut orchestrator = orchestrator(embedder, generator.clone());

    let report = orchestrator
        .ingest(vec![
            UploadedFile::new("scan.pdf", b"%PDF-garbage".to_vec()),
            UploadedFile::new("notes.docx", b"PK\x03\x04".to_vec()),
        ])
        .await
        .unwrap();

    assert_eq!(report.failures().len(), 2);
    assert!(!orchestrator.is_ready());
    let answer = orchestrator.answer("anything?", &[]).await.unwrap();
    assert_eq!(answer, UNREADY_REFUSAL);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn one_failed_document_does_not_sink_the_batch() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("ship", "Orders ship within two business days."));
    let mut orchestrator = orchestrator(embedder, generator);

    let report = orchestrator
        .ingest(vec![
            UploadedFile::new("broken.pdf", b"not a pdf at all".to_vec()),
            text_file("shipping.txt", SHIPPING),
        ])
        .await
        .unwrap();

    assert!(orchestrator.is_ready());
    assert_eq!(report.ingested_count(), 1);
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "broken.pdf");

    let index = orchestrator.index().unwrap();
    assert!(index.entries().iter().all(|e| e.chunk.document_name == "shipping.txt"));
    assert_eq!(orchestrator.chunk_count(), report.chunks.len());
}

#[tokio::test]
async fn question_outside_the_documents_gets_i_do_not_know() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator =
        Arc::new(KeywordGenerator::new("refund", "Refunds are issued within thirty days."));
    let mut orchestrator = orchestrator(embedder, generator.clone());
    orchestrator.ingest(vec![text_file("shipping.txt", SHIPPING)]).await.unwrap();

    let answer = orchestrator.answer("What is the refund policy?", &[]).await.unwrap();

    assert_eq!(answer, I_DO_NOT_KNOW);
    assert_eq!(generator.call_count(), 1);
    let request = generator.last_request().unwrap();
    assert_eq!(request.instruction, GROUNDING_INSTRUCTION);
    assert!(request.context.contains("ship"));
    assert!(!request.context.to_lowercase().contains("refund"));
}

#[tokio::test]
async fn answer_is_grounded_in_the_best_matching_chunk() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator =
        Arc::new(KeywordGenerator::new("refund", "Refunds are issued within thirty days."));
    let mut orchestrator = orchestrator(embedder, generator.clone());
    orchestrator
        .ingest(vec![text_file("shipping.txt", SHIPPING), text_file("refunds.txt", REFUNDS)])
        .await
        .unwrap();

    let result = orchestrator
        .answer_with_sources("When are refunds issued after purchase?", &[])
        .await
        .unwrap();

    assert_eq!(result.answer, "Refunds are issued within thirty days.");
    assert_eq!(result.sources[0].chunk.chunk.document_name, "refunds.txt");
    assert!(result.sources.len() <= orchestrator.config().top_k);
    for window in result.sources.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
    let request = generator.last_request().unwrap();
    assert!(request.context.starts_with(result.sources[0].text()));
}

#[tokio::test]
async fn history_is_passed_through_and_left_to_the_caller() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("ship", "Two business days."));
    let mut orchestrator = orchestrator(embedder, generator.clone());
    orchestrator.ingest(vec![text_file("shipping.txt", SHIPPING)]).await.unwrap();

    let mut history = vec![
        ConversationTurn::human("Do you ship abroad?"),
        ConversationTurn::assistant("Yes, within three weeks."),
    ];
    let query = "How fast do orders ship?";
    let answer = orchestrator.answer(query, &history).await.unwrap();

    assert_eq!(generator.last_request().unwrap().history, history);
    assert_eq!(history.len(), 2);

    record_exchange(&mut history, query, &answer);
    assert_eq!(history.len(), 4);
    assert_eq!(history[2], ConversationTurn::human(query));
    assert_eq!(history[3], ConversationTurn::assistant("Two business days."));
}

#[tokio::test]
async fn generation_failure_is_surfaced() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(FailingGenerator::default());
    let mut orchestrator = orchestrator(embedder, generator);
    orchestrator.ingest(vec![text_file("shipping.txt", SHIPPING)]).await.unwrap();

    let err = orchestrator.answer("How fast do orders ship?", &[]).await.unwrap_err();
    assert!(matches!(err, RagError::GenerationError { .. }));
}

#[tokio::test]
async fn embedding_failure_leaves_state_untouched() {
    let mut orchestrator = orchestrator(
        Arc::new(FailingEmbedder),
        Arc::new(KeywordGenerator::new("ship", "unused")),
    );

    let err = orchestrator.ingest(vec![text_file("shipping.txt", SHIPPING)]).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert_eq!(orchestrator.state(), OrchestratorState::Unready);
}

#[tokio::test]
async fn later_batches_rebuild_from_the_union() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("refund", "ok"));
    let mut orchestrator = orchestrator(embedder, generator);

    let first = orchestrator.ingest(vec![text_file("shipping.txt", SHIPPING)]).await.unwrap();
    let second = orchestrator.ingest(vec![text_file("refunds.txt", REFUNDS)]).await.unwrap();

    assert_eq!(orchestrator.chunk_count(), first.chunks.len() + second.chunks.len());
    let names: Vec<&str> = orchestrator
        .index()
        .unwrap()
        .entries()
        .iter()
        .map(|e| e.chunk.document_name.as_str())
        .collect();
    assert_eq!(names.first(), Some(&"shipping.txt"));
    assert_eq!(names.last(), Some(&"refunds.txt"));

    // An all-failing batch afterwards keeps the existing index.
    orchestrator.ingest(vec![UploadedFile::new("x.bin", vec![0u8; 4])]).await.unwrap();
    assert!(orchestrator.is_ready());
    assert_eq!(orchestrator.chunk_count(), first.chunks.len() + second.chunks.len());
}

#[tokio::test]
async fn retrieve_is_empty_when_unready() {
    let orchestrator = orchestrator(
        Arc::new(BagOfWordsEmbedder::new()),
        Arc::new(KeywordGenerator::new("x", "y")),
    );
    assert!(orchestrator.retrieve("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn context_respects_the_character_budget() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let generator = Arc::new(KeywordGenerator::new("x", "y"));
    let mut orchestrator = orchestrator(embedder, generator);
    orchestrator
        .ingest(vec![text_file("shipping.txt", SHIPPING), text_file("refunds.txt", REFUNDS)])
        .await
        .unwrap();

    let results = orchestrator.retrieve("refund shipping orders").await.unwrap();
    assert_eq!(results.len(), 2);

    let full = assemble_context(&results, usize::MAX);
    assert_eq!(full, format!("{}\n\n{}", results[0].text(), results[1].text()));

    let first_len = results[0].text().chars().count();
    let bounded = assemble_context(&results, first_len + 5);
    assert_eq!(bounded.chars().count(), first_len + 5);
    assert!(bounded.starts_with(results[0].text()));

    let cut = assemble_context(&results, 10);
    assert_eq!(cut, results[0].text().chars().take(10).collect::<String>());
}
