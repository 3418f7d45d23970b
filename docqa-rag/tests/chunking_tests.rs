//! Property and scenario tests for recursive overlap chunking.

use docqa_rag::{Chunker, Document, Page, RagError, RecursiveChunker, TextSpan};
use proptest::prelude::*;

/// Rebuild the source by dropping each span's carried prefix.
fn reconstruct(spans: &[TextSpan]) -> String {
    let mut out = String::new();
    let mut end = 0;
    for span in spans {
        let carried = end - span.start_offset;
        out.extend(span.text.chars().skip(carried));
        end = span.start_offset + span.length;
    }
    out
}

fn tail(text: &str, n: usize) -> String {
    let len = text.chars().count();
    text.chars().skip(len - n).collect()
}

fn head(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Sizes with `overlap < chunk_size`.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (2usize..150).prop_flat_map(|size| (Just(size), 0..size))
}

/// Text with paragraph breaks, line breaks, long words and multi-byte chars.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zé ]{0,800}",
        "([a-z]{1,12}( |\n|\n\n)){0,120}",
        "[a-zA-Z0-9]{0,500}",
    ]
}

/// Space-separated words, each shorter than `size` so that a word plus its
/// trailing space always fits in one chunk.
fn arb_words_within(size: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(1..size, 0..40).prop_map(|lengths| {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &n)| char::from(b'a' + (i % 26) as u8).to_string().repeat(n))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

mod prop_chunk_invariants {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn every_chunk_fits_the_budget(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            for span in chunker.split(&text) {
                prop_assert!(span.length <= size, "chunk of {} chars exceeds {}", span.length, size);
                prop_assert_eq!(span.length, span.text.chars().count());
                prop_assert!(span.length > 0);
            }
        }

        #[test]
        fn adjacent_chunks_share_the_overlap(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            let spans = chunker.split(&text);
            for pair in spans.windows(2) {
                let carried = overlap.min(pair[0].length);
                prop_assert_eq!(tail(&pair[0].text, carried), head(&pair[1].text, carried));
                prop_assert_eq!(pair[1].start_offset, pair[0].start_offset + pair[0].length - carried);
                if pair[0].length >= overlap {
                    prop_assert_eq!(tail(&pair[0].text, overlap), head(&pair[1].text, overlap));
                }
            }
        }

        #[test]
        fn word_separators_only_stay_within_budget(
            ((size, overlap), text) in arb_sizes()
                .prop_flat_map(|sizes| (Just(sizes), arb_words_within(sizes.0))),
        ) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap().with_separators([" "]);
            let spans = chunker.split(&text);
            for span in &spans {
                prop_assert!(span.length <= size, "chunk {:?} exceeds {}", span.text, size);
            }
            prop_assert_eq!(reconstruct(&spans), text.clone());
        }

        #[test]
        fn stripping_overlaps_reconstructs_the_source(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            let spans = chunker.split(&text);
            prop_assert_eq!(reconstruct(&spans), text.clone());

            let chars: Vec<char> = text.chars().collect();
            for span in &spans {
                let slice: String = chars[span.start_offset..span.start_offset + span.length].iter().collect();
                prop_assert_eq!(&slice, &span.text);
            }
        }
    }
}

#[test]
fn twenty_four_hundred_chars_make_three_chunks() {
    let text = format!("{}abcdefghij", "abcdefghi ".repeat(239));
    assert_eq!(text.chars().count(), 2400);

    let chunker = RecursiveChunker::new(1000, 200).unwrap();
    let spans = chunker.split(&text);

    assert_eq!(spans.len(), 3);
    for span in &spans {
        assert!(span.length <= 1000);
    }
    assert_eq!(tail(&spans[0].text, 200), head(&spans[1].text, 200));
    assert_eq!(tail(&spans[1].text, 200), head(&spans[2].text, 200));
    assert_eq!(reconstruct(&spans), text);
}

#[test]
fn unbreakable_text_is_split_anywhere() {
    let text = "x".repeat(2400);
    let spans = RecursiveChunker::new(1000, 200).unwrap().split(&text);

    assert_eq!(spans.len(), 3);
    assert!(spans.iter().all(|s| s.length <= 1000));
    assert_eq!(reconstruct(&spans), text);
}

#[test]
fn paragraph_breaks_are_preferred() {
    let text = format!("{}\n\n{}", "a".repeat(30), "b".repeat(30));
    let spans = RecursiveChunker::new(40, 5).unwrap().split(&text);

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, format!("{}\n\n", "a".repeat(30)));
    assert_eq!(spans[1].text, format!("aaa\n\n{}", "b".repeat(30)));
}

#[test]
fn atomic_token_is_emitted_oversized() {
    let token = "y".repeat(50);
    let text = format!("short {token} end");
    let chunker = RecursiveChunker::new(20, 4).unwrap().with_separators([" "]);
    let spans = chunker.split(&text);

    assert!(spans.iter().any(|s| s.text.contains(&token) && s.length > 20));
    assert_eq!(reconstruct(&spans), text);
}

#[test]
fn word_longer_than_body_budget_shortens_the_overlap() {
    let text = format!("{} {}", "a".repeat(16), "b".repeat(18));
    let chunker = RecursiveChunker::new(20, 4).unwrap().with_separators([" "]);
    let spans = chunker.split(&text);

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, format!("{} ", "a".repeat(16)));
    assert_eq!(spans[1].text, format!("a {}", "b".repeat(18)));
    assert!(spans.iter().all(|s| s.length <= 20));
    assert_eq!(reconstruct(&spans), text);
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    assert!(matches!(RecursiveChunker::new(100, 100), Err(RagError::ConfigError(_))));
    assert!(matches!(RecursiveChunker::new(100, 150), Err(RagError::ConfigError(_))));
    assert!(matches!(RecursiveChunker::new(0, 0), Err(RagError::ConfigError(_))));
    assert!(RecursiveChunker::new(100, 99).is_ok());
}

#[test]
fn chunks_carry_page_and_source_metadata() {
    let document = Document::new(
        "manual.pdf",
        vec![
            Page { index: 0, text: "first page text".into() },
            Page { index: 2, text: "third page ".repeat(10).trim().to_string() },
        ],
    );
    let chunks = RecursiveChunker::new(40, 10).unwrap().chunk(&document);

    assert_eq!(chunks[0].page, 0);
    assert_eq!(chunks[0].text, "first page text");
    assert!(chunks[1..].iter().all(|c| c.page == 2));
    assert!(chunks.iter().all(|c| c.document_id == document.id));
    assert!(chunks.iter().all(|c| c.metadata["source"] == "manual.pdf"));

    // Chunk numbering restarts on every page.
    assert_eq!(chunks[1].metadata["chunk_index"], "0");
    assert_eq!(chunks[1].start_offset, 0);
    assert_eq!(chunks[1].id, format!("{}_2_0", document.id));
}
