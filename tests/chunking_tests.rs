//! Property and edge-case tests for the fixed-size chunker.

use minirag::{Chunker, FixedSizeChunker};
use proptest::prelude::*;

/// Collapse whitespace runs the same way the chunker does.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stitch overlapping chunks back together: chunk `i` starts at character
/// `i * (size - overlap)` of the normalized text.
fn reconstruct(chunks: &[String], size: usize, overlap: usize) -> String {
    let step = size - overlap;
    let mut out: Vec<char> = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let start = i * step;
        let skip = out.len().saturating_sub(start);
        out.extend(chunk.chars().skip(skip));
    }
    out.into_iter().collect()
}

/// A `(chunk_size, chunk_overlap)` pair with `0 < overlap < size`.
fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (2usize..60).prop_flat_map(|size| (Just(size), 1usize..size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The overlap-adjusted union of the chunks reconstructs the original
    /// (whitespace-normalized) text for every valid window.
    #[test]
    fn chunks_reconstruct_the_text(
        text in "[a-z0-9 ]{0,400}",
        (size, overlap) in arb_window(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap);
        let chunks = chunker.chunk(&text);
        prop_assert_eq!(reconstruct(&chunks, size, overlap), normalize(&text));
    }

    /// Every chunk except the last is exactly `chunk_size` characters; the
    /// last may be shorter but is never empty.
    #[test]
    fn chunk_sizes_are_bounded(
        text in "[a-z ]{1,300}",
        (size, overlap) in arb_window(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap);
        let chunks = chunker.chunk(&text);
        if normalize(&text).is_empty() {
            prop_assert!(chunks.is_empty());
        } else {
            for chunk in &chunks[..chunks.len() - 1] {
                prop_assert_eq!(chunk.chars().count(), size);
            }
            let last = chunks.last().unwrap();
            prop_assert!(!last.is_empty());
            prop_assert!(last.chars().count() <= size);
        }
    }

    /// The same input and parameters always yield the same sequence.
    #[test]
    fn chunking_is_deterministic(
        text in "[a-z ]{0,300}",
        (size, overlap) in arb_window(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap);
        prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }
}

#[test]
fn empty_text_yields_no_chunks() {
    let chunker = FixedSizeChunker::new(350, 60);
    assert!(chunker.chunk("").is_empty());
    assert!(chunker.chunk("   \n\t ").is_empty());
}

#[test]
fn short_text_yields_a_single_chunk() {
    let chunker = FixedSizeChunker::new(350, 60);
    assert_eq!(chunker.chunk("leave policy"), vec!["leave policy".to_string()]);
}

#[test]
fn whitespace_runs_are_collapsed() {
    let chunker = FixedSizeChunker::new(350, 60);
    assert_eq!(chunker.chunk("a  b\n\nc\td"), vec!["a b c d".to_string()]);
}

#[test]
fn consecutive_chunks_share_the_overlap() {
    let chunker = FixedSizeChunker::new(10, 4);
    let text = "abcdefghijklmnopqrstuvwxyz";
    let chunks = chunker.chunk(text);
    assert_eq!(chunks[0], "abcdefghij");
    assert_eq!(chunks[1], "ghijklmnop");
    assert!(chunks[0].ends_with(&chunks[1][..4]));
}

#[test]
fn multibyte_text_does_not_panic() {
    let chunker = FixedSizeChunker::new(5, 2);
    let chunks = chunker.chunk("héllo wörld ünïcode tèxt");
    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 5);
    }
}
