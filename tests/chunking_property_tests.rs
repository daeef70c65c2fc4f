//! Property tests for the recursive chunker: size bounds, overlap carry,
//! and exact reconstruction of the input from the chunk sequence.

use proptest::prelude::*;

use ragchat::{Chunker, Document, RecursiveChunker};

fn chunk_texts(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let doc = Document::new(text, "prop.md");
    RecursiveChunker::new(chunk_size, chunk_overlap)
        .chunk(&doc)
        .into_iter()
        .map(|c| c.text)
        .collect()
}

/// ASCII text plus a chunk size and a strictly smaller overlap.
fn params() -> impl Strategy<Value = (String, usize, usize)> {
    ("[a-z .!?\\n]{1,1500}", 8usize..200).prop_flat_map(|(text, size)| {
        (Just(text), Just(size), 0..size)
    })
}

proptest! {
    #[test]
    fn chunks_are_bounded_and_non_empty((text, size, overlap) in params()) {
        for piece in chunk_texts(&text, size, overlap) {
            prop_assert!(!piece.is_empty());
            prop_assert!(piece.len() <= size);
        }
    }

    #[test]
    fn stripping_overlaps_rebuilds_the_input((text, size, overlap) in params()) {
        let pieces = chunk_texts(&text, size, overlap);
        prop_assert!(!pieces.is_empty());

        let mut rebuilt = pieces[0].clone();
        for piece in &pieces[1..] {
            rebuilt.push_str(&piece[overlap..]);
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn each_chunk_begins_with_its_predecessors_tail((text, size, overlap) in params()) {
        let pieces = chunk_texts(&text, size, overlap);
        for pair in pieces.windows(2) {
            let tail = &pair[0][pair[0].len() - overlap..];
            prop_assert!(pair[1].starts_with(tail));
        }
    }

    #[test]
    fn short_input_is_a_single_unchanged_chunk(text in "[a-z .]{1,64}") {
        let pieces = chunk_texts(&text, 64, 16);
        prop_assert_eq!(pieces, vec![text]);
    }

    #[test]
    fn multibyte_input_never_panics(text in "\\PC{1,400}", size in 16usize..100) {
        for piece in chunk_texts(&text, size, size / 4) {
            prop_assert!(!piece.is_empty());
            prop_assert!(piece.len() <= size);
        }
    }
}
