//! Document chunking.
//!
//! [`RecursiveChunker`] splits text greedily, preferring larger semantic
//! boundaries (paragraph break, then sentence end, then whitespace) before
//! falling back to a hard cut at `chunk_size`. The trailing `chunk_overlap`
//! characters of each chunk are carried as the leading characters of the
//! next, so concatenating chunks and stripping the overlaps reconstructs
//! the original text.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings; embeddings are attached later by the store gateway.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text. Metadata is
    /// copied unchanged from the parent onto every chunk, plus a
    /// `chunk_index` field.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split each document independently and collect all chunks.
    fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.chunk(d)).collect()
    }
}

/// Splits text at semantic boundaries with a fixed overlap carry.
///
/// Within each `chunk_size` window the cut point is the last paragraph
/// break, else the last sentence end, else the last whitespace, else the
/// window edge. Chunk IDs are generated as `{document_id}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 150);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters shared between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        split_text(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

/// Split `text` into overlapping pieces of at most `chunk_size` bytes.
///
/// Text no longer than `chunk_size` is returned as a single piece. Every
/// piece after the first begins with the trailing `chunk_overlap` bytes of
/// its predecessor (adjusted down to a character boundary for non-ASCII
/// input), so the pieces tile the input exactly.
pub(crate) fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = floor_boundary(text, (start + chunk_size).min(text.len()));
        if hard_end >= text.len() {
            chunks.push(text[start..].to_string());
            break;
        }

        // The cut must land past the carried overlap so each chunk adds
        // fresh content.
        let window = &text[start..hard_end];
        let min_cut = (chunk_overlap + 1).min(window.len());
        let cut = break_point(window, min_cut).unwrap_or(window.len());
        let end = start + cut;
        chunks.push(text[start..end].to_string());

        let next = floor_boundary(text, end.saturating_sub(chunk_overlap));
        start = if next > start { next } else { ceil_boundary(text, start + 1) };
    }

    chunks
}

/// Find the best cut position in `window`, at or after `min_cut`.
///
/// Prefers cutting just after the last paragraph break, then the last
/// sentence end, then the last whitespace. Returns `None` when no boundary
/// qualifies, in which case the caller hard-cuts at the window edge.
fn break_point(window: &str, min_cut: usize) -> Option<usize> {
    let after_last = |sep: &str| window.rfind(sep).map(|pos| pos + sep.len());

    if let Some(cut) = after_last("\n\n").filter(|&c| c >= min_cut) {
        return Some(cut);
    }

    let sentence = [". ", "! ", "? ", "\n"]
        .iter()
        .filter_map(|sep| after_last(sep))
        .filter(|&c| c >= min_cut)
        .max();
    if sentence.is_some() {
        return sentence;
    }

    after_last(" ").filter(|&c| c >= min_cut)
}

/// Largest character boundary at or below `i`.
fn floor_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest character boundary at or above `i`.
fn ceil_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
