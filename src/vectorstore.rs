//! Vector store trait and search-mode selection.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// How similarity search ranks its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Pure nearest-neighbor ranking by similarity score.
    Similarity,
    /// Maximal marginal relevance: balances relevance against diversity by
    /// penalizing candidates similar to ones already selected.
    MaxMarginalRelevance,
}

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage one table/collection per name and support
/// idempotent creation, upserting, searching, and dropping.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. Not an error if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Drop a named collection and all its data. A missing collection is a
    /// no-op success.
    async fn drop_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` chunks ranked per `mode`.
    ///
    /// Returns results ordered by descending relevance.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>>;
}

/// Number of nearest-neighbor candidates to fetch before MMR selection.
pub(crate) fn mmr_fetch_k(top_k: usize) -> usize {
    (top_k * 4).max(20)
}

/// Relevance/diversity trade-off for MMR selection. 1.0 is pure relevance.
pub(crate) const MMR_LAMBDA: f32 = 0.5;

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Select up to `top_k` results by maximal marginal relevance.
///
/// Candidates must carry their embeddings. At each step the candidate
/// maximizing `lambda * sim(query, c) - (1 - lambda) * max sim(c, selected)`
/// is taken, starting from the most query-similar one.
pub(crate) fn maximal_marginal_relevance(
    query: &[f32],
    mut candidates: Vec<SearchResult>,
    top_k: usize,
    lambda: f32,
) -> Vec<SearchResult> {
    let mut selected: Vec<SearchResult> = Vec::with_capacity(top_k.min(candidates.len()));

    while selected.len() < top_k && !candidates.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (i, candidate) in candidates.iter().enumerate() {
            let relevance = cosine_similarity(query, &candidate.chunk.embedding);
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&candidate.chunk.embedding, &s.chunk.embedding))
                .fold(0.0f32, f32::max);
            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }

        selected.push(candidates.swap_remove(best_idx));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn result(id: &str, embedding: Vec<f32>, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: id.to_string(),
                text: id.to_string(),
                embedding,
                metadata: HashMap::new(),
                document_id: "d".to_string(),
            },
            score,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -0.7, 0.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn mmr_bounded_by_top_k() {
        let candidates = (0..10).map(|i| result(&i.to_string(), vec![1.0, 0.0], 0.9)).collect();
        let selected = maximal_marginal_relevance(&[1.0, 0.0], candidates, 3, 0.5);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn mmr_prefers_diverse_results() {
        // Two identical candidates near the query plus one equally relevant
        // candidate on the query's other side. After taking dup_a, the
        // exact duplicate is fully penalized and the diverse one wins.
        let candidates = vec![
            result("dup_a", vec![1.0, 0.9], 0.99),
            result("dup_b", vec![1.0, 0.9], 0.99),
            result("diverse", vec![0.9, 1.0], 0.99),
        ];
        let selected = maximal_marginal_relevance(&[1.0, 1.0], candidates, 2, 0.5);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].chunk.id, "dup_a");
        assert_eq!(selected[1].chunk.id, "diverse");
    }

    #[test]
    fn mmr_fetch_k_has_a_floor() {
        assert_eq!(mmr_fetch_k(3), 20);
        assert_eq!(mmr_fetch_k(10), 40);
    }
}
