//! Reranker trait for re-scoring search results.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A reranker that re-scores and reorders search results.
///
/// Implementations typically call a hosted cross-encoder model to improve
/// precision beyond initial vector similarity.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank search results given the original query.
    ///
    /// Returns at most `top_n` results drawn from `results`, ordered by
    /// descending relevance with updated scores.
    async fn rerank(
        &self,
        query: &str,
        results: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// A no-op reranker that truncates results without reordering.
///
/// Useful as a default in tests and when no reranking backend is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(
        &self,
        _query: &str,
        mut results: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        results.truncate(top_n);
        Ok(results)
    }
}
