//! Query-time retrieval with optional reranking.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RetrievalSettings;
use crate::document::SearchResult;
use crate::error::Result;
use crate::gateway::VectorStoreGateway;
use crate::reranker::Reranker;
use crate::vectorstore::SearchMode;

/// The outcome of one retrieval: a bounded result set plus an optional
/// non-fatal warning (currently only reranking degradation).
#[derive(Debug)]
pub struct Retrieval {
    /// At most `top_n` results, most relevant first.
    pub results: Vec<SearchResult>,
    /// Set when reranking was requested but unavailable.
    pub warning: Option<String>,
}

/// Fetches candidates from the store gateway and optionally reranks them.
pub struct Retriever {
    gateway: Arc<VectorStoreGateway>,
}

impl Retriever {
    /// Create a retriever over the given gateway.
    pub fn new(gateway: Arc<VectorStoreGateway>) -> Self {
        Self { gateway }
    }

    /// Retrieve up to `settings.top_n` chunks relevant to `query`.
    ///
    /// Without reranking this is a single diversity-aware search. With
    /// reranking, `settings.initial_k` candidates are fetched and the
    /// reranker keeps the best `top_n`. When reranking is requested but no
    /// reranker is available (missing credential), the plain path runs
    /// instead and the returned [`Retrieval::warning`] says so; a reranker
    /// that fails mid-call propagates its error.
    pub async fn retrieve(
        &self,
        query: &str,
        reranker: Option<&dyn Reranker>,
        settings: &RetrievalSettings,
    ) -> Result<Retrieval> {
        if !settings.use_reranking {
            let results = self
                .gateway
                .similarity_search(query, settings.top_n, SearchMode::MaxMarginalRelevance)
                .await?;
            return Ok(Retrieval { results, warning: None });
        }

        let Some(reranker) = reranker else {
            warn!("reranking requested but no reranker available; falling back");
            let results = self
                .gateway
                .similarity_search(query, settings.top_n, SearchMode::MaxMarginalRelevance)
                .await?;
            return Ok(Retrieval {
                results,
                warning: Some(
                    "COHERE_API_KEY not set. Reranking disabled. \
                     Add it in settings or .env file."
                        .to_string(),
                ),
            });
        };

        let initial_k = settings.initial_k.max(settings.top_n);
        let candidates = self
            .gateway
            .similarity_search(query, initial_k, SearchMode::MaxMarginalRelevance)
            .await?;
        debug!(candidates = candidates.len(), top_n = settings.top_n, "reranking candidates");

        let results = reranker.rerank(query, candidates, settings.top_n).await?;
        Ok(Retrieval { results, warning: None })
    }
}
