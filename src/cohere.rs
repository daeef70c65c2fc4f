//! Cohere reranking client.
//!
//! Calls the Cohere v2 `/rerank` endpoint with the query and candidate
//! texts; the response maps indices back into the candidate set with new
//! relevance scores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::error::{RagChatError, Result};
use crate::reranker::Reranker;

/// The Cohere rerank API endpoint.
const COHERE_RERANK_URL: &str = "https://api.cohere.com/v2/rerank";

/// A [`Reranker`] backed by the Cohere rerank API.
pub struct CohereReranker {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereReranker {
    /// Create a reranker with the given API key and model.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagChatError::Config("Cohere API key must not be empty".to_string()));
        }
        Ok(Self { client: reqwest::Client::new(), api_key, model: model.into() })
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankEntry>,
}

#[derive(Deserialize)]
struct RerankEntry {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl Reranker for CohereReranker {
    async fn rerank(
        &self,
        query: &str,
        results: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        if results.is_empty() {
            return Ok(results);
        }

        debug!(model = %self.model, candidates = results.len(), top_n, "reranking");

        let request_body = RerankRequest {
            model: &self.model,
            query,
            documents: results.iter().map(|r| r.chunk.text.as_str()).collect(),
            top_n,
        };

        let response = self
            .client
            .post(COHERE_RERANK_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "rerank request failed");
                RagChatError::Reranker {
                    reranker: "Cohere".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "rerank API error");
            return Err(RagChatError::Reranker {
                reranker: "Cohere".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        let rerank_response: RerankResponse =
            response.json().await.map_err(|e| RagChatError::Reranker {
                reranker: "Cohere".into(),
                message: format!("failed to parse response: {e}"),
            })?;

        // Map returned indices back into the candidate set, carrying the
        // reranker's relevance scores.
        let mut candidates: Vec<Option<SearchResult>> = results.into_iter().map(Some).collect();
        let mut reranked = Vec::new();
        for entry in rerank_response.results.into_iter().take(top_n) {
            if let Some(slot) = candidates.get_mut(entry.index) {
                if let Some(mut result) = slot.take() {
                    result.score = entry.relevance_score;
                    reranked.push(result);
                }
            }
        }

        Ok(reranked)
    }
}
