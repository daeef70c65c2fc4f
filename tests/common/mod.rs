#![allow(dead_code)]

//! Shared fixtures for integration tests: deterministic providers that
//! stand in for the hosted embedding, chat, and rerank services.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ragchat::{
    ChatMessage, ChatModel, DocumentConverter, EmbeddingProvider, RagChatError, Reranker, Result,
    SearchResult,
};

/// Embedding dimensionality used across tests.
pub const DIMS: usize = 4;

/// Install the tracing subscriber for test output.
///
/// Idempotent; later calls in the same process are no-ops. Log verbosity
/// follows `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An embedding provider returning canned vectors by exact text match.
///
/// Unknown texts embed to a fixed fallback vector so ingestion of
/// incidental content never fails.
pub struct StaticEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    dims: usize,
}

impl StaticEmbedder {
    pub fn new(dims: usize) -> Self {
        let mut fallback = vec![0.0; dims];
        fallback[0] = 1.0;
        Self { vectors: HashMap::new(), fallback, dims }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.fallback.clone()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// An embedder that reports one dimensionality but produces another.
pub struct LyingEmbedder {
    pub claimed: usize,
    pub actual: usize,
}

#[async_trait]
impl EmbeddingProvider for LyingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.5; self.actual])
    }

    fn dimensions(&self) -> usize {
        self.claimed
    }
}

/// A chat model that replies with a fixed string and records its input.
pub struct ScriptedChatModel {
    pub reply: String,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), calls: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().await.push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

/// A chat model that always fails.
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(RagChatError::Chat {
            model: "failing".to_string(),
            message: "service unavailable".to_string(),
        })
    }
}

/// A reranker that reverses the candidate order, for observable effect.
pub struct ReversingReranker;

#[async_trait]
impl Reranker for ReversingReranker {
    async fn rerank(
        &self,
        _query: &str,
        mut results: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        results.reverse();
        results.truncate(top_n);
        Ok(results)
    }
}

/// A converter that returns the staged file's bytes as text.
pub struct PassthroughConverter;

#[async_trait]
impl DocumentConverter for PassthroughConverter {
    async fn convert(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| RagChatError::Ingestion {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
