//! End-to-end orchestration: ingestion and chat turns.
//!
//! [`ChatPipeline`] wires the ingestor, chunker, store gateway, retriever,
//! and composer together. Construct one via [`ChatPipeline::builder()`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat::{AppConfig, ChatPipeline, Session};
//!
//! let pipeline = ChatPipeline::builder()
//!     .config(AppConfig::default())
//!     .vector_store(Arc::new(store))
//!     .embedding_provider(Arc::new(embedder))
//!     .chat_model(Arc::new(model))
//!     .converter(Arc::new(converter))
//!     .build()?;
//!
//! let mut session = Session::new();
//! pipeline.ingest_files(&mut session, &files).await?;
//! let outcome = pipeline.chat_turn(&mut session, "What does the report say?", &settings).await;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chat::{ChatModel, Composer};
use crate::chunking::{Chunker, RecursiveChunker};
use crate::cohere::CohereReranker;
use crate::config::{AppConfig, RetrievalSettings};
use crate::document::{Chunk, SourceRef};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagChatError, Result};
use crate::gateway::VectorStoreGateway;
use crate::ingestion::{DocumentConverter, Ingestor, UploadedFile};
use crate::reranker::Reranker;
use crate::retriever::Retriever;
use crate::session::{COHERE_API_KEY, Session};
use crate::vectorstore::VectorStore;

/// The result of one chat turn.
///
/// A turn never panics the session: failures are converted into a
/// user-visible reply and recorded in [`error`](TurnOutcome::error).
#[derive(Debug)]
pub struct TurnOutcome {
    /// The assistant reply appended to history.
    pub reply: String,
    /// One citation per retrieved chunk, in retrieval order.
    pub sources: Vec<SourceRef>,
    /// Non-fatal warning surfaced to the user (e.g. reranking disabled).
    pub warning: Option<String>,
    /// Set when the turn failed; the reply then describes the failure.
    pub error: Option<String>,
}

/// Orchestrates ingestion and chat over one vector store.
pub struct ChatPipeline {
    config: AppConfig,
    ingestor: Ingestor,
    chunker: Arc<dyn Chunker>,
    gateway: Arc<VectorStoreGateway>,
    retriever: Retriever,
    composer: Composer,
    reranker: Option<Arc<dyn Reranker>>,
}

impl ChatPipeline {
    /// Create a new [`ChatPipelineBuilder`].
    pub fn builder() -> ChatPipelineBuilder {
        ChatPipelineBuilder::default()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The shared store gateway.
    pub fn gateway(&self) -> &Arc<VectorStoreGateway> {
        &self.gateway
    }

    /// Ingest uploaded files: convert, chunk, embed, store.
    ///
    /// Files whose source was already processed in this session are
    /// skipped. Returns the number of chunks stored.
    pub async fn ingest_files(
        &self,
        session: &mut Session,
        files: &[UploadedFile],
    ) -> Result<usize> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut ingested: Vec<String> = Vec::new();

        for file in files {
            if session.is_processed(&file.name) {
                info!(source = %file.name, "skipping already processed file");
                continue;
            }
            let docs = self.ingestor.ingest_file(file).await?;
            chunks.extend(self.chunker.chunk_all(&docs));
            ingested.push(file.name.clone());
        }

        let count = self.gateway.add(chunks).await?;
        for source in ingested {
            session.mark_processed(source);
        }
        info!(chunk_count = count, "ingested uploaded files");
        Ok(count)
    }

    /// Ingest URLs: fetch, extract, chunk, embed, store.
    ///
    /// A URL that fails to fetch or extract contributes nothing and does
    /// not fail the batch. Returns the number of chunks stored.
    pub async fn ingest_urls(&self, session: &mut Session, urls: &[String]) -> Result<usize> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut ingested: Vec<String> = Vec::new();

        for url in urls {
            if session.is_processed(url) {
                info!(source = %url, "skipping already processed url");
                continue;
            }
            let docs = self.ingestor.ingest_url(url).await;
            if docs.is_empty() {
                continue;
            }
            chunks.extend(self.chunker.chunk_all(&docs));
            ingested.push(url.clone());
        }

        let count = self.gateway.add(chunks).await?;
        for source in ingested {
            session.mark_processed(source);
        }
        info!(chunk_count = count, "ingested urls");
        Ok(count)
    }

    /// Run one chat turn: retrieve, compose, generate, append to history.
    ///
    /// Retrieval and generation failures become a user-visible error
    /// reply appended to history, not a crash.
    pub async fn chat_turn(
        &self,
        session: &mut Session,
        query: &str,
        settings: &RetrievalSettings,
    ) -> TurnOutcome {
        let reranker = self.resolve_reranker(session, settings);

        session.push_user(query);
        // Everything before the question just asked.
        let prior: Vec<_> =
            session.messages()[..session.messages().len() - 1].to_vec();

        let outcome = async {
            let retrieval =
                self.retriever.retrieve(query, reranker.as_deref(), settings).await?;
            let chunks: Vec<Chunk> =
                retrieval.results.into_iter().map(|r| r.chunk).collect();
            let reply = self.composer.respond(query, &chunks, &prior).await?;
            Ok::<_, RagChatError>((reply, retrieval.warning))
        }
        .await;

        match outcome {
            Ok((reply, warning)) => {
                session.push_assistant(&reply.text, reply.sources.clone());
                TurnOutcome { reply: reply.text, sources: reply.sources, warning, error: None }
            }
            Err(e) => {
                error!(error = %e, "chat turn failed");
                let reply = format!("Sorry, I ran into an error answering that: {e}");
                session.push_assistant(&reply, Vec::new());
                TurnOutcome {
                    reply,
                    sources: Vec::new(),
                    warning: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Clear the vector store and forget this session's processed sources.
    pub async fn clear_store(&self, session: &mut Session) -> Result<()> {
        self.gateway.clear().await?;
        session.reset_processed();
        Ok(())
    }

    /// Resolve the reranker for one turn: a builder-injected reranker wins,
    /// else a Cohere client from the session credential. `None` means the
    /// retriever degrades to the non-reranking path.
    fn resolve_reranker(
        &self,
        session: &Session,
        settings: &RetrievalSettings,
    ) -> Option<Arc<dyn Reranker>> {
        if !settings.use_reranking {
            return None;
        }
        if let Some(reranker) = &self.reranker {
            return Some(reranker.clone());
        }
        let key = session.credential(COHERE_API_KEY)?;
        CohereReranker::new(key, &self.config.rerank_model)
            .ok()
            .map(|r| Arc::new(r) as Arc<dyn Reranker>)
    }
}

/// Builder for constructing a [`ChatPipeline`].
///
/// `config` defaults to [`AppConfig::default()`]; the chunker defaults to a
/// [`RecursiveChunker`] sized from the config. Store, embedding provider,
/// chat model, and converter are required. An injected reranker overrides
/// per-session Cohere resolution (useful for tests).
#[derive(Default)]
pub struct ChatPipelineBuilder {
    config: Option<AppConfig>,
    store: Option<Arc<dyn VectorStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    converter: Option<Arc<dyn DocumentConverter>>,
    chunker: Option<Arc<dyn Chunker>>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl ChatPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the chat completion model.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Set the document converter used for uploaded files.
    pub fn converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Inject a fixed reranker instead of per-session Cohere resolution.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Build the [`ChatPipeline`], validating that required parts are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::Config`] if the store, embedding provider,
    /// chat model, or converter is missing, or if the embedder's
    /// dimensionality does not match the configured vector size.
    pub fn build(self) -> Result<ChatPipeline> {
        let config = self.config.unwrap_or_default();
        let store = self
            .store
            .ok_or_else(|| RagChatError::Config("vector_store is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagChatError::Config("embedding_provider is required".to_string()))?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagChatError::Config("chat_model is required".to_string()))?;
        let converter = self
            .converter
            .ok_or_else(|| RagChatError::Config("converter is required".to_string()))?;

        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });

        let gateway = Arc::new(VectorStoreGateway::new(
            store,
            embedder,
            config.table_name.clone(),
            config.vector_size,
        )?);

        Ok(ChatPipeline {
            ingestor: Ingestor::new(converter),
            chunker,
            retriever: Retriever::new(gateway.clone()),
            composer: Composer::new(chat_model),
            gateway,
            reranker: self.reranker,
            config,
        })
    }
}
