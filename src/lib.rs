//! Retrieval-augmented document chat.
//!
//! `ragchat` ingests uploaded files and URLs, chunks and embeds them into a
//! vector store, and answers questions by retrieving relevant chunks and
//! prompting a hosted chat model with the retrieved context plus the
//! conversation history.
//!
//! The building blocks are traits at each external seam — [`EmbeddingProvider`],
//! [`VectorStore`], [`ChatModel`], [`Reranker`], [`DocumentConverter`] — with
//! hosted implementations (OpenAI embeddings and chat, Cohere reranking,
//! pgvector persistence) and an in-memory store for tests and development.
//! [`ChatPipeline`] wires them together.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat::{AppConfig, ChatPipeline, InMemoryVectorStore, RetrievalSettings, Session};
//!
//! let pipeline = ChatPipeline::builder()
//!     .config(AppConfig::from_env()?)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .embedding_provider(Arc::new(embedder))
//!     .chat_model(Arc::new(chat_model))
//!     .converter(Arc::new(converter))
//!     .build()?;
//!
//! let mut session = Session::new();
//! pipeline.ingest_urls(&mut session, &urls).await?;
//! let outcome = pipeline
//!     .chat_turn(&mut session, "Summarize the report", &RetrievalSettings::default())
//!     .await;
//! println!("{}", outcome.reply);
//! ```

pub mod chat;
pub mod chunking;
pub mod cohere;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod ingestion;
pub mod inmemory;
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod session;
pub mod vectorstore;

pub use chat::{ChatModel, ChatReply, Composer, NO_DOCUMENTS_REPLY, format_context};
pub use chunking::{Chunker, RecursiveChunker};
pub use cohere::CohereReranker;
pub use config::{AppConfig, AppConfigBuilder, RetrievalSettings};
pub use document::{ChatMessage, Chunk, Document, Role, SearchResult, SourceRef};
pub use embedding::EmbeddingProvider;
pub use error::{RagChatError, Result};
pub use gateway::VectorStoreGateway;
pub use ingestion::{
    ConvertServiceClient, DocumentConverter, Ingestor, SUPPORTED_EXTENSIONS, UploadedFile,
};
pub use inmemory::InMemoryVectorStore;
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
pub use pipeline::{ChatPipeline, ChatPipelineBuilder, TurnOutcome};
pub use reranker::{NoOpReranker, Reranker};
pub use retriever::{Retrieval, Retriever};
pub use session::{COHERE_API_KEY, OPENAI_API_KEY, Session};
pub use vectorstore::{SearchMode, VectorStore};
