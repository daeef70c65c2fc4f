//! Error types for the `ragchat` crate.

use thiserror::Error;

/// Errors that can occur in the document chat pipeline.
#[derive(Debug, Error)]
pub enum RagChatError {
    /// A configuration validation error (bad constants, missing connection
    /// string, missing credential, dimensionality mismatch). Fail fast,
    /// never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while ingesting a source document.
    #[error("Ingestion error ({source_name}): {message}")]
    Ingestion {
        /// The file name or URL that failed.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during result reranking.
    #[error("Reranker error ({reranker}): {message}")]
    Reranker {
        /// The reranker that produced the error.
        reranker: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while invoking the chat model.
    #[error("Chat model error ({model}): {message}")]
    Chat {
        /// The chat model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for document chat operations.
pub type Result<T> = std::result::Result<T, RagChatError>;
