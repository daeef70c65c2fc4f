//! Vector store gateway: the shared embedding-and-storage connection.
//!
//! The gateway owns one configured table, lazily initializes it exactly
//! once, embeds on the way in (`add`) and on the way out
//! (`similarity_search`), and supports a destructive [`clear`] that drops
//! and recreates the table. Reads run concurrently; `clear` takes the
//! write half of the lock so an `add` or search in flight can never
//! observe a dropped table.
//!
//! [`clear`]: VectorStoreGateway::clear

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagChatError, Result};
use crate::vectorstore::{SearchMode, VectorStore};

/// Shared, lazily-initialized access to the configured vector table.
pub struct VectorStoreGateway {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    table: String,
    vector_size: usize,
    // Guards table existence: false until first initialization, reset
    // never — clear() recreates the table under the write lock instead.
    ready: RwLock<bool>,
}

impl std::fmt::Debug for VectorStoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreGateway")
            .field("table", &self.table)
            .field("vector_size", &self.vector_size)
            .finish_non_exhaustive()
    }
}

impl VectorStoreGateway {
    /// Create a gateway over `store` for the configured `table`.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::Config`] if the embedder's dimensionality
    /// does not match `vector_size`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        table: impl Into<String>,
        vector_size: usize,
    ) -> Result<Self> {
        if embedder.dimensions() != vector_size {
            return Err(RagChatError::Config(format!(
                "embedding model produces {} dimensions but the store is configured for {}",
                embedder.dimensions(),
                vector_size
            )));
        }
        Ok(Self { store, embedder, table: table.into(), vector_size, ready: RwLock::new(false) })
    }

    /// Initialize the backing table if this process has not done so yet.
    ///
    /// Idempotent: creation uses the store's already-exists-tolerant path,
    /// and subsequent callers see the flag and return immediately.
    pub async fn ensure_ready(&self) -> Result<()> {
        if *self.ready.read().await {
            return Ok(());
        }
        let mut ready = self.ready.write().await;
        if *ready {
            return Ok(());
        }
        self.store.create_collection(&self.table, self.vector_size).await?;
        *ready = true;
        debug!(table = %self.table, "vector store initialized");
        Ok(())
    }

    /// Embed and persist `chunks`, returning the number stored.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::Config`] if any produced embedding does not
    /// match the configured dimensionality, or a store/embedding error.
    pub async fn add(&self, mut chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        self.ensure_ready().await?;

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            if embedding.len() != self.vector_size {
                return Err(RagChatError::Config(format!(
                    "embedding of length {} does not match configured vector size {}",
                    embedding.len(),
                    self.vector_size
                )));
            }
            chunk.embedding = embedding;
        }

        // Read lock: concurrent adds and searches are fine, but a clear
        // in progress must finish first.
        let _guard = self.ready.read().await;
        self.store.upsert(&self.table, &chunks).await?;

        info!(table = %self.table, count = chunks.len(), "added chunks to vector store");
        Ok(chunks.len())
    }

    /// Embed `query` and search the store.
    pub async fn similarity_search(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>> {
        self.ensure_ready().await?;
        let embedding = self.embedder.embed(query).await?;

        let _guard = self.ready.read().await;
        self.store.search(&self.table, &embedding, top_k, mode).await
    }

    /// Remove all stored records by dropping and recreating the table.
    ///
    /// Holds the write lock across drop and recreate, so no reader can
    /// observe the intermediate state; afterwards the gateway is ready
    /// again and observes an empty store.
    pub async fn clear(&self) -> Result<()> {
        let mut ready = self.ready.write().await;
        self.store.drop_collection(&self.table).await?;
        self.store.create_collection(&self.table, self.vector_size).await?;
        *ready = true;
        info!(table = %self.table, "vector store cleared");
        Ok(())
    }
}
