//! pgvector (PostgreSQL) vector store backend.
//!
//! [`PgVectorStore`] implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the
//! [pgvector](https://github.com/pgvector/pgvector) PostgreSQL extension.
//!
//! # Prerequisites
//!
//! - PostgreSQL with the `pgvector` extension installed
//!
//! Table creation and teardown use `IF NOT EXISTS` / `IF EXISTS`, so
//! initialization is idempotent and dropping a missing table is a no-op.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagChatError, Result};
use crate::vectorstore::{
    MMR_LAMBDA, SearchMode, VectorStore, maximal_marginal_relevance, mmr_fetch_k,
};

/// A [`VectorStore`] backed by PostgreSQL with the pgvector extension.
///
/// Each collection is a table with columns `id`, `text`, `embedding`
/// (vector), `metadata` (jsonb), and `document_id`.
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    /// Connect to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::VectorStore`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        Ok(Self { pool })
    }

    /// Create a store from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_err(e: sqlx::Error) -> RagChatError {
        RagChatError::VectorStore { backend: "pgvector".to_string(), message: e.to_string() }
    }

    /// Sanitize a collection name for use as a table name.
    /// Only allows alphanumeric characters and underscores.
    fn table_name(name: &str) -> Result<String> {
        let sanitized: String =
            name.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
        if sanitized.is_empty() {
            return Err(RagChatError::VectorStore {
                backend: "pgvector".to_string(),
                message: "collection name is empty after sanitization".to_string(),
            });
        }
        Ok(sanitized)
    }

    /// Format an embedding as a pgvector literal like `[1.0,2.0,3.0]`.
    fn vector_literal(embedding: &[f32]) -> String {
        format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
    }

    async fn fetch_nearest(
        &self,
        table_name: &str,
        embedding: &[f32],
        limit: usize,
        with_embeddings: bool,
    ) -> Result<Vec<SearchResult>> {
        // pgvector cosine distance operator: <=>
        // Returns distance (0 = identical), so score = 1 - distance.
        let embedding_col = if with_embeddings { "embedding::text" } else { "NULL::text" };
        let search_sql = format!(
            "SELECT id, text, metadata, document_id, {embedding_col} AS embedding_text, \
                    1 - (embedding <=> $1::vector) AS score \
             FROM {table_name} \
             ORDER BY embedding <=> $1::vector \
             LIMIT $2"
        );

        let rows = sqlx::query(&search_sql)
            .bind(Self::vector_literal(embedding))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let results = rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let text: String = row.get("text");
                let document_id: String = row.get("document_id");
                let score: f64 = row.get("score");
                let embedding = row
                    .get::<Option<String>, _>("embedding_text")
                    .map(|s| parse_vector_literal(&s))
                    .unwrap_or_default();
                let metadata_value: serde_json::Value = row.get("metadata");
                let metadata: HashMap<String, String> = metadata_value
                    .as_object()
                    .map(|obj| {
                        obj.iter()
                            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                            .collect()
                    })
                    .unwrap_or_default();

                SearchResult {
                    chunk: Chunk { id, text, embedding, metadata, document_id },
                    score: score as f32,
                }
            })
            .collect();

        Ok(results)
    }
}

/// Parse a pgvector text literal (`[1,2,3]`) back into a vector.
fn parse_vector_literal(literal: &str) -> Vec<f32> {
    literal
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter_map(|v| v.trim().parse::<f32>().ok())
        .collect()
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let table_name = Self::table_name(name)?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (\
                id TEXT PRIMARY KEY, \
                text TEXT NOT NULL, \
                embedding vector({dimensions}), \
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                document_id TEXT NOT NULL\
            )"
        );
        sqlx::query(&create_sql).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(collection = name, table = %table_name, dimensions, "created pgvector table");
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let table_name = Self::table_name(name)?;

        let drop_sql = format!("DROP TABLE IF EXISTS {table_name}");
        sqlx::query(&drop_sql).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(collection = name, table = %table_name, "dropped pgvector table");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let table_name = Self::table_name(collection)?;

        let upsert_sql = format!(
            "INSERT INTO {table_name} (id, text, embedding, metadata, document_id) \
             VALUES ($1, $2, $3::vector, $4::jsonb, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                text = EXCLUDED.text, \
                embedding = EXCLUDED.embedding, \
                metadata = EXCLUDED.metadata, \
                document_id = EXCLUDED.document_id"
        );

        for chunk in chunks {
            let metadata_json =
                serde_json::to_string(&chunk.metadata).unwrap_or_else(|_| "{}".to_string());

            sqlx::query(&upsert_sql)
                .bind(&chunk.id)
                .bind(&chunk.text)
                .bind(Self::vector_literal(&chunk.embedding))
                .bind(&metadata_json)
                .bind(&chunk.document_id)
                .execute(&self.pool)
                .await
                .map_err(Self::map_err)?;
        }

        debug!(collection, count = chunks.len(), "upserted chunks to pgvector");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>> {
        let table_name = Self::table_name(collection)?;

        match mode {
            SearchMode::Similarity => {
                self.fetch_nearest(&table_name, embedding, top_k, false).await
            }
            SearchMode::MaxMarginalRelevance => {
                let candidates =
                    self.fetch_nearest(&table_name, embedding, mmr_fetch_k(top_k), true).await?;
                Ok(maximal_marginal_relevance(embedding, candidates, top_k, MMR_LAMBDA))
            }
        }
    }
}
