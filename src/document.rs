//! Data types for documents, chunks, search results, and chat messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the originating file name or URL.
pub const SOURCE_KEY: &str = "source";

/// Source identifier used when a chunk carries no source metadata.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A source document containing normalized text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata; ingestion always sets [`SOURCE_KEY`].
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with a fresh ID and its `source` metadata set.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self { id: uuid::Uuid::new_v4().to_string(), text: text.into(), metadata }
    }

    /// The source identifier, or [`UNKNOWN_SOURCE`] if absent.
    pub fn source(&self) -> &str {
        self.metadata.get(SOURCE_KEY).map(String::as_str).unwrap_or(UNKNOWN_SOURCE)
    }
}

/// A segment of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{document_id}_{chunk_index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until the gateway
    /// attaches one during `add`.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// The source identifier, or [`UNKNOWN_SOURCE`] if absent.
    pub fn source(&self) -> &str {
        self.metadata.get(SOURCE_KEY).map(String::as_str).unwrap_or(UNKNOWN_SOURCE)
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A source citation attached to an assistant reply.
///
/// One entry per retrieved chunk, in retrieval order, not deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// The originating file name or URL, or [`UNKNOWN_SOURCE`].
    pub source: String,
    /// The chunk text the reply drew on.
    pub content: String,
}

impl From<&Chunk> for SourceRef {
    fn from(chunk: &Chunk) -> Self {
        Self { source: chunk.source().to_string(), content: chunk.text.clone() }
    }
}

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction.
    System,
    /// End-user turn.
    User,
    /// Model turn.
    Assistant,
}

/// A single turn in a session's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Sources cited by an assistant reply; empty for user messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), sources: Vec::new() }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), sources: Vec::new() }
    }

    /// Create an assistant message with its cited sources.
    pub fn assistant(content: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self { role: Role::Assistant, content: content.into(), sources }
    }
}
