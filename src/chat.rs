//! Conversation composition: context assembly, prompt building, generation.
//!
//! The [`Composer`] turns retrieved chunks plus prior turns into a chat
//! completion request and returns the model's raw reply together with one
//! source citation per chunk. With no retrieved chunks it short-circuits
//! to a fixed reply without invoking the model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::document::{ChatMessage, Chunk, Role, SourceRef};
use crate::error::Result;

/// Reply returned when no documents have been ingested yet.
pub const NO_DOCUMENTS_REPLY: &str =
    "I don't have any documents to answer your question. Please upload some documents first!";

/// System instruction embedding the retrieved context.
///
/// The model is told to answer only from the provided context and to say
/// it has no information when the context is insufficient.
const SYSTEM_PROMPT: &str = "You are a helpful AI assistant having a conversation about documents. \n\
Use the provided context to answer questions accurately and naturally.\n\
If you reference information from the context, you can mention it conversationally.\n\
CRUCIAL: If the context doesn't contain relevant information, say \"I don't have any information about that\" and don't provide any additional information.\n\
\n\
Context from documents:\n";

/// A hosted chat completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a reply for an ordered list of chat messages.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// An assistant reply with its cited sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// The model's raw text output (or the fixed no-documents reply).
    pub text: String,
    /// One citation per retrieved chunk, in retrieval order.
    pub sources: Vec<SourceRef>,
}

/// Format retrieved chunks into the context block fed to the model.
///
/// Each chunk renders as `[Source: <source>]\n<content>`, joined by blank
/// lines.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[Source: {}]\n{}", chunk.source(), chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assembles prompts and invokes the chat model.
pub struct Composer {
    model: Arc<dyn ChatModel>,
}

impl Composer {
    /// Create a composer over the given chat model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Generate a reply to `query` from `relevant_chunks` and prior turns.
    ///
    /// `prior_messages` must not include the current question; only user
    /// and assistant turns are forwarded to the model, in original order.
    ///
    /// With no chunks this returns [`NO_DOCUMENTS_REPLY`] and no sources
    /// without calling the model.
    pub async fn respond(
        &self,
        query: &str,
        relevant_chunks: &[Chunk],
        prior_messages: &[ChatMessage],
    ) -> Result<ChatReply> {
        if relevant_chunks.is_empty() {
            debug!("no relevant chunks; returning fixed reply");
            return Ok(ChatReply { text: NO_DOCUMENTS_REPLY.to_string(), sources: Vec::new() });
        }

        let context = format_context(relevant_chunks);
        let mut messages =
            Vec::with_capacity(prior_messages.len() + 2);
        messages.push(ChatMessage::system(format!("{SYSTEM_PROMPT}{context}")));
        messages.extend(
            prior_messages
                .iter()
                .filter(|m| matches!(m.role, Role::User | Role::Assistant))
                .cloned(),
        );
        messages.push(ChatMessage::user(query));

        let text = self.model.complete(&messages).await?;
        let sources = relevant_chunks.iter().map(SourceRef::from).collect();

        info!(chunk_count = relevant_chunks.len(), reply_chars = text.len(), "generated reply");
        Ok(ChatReply { text, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct CapturingModel {
        seen: tokio::sync::Mutex<Vec<ChatMessage>>,
        reply: String,
    }

    #[async_trait]
    impl ChatModel for CapturingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.seen.lock().await = messages.to_vec();
            Ok(self.reply.clone())
        }
    }

    fn chunk(source: &str, text: &str) -> Chunk {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), source.to_string());
        Chunk {
            id: "c0".to_string(),
            text: text.to_string(),
            embedding: Vec::new(),
            metadata,
            document_id: "d0".to_string(),
        }
    }

    #[test]
    fn context_block_format() {
        let chunks = vec![chunk("a.pdf", "alpha"), chunk("b.md", "beta")];
        assert_eq!(format_context(&chunks), "[Source: a.pdf]\nalpha\n\n[Source: b.md]\nbeta");
    }

    #[test]
    fn unknown_source_fallback() {
        let mut c = chunk("x", "text");
        c.metadata.clear();
        assert_eq!(format_context(&[c]), "[Source: Unknown]\ntext");
    }

    #[tokio::test]
    async fn empty_chunks_short_circuit() {
        let model = Arc::new(CapturingModel {
            seen: tokio::sync::Mutex::new(Vec::new()),
            reply: "should not be called".to_string(),
        });
        let composer = Composer::new(model.clone());
        let reply = composer
            .respond("anything", &[], &[ChatMessage::user("earlier")])
            .await
            .unwrap();
        assert_eq!(reply.text, NO_DOCUMENTS_REPLY);
        assert!(reply.sources.is_empty());
        assert!(model.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn prompt_order_and_sources() {
        let model = Arc::new(CapturingModel {
            seen: tokio::sync::Mutex::new(Vec::new()),
            reply: "the answer".to_string(),
        });
        let composer = Composer::new(model.clone());

        let history = vec![
            ChatMessage::user("first question"),
            ChatMessage::assistant("first answer", Vec::new()),
        ];
        let chunks = vec![chunk("doc.pdf", "relevant text"), chunk("doc.pdf", "more text")];

        let reply = composer.respond("second question", &chunks, &history).await.unwrap();
        assert_eq!(reply.text, "the answer");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[0].source, "doc.pdf");
        assert_eq!(reply.sources[0].content, "relevant text");

        let seen = model.seen.lock().await;
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].role, Role::System);
        assert!(seen[0].content.contains("[Source: doc.pdf]\nrelevant text"));
        assert_eq!(seen[1].content, "first question");
        assert_eq!(seen[2].content, "first answer");
        assert_eq!(seen[3].content, "second question");
        assert_eq!(seen[3].role, Role::User);
    }
}
