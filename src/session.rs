//! Per-session state: credentials, conversation history, processed sources.
//!
//! All session-scoped mutable state lives on an explicit [`Session`] value
//! passed into every call, so nothing leaks across sessions. Credentials
//! resolve with session-scoped overrides first, then the environment.

use std::collections::{HashMap, HashSet};

use crate::document::{ChatMessage, SourceRef};
use crate::error::{RagChatError, Result};

/// Environment/credential name for the OpenAI API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment/credential name for the Cohere API key.
pub const COHERE_API_KEY: &str = "COHERE_API_KEY";

/// State scoped to one chat session.
///
/// History is append-only and lives only as long as the session; nothing
/// here is persisted.
#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<ChatMessage>,
    credentials: HashMap<String, String>,
    processed_sources: HashSet<String>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a session-scoped credential override.
    ///
    /// An empty value is treated as absent, matching how a cleared input
    /// field should fall back to the environment.
    pub fn set_credential(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.credentials.remove(&name);
        } else {
            self.credentials.insert(name, value);
        }
    }

    /// Resolve a credential: session override first, then the environment.
    pub fn credential(&self, name: &str) -> Option<String> {
        if let Some(value) = self.credentials.get(name) {
            return Some(value.clone());
        }
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    /// Resolve a credential or fail with a configuration error.
    pub fn require_credential(&self, name: &str) -> Result<String> {
        self.credential(name).ok_or_else(|| {
            RagChatError::Config(format!("{name} not found in session or environment"))
        })
    }

    /// The full conversation history, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant message with its cited sources.
    pub fn push_assistant(&mut self, content: impl Into<String>, sources: Vec<SourceRef>) {
        self.messages.push(ChatMessage::assistant(content, sources));
    }

    /// Record a source as ingested. Returns `false` if it was already.
    pub fn mark_processed(&mut self, source: impl Into<String>) -> bool {
        self.processed_sources.insert(source.into())
    }

    /// Whether a source was already ingested in this session.
    pub fn is_processed(&self, source: &str) -> bool {
        self.processed_sources.contains(source)
    }

    /// Forget all processed sources (used after a store clear).
    pub fn reset_processed(&mut self) {
        self.processed_sources.clear();
    }
}
