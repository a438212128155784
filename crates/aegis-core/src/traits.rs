// Collaborator traits
//
// These traits keep the engine agnostic of its backends:
// - KeyValueStore: the storage collaborator (in-memory for dev/tests,
//   anything key-value shaped in production)
// - LanguageModel: the text-generation collaborator

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// KeyValueStore - the storage collaborator contract
// ============================================================================

/// Async key-value storage with prefix listing.
///
/// Semantics are last-write-wins; no transactions, no secondary indexes.
/// Values are JSON documents.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`; returns whether a value was present
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List all `(key, value)` pairs, optionally restricted to a key prefix
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<(String, Value)>>;
}

// ============================================================================
// LanguageModel - the inference collaborator contract
// ============================================================================

/// Message role for chat-style LLM calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Provider-agnostic chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat-style text generation. The engine treats the model as a black box:
/// a call either succeeds with text or fails.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and return the generated text
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String>;
}
