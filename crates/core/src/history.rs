//! Conversation history: the persistence collaborator of the chat service.
//!
//! The agent core never stores anything itself. It reads a bounded window of
//! prior turns before a query and hands back the user query and final answer
//! afterwards. Storage schema is up to the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::message::{ConversationId, Message, Role};

/// Conversation-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMeta {
    pub id: ConversationId,

    /// Agent type this conversation talks to (e.g. "research_agent")
    pub agent_type: String,

    /// Model identifier chosen for this conversation
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

impl From<StoredMessage> for Message {
    fn from(stored: StoredMessage) -> Self {
        Message {
            role: stored.role,
            content: stored.content,
            timestamp: stored.sent_at,
        }
    }
}

/// The history adapter.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new, untitled conversation.
    async fn create(&self, agent_type: &str, model: &str) -> Result<ConversationMeta, HistoryError>;

    /// Look up a conversation.
    async fn get(&self, id: &ConversationId) -> Result<ConversationMeta, HistoryError>;

    /// The most recent `limit` messages, oldest first.
    async fn recent_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, HistoryError>;

    /// Persist one exchange: the user query, then the final answer.
    async fn append_exchange(
        &self,
        id: &ConversationId,
        query: &str,
        answer: &str,
    ) -> Result<(), HistoryError>;

    /// Total number of stored messages in a conversation.
    async fn message_count(&self, id: &ConversationId) -> Result<usize, HistoryError>;

    async fn set_title(&self, id: &ConversationId, title: &str) -> Result<(), HistoryError>;

    /// Most recently updated conversations first.
    async fn list(&self, limit: usize) -> Result<Vec<ConversationMeta>, HistoryError>;
}

/// Derive a title from the first user message: 50 characters, then "...".
pub fn title_from_query(query: &str) -> String {
    const MAX_TITLE_CHARS: usize = 50;
    let mut title: String = query.chars().take(MAX_TITLE_CHARS).collect();
    if query.chars().count() > MAX_TITLE_CHARS {
        title.push_str("...");
    }
    title
}
