//! In-memory store: for the CLI and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aulabot_core::error::HistoryError;
use aulabot_core::history::{ConversationMeta, ConversationStore, StoredMessage};
use aulabot_core::message::{ConversationId, Role};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

struct Conversation {
    meta: ConversationMeta,
    messages: Vec<StoredMessage>,
}

/// Conversations kept in a map behind an async lock.
/// Nothing survives the process.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &ConversationId) -> HistoryError {
    HistoryError::NotFound(id.to_string())
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn create(&self, agent_type: &str, model: &str) -> Result<ConversationMeta, HistoryError> {
        let now = Utc::now();
        let meta = ConversationMeta {
            id: ConversationId::new(),
            agent_type: agent_type.to_string(),
            model: model.to_string(),
            title: None,
            created_at: now,
            updated_at: now,
        };
        debug!(conversation = %meta.id, agent = agent_type, "Created conversation");
        self.conversations.write().await.insert(
            meta.id.clone(),
            Conversation {
                meta: meta.clone(),
                messages: Vec::new(),
            },
        );
        Ok(meta)
    }

    async fn get(&self, id: &ConversationId) -> Result<ConversationMeta, HistoryError> {
        self.conversations
            .read()
            .await
            .get(id)
            .map(|c| c.meta.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn recent_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, HistoryError> {
        let conversations = self.conversations.read().await;
        let conversation = conversations.get(id).ok_or_else(|| not_found(id))?;
        let skip = conversation.messages.len().saturating_sub(limit);
        Ok(conversation.messages[skip..].to_vec())
    }

    async fn append_exchange(
        &self,
        id: &ConversationId,
        query: &str,
        answer: &str,
    ) -> Result<(), HistoryError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        let now = Utc::now();
        conversation.messages.push(StoredMessage {
            role: Role::User,
            content: query.to_string(),
            sent_at: now,
        });
        conversation.messages.push(StoredMessage {
            role: Role::Assistant,
            content: answer.to_string(),
            sent_at: now,
        });
        conversation.meta.updated_at = now;
        Ok(())
    }

    async fn message_count(&self, id: &ConversationId) -> Result<usize, HistoryError> {
        self.conversations
            .read()
            .await
            .get(id)
            .map(|c| c.messages.len())
            .ok_or_else(|| not_found(id))
    }

    async fn set_title(&self, id: &ConversationId, title: &str) -> Result<(), HistoryError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        conversation.meta.title = Some(title.to_string());
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ConversationMeta>, HistoryError> {
        let conversations = self.conversations.read().await;
        let mut metas: Vec<ConversationMeta> =
            conversations.values().map(|c| c.meta.clone()).collect();
        metas.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        metas.truncate(limit);
        Ok(metas)
    }
}
