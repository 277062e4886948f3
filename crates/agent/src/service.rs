//! Chat service: one query in, one persisted answer out.
//!
//! Glue between the history store, the agent factory, the model router and
//! the agent loop. Everything that can be checked locally (query, agent,
//! model, credentials) is checked before the first network call.

use std::sync::Arc;
use std::time::Duration;

use aulabot_config::{AgentSettings, AppConfig};
use aulabot_core::error::Error;
use aulabot_core::history::{ConversationMeta, ConversationStore, title_from_query};
use aulabot_core::message::{ConversationId, Message, Transcript};
use aulabot_core::tool::ToolContext;
use aulabot_providers::ProviderRouter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::factory::AgentFactory;
use crate::loop_runner::{AgentLoop, LoopOutcome};

/// Longest accepted query, in characters.
pub const MAX_QUERY_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    /// Model identifier; falls back to the conversation's, then the default.
    #[serde(default)]
    pub model: Option<String>,

    /// Agent type; falls back to the conversation's, then the default.
    #[serde(default)]
    pub agent: Option<String>,

    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn in_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: ConversationId,
    pub timestamp: DateTime<Utc>,
}

pub struct ChatService {
    router: Arc<ProviderRouter>,
    factory: Arc<AgentFactory>,
    store: Arc<dyn ConversationStore>,
    settings: AgentSettings,
    default_model: String,
    default_agent: String,
}

impl ChatService {
    pub fn new(
        router: Arc<ProviderRouter>,
        factory: Arc<AgentFactory>,
        store: Arc<dyn ConversationStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            router,
            factory,
            store,
            settings: config.agent.clone(),
            default_model: config.default_model.clone(),
            default_agent: config.default_agent.clone(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    pub async fn chat(&self, request: QueryRequest) -> Result<ChatResponse, Error> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(Error::InvalidRequest("query must not be empty".into()));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(Error::InvalidRequest(format!(
                "query exceeds {MAX_QUERY_CHARS} characters"
            )));
        }

        let existing = match &request.conversation_id {
            Some(id) => Some(self.store.get(id).await?),
            None => None,
        };

        let agent_type = request
            .agent
            .or_else(|| existing.as_ref().map(|c| c.agent_type.clone()))
            .unwrap_or_else(|| self.default_agent.clone());
        let model = request
            .model
            .or_else(|| existing.as_ref().map(|c| c.model.clone()))
            .unwrap_or_else(|| self.default_model.clone());

        let agent = self.factory.create(&agent_type)?;
        let client = self.router.client_for(&model)?;
        agent.ensure_ready()?;

        let conversation = match existing {
            Some(meta) => meta,
            None => self.store.create(&agent_type, &model).await?,
        };

        let history: Vec<Message> = self
            .store
            .recent_messages(&conversation.id, self.settings.history_window)
            .await?
            .into_iter()
            .map(Message::from)
            .collect();

        info!(
            conversation = %conversation.id,
            agent = %agent_type,
            model = %model,
            history = history.len(),
            "Processing query"
        );

        let mut transcript =
            Transcript::with_history(agent.system_prompt(Utc::now()), history, query);
        let mut ctx = ToolContext::new();
        let agent_loop = AgentLoop::new(client, agent.tools(), agent.parser())
            .with_max_iterations(self.settings.max_iterations);

        let outcome = self
            .run_bounded(&agent_loop, &mut transcript, &mut ctx)
            .await
            .inspect_err(|e| error!(conversation = %conversation.id, error = %e, "Chat error"))?;

        self.persist(&conversation, query, &outcome.answer).await?;

        Ok(ChatResponse {
            response: outcome.answer,
            conversation_id: conversation.id,
            timestamp: Utc::now(),
        })
    }

    async fn run_bounded(
        &self,
        agent_loop: &AgentLoop,
        transcript: &mut Transcript,
        ctx: &mut ToolContext,
    ) -> Result<LoopOutcome, Error> {
        match self.settings.session_timeout_secs {
            Some(secs) => tokio::time::timeout(
                Duration::from_secs(secs),
                agent_loop.run(transcript, ctx),
            )
            .await
            .map_err(|_| Error::DeadlineExceeded { secs })?,
            None => agent_loop.run(transcript, ctx).await,
        }
    }

    async fn persist(
        &self,
        conversation: &ConversationMeta,
        query: &str,
        answer: &str,
    ) -> Result<(), Error> {
        self.store
            .append_exchange(&conversation.id, query, answer)
            .await?;

        if conversation.title.is_none() && self.store.message_count(&conversation.id).await? <= 2 {
            self.store
                .set_title(&conversation.id, &title_from_query(query))
                .await?;
        }
        Ok(())
    }
}
