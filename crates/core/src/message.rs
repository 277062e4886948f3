//! Message and Transcript domain types.
//!
//! A transcript is what the agent loop sends to the model: exactly one
//! leading system message followed by user/assistant turns. Tool bookkeeping
//! is carried as ordinary assistant/user messages, there is no tool role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (agent prompt)
    System,
    /// The end user, and tool results fed back in-band
    User,
    /// The model, and synthetic tool-intent narration
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// The working message list of one agent session.
///
/// Append-only: entries are never edited or removed once pushed, and the
/// first entry is always the single system message.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript with its system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Build system prompt + prior turns + the new user query.
    ///
    /// System messages found in `history` are dropped so the leading
    /// system message stays unique.
    pub fn with_history(
        system_prompt: impl Into<String>,
        history: impl IntoIterator<Item = Message>,
        query: impl Into<String>,
    ) -> Self {
        let mut transcript = Self::new(system_prompt);
        for message in history {
            if message.role != Role::System {
                transcript.messages.push(message);
            }
        }
        transcript.messages.push(Message::user(query));
        transcript
    }

    /// Append a user or assistant message.
    pub fn push(&mut self, message: Message) {
        if message.role == Role::System {
            tracing::warn!("Ignoring extra system message; transcript keeps a single system prompt");
            return;
        }
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.messages.iter().map(|m| m.role).collect()
    }
}

/// Fold every system message into the first user turn.
///
/// For backends with no system-role concept. The system text is prepended
/// to the first user message; if there is no user message a user message
/// carrying only the system text is placed first.
pub fn fold_system_into_first_user(messages: &[Message]) -> Vec<Message> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let mut rest: Vec<Message> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .collect();

    if system.is_empty() {
        return rest;
    }
    let system = system.join("\n\n");

    match rest.iter_mut().find(|m| m.role == Role::User) {
        Some(first_user) => {
            first_user.content = format!("{system}\n\n{}", first_user.content);
        }
        None => rest.insert(0, Message::user(system)),
    }
    rest
}
