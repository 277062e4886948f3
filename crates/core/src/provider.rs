//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send an ordered message list to one vendor API
//! and return the generated text. [`ModelClient`] binds a provider to a
//! model identifier and default options, exposing the uniform
//! `chat(messages) -> text` capability the agent loop uses.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Sampling options for one chat call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Everything a provider needs for one completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// The vendor model name (e.g. "gpt-4o", "claude-3-5-sonnet-20241022")
    pub model: String,

    /// The ordered conversation
    pub messages: Vec<Message>,

    pub options: ChatOptions,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop never sees
/// which provider answers; it only holds a [`ModelClient`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Whether a credential is present. Unconfigured providers must refuse
    /// to make network calls.
    fn is_configured(&self) -> bool;

    /// Model identifiers this provider serves.
    fn models(&self) -> &[&'static str];

    /// Send a request and get the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// A provider bound to one model and its default options.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    model: String,
    options: ChatOptions,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn options(&self) -> ChatOptions {
        self.options
    }

    /// `chat(messages) -> text` with the bound defaults.
    pub async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        self.chat_with(messages, self.options).await
    }

    /// `chat(messages, options) -> text`.
    ///
    /// Fails with `NotConfigured` before touching the network when the
    /// provider has no credential.
    pub async fn chat_with(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<String, ProviderError> {
        if !self.provider.is_configured() {
            return Err(ProviderError::NotConfigured(format!(
                "Provider {} is not available (check API keys)",
                self.provider.name()
            )));
        }

        self.provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: messages.to_vec(),
                options,
            })
            .await
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("options", &self.options)
            .finish()
    }
}
