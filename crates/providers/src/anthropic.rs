//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field, or folded into the first user turn
//!   for gateways that reject the field

use std::time::Duration;

use async_trait::async_trait;
use aulabot_config::ProviderConfig;
use aulabot_core::error::ProviderError;
use aulabot_core::message::{Message, Role, fold_system_into_first_user};
use aulabot_core::provider::{CompletionRequest, Provider};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Where system messages go in the outgoing payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SystemPromptStyle {
    /// Top-level `system` field.
    #[default]
    TopLevelField,
    /// Prepended to the first user message.
    FoldIntoFirstUser,
}

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    system_style: SystemPromptStyle,
}

impl AnthropicProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client: http::client_with_timeout(Duration::from_secs(120)),
            system_style: SystemPromptStyle::default(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.api_url, config.api_key.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client_with_timeout(timeout);
        self
    }

    pub fn with_system_style(mut self, style: SystemPromptStyle) -> Self {
        self.system_style = style;
        self
    }

    /// Split system content from the conversational turns.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    fn to_api_messages(messages: &[&Message]) -> Vec<AnthropicMessage> {
        messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
        });

        match self.system_style {
            SystemPromptStyle::TopLevelField => {
                let (system, messages) = Self::extract_system(&request.messages);
                body["messages"] = serde_json::json!(Self::to_api_messages(&messages));
                if let Some(sys) = system {
                    body["system"] = serde_json::json!(sys);
                }
            }
            SystemPromptStyle::FoldIntoFirstUser => {
                let folded = fold_system_into_first_user(&request.messages);
                let refs: Vec<&Message> = folded.iter().collect();
                body["messages"] = serde_json::json!(Self::to_api_messages(&refs));
            }
        }

        body
    }

    /// Concatenate every text block.
    fn extract_text(response: AnthropicResponse) -> String {
        response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> &[&'static str] {
        ANTHROPIC_MODELS
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("Anthropic API key not set".into()))?;
        let url = format!("{}/messages", self.base_url);
        let body = self.build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let response = http::check_status("Anthropic", response).await?;

        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        Ok(Self::extract_text(api_resp))
    }
}

// --- Anthropic API types (internal) ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
