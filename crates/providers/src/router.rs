//! Provider router: maps a model identifier to the provider that serves it.
//!
//! Built once from [`AppConfig`](aulabot_config::AppConfig) and shared by
//! reference. Hands out [`ModelClient`]s bound to the resolved provider.

use std::sync::Arc;

use aulabot_core::error::Error;
use aulabot_core::provider::{ChatOptions, ModelClient, Provider};
use serde::Serialize;
use tracing::debug;

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;

const ANTHROPIC_PREFIX: &str = "anthropic:";

/// One entry of the model listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub provider: String,
    pub display_name: String,
}

struct Registered {
    provider: Arc<dyn Provider>,
    default_model: Option<String>,
}

/// Routes model identifiers to providers.
pub struct ProviderRouter {
    providers: Vec<Registered>,
    options: ChatOptions,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            options: ChatOptions::default(),
        }
    }

    /// Register a provider. Earlier registrations win on catalogue overlap.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(Registered {
            provider,
            default_model: None,
        });
    }

    /// Register a provider together with the model used when only the
    /// provider is named.
    pub fn register_with_default(
        &mut self,
        provider: Arc<dyn Provider>,
        default_model: impl Into<String>,
    ) {
        self.providers.push(Registered {
            provider,
            default_model: Some(default_model.into()),
        });
    }

    /// Default options for every client handed out.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    fn entry(&self, name: &str) -> Option<&Registered> {
        self.providers.iter().find(|r| r.provider.name() == name)
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.entry(name).map(|r| r.provider.clone())
    }

    /// The model a provider falls back to when no model is named.
    pub fn default_model(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|r| r.default_model.as_deref())
    }

    /// Resolve a model identifier to `(provider, vendor model name)`.
    ///
    /// An `anthropic:` prefix forces the Anthropic provider and is stripped.
    /// A bare provider name (or `anthropic:` alone) selects that provider's
    /// default model.
    pub fn resolve(&self, model: &str) -> Result<(Arc<dyn Provider>, String), Error> {
        let unknown = || Error::UnknownModel(model.to_string());

        if let Some(rest) = model.strip_prefix(ANTHROPIC_PREFIX) {
            let entry = self.entry("anthropic").ok_or_else(unknown)?;
            let vendor_model = if rest.is_empty() {
                entry.default_model.clone().ok_or_else(unknown)?
            } else {
                rest.to_string()
            };
            return Ok((entry.provider.clone(), vendor_model));
        }

        if let Some(entry) = self.entry(model) {
            let vendor_model = entry.default_model.clone().ok_or_else(unknown)?;
            return Ok((entry.provider.clone(), vendor_model));
        }

        self.providers
            .iter()
            .find(|r| r.provider.models().iter().any(|m| *m == model))
            .map(|r| (r.provider.clone(), model.to_string()))
            .ok_or_else(unknown)
    }

    /// A ready-to-use client for `model`.
    ///
    /// Fails with a configuration error when the provider has no credential,
    /// so nothing reaches the network.
    pub fn client_for(&self, model: &str) -> Result<ModelClient, Error> {
        let (provider, vendor_model) = self.resolve(model)?;
        if !provider.is_configured() {
            return Err(Error::config(format!(
                "Provider {} is not available (check API keys)",
                provider.name()
            )));
        }
        debug!(provider = provider.name(), model = %vendor_model, "Resolved model");
        Ok(ModelClient::new(provider, vendor_model).with_options(self.options))
    }

    /// Models of configured providers only.
    pub fn available_models(&self) -> Vec<ModelInfo> {
        self.providers
            .iter()
            .map(|r| &r.provider)
            .filter(|p| p.is_configured())
            .flat_map(|p| {
                p.models().iter().map(move |model| ModelInfo {
                    model: (*model).to_string(),
                    provider: p.name().to_string(),
                    display_name: display_name(p.name(), model),
                })
            })
            .collect()
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-friendly model name.
pub fn display_name(provider: &str, model: &str) -> String {
    let known = match model {
        "gpt-4o" => "GPT-4o",
        "gpt-4o-mini" => "GPT-4o Mini",
        "gpt-4-turbo" => "GPT-4 Turbo",
        "gpt-3.5-turbo" => "GPT-3.5 Turbo",
        "claude-3-5-sonnet-20241022" => "Claude 3.5 Sonnet",
        "claude-3-5-haiku-20241022" => "Claude 3.5 Haiku",
        "claude-3-opus-20240229" => "Claude 3 Opus",
        "claude-3-sonnet-20240229" => "Claude 3 Sonnet",
        "claude-3-haiku-20240307" => "Claude 3 Haiku",
        _ => "",
    };
    if !known.is_empty() {
        return known.to_string();
    }

    let mut chars = provider.chars();
    let provider = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{provider}: {model}")
}

/// Build the router from configuration.
pub fn build_from_config(config: &aulabot_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new().with_options(ChatOptions {
        temperature: config.default_temperature,
        max_tokens: config.default_max_tokens,
    });
    let openai = &config.providers.openai;
    let anthropic = &config.providers.anthropic;
    router.register_with_default(
        Arc::new(OpenAiProvider::from_config(openai)),
        &openai.default_model,
    );
    router.register_with_default(
        Arc::new(AnthropicProvider::from_config(anthropic)),
        &anthropic.default_model,
    );
    router
}
