//! LLM provider implementations for aulabot.
//!
//! All providers implement the `aulabot_core::Provider` trait.
//! The router selects the provider that serves a given model identifier.

pub mod anthropic;
mod http;
pub mod openai;
pub mod router;

pub use anthropic::{AnthropicProvider, SystemPromptStyle};
pub use openai::OpenAiProvider;
pub use router::{ModelInfo, ProviderRouter, build_from_config};
