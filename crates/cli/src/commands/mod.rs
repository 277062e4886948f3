//! Subcommand implementations and the shared wiring they use.

pub mod agents;
pub mod chat;
pub mod doctor;
pub mod models;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use aulabot_agent::{AgentFactory, ChatService};
use aulabot_config::AppConfig;
use aulabot_history::InMemoryStore;

pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// File (if any) plus environment overrides.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = config_path(explicit);
    AppConfig::load_with_env(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Router, agents and an in-memory history, all built once.
pub fn build_service(config: &AppConfig) -> ChatService {
    let router = Arc::new(aulabot_providers::build_from_config(config));
    let factory = Arc::new(AgentFactory::from_config(config));
    let store = Arc::new(InMemoryStore::new());
    ChatService::new(router, factory, store, config)
}
