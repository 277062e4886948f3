//! Built-in tool implementations for aulabot.
//!
//! Research tools search Google and fetch pages; the Aula tools read the
//! Danish school portal. Each agent gets its own [`ToolRegistry`].

pub mod aula;
pub mod fetch_url;
pub mod google_search;

use std::sync::Arc;
use std::time::Duration;

use aulabot_config::AppConfig;
use aulabot_core::tool::ToolRegistry;
use tracing::warn;

pub use aula::AulaClient;
pub use fetch_url::FetchUrlTool;
pub use google_search::GoogleSearchTool;

/// Build a client with a bounded request timeout.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// `google_search` and `fetch_url`.
pub fn research_tools(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GoogleSearchTool::new(config.google.clone())));
    registry.register(Box::new(FetchUrlTool::new(&config.fetch)));
    registry
}

/// The five portal tools over one shared client.
pub fn aula_tools(client: Arc<AulaClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(aula::SetActiveChildTool::new(client.clone())));
    registry.register(Box::new(aula::FetchBasicDataTool::new(client.clone())));
    registry.register(Box::new(aula::FetchDailyOverviewTool::new(client.clone())));
    registry.register(Box::new(aula::FetchMessagesTool::new(client.clone())));
    registry.register(Box::new(aula::FetchCalendarTool::new(client)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_registry_has_both_tools() {
        let registry = research_tools(&AppConfig::default());
        assert_eq!(registry.names(), vec!["fetch_url", "google_search"]);
    }

    #[test]
    fn aula_registry_has_five_tools() {
        let client = Arc::new(AulaClient::new(Default::default()));
        let registry = aula_tools(client);
        assert_eq!(
            registry.names(),
            vec![
                "fetch_basic_data",
                "fetch_calendar",
                "fetch_daily_overview",
                "fetch_messages",
                "set_active_child"
            ]
        );
    }
}
