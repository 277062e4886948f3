//! Google Custom Search tool.
//!
//! Takes a keyword `query` and a `query_number` (the model numbers its
//! searches) and returns the ranked `{title, link, snippet}` list as text.

use std::time::Duration;

use async_trait::async_trait;
use aulabot_config::GoogleSearchConfig;
use aulabot_core::error::ToolError;
use aulabot_core::tool::{Tool, ToolContext};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http_client;

pub struct GoogleSearchTool {
    config: GoogleSearchConfig,
    client: reqwest::Client,
}

impl GoogleSearchTool {
    pub fn new(config: GoogleSearchConfig) -> Self {
        let client = http_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchItem {
    title: String,
    link: String,
    snippet: String,
}

fn format_results(query_number: i64, query: &str, items: &[SearchItem]) -> String {
    let listing = items
        .iter()
        .map(|item| format!("- {}\n  {}\n  {}\n", item.title, item.link, item.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Search query {query_number}: {query}\nResults:\n{listing}")
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Look up 3-5 results on Google"
    }

    async fn execute(
        &self,
        parameters: &serde_json::Map<String, serde_json::Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let query = parameters
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let query_number = parameters
            .get("query_number")
            .and_then(|v| v.as_i64())
            .unwrap_or(1);

        if !self.config.is_configured() {
            return Ok("Google Search API not configured".into());
        }
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let cx = self.config.engine_id.as_deref().unwrap_or_default();

        debug!(query, query_number, "Running Google search");

        let num = self.config.num_results.to_string();
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("key", key),
                ("cx", cx),
                ("q", query),
                ("num", num.as_str()),
                ("cr", self.config.country.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ToolError::upstream("Search", e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(query, "Google search returned an error");
            return Err(ToolError::upstream("Search", body));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::upstream("Search", format!("invalid response: {e}")))?;

        Ok(format_results(query_number, query, &data.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, routing::get};
    use std::collections::HashMap;

    fn params(query: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("query".into(), query.into());
        map.insert("query_number".into(), 2.into());
        map
    }

    #[test]
    fn results_are_formatted_as_blocks() {
        let items = vec![
            SearchItem {
                title: "Aula".into(),
                link: "https://aula.dk".into(),
                snippet: "Skoleintra".into(),
            },
            SearchItem {
                title: "Uge 7".into(),
                link: "https://kk.dk".into(),
                snippet: "Vinterferie".into(),
            },
        ];
        let text = format_results(1, "vinterferie 2025", &items);
        assert_eq!(
            text,
            "Search query 1: vinterferie 2025\nResults:\n- Aula\n  https://aula.dk\n  Skoleintra\n\n- Uge 7\n  https://kk.dk\n  Vinterferie\n"
        );
    }

    #[tokio::test]
    async fn unconfigured_search_reports_it() {
        let tool = GoogleSearchTool::new(GoogleSearchConfig::default());
        let out = tool
            .execute(&params("x"), &mut ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out, "Google Search API not configured");
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = GoogleSearchTool::new(GoogleSearchConfig::default());
        let err = tool
            .execute(&serde_json::Map::new(), &mut ToolContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/customsearch/v1")
    }

    fn configured(api_url: String) -> GoogleSearchConfig {
        GoogleSearchConfig {
            api_key: Some("g-key".into()),
            engine_id: Some("cx-1".into()),
            api_url,
            ..GoogleSearchConfig::default()
        }
    }

    #[tokio::test]
    async fn search_sends_expected_parameters() {
        let app = Router::new().route(
            "/customsearch/v1",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(serde_json::json!({
                    "items": [{
                        "title": format!("{}|{}|{}|{}", q["key"], q["cx"], q["num"], q["cr"]),
                        "link": "https://example.dk",
                        "snippet": q["q"]
                    }]
                }))
            }),
        );
        let tool = GoogleSearchTool::new(configured(serve(app).await));

        let out = tool
            .execute(&params("skole ferie"), &mut ToolContext::new())
            .await
            .unwrap();
        assert!(out.starts_with("Search query 2: skole ferie\nResults:\n"));
        assert!(out.contains("- g-key|cx-1|5|countryDK\n  https://example.dk\n  skole ferie\n"));
    }

    #[tokio::test]
    async fn failed_search_carries_body() {
        let app = Router::new().route(
            "/customsearch/v1",
            get(|| async { (axum::http::StatusCode::FORBIDDEN, "quota exceeded") }),
        );
        let tool = GoogleSearchTool::new(configured(serve(app).await));

        let err = tool
            .execute(&params("x"), &mut ToolContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Search failed: quota exceeded");
    }
}
