//! Page fetch tool: URL in, stripped plain text out.

use std::time::Duration;

use async_trait::async_trait;
use aulabot_config::FetchConfig;
use aulabot_core::error::ToolError;
use aulabot_core::tool::{Tool, ToolContext};
use scraper::{Html, Node};
use tracing::{debug, warn};

use crate::http_client;

pub struct FetchUrlTool {
    max_chars: usize,
    client: reqwest::Client,
}

impl FetchUrlTool {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            client: http_client(Duration::from_secs(config.timeout_secs)),
        }
    }
}

/// Visible text of an HTML document with whitespace collapsed.
/// Script and style contents are dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            matches!(
                a.value().as_element().map(|e| e.name()),
                Some("script" | "style" | "noscript")
            )
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap `text` at `max_chars` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch and return the plain-text of any URL"
    }

    async fn execute(
        &self,
        parameters: &serde_json::Map<String, serde_json::Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let url = parameters
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        debug!(url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::upstream("fetch_url", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Page fetch failed");
            return Ok(format!("Failed to fetch URL: {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::upstream("fetch_url", e.to_string()))?;

        let text = truncate_chars(&html_to_text(&body), self.max_chars);
        Ok(format!("Content from {url}:\n{text}"))
    }
}
