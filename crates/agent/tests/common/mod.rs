//! Shared fixtures for the agent integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use aulabot_core::error::{ProviderError, ToolError};
use aulabot_core::message::Message;
use aulabot_core::provider::{CompletionRequest, Provider};
use aulabot_core::tool::{Tool, ToolContext, ToolRegistry};

pub const MOCK_MODEL: &str = "mock-model";

/// A provider that replays canned responses and records each transcript.
pub struct ScriptedProvider {
    configured: bool,
    delay: Option<Duration>,
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            configured: true,
            delay: None,
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// The first call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        let provider = Self::new(&[]);
        *provider.responses.lock().unwrap() = vec![Err(error)];
        provider
    }

    /// Every call returns `response`.
    pub fn repeating(response: &str, times: usize) -> Self {
        Self::new(&vec![response; times])
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(&[])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn models(&self) -> &[&'static str] {
        &[MOCK_MODEL]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let index = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(request.messages);
            seen.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let responses = self.responses.lock().unwrap();
        responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse(format!("no response #{index}"))))
    }
}

/// Stand-in for `google_search` that counts its executions.
#[derive(Default)]
pub struct CountingSearch {
    pub runs: AtomicUsize,
}

#[async_trait]
impl Tool for CountingSearch {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Stub search"
    }

    async fn execute(
        &self,
        parameters: &serde_json::Map<String, serde_json::Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let query = parameters
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(format!("Search query 1: {query}\nResults:\n- Stub\n  https://example.test\n  snippet\n"))
    }
}

/// Stand-in for `fetch_url` that always fails upstream.
pub struct BrokenFetch;

#[async_trait]
impl Tool for BrokenFetch {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn execute(
        &self,
        _parameters: &serde_json::Map<String, serde_json::Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        Err(ToolError::upstream("Fetch", "connection reset"))
    }
}

/// Registry delegating `google_search` to a shared counter.
pub fn search_registry(search: std::sync::Arc<CountingSearch>) -> ToolRegistry {
    struct Shared(std::sync::Arc<CountingSearch>);

    #[async_trait]
    impl Tool for Shared {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn description(&self) -> &str {
            self.0.description()
        }
        async fn execute(
            &self,
            parameters: &serde_json::Map<String, serde_json::Value>,
            ctx: &mut ToolContext,
        ) -> Result<String, ToolError> {
            self.0.execute(parameters, ctx).await
        }
    }

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(Shared(search)));
    registry.register(Box::new(BrokenFetch));
    registry
}

pub const SEARCH_MARKER: &str = r#"I'll call google_search with query: "X" and query_number: 1"#;
