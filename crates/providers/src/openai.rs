//! OpenAI chat-completions provider.
//!
//! Bearer authentication, `POST {base}/chat/completions`, non-streaming.
//! The text is read from `choices[0].message.content`.

use std::time::Duration;

use async_trait::async_trait;
use aulabot_config::ProviderConfig;
use aulabot_core::error::ProviderError;
use aulabot_core::message::Message;
use aulabot_core::provider::{CompletionRequest, Provider};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"];

pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client: http::client_with_timeout(Duration::from_secs(120)),
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

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn build_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.options.temperature,
            "max_tokens": request.options.max_tokens,
            "stream": false,
        })
    }

    fn extract_text(response: ApiResponse) -> String {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> &[&'static str] {
        OPENAI_MODELS
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("OpenAI API key not set".into()))?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "openai",
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let response = http::check_status("OpenAI", response).await?;

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse OpenAI response: {e}"))
        })?;

        Ok(Self::extract_text(api_response))
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aulabot_core::provider::ChatOptions;
    use axum::{Json, Router, http::HeaderMap, routing::post};

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    #[test]
    fn message_conversion_keeps_system_role() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn body_has_expected_shape() {
        let body = OpenAiProvider::build_body(&request(vec![Message::user("hi")]));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn missing_content_is_empty_text() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(OpenAiProvider::extract_text(parsed), "");

        let empty: ApiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(OpenAiProvider::extract_text(empty), "");
    }

    #[test]
    fn empty_key_is_unconfigured() {
        let provider = OpenAiProvider::new("http://localhost", Some(String::new()));
        assert!(!provider.is_configured());
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn complete_against_local_server() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(serde_json::json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": format!("{auth} {}", body["messages"][0]["content"].as_str().unwrap_or_default())
                        }
                    }]
                }))
            }),
        );
        let base = serve(app).await;

        let provider = OpenAiProvider::new(base, Some("sk-test".into()));
        let text = provider
            .complete(request(vec![Message::user("ping")]))
            .await
            .unwrap();
        assert_eq!(text, "Bearer sk-test ping");
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(app).await;

        let provider = OpenAiProvider::new(base, Some("sk-test".into()));
        let err = provider
            .complete(request(vec![Message::user("ping")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 502, .. }));
        assert!(err.is_upstream());
    }
}
