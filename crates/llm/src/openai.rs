//! OpenAI-Compatible Provider
//!
//! Implementation of the LlmProvider trait for any endpoint speaking the
//! OpenAI `/chat/completions` protocol. Requests are always non-streaming.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    ChatMessage, CompletionParams, LlmError, LlmResponse, LlmResult, ProviderConfig,
};
use crate::http_client::build_http_client;

/// Path appended to the configured base URL
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// OpenAI-compatible provider bound to one base URL
pub struct OpenAIProvider {
    config: ProviderConfig,
    endpoint: url::Url,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a provider for `config.base_url`.
    ///
    /// Fails when the base URL is not an absolute http(s) URL.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let endpoint = chat_completions_url(&config.base_url)?;
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Full chat-completions URL this provider posts to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        params: CompletionParams,
    ) -> serde_json::Value {
        let mut openai_messages: Vec<serde_json::Value> = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for msg in messages {
            openai_messages.push(serde_json::json!({
                "role": msg.role.as_str(),
                "content": msg.content
            }));
        }

        serde_json::json!({
            "model": self.config.model,
            "messages": openai_messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": false,
        })
    }

    fn parse_response(&self, response: OpenAIResponse) -> LlmResponse {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        LlmResponse {
            content,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        }
    }
}

/// Join `base_url` and the chat-completions path.
fn chat_completions_url(base_url: &str) -> LlmResult<url::Url> {
    let base = format!("{}/", base_url.trim().trim_end_matches('/'));
    let parsed = url::Url::parse(&base).map_err(|e| LlmError::InvalidRequest {
        message: format!("invalid base URL '{}': {}", base_url, e),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LlmError::InvalidRequest {
            message: format!("unsupported scheme in base URL '{}'", base_url),
        });
    }
    parsed
        .join(CHAT_COMPLETIONS_PATH)
        .map_err(|e| LlmError::InvalidRequest {
            message: format!("invalid base URL '{}': {}", base_url, e),
        })
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<ChatMessage>,
        system: Option<String>,
        params: CompletionParams,
    ) -> LlmResult<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error(self.name()))?;

        let body = self.build_request_body(&messages, system.as_deref(), params);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(openai_response))
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
