//! LLM Provider Trait
//!
//! Defines the common interface for chat-completion endpoints.

use async_trait::async_trait;

use super::types::{ChatMessage, CompletionParams, LlmError, LlmResponse, LlmResult};

/// Trait that every chat-completion endpoint implements.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Identifier used in logs and attempt records (usually the base URL).
    fn name(&self) -> &str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Send a conversation and get a complete response.
    ///
    /// # Arguments
    /// * `messages` - Conversation history, oldest first
    /// * `system` - Optional system prompt, sent ahead of the history
    /// * `params` - Sampling parameters for this call site
    async fn send_message(
        &self,
        messages: Vec<ChatMessage>,
        system: Option<String>,
        params: CompletionParams,
    ) -> LlmResult<LlmResponse>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
