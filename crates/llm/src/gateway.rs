//! Provider Gateway
//!
//! Tries an ordered list of chat-completion endpoints and returns the first
//! non-empty reply. A transport error, a non-2xx status, an unparsable body
//! or a blank first choice all count as a failed attempt and move on to the
//! next endpoint. Every attempt is recorded in a [`GatewayLog`].

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::openai::OpenAIProvider;
use crate::provider::LlmProvider;
use crate::types::{ChatMessage, CompletionParams, LlmError, LlmResult, ProviderConfig};

/// Errors from gateway execution
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No chat-completion endpoints configured")]
    NoEndpoints,

    #[error("All {attempts} endpoints failed; last error: {last_error}")]
    AllEndpointsFailed { attempts: usize, last_error: String },
}

impl From<GatewayError> for String {
    fn from(err: GatewayError) -> String {
        err.to_string()
    }
}

// ============================================================================
// Endpoint list
// ============================================================================

/// Primary endpoint followed by the extras: trimmed, blanks dropped, and
/// deduplicated keeping the first occurrence.
pub fn candidate_endpoints(primary: &str, extras: &[String]) -> Vec<String> {
    let mut endpoints: Vec<String> = Vec::with_capacity(extras.len() + 1);
    for raw in std::iter::once(primary).chain(extras.iter().map(String::as_str)) {
        let endpoint = raw.trim();
        if endpoint.is_empty() || endpoints.iter().any(|e| e == endpoint) {
            continue;
        }
        endpoints.push(endpoint.to_string());
    }
    endpoints
}

/// Split a comma-separated endpoint list (as found in environment variables).
pub fn split_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Attempt log
// ============================================================================

/// Record of a single endpoint attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointAttempt {
    pub endpoint: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub started_at: String,
}

impl EndpointAttempt {
    fn success(endpoint: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: true,
            error_message: None,
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn failure(endpoint: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: false,
            error_message: Some(error.into()),
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Log of all attempts made for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayLog {
    pub attempts: Vec<EndpointAttempt>,
    pub total_duration_ms: u64,
    pub successful_endpoint: Option<String>,
}

impl GatewayLog {
    fn add_attempt(&mut self, attempt: EndpointAttempt) {
        self.total_duration_ms += attempt.duration_ms;
        if attempt.success {
            self.successful_endpoint = Some(attempt.endpoint.clone());
        }
        self.attempts.push(attempt);
    }

    pub fn failed_attempts_count(&self) -> usize {
        self.attempts.iter().filter(|a| !a.success).count()
    }
}

// ============================================================================
// ProviderGateway
// ============================================================================

/// Ordered set of endpoints tried one after another.
#[derive(Clone)]
pub struct ProviderGateway {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderGateway {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// One OpenAI-compatible provider per candidate endpoint, all sharing the
    /// key, model and timeout of `config`.
    ///
    /// Endpoints with an unusable URL are skipped with a warning.
    pub fn from_config(config: &ProviderConfig, fallback_base_urls: &[String]) -> Self {
        let providers = candidate_endpoints(&config.base_url, fallback_base_urls)
            .into_iter()
            .filter_map(|base_url| {
                let endpoint_config = ProviderConfig {
                    base_url,
                    ..config.clone()
                };
                match OpenAIProvider::new(endpoint_config) {
                    Ok(provider) => Some(Arc::new(provider) as Arc<dyn LlmProvider>),
                    Err(e) => {
                        warn!("[Gateway] Skipping endpoint: {}", e);
                        None
                    }
                }
            })
            .collect();
        Self::new(providers)
    }

    /// Endpoint names in the order they are tried.
    pub fn endpoints(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Send the conversation to each endpoint in order until one answers with
    /// non-empty text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        params: CompletionParams,
    ) -> Result<(String, GatewayLog), GatewayError> {
        if self.providers.is_empty() {
            return Err(GatewayError::NoEndpoints);
        }

        let mut log = GatewayLog::default();
        let mut last_error = String::new();

        for provider in &self.providers {
            let endpoint = provider.name().to_string();
            debug!("[Gateway] Trying endpoint {}", endpoint);
            let attempt_start = Instant::now();

            let result = attempt(provider.as_ref(), messages, system, params).await;
            let duration_ms = attempt_start.elapsed().as_millis() as u64;

            match result {
                Ok(text) => {
                    info!("[Gateway] Endpoint {} answered in {}ms", endpoint, duration_ms);
                    log.add_attempt(EndpointAttempt::success(endpoint, duration_ms));
                    return Ok((text, log));
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!("[Gateway] Endpoint {} failed: {}", endpoint, last_error);
                    log.add_attempt(EndpointAttempt::failure(endpoint, &last_error, duration_ms));
                }
            }
        }

        warn!(
            "[Gateway] All {} endpoints failed",
            log.failed_attempts_count()
        );
        Err(GatewayError::AllEndpointsFailed {
            attempts: log.attempts.len(),
            last_error,
        })
    }
}

async fn attempt(
    provider: &dyn LlmProvider,
    messages: &[ChatMessage],
    system: Option<&str>,
    params: CompletionParams,
) -> LlmResult<String> {
    let response = provider
        .send_message(messages.to_vec(), system.map(str::to_string), params)
        .await?;
    response
        .non_empty_content()
        .map(str::to_string)
        .ok_or_else(|| LlmError::EmptyResponse {
            endpoint: provider.name().to_string(),
        })
}
