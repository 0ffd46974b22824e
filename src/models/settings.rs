//! Settings Models
//!
//! Application configuration stored in config.json.

use interrogation_core::state::DEFAULT_LOGIC_COOLDOWN_MS;
use interrogation_llm::gateway::split_endpoint_list;
use interrogation_llm::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the primary base URL
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Environment variable with comma-separated fallback base URLs
pub const ENV_FALLBACK_BASE_URLS: &str = "OPENAI_FALLBACK_BASE_URLS";

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Primary OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Extra base URLs tried in order after the primary
    #[serde(default)]
    pub fallback_base_urls: Vec<String>,
    /// API key; only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Logic Press cooldown in milliseconds
    #[serde(default = "default_logic_cooldown_ms")]
    pub logic_cooldown_ms: u64,
    /// Level opened when none is given on the command line
    #[serde(default = "default_level")]
    pub default_level: String,
    /// Answer with the offline responder when every endpoint fails
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: bool,
}

fn default_base_url() -> String {
    "https://api.chatanywhere.tech/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_logic_cooldown_ms() -> u64 {
    DEFAULT_LOGIC_COOLDOWN_MS
}

fn default_level() -> String {
    "level-1".to_string()
}

fn default_offline_fallback() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_base_urls: Vec::new(),
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            logic_cooldown_ms: default_logic_cooldown_ms(),
            default_level: default_level(),
            offline_fallback: default_offline_fallback(),
        }
    }
}

impl AppConfig {
    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(list) = lookup(ENV_FALLBACK_BASE_URLS) {
            let extras = split_endpoint_list(&list);
            if !extras.is_empty() {
                self.fallback_base_urls = extras;
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Provider settings for the primary endpoint.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        if self.default_level.trim().is_empty() {
            return Err("default_level must not be empty".to_string());
        }
        Ok(())
    }
}
