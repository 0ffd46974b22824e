//! Interrogation LLM
//!
//! Chat-completion access for the interrogation game:
//! - OpenAI-compatible `/chat/completions` provider
//! - Ordered multi-endpoint gateway with attempt logging
//!
//! Also includes the HTTP client factory.

pub mod gateway;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use gateway::{candidate_endpoints, GatewayError, GatewayLog, ProviderGateway};
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
