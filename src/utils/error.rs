//! Error Handling
//!
//! Application error type. Domain and gateway errors convert in with `?`;
//! rejected game actions are outcomes, not errors.

use interrogation_core::CoreError;
use interrogation_llm::GatewayError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Level catalog parse errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] toml::de::Error),

    /// Domain layer errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Every endpoint failed and no fallback was allowed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Malformed requests
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
