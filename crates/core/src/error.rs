//! Core Error Types
//!
//! Errors raised by the persistence boundary of the core crate. Precondition
//! failures of game actions are not errors and never show up here.

use thiserror::Error;

/// Core error type for the Interrogation Room workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// File I/O errors from a disk-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store backend refused a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Bad key or value handed to a store
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
