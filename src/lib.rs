//! Interrogation Room
//!
//! A detective game played against a language model. The player questions
//! an AI suspect, presents evidence and spends energy on special moves until
//! the suspect's stress breaks it into a confession.
//!
//! It includes:
//! - Terminal command handlers
//! - The interrogation session and its provider services
//! - Storage for configuration and cross-session progress
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::{execute, parse_command, Command, Flow};
pub use models::response::*;
pub use models::settings::AppConfig;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
