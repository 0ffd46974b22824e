//! Cross-Platform Path Utilities
//!
//! Functions for resolving the application data directory and the files
//! inside it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Directory name under the platform data directory.
const APP_DIR_NAME: &str = "interrogation-room";

/// Get the default data directory (`<platform data dir>/interrogation-room`)
pub fn default_data_dir() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::config("Could not determine data directory"))
}

/// Get the config file path (`<data_dir>/config.json`)
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

/// Get the key-value store directory (`<data_dir>/store`)
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("store")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
