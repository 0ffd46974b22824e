//! Storage Layer
//!
//! Handles all data persistence: the JSON config file and the JSON-file
//! key-value store behind the archive.

pub mod config;
pub mod kv;

pub use config::*;
pub use kv::*;
