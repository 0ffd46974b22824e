//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod level;
pub mod message;
pub mod response;
pub mod settings;

pub use level::*;
pub use message::*;
pub use response::*;
pub use settings::*;
