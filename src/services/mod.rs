//! Services
//!
//! Game logic on top of the core state machine and the provider gateway.

pub mod chat;
pub mod offline;
pub mod prompt;
pub mod session;
pub mod summary;

pub use chat::{ChatReply, ChatRequest, InterrogationChannel};
pub use session::InterrogationSession;
pub use summary::CaseSummaryService;
