//! Interrogation Core
//!
//! Domain types and rules for the interrogation game: the stress/energy/combo
//! state machine, the action vocabulary, the sidecar block parser and the
//! persistence boundary. This crate has no dependency on LLM providers or on
//! the front end.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `state` - Meters, status, logs and resets (`InterrogationState`)
//! - `action` - Player actions, turn intents and the tuning table
//! - `sidecar` - `:::STATUS` / `:::SCHEMA` block parsing
//! - `store` - Key-value persistence boundary and typed archive access
//! - `snapshot` - Terminal snapshots and the read-only archive view

pub mod action;
pub mod error;
pub mod sidecar;
pub mod snapshot;
pub mod state;
pub mod store;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── State Machine ──────────────────────────────────────────────────────
pub use state::{clamp_meter, GameStatus, InterrogationState, NodeEntry, NodeKind, METER_MAX};

// ── Actions ────────────────────────────────────────────────────────────
pub use action::{Action, TurnIntent};

// ── Sidecar Parsing ────────────────────────────────────────────────────
pub use sidecar::{parse_reply, ParsedReply, Sidecar, SidecarKind, SidecarParse, StatusBlock};

// ── Persistence ────────────────────────────────────────────────────────
pub use snapshot::{ArchiveView, Snapshot};
pub use store::{Archive, KeyValueStore, MemoryStore};
