//! Response Types
//!
//! What a player action hands back to the front end.

use interrogation_core::GameStatus;
use serde::{Deserialize, Serialize};

use super::message::Message;

/// Why an action did nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Another turn is still in flight
    Busy,
    /// No session is open
    NoSession,
    /// The case is already closed
    NotPlaying,
    /// The session opener has already run
    AlreadyStarted,
    EmptyInput,
    InsufficientEnergy { required: u8, available: u8 },
    /// Recovery actions are pointless at full energy
    EnergyFull,
    Cooldown { remaining_secs: u64 },
    UnknownEvidence { id: String },
    /// The evidence exists but has not been found yet
    EvidenceLocked { id: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Busy => write!(f, "a turn is already in progress"),
            RejectReason::NoSession => write!(f, "no case is open"),
            RejectReason::NotPlaying => write!(f, "the case is closed"),
            RejectReason::AlreadyStarted => write!(f, "the session has already started"),
            RejectReason::EmptyInput => write!(f, "nothing to send"),
            RejectReason::InsufficientEnergy {
                required,
                available,
            } => write!(f, "needs {} energy, {} available", required, available),
            RejectReason::EnergyFull => write!(f, "energy is already full"),
            RejectReason::Cooldown { remaining_secs } => {
                write!(f, "cooling down for {}s", remaining_secs)
            }
            RejectReason::UnknownEvidence { id } => write!(f, "no evidence named '{}'", id),
            RejectReason::EvidenceLocked { id } => write!(f, "evidence '{}' is still locked", id),
        }
    }
}

/// Where the suspect's reply for a turn came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    Provider { endpoint: String },
    Offline,
    /// The turn failed and its cost was refunded
    Fault,
}

/// Result of an applied action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    /// Transcript messages appended by this action, in order
    pub messages: Vec<Message>,
    /// Present when the action made a provider turn
    pub source: Option<ReplySource>,
    pub stress: u8,
    pub energy: u8,
    pub status: GameStatus,
}

/// Outcome of a player action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// A precondition failed. Live state is unchanged; `notice` is the
    /// in-fiction message appended to the transcript, if any.
    Rejected {
        reason: RejectReason,
        notice: Option<Message>,
    },
    Applied(TurnReport),
}

impl ActionOutcome {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected {
            reason,
            notice: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }

    pub fn report(&self) -> Option<&TurnReport> {
        match self {
            ActionOutcome::Applied(report) => Some(report),
            ActionOutcome::Rejected { .. } => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            ActionOutcome::Rejected { reason, .. } => Some(reason),
            ActionOutcome::Applied(_) => None,
        }
    }
}
