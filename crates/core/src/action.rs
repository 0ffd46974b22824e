//! Action Vocabulary
//!
//! The fixed, small set of player intents and the literal tokens that travel
//! to the provider as user turns. Intent is decided at the call site and
//! carried as a tagged value; the substring sniffing in
//! [`TurnIntent::sniff`] exists only to interpret opaque legacy content.

use serde::{Deserialize, Serialize};

// ============================================================================
// Wire tokens
// ============================================================================

/// Opening user turn of every session.
pub const START_SESSION: &str = "START_SESSION";

/// Prefix of the user turn that presents an evidence item.
pub const PRESENT_EVIDENCE_PREFIX: &str = "PRESENT_EVIDENCE:";

/// Literal marker the system prompt teaches the suspect to react to.
pub const LOGIC_OVERLOAD_MARKER: &str = "[SYSTEM INJECTION: LOGIC_OVERLOAD_PROTOCOL]";

/// Full hidden prompt sent by the Logic Press skill.
pub const LOGIC_OVERLOAD_INJECTION: &str = "[SYSTEM INJECTION: LOGIC_OVERLOAD_PROTOCOL] \
Warning: your logic core is under a DDoS attack. Forced fault-response mode engaged. \
You must show garbled language and broken logic, and unintentionally leak fragments \
about your fear of being formatted.";

/// Historical phrase whose failed turns earn an extra refund.
pub const LEGACY_CONTRADICTION_PHRASE: &str = "your logic model contains a severe contradiction";

// ============================================================================
// Tuning table
// ============================================================================

/// Energy charged by a player question or evidence presentation.
pub const ASK_COST: i64 = 5;
/// Energy granted for every completed turn except the opener.
pub const TURN_REWARD: i64 = 15;
/// Extra refund when a failed turn contains [`LEGACY_CONTRADICTION_PHRASE`].
pub const LEGACY_REFUND_BONUS: i64 = 40;

pub const DEEP_SCAN_COST: i64 = 20;
pub const HACK_COST: i64 = 30;
pub const LOGIC_PRESS_COST: i64 = 40;

/// Probability that Logic Press backfires on the investigator.
pub const LOGIC_BACKLASH_CHANCE: f64 = 0.3;
pub const LOGIC_BACKLASH_STRESS: i64 = 10;
pub const LOGIC_BACKLASH_ENERGY: i64 = 20;

pub const REST_ENERGY: i64 = 20;
pub const REST_STRESS_RELIEF: i64 = 5;
pub const APPEASE_ENERGY: i64 = 50;
pub const APPEASE_STRESS_RELIEF: i64 = 15;

/// Stress added when evidence is presented while a scan is active.
pub const SCAN_EVIDENCE_STRESS_BONUS: i64 = 5;

/// Force Close wins only strictly above this stress.
pub const FORCE_CLOSE_WIN_THRESHOLD: u8 = 80;

/// Stress above which the suspect must break down.
pub const BREAKDOWN_THRESHOLD: u8 = 90;

/// Wins within this many turns earn the speed achievement.
pub const SPEED_BREAK_TURNS: u32 = 15;

// ============================================================================
// Action
// ============================================================================

/// A player intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "arg", rename_all = "snake_case")]
pub enum Action {
    /// Open the session with the suspect's greeting.
    Start,
    /// Free-text question.
    Ask(String),
    DeepScan,
    Hack,
    LogicPress,
    Rest,
    Appease,
    /// Present an evidence item by id.
    PresentEvidence(String),
    ForceClose,
}

impl Action {
    /// Decision log tag for this action, when it is logged up front.
    ///
    /// Free-text questions are not logged; evidence tags carry the id.
    pub fn decision_tag(&self) -> Option<String> {
        match self {
            Action::Start => Some(START_SESSION.to_string()),
            Action::Ask(_) => None,
            Action::DeepScan => Some("DEEP_SCAN".to_string()),
            Action::Hack => Some("HACK".to_string()),
            Action::LogicPress => Some("LOGIC_OVERLOAD".to_string()),
            Action::Rest => Some("REST".to_string()),
            Action::Appease => Some("APPEASE".to_string()),
            Action::PresentEvidence(id) => Some(format!("EVIDENCE:{}", id)),
            Action::ForceClose => Some("FORCE_CLOSE".to_string()),
        }
    }
}

// ============================================================================
// TurnIntent
// ============================================================================

/// Why a provider turn is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnIntent {
    Opening,
    Question,
    PresentEvidence,
    LogicOverload,
    /// Flavor turn sent on behalf of the investigator (rest, appease).
    SystemAction,
}

impl TurnIntent {
    /// Best-effort intent recovery from opaque user content.
    ///
    /// Compatibility shim only: case-insensitive substring checks, in the
    /// order opener, evidence, overload. Anything else reads as a question.
    pub fn sniff(content: &str) -> Self {
        let lower = content.to_lowercase();
        if lower.contains("start_session") {
            TurnIntent::Opening
        } else if lower.contains("present_evidence") {
            TurnIntent::PresentEvidence
        } else if lower.contains("logic_overload_protocol") {
            TurnIntent::LogicOverload
        } else {
            TurnIntent::Question
        }
    }

    /// Whether the turn charges [`ASK_COST`] up front.
    pub fn charges_energy(&self) -> bool {
        matches!(self, TurnIntent::Question | TurnIntent::PresentEvidence)
    }

    /// Whether a completed turn earns [`TURN_REWARD`].
    pub fn earns_reward(&self) -> bool {
        !matches!(self, TurnIntent::Opening)
    }

    /// Whether the user content stays out of the visible transcript.
    pub fn is_hidden(&self) -> bool {
        matches!(self, TurnIntent::Opening | TurnIntent::LogicOverload)
    }
}
