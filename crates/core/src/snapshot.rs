//! Terminal Snapshots
//!
//! Immutable records written when a session ends, and the read-only archive
//! view a snapshot is loaded into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{GameStatus, InterrogationState, NodeEntry};

/// Record of a finished interrogation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub level_id: String,
    pub title: String,
    pub result: GameStatus,
    pub timestamp: DateTime<Utc>,
    pub turns: u32,
    pub stress: u8,
    #[serde(default)]
    pub evidence_found: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub suggestion_history: Vec<String>,
    #[serde(default)]
    pub node_graph: Vec<NodeEntry>,
    #[serde(default)]
    pub objective: Option<String>,
}

impl Snapshot {
    /// Capture the display fields of `state` at this instant.
    pub fn capture(state: &InterrogationState, level_id: &str, title: &str, turns: u32) -> Self {
        Self {
            level_id: level_id.to_string(),
            title: title.to_string(),
            result: state.game_status(),
            timestamp: Utc::now(),
            turns,
            stress: state.stress(),
            evidence_found: state.evidence_found().to_vec(),
            decisions: state.decisions().to_vec(),
            suggestion_history: state.suggestion_history().to_vec(),
            node_graph: state.node_graph().to_vec(),
            objective: state.objective().map(str::to_string),
        }
    }
}

/// Review-only projection of a snapshot.
///
/// Held beside the live state, never merged into it, so loading an archive
/// cannot change the live stress, energy or status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveView {
    pub decisions: Vec<String>,
    pub suggestion_history: Vec<String>,
    pub node_graph: Vec<NodeEntry>,
    pub objective: Option<String>,
}

impl From<&Snapshot> for ArchiveView {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            decisions: snapshot.decisions.clone(),
            suggestion_history: snapshot.suggestion_history.clone(),
            node_graph: snapshot.node_graph.clone(),
            objective: snapshot.objective.clone(),
        }
    }
}
