//! Interrogation State Machine
//!
//! The client-held resource model for one interrogation session: stress,
//! energy, combo, discovered evidence, the decision log, the node graph,
//! suggestions, objective and achievements.
//!
//! Every field is private and only reachable through the mutators below so
//! the invariants hold regardless of call site:
//! - `stress` and `energy` are always in `[0, 100]`; all setters clamp.
//! - `combo` is always in `[0, 9]`.
//! - `evidence_found` and `achievements` are insertion-ordered sets.
//! - `decisions` and `node_graph` only grow, except on an explicit reset.
//! - `game_status` only leaves `Playing`, never returns to it (except on reset).
//!
//! No mutator fails: out-of-range input is clamped, not rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Archive, KeyValueStore};

/// Upper bound for the stress and energy meters.
pub const METER_MAX: u8 = 100;

/// Upper bound for the combo counter.
pub const COMBO_MAX: u8 = 9;

/// Default cooldown of the Logic Overload skill, in milliseconds.
pub const DEFAULT_LOGIC_COOLDOWN_MS: u64 = 30_000;

/// Clamp an arbitrary integer into the `[0, 100]` meter range.
pub fn clamp_meter(value: i64) -> u8 {
    value.clamp(0, METER_MAX as i64) as u8
}

// ============================================================================
// Status and node graph types
// ============================================================================

/// Lifecycle of an interrogation. One-way: `Playing` -> `Won` | `Lost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    /// Whether this status ends the session.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Playing)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Playing
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Playing => write!(f, "playing"),
            GameStatus::Won => write!(f, "won"),
            GameStatus::Lost => write!(f, "lost"),
        }
    }
}

/// Category of a node graph entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Evidence,
    Skill,
    Node,
    System,
}

impl NodeKind {
    /// Parse a case-insensitive kind name (`evidence`, `SKILL`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EVIDENCE" => Some(NodeKind::Evidence),
            "SKILL" => Some(NodeKind::Skill),
            "NODE" => Some(NodeKind::Node),
            "SYSTEM" => Some(NodeKind::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Evidence => write!(f, "EVIDENCE"),
            NodeKind::Skill => write!(f, "SKILL"),
            NodeKind::Node => write!(f, "NODE"),
            NodeKind::System => write!(f, "SYSTEM"),
        }
    }
}

/// One entry of the append-only node graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// InterrogationState
// ============================================================================

/// Resource model of a single interrogation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterrogationState {
    stress: u8,
    energy: u8,
    combo: u8,
    evidence_found: Vec<String>,
    game_status: GameStatus,
    decisions: Vec<String>,
    node_graph: Vec<NodeEntry>,
    suggestion_history: Vec<String>,
    objective: Option<String>,
    last_logic_overload_at: Option<DateTime<Utc>>,
    logic_cooldown_ms: u64,
    achievements: Vec<String>,
}

impl InterrogationState {
    /// Create a fresh state seeded with the chapter's starting evidence.
    pub fn new<I, S>(initial_evidence: I, logic_cooldown_ms: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self {
            stress: 0,
            energy: METER_MAX,
            combo: 0,
            evidence_found: Vec::new(),
            game_status: GameStatus::Playing,
            decisions: Vec::new(),
            node_graph: Vec::new(),
            suggestion_history: Vec::new(),
            objective: None,
            last_logic_overload_at: None,
            logic_cooldown_ms,
            achievements: Vec::new(),
        };
        for id in initial_evidence {
            state.add_evidence(id);
        }
        state
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn stress(&self) -> u8 {
        self.stress
    }

    pub fn energy(&self) -> u8 {
        self.energy
    }

    pub fn combo(&self) -> u8 {
        self.combo
    }

    pub fn evidence_found(&self) -> &[String] {
        &self.evidence_found
    }

    pub fn has_evidence(&self, id: &str) -> bool {
        self.evidence_found.iter().any(|e| e == id)
    }

    pub fn game_status(&self) -> GameStatus {
        self.game_status
    }

    pub fn is_playing(&self) -> bool {
        self.game_status == GameStatus::Playing
    }

    pub fn decisions(&self) -> &[String] {
        &self.decisions
    }

    pub fn node_graph(&self) -> &[NodeEntry] {
        &self.node_graph
    }

    pub fn suggestion_history(&self) -> &[String] {
        &self.suggestion_history
    }

    pub fn objective(&self) -> Option<&str> {
        self.objective.as_deref()
    }

    pub fn achievements(&self) -> &[String] {
        &self.achievements
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn logic_cooldown_ms(&self) -> u64 {
        self.logic_cooldown_ms
    }

    pub fn last_logic_overload_at(&self) -> Option<DateTime<Utc>> {
        self.last_logic_overload_at
    }

    // ── Meters ─────────────────────────────────────────────────────────

    /// Set stress directly, clamped into `[0, 100]`.
    pub fn set_stress(&mut self, value: i64) {
        self.stress = clamp_meter(value);
    }

    /// Apply an update function to stress; the result is clamped.
    pub fn apply_stress_delta<F>(&mut self, f: F)
    where
        F: FnOnce(i64) -> i64,
    {
        self.set_stress(f(self.stress as i64));
    }

    /// Add a signed amount to stress.
    pub fn add_stress(&mut self, delta: i64) {
        self.apply_stress_delta(|s| s.saturating_add(delta));
    }

    /// Set energy directly, clamped into `[0, 100]`.
    pub fn set_energy(&mut self, value: i64) {
        self.energy = clamp_meter(value);
    }

    /// Apply an update function to energy; the result is clamped.
    pub fn apply_energy_delta<F>(&mut self, f: F)
    where
        F: FnOnce(i64) -> i64,
    {
        self.set_energy(f(self.energy as i64));
    }

    /// Add a signed amount to energy.
    pub fn add_energy(&mut self, delta: i64) {
        self.apply_energy_delta(|e| e.saturating_add(delta));
    }

    /// Whether the suspect has broken (stress at the ceiling).
    pub fn stress_maxed(&self) -> bool {
        self.stress >= METER_MAX
    }

    // ── Combo ──────────────────────────────────────────────────────────

    pub fn increment_combo(&mut self) {
        self.combo = (self.combo + 1).min(COMBO_MAX);
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    // ── Sets and logs ──────────────────────────────────────────────────

    /// Add an evidence id. Returns `true` when it was not already present.
    pub fn add_evidence(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.has_evidence(&id) {
            return false;
        }
        self.evidence_found.push(id);
        true
    }

    /// Move out of `Playing`. Returns `true` only on an actual transition.
    ///
    /// Terminal states are sticky and setting `Playing` is a no-op.
    pub fn set_status(&mut self, status: GameStatus) -> bool {
        if self.game_status.is_terminal() || status == GameStatus::Playing {
            return false;
        }
        self.game_status = status;
        true
    }

    /// Grant an achievement. Returns `true` when it is new.
    pub fn grant_achievement(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.has_achievement(&id) {
            return false;
        }
        self.achievements.push(id);
        true
    }

    pub fn record_decision(&mut self, tag: impl Into<String>) {
        self.decisions.push(tag.into());
    }

    /// Append a node; the timestamp is assigned now.
    pub fn record_node(&mut self, kind: NodeKind, id: impl Into<String>, label: impl Into<String>) {
        self.node_graph.push(NodeEntry {
            id: id.into(),
            kind,
            label: label.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn set_objective(&mut self, objective: impl Into<String>) {
        self.objective = Some(objective.into());
    }

    pub fn record_suggestion(&mut self, suggestion: impl Into<String>) {
        self.suggestion_history.push(suggestion.into());
    }

    // ── Logic overload cooldown ────────────────────────────────────────

    /// Milliseconds left before Logic Overload may fire again, if any.
    pub fn logic_cooldown_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        let last = self.last_logic_overload_at?;
        let elapsed = now.signed_duration_since(last).num_milliseconds().max(0) as u64;
        if elapsed < self.logic_cooldown_ms {
            Some(self.logic_cooldown_ms - elapsed)
        } else {
            None
        }
    }

    pub fn mark_logic_overload(&mut self, at: DateTime<Utc>) {
        self.last_logic_overload_at = Some(at);
    }

    // ── Display helpers ────────────────────────────────────────────────

    /// Decisions with duplicates removed, first occurrence wins.
    pub fn distinct_decisions(&self) -> Vec<&str> {
        distinct(&self.decisions)
    }

    /// Suggestion history with duplicates removed, first occurrence wins.
    pub fn distinct_suggestions(&self) -> Vec<&str> {
        distinct(&self.suggestion_history)
    }

    /// Node graph entries of one kind, or all of them.
    pub fn nodes_of(&self, kind: Option<NodeKind>) -> Vec<&NodeEntry> {
        self.node_graph
            .iter()
            .filter(|n| kind.map_or(true, |k| n.kind == k))
            .collect()
    }

    // ── Resets ─────────────────────────────────────────────────────────

    /// Reinitialize every field for a replay of the chapter.
    ///
    /// The cooldown length is configuration, not session data, and survives.
    pub fn reset_chapter<I, S>(&mut self, initial_evidence: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::new(initial_evidence, self.logic_cooldown_ms);
    }

    /// Reset the chapter and forget cross-session progress in `store`.
    ///
    /// Store failures are logged and swallowed; the in-memory reset always
    /// happens.
    pub fn reset_all<I, S>(&mut self, initial_evidence: I, store: &dyn KeyValueStore)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Err(e) = Archive::new(store).clear_completed() {
            tracing::warn!("[State] Failed to clear completed levels: {}", e);
        }
        self.reset_chapter(initial_evidence);
    }
}

impl Default for InterrogationState {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), DEFAULT_LOGIC_COOLDOWN_MS)
    }
}

fn distinct(items: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item.as_str()) {
            seen.push(item.as_str());
        }
    }
    seen
}
