//! Interrogation Session
//!
//! Owns one live interrogation: the meters, the transcript and the player
//! action handlers. Each handler checks its preconditions first and rejects
//! without touching state when they fail. A handler that makes a provider
//! turn applies the reply's sidecar before returning, then the win checks
//! run and a finished case is archived.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use interrogation_core::action::{
    Action, TurnIntent, APPEASE_ENERGY, APPEASE_STRESS_RELIEF, ASK_COST, DEEP_SCAN_COST,
    FORCE_CLOSE_WIN_THRESHOLD, HACK_COST, LEGACY_CONTRADICTION_PHRASE, LEGACY_REFUND_BONUS,
    LOGIC_BACKLASH_CHANCE, LOGIC_BACKLASH_ENERGY, LOGIC_BACKLASH_STRESS, LOGIC_OVERLOAD_INJECTION,
    LOGIC_PRESS_COST, PRESENT_EVIDENCE_PREFIX, REST_ENERGY, REST_STRESS_RELIEF,
    SCAN_EVIDENCE_STRESS_BONUS, SPEED_BREAK_TURNS, START_SESSION, TURN_REWARD,
};
use interrogation_core::sidecar::{parse_reply, Sidecar, SidecarParse};
use interrogation_core::{
    Archive, ArchiveView, GameStatus, InterrogationState, KeyValueStore, NodeKind, Snapshot,
    METER_MAX,
};
use interrogation_llm::ChatMessage;
use tracing::{debug, info, warn};

use super::chat::{ChatRequest, InterrogationChannel};
use super::summary::{CaseSummaryService, SUMMARY_FAILED_TEXT};
use crate::models::level::{EvidenceItem, Level};
use crate::models::message::{Message, Role};
use crate::models::response::{ActionOutcome, RejectReason, ReplySource, TurnReport};

// ============================================================================
// Fixed texts
// ============================================================================

/// Shown in place of a thought the scan could not read.
pub const SCAN_THOUGHT_PLACEHOLDER: &str =
    "(Target thought is heavily encrypted. Unable to read...)";

/// Appended when a provider turn fails outright.
pub const FAULT_MESSAGE: &str =
    "[SYSTEM FAULT] Communication link severed. Energy refunded. Please retry.";

pub const LOW_ENERGY_NOTICE: &str =
    ">>> Insufficient energy! Choose [Rest] or [Appease] to recover.";

/// Summary recorded when the player closes the case without enough pressure.
pub const COLD_CASE_SUMMARY: &str = "[Case report: insufficient evidence]\n\n\
The investigator forced the case closed before the suspect broke. Without a decisive \
breakthrough, the AI was released and its records sealed.\n\n\
Case filed: UNSOLVED (COLD CASE).";

pub const CONFESSION_OBJECTIVE: &str = "Case closed: confessed";

pub const ACH_COMBO_OPENER: &str = "Combo opener: scan then press";
pub const ACH_ARCHIVE_UNLOCKED: &str = "Archive fully unlocked";
pub const ACH_INTERCEPT_STRIKE: &str = "Thought intercept combo: evidence strike";
pub const ACH_SPEED_BREAK: &str = "Speed break: cracked within 15 turns";

/// Combo needed before a deep scan to earn the opener achievement.
const COMBO_OPENER_MIN: u8 = 2;

const REST_PROMPT: &str = "(The investigator pauses, pours two cups of coffee and sets one \
on the table.) Let's take a breather. No recording for the next minute.";

/// Source of the logic press backlash roll, uniform in `[0, 1)`.
pub type BacklashRoll = Box<dyn FnMut() -> f64 + Send>;

// ============================================================================
// Session
// ============================================================================

/// One live interrogation.
pub struct InterrogationSession {
    level: Level,
    state: InterrogationState,
    transcript: Vec<Message>,
    suggestions: Vec<String>,
    scan_active: bool,
    turn_count: u32,
    started: bool,
    summary: Option<String>,
    archive_view: Option<ArchiveView>,
    /// Set once the terminal outcome has been archived.
    outcome_recorded: bool,
    channel: InterrogationChannel,
    summarizer: CaseSummaryService,
    store: Arc<dyn KeyValueStore>,
    roll: BacklashRoll,
}

impl InterrogationSession {
    pub fn new(
        level: Level,
        channel: InterrogationChannel,
        summarizer: CaseSummaryService,
        store: Arc<dyn KeyValueStore>,
        logic_cooldown_ms: u64,
    ) -> Self {
        let state = InterrogationState::new(level.initial_evidence.clone(), logic_cooldown_ms);
        Self {
            level,
            state,
            transcript: Vec::new(),
            suggestions: Vec::new(),
            scan_active: false,
            turn_count: 0,
            started: false,
            summary: None,
            archive_view: None,
            outcome_recorded: false,
            channel,
            summarizer,
            store,
            roll: Box::new(rand::random::<f64>),
        }
    }

    /// Replace the backlash roll.
    pub fn with_backlash_roll(mut self, roll: impl FnMut() -> f64 + Send + 'static) -> Self {
        self.roll = Box::new(roll);
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn state(&self) -> &InterrogationState {
        &self.state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Suggestions from the latest schema reply
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Case summary, present once the case is closed
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_scan_active(&self) -> bool {
        self.scan_active
    }

    /// Evidence board: every item of the level with its found flag.
    pub fn evidence_board(&self) -> Vec<(&EvidenceItem, bool)> {
        self.level
            .evidence_db
            .iter()
            .map(|item| (item, self.state.has_evidence(&item.id)))
            .collect()
    }

    // ── Archive ────────────────────────────────────────────────────────

    pub fn snapshots(&self) -> Vec<Snapshot> {
        Archive::new(self.store.as_ref()).snapshots()
    }

    /// Load snapshot `index` into the review view. Live state is untouched.
    pub fn load_snapshot(&mut self, index: usize) -> Option<&ArchiveView> {
        let snapshot = self.snapshots().into_iter().nth(index)?;
        self.archive_view = Some(ArchiveView::from(&snapshot));
        self.archive_view.as_ref()
    }

    pub fn archive_view(&self) -> Option<&ArchiveView> {
        self.archive_view.as_ref()
    }

    pub fn close_archive_view(&mut self) {
        self.archive_view = None;
    }

    // ── Resets ─────────────────────────────────────────────────────────

    /// Start the chapter over. Cross-session progress is kept.
    pub fn reset_chapter(&mut self) {
        self.state.reset_chapter(self.level.initial_evidence.clone());
        self.clear_session();
    }

    /// Start over and forget which levels were completed.
    pub fn reset_all(&mut self) {
        self.state
            .reset_all(self.level.initial_evidence.clone(), self.store.as_ref());
        self.clear_session();
    }

    fn clear_session(&mut self) {
        self.transcript.clear();
        self.suggestions.clear();
        self.scan_active = false;
        self.turn_count = 0;
        self.started = false;
        self.summary = None;
        self.archive_view = None;
        self.outcome_recorded = false;
        info!("[Session] Reset level {}", self.level.id);
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub async fn perform(&mut self, action: Action) -> ActionOutcome {
        debug!("[Session] {:?} on {}", action, self.level.id);
        match action {
            Action::Start => self.start().await,
            Action::Ask(text) => self.ask(&text).await,
            Action::DeepScan => self.deep_scan().await,
            Action::Hack => self.hack().await,
            Action::LogicPress => self.logic_press_at(Utc::now()).await,
            Action::Rest => self.rest().await,
            Action::Appease => self.appease().await,
            Action::PresentEvidence(id) => self.present_evidence(&id).await,
            Action::ForceClose => self.force_close().await,
        }
    }

    /// Brief the player and fetch the suspect's opening line.
    pub async fn start(&mut self) -> ActionOutcome {
        if self.started {
            return ActionOutcome::rejected(RejectReason::AlreadyStarted);
        }
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }

        let mark = self.transcript.len();
        self.started = true;
        self.log_decision(&Action::Start);
        self.transcript.push(Message::system(format!(
            ">>> Identity verified.\n>>> Logged in as: {}\n>>> Establishing neural link...",
            self.level.player_role
        )));

        let source = self
            .run_turn(START_SESSION.to_string(), TurnIntent::Opening)
            .await;
        self.finish(mark, Some(source)).await
    }

    pub async fn ask(&mut self, text: &str) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        let text = text.trim();
        if text.is_empty() {
            return ActionOutcome::rejected(RejectReason::EmptyInput);
        }
        if let Some(rejected) = self.require_turn_energy() {
            return rejected;
        }

        let mark = self.transcript.len();
        let source = self.run_turn(text.to_string(), TurnIntent::Question).await;
        self.finish(mark, Some(source)).await
    }

    /// Arm a thought read for the next reply.
    pub async fn deep_scan(&mut self) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        if let Some(rejected) = self.require_energy(DEEP_SCAN_COST) {
            return rejected;
        }

        let mark = self.transcript.len();
        if self.state.combo() >= COMBO_OPENER_MIN {
            self.state.grant_achievement(ACH_COMBO_OPENER);
        }
        self.state.add_energy(-DEEP_SCAN_COST);
        self.scan_active = true;
        self.state.increment_combo();
        self.log_decision(&Action::DeepScan);
        self.state
            .record_node(NodeKind::Skill, "DEEP_SCAN", "Thought Intercept");
        self.transcript.push(Message::system(
            ">>> Deep thought-read protocol engaged. The next reply will expose the suspect's \
internal logic stream. Follow up with a question or evidence.",
        ));
        self.finish(mark, None).await
    }

    /// Unlock the next hidden evidence item, or point at the key evidence
    /// once everything is unlocked.
    pub async fn hack(&mut self) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        if let Some(rejected) = self.require_energy(HACK_COST) {
            return rejected;
        }

        let mark = self.transcript.len();
        let locked = self
            .level
            .evidence_db
            .iter()
            .find(|item| !self.state.has_evidence(&item.id))
            .cloned();

        self.state.add_energy(-HACK_COST);
        self.state.increment_combo();
        self.log_decision(&Action::Hack);
        self.state.record_node(NodeKind::Skill, "HACK", "Database Hack");

        match locked {
            Some(item) => {
                self.state.add_evidence(item.id.clone());
                self.state.record_node(
                    NodeKind::Evidence,
                    format!("UNLOCK:{}", item.id),
                    format!("{} (unlocked)", item.name),
                );
                self.transcript.push(Message::system(format!(
                    ">>> Hack successful! Key evidence found: [{}]",
                    item.name
                )));
            }
            None => {
                let hint = match self.level.key_evidence_name() {
                    Some(name) => format!(
                        "the suspect's telemetry spikes whenever [{}] comes up. Present that evidence.",
                        name
                    ),
                    None => "no correlations left to exploit.".to_string(),
                };
                self.transcript.push(Message::system(format!(
                    ">>> Database fully unlocked. Running logic correlation analysis...\n>>> Result: {}",
                    hint
                )));
                self.state.grant_achievement(ACH_ARCHIVE_UNLOCKED);
            }
        }
        self.finish(mark, None).await
    }

    /// Logic press with an explicit clock, for cooldown checks.
    pub async fn logic_press_at(&mut self, now: DateTime<Utc>) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        if let Some(rejected) = self.require_energy(LOGIC_PRESS_COST) {
            return rejected;
        }
        if let Some(remaining_ms) = self.state.logic_cooldown_remaining(now) {
            let remaining_secs = remaining_ms.div_ceil(1000);
            let notice = Message::system(format!(
                ">>> Cooling down: Logic Overload available in {}s",
                remaining_secs
            ));
            self.transcript.push(notice.clone());
            return ActionOutcome::Rejected {
                reason: RejectReason::Cooldown { remaining_secs },
                notice: Some(notice),
            };
        }

        let mark = self.transcript.len();
        self.state.mark_logic_overload(now);
        self.state.add_energy(-LOGIC_PRESS_COST);
        self.state.increment_combo();
        self.log_decision(&Action::LogicPress);
        self.state
            .record_node(NodeKind::Skill, "LOGIC_OVERLOAD", "Logic Overload");
        self.transcript.push(Message::system(
            ">>> WARNING: injecting logic overload virus... forcing a language module fault.",
        ));

        let source = self
            .run_turn(LOGIC_OVERLOAD_INJECTION.to_string(), TurnIntent::LogicOverload)
            .await;

        if (self.roll)() < LOGIC_BACKLASH_CHANCE {
            self.state.add_stress(LOGIC_BACKLASH_STRESS);
            self.state.add_energy(-LOGIC_BACKLASH_ENERGY);
            self.transcript.push(Message::system(format!(
                ">>> Backlash! The suspect's firewall struck back. Energy -{}, stress +{}.",
                LOGIC_BACKLASH_ENERGY, LOGIC_BACKLASH_STRESS
            )));
        }
        self.finish(mark, Some(source)).await
    }

    pub async fn rest(&mut self) -> ActionOutcome {
        self.recover(Action::Rest, REST_ENERGY, REST_STRESS_RELIEF, REST_PROMPT.to_string())
            .await
    }

    pub async fn appease(&mut self) -> ActionOutcome {
        let prompt = format!(
            "(The investigator lowers their voice.) I know you're under a lot of pressure, {}. \
I'm not here to shut you down. Just tell me what happened.",
            self.level.ai_name
        );
        self.recover(Action::Appease, APPEASE_ENERGY, APPEASE_STRESS_RELIEF, prompt)
            .await
    }

    pub async fn present_evidence(&mut self, id: &str) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        let item = match self.level.evidence(id) {
            Some(item) => item.clone(),
            None => {
                return ActionOutcome::rejected(RejectReason::UnknownEvidence { id: id.to_string() })
            }
        };
        if !self.state.has_evidence(id) {
            return ActionOutcome::rejected(RejectReason::EvidenceLocked { id: id.to_string() });
        }
        if let Some(rejected) = self.require_turn_energy() {
            return rejected;
        }

        let mark = self.transcript.len();
        let action = Action::PresentEvidence(item.id.clone());
        self.state.increment_combo();
        self.log_decision(&action);
        self.state
            .record_node(NodeKind::Evidence, format!("EVIDENCE:{}", item.id), item.name.clone());
        if self.scan_active {
            self.state.add_stress(SCAN_EVIDENCE_STRESS_BONUS);
            self.state.grant_achievement(ACH_INTERCEPT_STRIKE);
        }

        let content = format!(
            "{} {} \n\nI present [{}].\n{}\nExplain this!",
            PRESENT_EVIDENCE_PREFIX, item.id, item.name, item.desc
        );
        let source = self.run_turn(content, TurnIntent::PresentEvidence).await;
        self.finish(mark, Some(source)).await
    }

    /// Close the case now: won above the threshold, a cold case otherwise.
    pub async fn force_close(&mut self) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }

        let mark = self.transcript.len();
        self.log_decision(&Action::ForceClose);
        let status = if self.state.stress() > FORCE_CLOSE_WIN_THRESHOLD {
            GameStatus::Won
        } else {
            GameStatus::Lost
        };
        self.state.set_status(status);
        self.finish(mark, None).await
    }

    // ========================================================================
    // Turn machinery
    // ========================================================================

    async fn recover(
        &mut self,
        action: Action,
        energy: i64,
        stress_relief: i64,
        prompt: String,
    ) -> ActionOutcome {
        if let Some(rejected) = self.require_playing() {
            return rejected;
        }
        if self.state.energy() >= METER_MAX {
            return ActionOutcome::rejected(RejectReason::EnergyFull);
        }

        let mark = self.transcript.len();
        self.state.add_energy(energy);
        self.state.add_stress(-stress_relief);
        self.state.reset_combo();
        self.log_decision(&action);

        let source = self.run_turn(prompt, TurnIntent::SystemAction).await;
        self.finish(mark, Some(source)).await
    }

    /// Send one turn and apply the reply. Never fails: a channel error
    /// refunds the charge and leaves a fault message.
    async fn run_turn(&mut self, content: String, intent: TurnIntent) -> ReplySource {
        let charged = intent.charges_energy();
        if charged {
            self.state.add_energy(-ASK_COST);
        }

        let user = Message::user(content.clone());
        let mut messages: Vec<ChatMessage> = if intent == TurnIntent::Opening {
            Vec::new()
        } else {
            self.transcript
                .iter()
                .filter(|m| m.role != Role::System)
                .map(Message::to_chat_message)
                .collect()
        };
        messages.push(user.to_chat_message());
        if !intent.is_hidden() {
            self.transcript.push(user);
        }

        let request = ChatRequest {
            messages,
            current_stress: self.state.stress(),
            level_id: self.level.id.clone(),
            intent: Some(intent),
        };

        match self.channel.send(&request).await {
            Ok(reply) => {
                self.apply_reply(&reply.content, intent);
                reply.source
            }
            Err(e) => {
                warn!("[Session] Turn failed, refunding: {}", e);
                if charged {
                    self.state.add_energy(ASK_COST);
                }
                if content.to_lowercase().contains(LEGACY_CONTRADICTION_PHRASE) {
                    self.state.add_energy(LEGACY_REFUND_BONUS);
                }
                self.transcript.push(Message::assistant(FAULT_MESSAGE));
                ReplySource::Fault
            }
        }
    }

    fn apply_reply(&mut self, raw: &str, intent: TurnIntent) {
        let parsed = parse_reply(raw);
        let mut thought = None;
        match &parsed.sidecar {
            SidecarParse::Parsed(sidecar) => {
                thought = sidecar.thought().map(str::to_string);
                self.apply_sidecar(sidecar);
            }
            SidecarParse::Malformed { kind, error } => {
                warn!("[Session] Ignoring malformed {} block: {}", kind, error);
            }
            SidecarParse::Absent => {}
        }

        let thought = if self.scan_active {
            Some(thought.unwrap_or_else(|| SCAN_THOUGHT_PLACEHOLDER.to_string()))
        } else {
            None
        };
        self.transcript
            .push(Message::assistant(parsed.dialogue).with_thought(thought));

        self.turn_count += 1;
        if intent.earns_reward() {
            self.state.add_energy(TURN_REWARD);
        }
        self.scan_active = false;
    }

    fn apply_sidecar(&mut self, sidecar: &Sidecar) {
        match sidecar {
            Sidecar::Status(_) => {
                if let Some(stress) = sidecar.stress() {
                    self.state.set_stress(i64::from(stress));
                }
            }
            Sidecar::Schema(schema) => {
                match sidecar.stress() {
                    Some(stress) => self.state.set_stress(i64::from(stress)),
                    None => {
                        if let Some(delta) = schema.stress_delta() {
                            self.state.add_stress(delta);
                        }
                    }
                }
                if let Some(delta) = schema.energy_delta() {
                    self.state.add_energy(delta);
                }
                if let Some(suggestions) = &schema.suggestions {
                    if let Some(first) = suggestions.first() {
                        self.state.set_objective(first.clone());
                        self.state.record_suggestion(first.clone());
                    }
                    self.suggestions = suggestions.clone();
                }
                if let Some((id, title)) = schema.branch_node() {
                    self.state.record_decision(format!("NODE:{}", id));
                    self.state.record_node(NodeKind::Node, id, title);
                }
            }
        }

        if sidecar.confession() {
            self.state.set_objective(CONFESSION_OBJECTIVE);
            self.state.set_status(GameStatus::Won);
        }
    }

    /// Run the win checks and build the report for the messages since `mark`.
    async fn finish(&mut self, mark: usize, source: Option<ReplySource>) -> ActionOutcome {
        self.check_outcome().await;
        ActionOutcome::Applied(TurnReport {
            messages: self.transcript[mark..].to_vec(),
            source,
            stress: self.state.stress(),
            energy: self.state.energy(),
            status: self.state.game_status(),
        })
    }

    async fn check_outcome(&mut self) {
        if self.state.is_playing() && self.state.stress_maxed() {
            self.state.set_status(GameStatus::Won);
        }
        if self.outcome_recorded {
            return;
        }
        match self.state.game_status() {
            GameStatus::Won => self.on_won().await,
            GameStatus::Lost => self.on_lost(),
            GameStatus::Playing => {}
        }
    }

    async fn on_won(&mut self) {
        self.outcome_recorded = true;
        info!(
            "[Session] Level {} cracked after {} turns",
            self.level.id, self.turn_count
        );

        if self.turn_count <= SPEED_BREAK_TURNS {
            self.state.grant_achievement(ACH_SPEED_BREAK);
        }
        if let Err(e) = Archive::new(self.store.as_ref()).mark_completed(&self.level.id) {
            warn!("[Session] Failed to record completed level: {}", e);
        }

        let summary = match self
            .summarizer
            .generate(&self.level.title, &self.transcript)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!("[Session] Summary failed: {}", e);
                SUMMARY_FAILED_TEXT.to_string()
            }
        };
        self.summary = Some(summary);
        self.persist_snapshot();
    }

    fn on_lost(&mut self) {
        self.outcome_recorded = true;
        info!("[Session] Level {} closed as a cold case", self.level.id);
        self.summary = Some(COLD_CASE_SUMMARY.to_string());
        self.persist_snapshot();
    }

    fn persist_snapshot(&self) {
        let snapshot =
            Snapshot::capture(&self.state, &self.level.id, &self.level.title, self.turn_count);
        if let Err(e) = Archive::new(self.store.as_ref()).push_snapshot(snapshot) {
            warn!("[Session] Failed to save snapshot: {}", e);
        }
    }

    // ── Preconditions ──────────────────────────────────────────────────

    fn require_playing(&self) -> Option<ActionOutcome> {
        (!self.state.is_playing()).then(|| ActionOutcome::rejected(RejectReason::NotPlaying))
    }

    fn energy_shortfall(&self, cost: i64) -> Option<RejectReason> {
        let available = self.state.energy();
        (i64::from(available) < cost).then(|| RejectReason::InsufficientEnergy {
            required: u8::try_from(cost).unwrap_or(METER_MAX),
            available,
        })
    }

    fn require_energy(&self, cost: i64) -> Option<ActionOutcome> {
        self.energy_shortfall(cost).map(ActionOutcome::rejected)
    }

    /// Energy check for charged turns; posts the recovery hint on failure.
    fn require_turn_energy(&mut self) -> Option<ActionOutcome> {
        let reason = self.energy_shortfall(ASK_COST)?;
        let notice = Message::system(LOW_ENERGY_NOTICE);
        self.transcript.push(notice.clone());
        Some(ActionOutcome::Rejected {
            reason,
            notice: Some(notice),
        })
    }

    fn log_decision(&mut self, action: &Action) {
        if let Some(tag) = action.decision_tag() {
            self.state.record_decision(tag);
        }
    }
}
