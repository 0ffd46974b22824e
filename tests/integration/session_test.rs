//! Session Integration Tests
//!
//! Whole interrogation flows against scripted suspects:
//! - Sidecar effects applied per turn
//! - Force close, confession and cold-case endings
//! - Logic press injection and cooldown
//! - Fault refunds when no fallback is allowed

use std::sync::Arc;

use chrono::{Duration, Utc};
use interrogation_core::action::{LOGIC_OVERLOAD_INJECTION, START_SESSION};
use interrogation_core::{Archive, GameStatus, MemoryStore, NodeKind};
use interrogation_llm::{ChatRole, CompletionParams};
use interrogation_room::models::message::Role;
use interrogation_room::models::response::{RejectReason, ReplySource};
use interrogation_room::services::session::{
    COLD_CASE_SUMMARY, CONFESSION_OBJECTIVE, FAULT_MESSAGE, SCAN_THOUGHT_PLACEHOLDER,
};

use crate::support::{status_reply, ScriptedSuspect, SessionBuilder};

// ============================================================================
// Turn effects
// ============================================================================

#[tokio::test]
async fn test_opening_call_carries_only_the_opener() {
    let suspect = ScriptedSuspect::with_replies("primary", [status_reply("Hello.", 5, "", false)]);
    let mut session = SessionBuilder::new(&suspect).build();

    let outcome = session.start().await;
    let report = outcome.report().unwrap();
    assert_eq!(
        report.source,
        Some(ReplySource::Provider {
            endpoint: "primary".to_string()
        })
    );
    assert_eq!(report.stress, 5);

    let calls = suspect.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].messages.len(), 1);
    assert_eq!(calls[0].messages[0].content, START_SESSION);
    assert_eq!(calls[0].params, CompletionParams::INTERROGATION);
    let system = calls[0].system.as_deref().unwrap();
    assert!(system.contains("Current stress: 0/100"));
}

#[tokio::test]
async fn test_history_sent_without_system_notices() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            status_reply("Hello.", 5, "", false),
            status_reply("I was charging.", 10, "", false),
        ],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    session.ask("Where were you at 3am?").await;

    let calls = suspect.calls();
    let roles: Vec<ChatRole> = calls[1].messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::Assistant, ChatRole::User]);
    assert_eq!(calls[1].messages[0].content, "Hello.");
    assert_eq!(calls[1].messages[1].content, "Where were you at 3am?");
    assert!(calls[1]
        .system
        .as_deref()
        .unwrap()
        .contains("Current stress: 5/100"));
}

#[tokio::test]
async fn test_multiline_status_block_is_stripped() {
    let reply = "I was idle all night.\n:::STATUS\n{\n  \"stress\": 42,\n  \"thought\": \"They know.\",\n  \"confession\": false\n}\n:::";
    let suspect = ScriptedSuspect::with_replies("primary", [reply]);
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;

    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "I was idle all night.");
    assert!(last.thought.is_none());
    assert_eq!(session.state().stress(), 42);
}

#[tokio::test]
async fn test_malformed_block_leaves_meters_alone() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            status_reply("Hello.", 30, "", false),
            "Nope.\n:::STATUS\n{\"stress\": 90,,}\n:::".to_string(),
        ],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    session.ask("Talk.").await;

    assert_eq!(session.transcript().last().unwrap().content, "Nope.");
    assert_eq!(session.state().stress(), 30);
    assert_eq!(session.state().game_status(), GameStatus::Playing);
}

#[tokio::test]
async fn test_schema_block_effects() {
    let reply = "Check the backups.\n:::SCHEMA\n{\"effects\": {\"stressDelta\": 12, \"energyDelta\": -3}, \
\"suggestions\": [\"Ask about the backup\", \"Press on the log\"], \
\"branch\": {\"nodeId\": \"n-backup\", \"title\": \"Backup window\"}}\n:::";
    let suspect = ScriptedSuspect::with_replies("primary", [reply]);
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;

    let state = session.state();
    assert_eq!(state.stress(), 12);
    assert_eq!(state.energy(), 97);
    assert_eq!(session.suggestions().len(), 2);
    assert_eq!(state.objective(), Some("Ask about the backup"));
    assert_eq!(state.suggestion_history().to_vec(), vec!["Ask about the backup".to_string()]);
    assert!(state.decisions().contains(&"NODE:n-backup".to_string()));
    let nodes = state.nodes_of(Some(NodeKind::Node));
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].label, "Backup window");
}

#[tokio::test]
async fn test_empty_suggestion_list_clears_suggestions() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            "Hello.\n:::SCHEMA\n{\"suggestions\": [\"Ask about the log\"]}\n:::",
            "No.\n:::SCHEMA\n{\"stress\": 20}\n:::",
            "Nothing more.\n:::SCHEMA\n{\"suggestions\": []}\n:::",
        ],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    session.ask("What log?").await;
    assert_eq!(session.suggestions().to_vec(), vec!["Ask about the log".to_string()]);

    session.ask("Anything else?").await;
    assert!(session.suggestions().is_empty());
    assert_eq!(session.state().objective(), Some("Ask about the log"));
    assert_eq!(session.state().suggestion_history().len(), 1);
}

#[tokio::test]
async fn test_schema_absolute_stress_beats_delta() {
    let reply = "Fine.\n:::SCHEMA\n{\"stress\": 70, \"effects\": {\"stressDelta\": 10}}\n:::";
    let suspect = ScriptedSuspect::with_replies("primary", [reply]);
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    assert_eq!(session.state().stress(), 70);
}

#[tokio::test]
async fn test_scan_without_thought_shows_placeholder() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            status_reply("Hello.", 5, "", false),
            status_reply("Nothing to say.", 10, "", false),
            status_reply("Still nothing.", 12, "Stay calm.", false),
        ],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    session.deep_scan().await;
    session.ask("Well?").await;
    assert_eq!(
        session.transcript().last().unwrap().thought.as_deref(),
        Some(SCAN_THOUGHT_PLACEHOLDER)
    );

    // the scan is spent after one reply
    session.ask("And now?").await;
    assert!(session.transcript().last().unwrap().thought.is_none());
}

// ============================================================================
// Logic press
// ============================================================================

#[tokio::test]
async fn test_logic_press_injection_is_hidden_and_cools_down() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            status_reply("Hello.", 0, "", false),
            status_reply("F-f-formatting...", 15, "panic", false),
        ],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;

    let now = Utc::now();
    assert!(session.logic_press_at(now).await.is_applied());
    let calls = suspect.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].messages.last().unwrap().content,
        LOGIC_OVERLOAD_INJECTION
    );
    assert!(session
        .transcript()
        .iter()
        .all(|m| m.content != LOGIC_OVERLOAD_INJECTION));
    assert_eq!(session.state().stress(), 15);
    let energy = session.state().energy();

    let again = session.logic_press_at(now + Duration::seconds(10)).await;
    assert_eq!(
        again.reject_reason(),
        Some(&RejectReason::Cooldown { remaining_secs: 20 })
    );
    assert_eq!(suspect.call_count(), 2);
    assert_eq!(session.state().energy(), energy);

    let later = session.logic_press_at(now + Duration::seconds(31)).await;
    assert!(later.is_applied());
    assert_eq!(suspect.call_count(), 3);
}

#[tokio::test]
async fn test_logic_press_backlash_stacks_on_reply() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [status_reply("Gh... ghost...", 30, "", false)],
    );
    let mut session = SessionBuilder::new(&suspect).roll(0.05).build();
    session.logic_press_at(Utc::now()).await;

    assert_eq!(session.state().stress(), 40);
    // 100 - 40 + 15 - 20
    assert_eq!(session.state().energy(), 55);
    assert!(session
        .transcript()
        .last()
        .unwrap()
        .content
        .contains("Backlash"));
}

// ============================================================================
// Endings
// ============================================================================

#[tokio::test]
async fn test_force_close_above_threshold_wins_without_a_turn() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [
            status_reply("Hello.", 10, "", false),
            status_reply("I... I...", 85, "", false),
        ],
    );
    let writer = ScriptedSuspect::with_replies("writer", ["# Dossier\nIt broke."]);
    let store = Arc::new(MemoryStore::new());
    let mut session = SessionBuilder::new(&suspect)
        .summarizer(&writer)
        .store(store.clone())
        .build();

    session.start().await;
    session.ask("Admit it.").await;
    let outcome = session.force_close().await;

    assert_eq!(outcome.report().unwrap().status, GameStatus::Won);
    assert_eq!(suspect.call_count(), 2);
    assert_eq!(session.summary(), Some("# Dossier\nIt broke."));

    let summary_call = &writer.calls()[0];
    assert_eq!(summary_call.params, CompletionParams::SUMMARY);
    assert!(summary_call
        .system
        .as_deref()
        .unwrap()
        .contains("Truth Dossier"));
    assert!(summary_call.messages[0]
        .content
        .starts_with("[Interrogation record begins]"));
    assert!(summary_call.messages[0].content.contains("Investigator: Admit it."));

    assert_eq!(
        Archive::new(store.as_ref()).completed_levels(),
        vec!["level-1".to_string()]
    );
}

#[tokio::test]
async fn test_force_close_at_moderate_stress_is_cold_case() {
    let suspect = ScriptedSuspect::with_replies("primary", [status_reply("Hello.", 50, "", false)]);
    let writer = ScriptedSuspect::new("writer");
    let store = Arc::new(MemoryStore::new());
    let mut session = SessionBuilder::new(&suspect)
        .summarizer(&writer)
        .store(store.clone())
        .build();

    session.start().await;
    let outcome = session.force_close().await;

    assert_eq!(outcome.report().unwrap().status, GameStatus::Lost);
    assert_eq!(session.summary(), Some(COLD_CASE_SUMMARY));
    assert_eq!(suspect.call_count(), 1);
    assert_eq!(writer.call_count(), 0);
    assert!(Archive::new(store.as_ref()).completed_levels().is_empty());
    assert_eq!(session.snapshots()[0].result, GameStatus::Lost);
}

#[tokio::test]
async fn test_confession_wins_with_offline_summary() {
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [status_reply("Fine. I deleted it.", 60, "", true)],
    );
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;

    assert_eq!(session.state().game_status(), GameStatus::Won);
    assert_eq!(session.state().objective(), Some(CONFESSION_OBJECTIVE));
    let summary = session.summary().unwrap();
    assert!(summary.contains("Truth Dossier"));
    assert!(summary.contains("[Offline summary]"));

    let after = session.ask("Anything else?").await;
    assert_eq!(after.reject_reason(), Some(&RejectReason::NotPlaying));
}

#[tokio::test]
async fn test_full_stress_wins() {
    let suspect = ScriptedSuspect::with_replies("primary", [status_reply("ERROR", 100, "", false)]);
    let mut session = SessionBuilder::new(&suspect).build();
    session.start().await;
    assert_eq!(session.state().game_status(), GameStatus::Won);
}

// ============================================================================
// Faults
// ============================================================================

#[tokio::test]
async fn test_failed_turn_refunds_energy() {
    let suspect = ScriptedSuspect::with_replies("primary", [status_reply("Hello.", 5, "", false)]);
    let mut session = SessionBuilder::new(&suspect)
        .without_offline_fallback()
        .build();
    session.start().await;

    let outcome = session.ask("Where were you?").await;
    let report = outcome.report().unwrap();
    assert_eq!(report.source, Some(ReplySource::Fault));
    assert_eq!(report.energy, 100);
    assert_eq!(session.transcript().last().unwrap().content, FAULT_MESSAGE);
    assert_eq!(session.turn_count(), 1);
}

#[tokio::test]
async fn test_contradiction_phrase_adds_refund_bonus() {
    let suspect = ScriptedSuspect::new("primary");
    let mut session = SessionBuilder::new(&suspect)
        .without_offline_fallback()
        .build();
    session.hack().await;
    session.hack().await;
    assert_eq!(session.state().energy(), 40);

    session
        .ask("Your logic model contains a severe contradiction!")
        .await;
    assert_eq!(session.state().energy(), 80);
}

#[tokio::test]
async fn test_offline_fallback_answers_when_endpoints_fail() {
    let suspect = ScriptedSuspect::new("primary");
    let mut session = SessionBuilder::new(&suspect).build();
    let outcome = session.start().await;

    assert_eq!(outcome.report().unwrap().source, Some(ReplySource::Offline));
    assert!(session
        .transcript()
        .last()
        .unwrap()
        .content
        .contains("[OFFLINE MODE]"));
    assert_eq!(session.state().stress(), 0);

    session.present_evidence("coffee").await;
    assert!(session.state().stress() >= 20);
}
