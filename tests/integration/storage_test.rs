//! Storage Integration Tests
//!
//! Progress written through a session onto the JSON file store, read back
//! by a fresh store or a fresh application state.

use std::sync::Arc;

use interrogation_core::action::Action;
use interrogation_core::store::SNAPSHOT_LIMIT;
use interrogation_core::{Archive, GameStatus, KeyValueStore, Snapshot};
use interrogation_room::models::level::LevelCatalog;
use interrogation_room::storage::{ConfigService, JsonFileStore};
use interrogation_room::{AppConfig, AppState};

use crate::support::{gateway_of, status_reply, ScriptedSuspect, SessionBuilder};

fn file_store(dir: &std::path::Path) -> Arc<dyn KeyValueStore> {
    Arc::new(JsonFileStore::open(dir).unwrap())
}

#[tokio::test]
async fn test_won_case_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [status_reply("All right. I did it.", 70, "", true)],
    );
    let mut session = SessionBuilder::new(&suspect)
        .store(file_store(temp.path()))
        .build();
    session.start().await;
    assert_eq!(session.state().game_status(), GameStatus::Won);

    let reopened = JsonFileStore::open(temp.path()).unwrap();
    let archive = Archive::new(&reopened);
    assert_eq!(archive.completed_levels(), vec!["level-1"]);
    let snapshots = archive.snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].level_id, "level-1");
    assert_eq!(snapshots[0].result, GameStatus::Won);
    assert_eq!(snapshots[0].stress, 70);
}

#[tokio::test]
async fn test_reset_all_forgets_completion_but_keeps_archive() {
    let temp = tempfile::tempdir().unwrap();
    let suspect = ScriptedSuspect::with_replies("primary", [status_reply("ERROR", 100, "", false)]);
    let mut session = SessionBuilder::new(&suspect)
        .store(file_store(temp.path()))
        .build();
    session.start().await;
    session.reset_all();

    assert_eq!(session.state().game_status(), GameStatus::Playing);
    let reopened = JsonFileStore::open(temp.path()).unwrap();
    assert!(Archive::new(&reopened).completed_levels().is_empty());
    assert_eq!(Archive::new(&reopened).snapshots().len(), 1);
}

#[test]
fn test_snapshot_list_is_capped_on_disk() {
    let temp = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(temp.path()).unwrap();
    let state = interrogation_core::InterrogationState::default();
    for turns in 0..(SNAPSHOT_LIMIT as u32 + 3) {
        Archive::new(&store)
            .push_snapshot(Snapshot::capture(&state, "level-1", "Case", turns))
            .unwrap();
    }

    let reopened = JsonFileStore::open(temp.path()).unwrap();
    let snapshots = Archive::new(&reopened).snapshots();
    assert_eq!(snapshots.len(), SNAPSHOT_LIMIT);
    assert_eq!(snapshots[0].turns, SNAPSHOT_LIMIT as u32 + 2);
}

#[tokio::test]
async fn test_next_level_unlocks_for_a_fresh_state() {
    let temp = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let suspect = ScriptedSuspect::with_replies(
        "primary",
        [status_reply("Fine. I deleted it.", 60, "", true)],
    );

    let state = AppState::with_gateway(
        &config,
        LevelCatalog::builtin(),
        file_store(temp.path()),
        gateway_of(&[suspect]),
    );
    state.open_level("level-1").await.unwrap();
    state.dispatch(Action::Start).await;
    assert_eq!(state.completed_levels(), vec!["level-1"]);

    let fresh = AppState::with_gateway(
        &config,
        LevelCatalog::builtin(),
        file_store(temp.path()),
        gateway_of(&[]),
    );
    let statuses = fresh.level_statuses();
    assert!(statuses[0].completed);
    assert!(statuses[1].unlocked);
    fresh.open_level("level-2").await.unwrap();
    assert_eq!(fresh.snapshots().len(), 1);
}

#[test]
fn test_config_edits_persist() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    {
        let mut service = ConfigService::open(&path).unwrap();
        service.config_mut().fallback_base_urls = vec!["https://backup.example/v1".to_string()];
        service.config_mut().offline_fallback = false;
        service.save().unwrap();
    }

    let service = ConfigService::open(&path).unwrap();
    let config = service.get_config();
    assert_eq!(config.fallback_base_urls, vec!["https://backup.example/v1"]);
    assert!(!config.offline_fallback);
    assert_eq!(config.request_timeout_secs, 60);
}
