//! Application State
//!
//! Shared state behind the front end: the level catalog, the persistence
//! store, the provider gateway and the single open session.

use std::sync::Arc;

use interrogation_core::{Archive, KeyValueStore, Snapshot};
use interrogation_llm::ProviderGateway;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::level::LevelCatalog;
use crate::models::response::{ActionOutcome, RejectReason};
use crate::models::settings::AppConfig;
use crate::services::chat::InterrogationChannel;
use crate::services::session::InterrogationSession;
use crate::services::summary::CaseSummaryService;
use crate::utils::error::{AppError, AppResult};
use interrogation_core::action::Action;

/// A level as shown on the level picker
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStatus {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub unlocked: bool,
}

/// Application state shared by the command handlers
pub struct AppState {
    catalog: Arc<LevelCatalog>,
    store: Arc<dyn KeyValueStore>,
    gateway: ProviderGateway,
    offline_fallback: bool,
    logic_cooldown_ms: u64,
    /// The open interrogation, if any. Held for the whole of an action so
    /// overlapping submissions are refused.
    session: Arc<Mutex<Option<InterrogationSession>>>,
}

impl AppState {
    /// Build the state from configuration, wiring the gateway from the
    /// configured endpoints.
    pub fn new(
        config: &AppConfig,
        catalog: LevelCatalog,
        store: Arc<dyn KeyValueStore>,
    ) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        let gateway =
            ProviderGateway::from_config(&config.provider_config(), &config.fallback_base_urls);
        info!(
            "[State] {} endpoint(s), {} level(s)",
            gateway.endpoints().len(),
            catalog.levels().len()
        );
        Ok(Self::with_gateway(config, catalog, store, gateway))
    }

    /// Build the state around an existing gateway.
    pub fn with_gateway(
        config: &AppConfig,
        catalog: LevelCatalog,
        store: Arc<dyn KeyValueStore>,
        gateway: ProviderGateway,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            gateway,
            offline_fallback: config.offline_fallback,
            logic_cooldown_ms: config.logic_cooldown_ms,
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn completed_levels(&self) -> Vec<String> {
        Archive::new(self.store.as_ref()).completed_levels()
    }

    /// Archived cases, most recent first.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        Archive::new(self.store.as_ref()).snapshots()
    }

    /// Every level with its completion and lock status.
    pub fn level_statuses(&self) -> Vec<LevelStatus> {
        let completed = self.completed_levels();
        self.catalog
            .levels()
            .iter()
            .map(|level| LevelStatus {
                id: level.id.clone(),
                title: level.title.clone(),
                completed: completed.contains(&level.id),
                unlocked: self.catalog.is_unlocked(&level.id, &completed),
            })
            .collect()
    }

    /// Open `level_id` as a fresh session, replacing any open one.
    pub async fn open_level(&self, level_id: &str) -> AppResult<()> {
        let level = self
            .catalog
            .get(level_id)
            .ok_or_else(|| AppError::not_found(format!("Level '{}'", level_id)))?
            .clone();
        if !self.catalog.is_unlocked(&level.id, &self.completed_levels()) {
            return Err(AppError::validation(format!(
                "Level '{}' is locked until the previous case is closed",
                level.id
            )));
        }

        let channel = InterrogationChannel::new(self.gateway.clone(), self.catalog.clone())
            .with_offline_fallback(self.offline_fallback);
        let summarizer = CaseSummaryService::new(self.gateway.clone());
        let session = InterrogationSession::new(
            level,
            channel,
            summarizer,
            self.store.clone(),
            self.logic_cooldown_ms,
        );

        let mut guard = self.session.lock().await;
        info!("[State] Opened level {}", level_id);
        *guard = Some(session);
        Ok(())
    }

    /// Run `action` on the open session. Refused while another action is
    /// still in flight.
    pub async fn dispatch(&self, action: Action) -> ActionOutcome {
        let Ok(mut guard) = self.session.try_lock() else {
            return ActionOutcome::rejected(RejectReason::Busy);
        };
        match guard.as_mut() {
            Some(session) => session.perform(action).await,
            None => ActionOutcome::rejected(RejectReason::NoSession),
        }
    }

    /// Read or adjust the open session outside of an action.
    pub async fn with_session<T>(
        &self,
        f: impl FnOnce(&mut InterrogationSession) -> T,
    ) -> AppResult<T> {
        let mut guard = self.session.lock().await;
        guard
            .as_mut()
            .map(f)
            .ok_or_else(|| AppError::validation("No case is open"))
    }

    pub async fn close_level(&self) {
        *self.session.lock().await = None;
    }
}
