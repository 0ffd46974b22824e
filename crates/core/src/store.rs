//! Persistence Boundary
//!
//! The game persists two things across sessions: the ordered list of completed
//! level ids and a bounded, most-recent-first list of terminal snapshots. Both
//! live behind the opaque [`KeyValueStore`] collaborator so the state machine
//! can be exercised without a storage backend.
//!
//! Persistence is best-effort. Readers treat missing or malformed values as
//! empty and skip unreadable list entries. Writers return errors for the
//! caller to log, and never write over a list they could not read.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;

/// Key holding the ordered list of completed level ids.
pub const COMPLETED_LEVELS_KEY: &str = "completed_levels";

/// Key holding the snapshot list, most recent first.
pub const SNAPSHOTS_KEY: &str = "snapshots";

/// Maximum number of snapshots retained.
pub const SNAPSHOT_LIMIT: usize = 20;

/// Opaque key-value store for cross-session data.
pub trait KeyValueStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> CoreResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> CoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store, used by tests and the `--ephemeral` front end mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> CoreResult<Option<Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// Archive - typed access to the persisted keys
// ============================================================================

/// Typed view over the two persisted keys of a [`KeyValueStore`].
pub struct Archive<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Archive<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Completed level ids in completion order. Unreadable data reads as empty.
    pub fn completed_levels(&self) -> Vec<String> {
        self.read_entries(COMPLETED_LEVELS_KEY)
    }

    /// Append `level_id` to the completed list. Returns `false` if it was
    /// already there.
    pub fn mark_completed(&self, level_id: &str) -> CoreResult<bool> {
        let levels = self.stored_entries::<String>(COMPLETED_LEVELS_KEY)?;
        if levels.iter().any(|(l, _)| l == level_id) {
            return Ok(false);
        }
        let mut raw: Vec<Value> = levels.into_iter().map(|(_, value)| value).collect();
        raw.push(Value::String(level_id.to_string()));
        self.store.save(COMPLETED_LEVELS_KEY, &Value::Array(raw))?;
        Ok(true)
    }

    pub fn clear_completed(&self) -> CoreResult<()> {
        self.store.remove(COMPLETED_LEVELS_KEY)
    }

    /// Stored snapshots, most recent first. Unreadable entries are skipped.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.read_entries(SNAPSHOTS_KEY)
    }

    /// Prepend a snapshot and keep at most [`SNAPSHOT_LIMIT`] entries.
    ///
    /// Earlier entries are written back as stored. Fails without writing
    /// when the stored list itself cannot be read.
    pub fn push_snapshot(&self, snapshot: Snapshot) -> CoreResult<()> {
        let mut raw = vec![serde_json::to_value(&snapshot)?];
        raw.extend(
            self.stored_entries::<Snapshot>(SNAPSHOTS_KEY)?
                .into_iter()
                .map(|(_, value)| value),
        );
        raw.truncate(SNAPSHOT_LIMIT);
        self.store.save(SNAPSHOTS_KEY, &Value::Array(raw))
    }

    fn read_entries<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.stored_entries(key) {
            Ok(entries) => entries.into_iter().map(|(entry, _)| entry).collect(),
            Err(e) => {
                tracing::warn!("[Archive] Failed to load '{}': {}", key, e);
                Vec::new()
            }
        }
    }

    /// Decode the list under `key` entry by entry, keeping each raw value
    /// beside its decoded form. Entries that do not decode are dropped.
    fn stored_entries<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Vec<(T, Value)>> {
        let entries = match self.store.load(key)? {
            None => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(CoreError::storage(format!("'{}' is not a list", key)));
            }
        };
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match T::deserialize(&value) {
                Ok(entry) => Some((entry, value)),
                Err(e) => {
                    tracing::warn!("[Archive] Skipping unreadable '{}' entry {}: {}", key, i, e);
                    None
                }
            })
            .collect())
    }
}
