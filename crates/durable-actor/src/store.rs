//! # Durable Store
//!
//! Per-key state snapshots and per-invocation journals. Everything is stored as
//! `serde_json::Value` so the store is independent of the entity types it holds.

use crate::error::FrameworkError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Identifies one invocation of an action; replays of the same invocation share it.
pub type InvocationId = Uuid;

/// One completed, replayable journal entry.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Default)]
pub struct DurableStore {
    snapshots: RwLock<HashMap<String, Value>>,
    journals: RwLock<HashMap<InvocationId, Vec<JournalEntry>>>,
}

fn snapshot_key(kind: &str, key: &str) -> String {
    format!("{kind}/{key}")
}

impl DurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the committed snapshot for `kind/key`, if any.
    pub fn load<S: DeserializeOwned>(&self, kind: &str, key: &str) -> Result<Option<S>, FrameworkError> {
        let snapshots = self.snapshots.read();
        match snapshots.get(&snapshot_key(kind, key)) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| FrameworkError::Journal(format!("corrupt snapshot {kind}/{key}: {e}"))),
            None => Ok(None),
        }
    }

    pub fn save<S: Serialize>(&self, kind: &str, key: &str, state: &S) -> Result<(), FrameworkError> {
        let value = serde_json::to_value(state)
            .map_err(|e| FrameworkError::Journal(format!("unserializable state {kind}/{key}: {e}")))?;
        self.snapshots.write().insert(snapshot_key(kind, key), value);
        Ok(())
    }

    pub fn journal_entry(&self, invocation: &InvocationId, index: usize) -> Option<JournalEntry> {
        self.journals
            .read()
            .get(invocation)
            .and_then(|entries| entries.get(index).cloned())
    }

    /// Records the result at `index`. Entries are append-only: a slot that already exists is
    /// left untouched so a racing replay can never overwrite history.
    pub fn record(&self, invocation: &InvocationId, index: usize, name: &str, value: Value) {
        let mut journals = self.journals.write();
        let entries = journals.entry(*invocation).or_default();
        if index == entries.len() {
            entries.push(JournalEntry {
                name: name.to_string(),
                value,
            });
        }
    }

    pub fn clear_journal(&self, invocation: &InvocationId) {
        self.journals.write().remove(invocation);
    }

    /// Number of invocations with a live journal.
    pub fn open_journals(&self) -> usize {
        self.journals.read().len()
    }
}
