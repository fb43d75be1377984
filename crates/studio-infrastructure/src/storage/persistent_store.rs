//! JSON persistence over a [`KeyValueStore`] that never fails the caller.
//!
//! Writes that exceed the store's capacity are shrunk once: an array value is
//! truncated to its first half (at least one element) and retried. If that
//! retry fails too, the write is dropped and the previous value stays.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::kv::{KeyValueStore, StoreError};

/// What a [`PersistentStore::save`] call ended up writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The full value was written.
    Written,
    /// Only the first `kept` array elements were written.
    Trimmed { kept: usize },
    /// Nothing was written; the previously stored value is unchanged.
    Abandoned,
}

impl SaveOutcome {
    pub fn is_written(&self) -> bool {
        !matches!(self, SaveOutcome::Abandoned)
    }
}

/// Number of elements kept when an `len`-element array does not fit.
pub fn trimmed_len(len: usize) -> usize {
    (len / 2).max(1)
}

pub struct PersistentStore<S> {
    store: S,
}

impl<S: KeyValueStore> PersistentStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying key-value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Serializes `value` and writes it under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SaveOutcome {
        match serde_json::to_value(value) {
            Ok(json) => self.save_value(key, json),
            Err(e) => {
                tracing::error!("[PersistentStore] Failed to serialize '{}': {}", key, e);
                SaveOutcome::Abandoned
            }
        }
    }

    /// Writes an already-built JSON value under `key`.
    pub fn save_value(&self, key: &str, value: Value) -> SaveOutcome {
        let err = match self.write(key, &value) {
            Ok(()) => return SaveOutcome::Written,
            Err(err) => err,
        };

        if !err.is_quota_exceeded() {
            tracing::error!("[PersistentStore] Failed to save '{}': {}", key, err);
            return SaveOutcome::Abandoned;
        }

        let Value::Array(mut items) = value else {
            tracing::warn!(
                "[PersistentStore] '{}' exceeds storage quota and cannot be trimmed",
                key
            );
            return SaveOutcome::Abandoned;
        };
        if items.is_empty() {
            tracing::warn!("[PersistentStore] '{}' exceeds storage quota while empty", key);
            return SaveOutcome::Abandoned;
        }

        let total = items.len();
        let kept = trimmed_len(total);
        items.truncate(kept);
        tracing::warn!(
            "[PersistentStore] Storage quota exceeded for '{}', keeping {} of {} entries",
            key,
            kept,
            total
        );

        match self.write(key, &Value::Array(items)) {
            Ok(()) => SaveOutcome::Trimmed { kept },
            Err(err) => {
                tracing::warn!(
                    "[PersistentStore] Giving up on '{}' after trimming: {}",
                    key,
                    err
                );
                SaveOutcome::Abandoned
            }
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        self.store.set(key, &text)
    }

    /// Reads and deserializes `key`. Missing, unreadable or mismatched data
    /// yields `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.load_value(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("[PersistentStore] Unexpected shape under '{}': {}", key, e);
                None
            }
        }
    }

    /// Reads `key` as untyped JSON.
    pub fn load_value(&self, key: &str) -> Option<Value> {
        let text = match self.store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("[PersistentStore] Failed to read '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("[PersistentStore] Discarding malformed '{}': {}", key, e);
                None
            }
        }
    }
}
