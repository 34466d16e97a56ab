use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::{SlotError, StorageSlot};

pub const WISHLIST_KEY: &str = "wishlist";

/// An element of a persisted set: keyed for dedup and validated on load.
pub trait SetRecord: Serialize + DeserializeOwned {
    fn key(&self) -> i64;
    fn validate(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: i64,
    pub title: String,
    pub price: f64,
}

impl SetRecord for WishlistEntry {
    fn key(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> bool {
        !self.title.is_empty() && self.price.is_finite() && self.price >= 0.0
    }
}

/// Deduplicated collection mirrored in memory, with its canonical copy in a
/// durable slot. Persistence is advisory: if the slot is unreadable or
/// unwritable the in-memory set stays authoritative for the session.
pub struct PersistedSet<T, S> {
    slot: S,
    storage_key: &'static str,
    entries: Vec<T>,
}

pub type Wishlist<S> = PersistedSet<WishlistEntry, S>;

impl<S: StorageSlot> PersistedSet<WishlistEntry, S> {
    pub fn open(slot: S) -> Self {
        Self::load(slot, WISHLIST_KEY)
    }
}

impl<T: SetRecord, S: StorageSlot> PersistedSet<T, S> {
    pub fn load(slot: S, storage_key: &'static str) -> Self {
        let entries = match Self::read(&slot, storage_key) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(key = storage_key, %err, "could not read persisted set, starting empty");
                Vec::new()
            }
        };
        Self {
            slot,
            storage_key,
            entries,
        }
    }

    /// Strict read, kept internal: the public contract degrades every failure
    /// to an empty set, but the distinction between "validly empty" and
    /// "unreadable" matters when debugging.
    fn read(slot: &S, key: &str) -> Result<Vec<T>, SlotError> {
        let Some(raw) = slot.get(key)? else {
            return Ok(Vec::new());
        };
        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|err| SlotError::Corrupt(err.to_string()))?;
        let Value::Array(items) = parsed else {
            return Err(SlotError::Corrupt("payload is not a JSON array".into()));
        };

        let mut entries: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<T>(item) {
                Ok(entry) if entry.validate() => {
                    if !entries.iter().any(|e| e.key() == entry.key()) {
                        entries.push(entry);
                    }
                }
                Ok(entry) => {
                    debug!(key = entry.key(), "dropping persisted entry that failed validation");
                }
                Err(err) => {
                    debug!(%err, "dropping malformed persisted entry");
                }
            }
        }
        Ok(entries)
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = self.storage_key, %err, "could not serialize persisted set");
                return;
            }
        };
        if let Err(err) = self.slot.set(self.storage_key, &raw) {
            warn!(key = self.storage_key, %err, "persist failed, keeping in-memory set");
        }
    }

    /// Removes the entry with the same key if present, appends it otherwise,
    /// then persists. A re-added entry moves to the end of the sequence.
    pub fn toggle(&mut self, entry: T) -> &[T] {
        if let Some(pos) = self.entries.iter().position(|e| e.key() == entry.key()) {
            self.entries.remove(pos);
        } else {
            self.entries.push(entry);
        }
        self.persist();
        &self.entries
    }

    /// Removes by key. Persists only when something was actually dropped.
    pub fn remove(&mut self, key: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != key);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn contains(&self, key: i64) -> bool {
        self.entries.iter().any(|e| e.key() == key)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
