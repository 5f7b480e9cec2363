//! Archived sessions, newest first.

use crate::types::{SessionEntry, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// In-memory session log
///
/// Serializes as a bare JSON array, which is exactly what the durable slot
/// holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryState {
    entries: Vec<SessionEntry>,
}

impl HistoryState {
    /// Creates an empty history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Wraps entries that are already newest-first
    #[must_use]
    pub const fn from_entries(entries: Vec<SessionEntry>) -> Self {
        Self { entries }
    }

    /// Inserts `entry` at the head
    pub fn append(&mut self, entry: SessionEntry) {
        self.entries.insert(0, entry);
    }

    /// Removes the first entry with `id`
    ///
    /// Returns `false` when no entry matched.
    pub fn delete(&mut self, id: SessionId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            },
            None => false,
        }
    }

    /// Removes every entry
    ///
    /// Returns `false` when the history was already empty.
    pub fn clear(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        true
    }

    /// Entries, newest first
    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    /// Looks up an entry by id
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<&SessionEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Number of archived sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been archived
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id for a session finished at `now`
    ///
    /// The millisecond timestamp, bumped past every existing id so two
    /// sessions finished within the same millisecond stay distinct. If the
    /// largest stored id is `i64::MAX`, the first free id at or after the
    /// timestamp is used instead, wrapping around to `i64::MIN`.
    #[must_use]
    pub fn next_id(&self, now: DateTime<Utc>) -> SessionId {
        let stamp = now.timestamp_millis();
        let Some(max) = self.entries.iter().map(|entry| entry.id.as_millis()).max() else {
            return SessionId::new(stamp);
        };

        match max.checked_add(1) {
            Some(after_newest) => SessionId::new(stamp.max(after_newest)),
            None => {
                let taken: BTreeSet<i64> =
                    self.entries.iter().map(|entry| entry.id.as_millis()).collect();
                let free = (stamp..=i64::MAX)
                    .chain(i64::MIN..stamp)
                    .find(|id| !taken.contains(id))
                    .unwrap_or(stamp);
                SessionId::new(free)
            },
        }
    }
}
