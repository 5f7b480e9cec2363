//! Durable mirror of the session history.
//!
//! The whole history lives under one slot key as a compact JSON array. Reads
//! happen once, at startup, through [`HistoryRepository::hydrate`]; writes go
//! through `Storage` effects built by the reducer from
//! [`HistoryRepository::encode`].

use crate::history::HistoryState;
use crate::types::SessionEntry;
use std::sync::Arc;
use tally_core::storage::{SlotStore, StorageError};
use thiserror::Error;

/// Slot key the history is stored under
pub const DEFAULT_HISTORY_KEY: &str = "workoutHistory";

/// Errors raised while loading or saving the history
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The slot store failed
    #[error("History storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The stored value is not a valid history
    #[error("Stored history is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reads and writes the history slot
#[derive(Clone)]
pub struct HistoryRepository {
    store: Arc<dyn SlotStore>,
    key: String,
}

impl HistoryRepository {
    /// Creates a repository over `store`, using slot `key`
    pub fn new(store: Arc<dyn SlotStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Slot key in use
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Handle to the underlying store, for building write effects
    #[must_use]
    pub fn store(&self) -> Arc<dyn SlotStore> {
        Arc::clone(&self.store)
    }

    /// Encodes `entries` the way they are stored
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Malformed`] if serialization fails.
    pub fn encode(entries: &[SessionEntry]) -> Result<String, HistoryError> {
        Ok(serde_json::to_string(entries)?)
    }

    /// Decodes a stored value
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Malformed`] if `raw` is not a history array.
    pub fn decode(raw: &str) -> Result<Vec<SessionEntry>, HistoryError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads the stored history
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the slot cannot be read or does not hold a
    /// valid history.
    pub fn load(&self) -> Result<Option<Vec<SessionEntry>>, HistoryError> {
        self.store
            .read(&self.key)?
            .map(|raw| Self::decode(&raw))
            .transpose()
    }

    /// Replaces the stored history with `entries`
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if encoding or the write fails.
    pub fn save(&self, entries: &[SessionEntry]) -> Result<(), HistoryError> {
        let encoded = Self::encode(entries)?;
        self.store.write(&self.key, &encoded)?;
        Ok(())
    }

    /// Loads the history for a new session
    ///
    /// Absent, unreadable and malformed data all start an empty history.
    /// Failures are logged and never propagated; the stored value is left
    /// alone until the next mutation overwrites it.
    #[must_use]
    pub fn hydrate(&self) -> HistoryState {
        match self.load() {
            Ok(Some(entries)) => {
                tracing::info!(key = %self.key, entries = entries.len(), "Loaded history");
                HistoryState::from_entries(entries)
            },
            Ok(None) => {
                tracing::debug!(key = %self.key, "No stored history, starting empty");
                HistoryState::new()
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Ignoring unreadable history");
                HistoryState::new()
            },
        }
    }
}

impl std::fmt::Debug for HistoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRepository")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
