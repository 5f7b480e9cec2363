//! In-memory slot store for tests
//!
//! [`InMemorySlotStore`] keeps slots in a `HashMap` and can be switched into
//! a failing mode to exercise persistence error paths.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Only panics on a poisoned lock

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use tally_core::storage::{SlotStore, StorageError};

/// In-memory slot store for fast, deterministic testing.
///
/// # Example
///
/// ```
/// use tally_testing::InMemorySlotStore;
/// use tally_core::storage::SlotStore;
///
/// let store = InMemorySlotStore::new();
/// store.write("workoutHistory", "[]").unwrap();
/// assert_eq!(store.read("workoutHistory").unwrap().as_deref(), Some("[]"));
///
/// store.fail_writes(true);
/// assert!(store.write("workoutHistory", "[1]").is_err());
/// assert_eq!(store.read("workoutHistory").unwrap().as_deref(), Some("[]"));
/// ```
#[derive(Debug, Default)]
pub struct InMemorySlotStore {
    data: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl InMemorySlotStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one slot already populated
    #[must_use]
    pub fn with_slot(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw value of a slot, bypassing the trait
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SlotStore for InMemorySlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("quota exceeded".to_string()));
        }
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
