//! Durable key-value slots.
//!
//! A slot store holds a handful of named string values that survive process
//! restarts. Reducers never touch a slot directly: they return an
//! [`Effect::Storage`](crate::effect::Effect::Storage) carrying a [`SlotWrite`],
//! and the runtime executes it after the state change is applied.
//!
//! # Implementations
//!
//! - `FileSlotStore` (in the `tally` crate): one file per key on local disk
//! - `InMemorySlotStore` (in `tally-testing`): `HashMap`-backed, can be told to fail writes
//!
//! # Synchronous by contract
//!
//! Slot access is local and bounded, so the trait is synchronous. The runtime
//! calls it inline, which keeps "mutation, then persist" inside a single
//! dispatch with no interleaving.

use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while reading or writing a slot.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying file or device failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A process-wide durable key-value store.
///
/// # Example
///
/// ```
/// use tally_core::storage::{SlotStore, StorageError};
/// use std::collections::HashMap;
/// use std::sync::Mutex;
///
/// struct MapStore(Mutex<HashMap<String, String>>);
///
/// impl SlotStore for MapStore {
///     fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
///         let map = self.0.lock().map_err(|e| StorageError::Backend(e.to_string()))?;
///         Ok(map.get(key).cloned())
///     }
///
///     fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
///         let mut map = self.0.lock().map_err(|e| StorageError::Backend(e.to_string()))?;
///         map.insert(key.to_string(), value.to_string());
///         Ok(())
///     }
/// }
///
/// let store = MapStore(Mutex::new(HashMap::new()));
/// assert_eq!(store.read("history").unwrap(), None);
/// store.write("history", "[]").unwrap();
/// assert_eq!(store.read("history").unwrap().as_deref(), Some("[]"));
/// ```
pub trait SlotStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value could not be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Callback producing a follow-up action after a successful write
pub type OnWritten<Action> = Box<dyn FnOnce() -> Option<Action> + Send>;

/// Callback producing a follow-up action after a failed write
pub type OnWriteError<Action> = Box<dyn FnOnce(StorageError) -> Option<Action> + Send>;

/// Description of a single slot write, executed by the runtime.
pub struct SlotWrite<Action> {
    /// Store to write to
    pub store: Arc<dyn SlotStore>,
    /// Slot key
    pub key: String,
    /// Encoded value
    pub value: String,
    /// Action to feed back on success
    pub on_success: OnWritten<Action>,
    /// Action to feed back on failure
    pub on_error: OnWriteError<Action>,
}

impl<Action> SlotWrite<Action> {
    /// Perform the write and return the follow-up action, if any.
    pub fn execute(self) -> Option<Action> {
        match self.store.write(&self.key, &self.value) {
            Ok(()) => (self.on_success)(),
            Err(error) => (self.on_error)(error),
        }
    }
}

impl<Action> std::fmt::Debug for SlotWrite<Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotWrite")
            .field("key", &self.key)
            .field("bytes", &self.value.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct OneSlot {
        value: Mutex<Option<String>>,
        broken: bool,
    }

    impl SlotStore for OneSlot {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.value.lock().unwrap().clone())
        }

        fn write(&self, _key: &str, value: &str) -> Result<(), StorageError> {
            if self.broken {
                return Err(StorageError::Backend("disk full".to_string()));
            }
            *self.value.lock().unwrap() = Some(value.to_string());
            Ok(())
        }
    }

    fn write_to(store: Arc<OneSlot>) -> SlotWrite<String> {
        SlotWrite {
            store,
            key: "k".to_string(),
            value: "v".to_string(),
            on_success: Box::new(|| Some("ok".to_string())),
            on_error: Box::new(|error| Some(error.to_string())),
        }
    }

    #[test]
    fn execute_reports_success() {
        let store = Arc::new(OneSlot::default());
        let action = write_to(Arc::clone(&store)).execute();

        assert_eq!(action.as_deref(), Some("ok"));
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn execute_reports_failure() {
        let store = Arc::new(OneSlot {
            broken: true,
            ..OneSlot::default()
        });
        let action = write_to(Arc::clone(&store)).execute();

        assert_eq!(action.as_deref(), Some("Storage backend error: disk full"));
        assert_eq!(store.read("k").unwrap(), None);
    }

    #[test]
    fn debug_omits_payload() {
        let write = write_to(Arc::new(OneSlot::default()));
        let rendered = format!("{write:?}");
        assert!(rendered.contains("bytes: 1"));
        assert!(!rendered.contains("on_error"));
    }
}
