//! # Tally
//!
//! A tap counter that archives finished sessions into a persisted log.
//!
//! The counter and the log are plain state changed by [`TallyReducer`]; the
//! [`tally_runtime::Store`] runs it, writing the log to a durable slot after
//! every change and firing a feedback pulse on each tap.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tally::{HistoryRepository, TallyAction, TallyEnvironment, TallyReducer, TallyState};
//! use tally_core::environment::SystemClock;
//! use tally_core::feedback::NoFeedback;
//! use tally_core::storage::SlotStore;
//! use tally_runtime::Store;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = std::env::temp_dir().join(format!("tally-doc-{}", std::process::id()));
//! let slots: Arc<dyn SlotStore> = Arc::new(tally::FileSlotStore::open(&dir)?);
//! let repository = HistoryRepository::new(slots, "workoutHistory");
//!
//! let state = TallyState::hydrate(&repository, 5);
//! let env = TallyEnvironment::new(Arc::new(SystemClock), repository, Arc::new(NoFeedback));
//! let store = Store::new(state, TallyReducer::new(), env);
//!
//! store.send(TallyAction::Increment).await?;
//! store.send(TallyAction::IncrementByStep).await?;
//! assert_eq!(store.state(|s| s.counter.count).await, 6);
//! # std::fs::remove_dir_all(&dir)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod counter;
pub mod file_store;
pub mod history;
pub mod intent;
pub mod reducer;
pub mod repository;
pub mod types;
pub mod view;

pub use config::TallyConfig;
pub use counter::CounterState;
pub use file_store::FileSlotStore;
pub use history::HistoryState;
pub use intent::{Intent, IntentError};
pub use reducer::{TallyAction, TallyEnvironment, TallyReducer, TallySettings, TallyState};
pub use repository::{HistoryError, HistoryRepository};
pub use types::{SessionEntry, SessionId};
pub use view::{Screen, View};
