//! Reducer wiring the counter and the history together.
//!
//! Every user intent is a [`TallyAction`]. The reducer mutates
//! [`TallyState`] in place and returns what should happen next: a slot write
//! after any history change, a feedback pulse after a tap, a delayed action
//! that hides the "History cleared!" notice.

use crate::counter::{CounterState, UNTITLED_SESSION};
use crate::history::HistoryState;
use crate::repository::HistoryRepository;
use crate::types::SessionId;
use crate::view::View;
use std::sync::Arc;
use std::time::Duration;
use tally_core::environment::Clock;
use tally_core::feedback::FeedbackSignal;
use tally_core::{SmallVec, effect::Effect, pulse, reducer::Reducer, smallvec, write_slot};

/// Everything the user (or an effect) can ask for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TallyAction {
    // ========== Counter ==========
    /// Add one
    Increment,
    /// Subtract one, stopping at zero
    Decrement,
    /// Zero the count
    Reset,
    /// Change the custom step from raw input
    SetIncrementStep {
        /// Text as typed
        input: String,
    },
    /// Add the custom step
    IncrementByStep,
    /// Change the working title
    SetDraftName {
        /// New title
        name: String,
    },
    /// Archive the running session
    FinishSession,

    // ========== History ==========
    /// Remove one archived session
    DeleteEntry {
        /// Session to remove
        id: SessionId,
    },
    /// Remove every archived session; the caller has already confirmed
    ClearHistory,

    // ========== View ==========
    /// Switch the active view
    ShowView(View),

    // ========== Effect feedback ==========
    /// The history slot was written
    PersistSucceeded,
    /// The history slot could not be written
    PersistFailed {
        /// What went wrong
        error: String,
    },
    /// The cleared notice raised with `generation` has timed out
    ClearedNoticeExpired {
        /// Notice the timer belongs to
        generation: u64,
    },
}

/// Whole application state, owned by the store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TallyState {
    /// Session in progress
    pub counter: CounterState,
    /// Archived sessions
    pub history: HistoryState,
    /// Screen being shown
    pub view: View,
    /// Whether the "History cleared!" notice is showing
    pub cleared_notice: bool,
    /// Bumped every time the notice is raised
    pub notice_generation: u64,
    /// Error from the most recent failed write, until a write succeeds
    pub last_persist_error: Option<String>,
}

impl TallyState {
    /// Starting state: stored history, a fresh counter on the given step
    #[must_use]
    pub fn hydrate(repository: &HistoryRepository, increment_step: i64) -> Self {
        Self {
            counter: CounterState::new(increment_step),
            history: repository.hydrate(),
            ..Self::default()
        }
    }
}

/// Tunables for the reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TallySettings {
    /// Name for sessions finished without one
    pub placeholder_name: String,
    /// How long the cleared notice stays up
    pub cleared_notice: Duration,
    /// Length of the tap feedback pulse
    pub feedback_pulse: Duration,
}

impl Default for TallySettings {
    fn default() -> Self {
        Self {
            placeholder_name: UNTITLED_SESSION.to_string(),
            cleared_notice: Duration::from_secs(2),
            feedback_pulse: Duration::from_millis(50),
        }
    }
}

/// Dependencies of [`TallyReducer`]
#[derive(Clone)]
pub struct TallyEnvironment {
    /// Source of timestamps and ids
    pub clock: Arc<dyn Clock>,
    /// Where the history is mirrored
    pub repository: HistoryRepository,
    /// Tap feedback device
    pub feedback: Arc<dyn FeedbackSignal>,
    /// Tunables
    pub settings: TallySettings,
}

impl TallyEnvironment {
    /// Creates an environment with default settings
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        repository: HistoryRepository,
        feedback: Arc<dyn FeedbackSignal>,
    ) -> Self {
        Self {
            clock,
            repository,
            feedback,
            settings: TallySettings::default(),
        }
    }

    /// Replaces the settings
    #[must_use]
    pub fn with_settings(mut self, settings: TallySettings) -> Self {
        self.settings = settings;
        self
    }
}

impl std::fmt::Debug for TallyEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TallyEnvironment")
            .field("repository", &self.repository)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Reducer for the counter and its history
#[derive(Clone, Debug, Default)]
pub struct TallyReducer;

impl TallyReducer {
    /// Creates a new `TallyReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn tap(env: &TallyEnvironment) -> Effect<TallyAction> {
        pulse!(env.feedback, env.settings.feedback_pulse)
    }

    /// Write effect mirroring the current history
    ///
    /// Encoding cannot realistically fail; if it does the error is recorded
    /// like a failed write and nothing is stored.
    fn persist(state: &mut TallyState, env: &TallyEnvironment) -> Option<Effect<TallyAction>> {
        match HistoryRepository::encode(state.history.entries()) {
            Ok(encoded) => {
                let store = env.repository.store();
                Some(write_slot! {
                    store: store,
                    key: env.repository.key(),
                    value: encoded,
                    on_success: || Some(TallyAction::PersistSucceeded),
                    on_error: |error| Some(TallyAction::PersistFailed {
                        error: error.to_string(),
                    })
                })
            },
            Err(error) => {
                tracing::error!(%error, "Could not encode history");
                state.last_persist_error = Some(error.to_string());
                None
            },
        }
    }
}

impl Reducer for TallyReducer {
    type State = TallyState;
    type Action = TallyAction;
    type Environment = TallyEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Counter ==========
            TallyAction::Increment => {
                state.counter.increment();
                smallvec![Self::tap(env)]
            },

            TallyAction::Decrement => {
                state.counter.decrement();
                smallvec![Self::tap(env)]
            },

            TallyAction::Reset => {
                state.counter.reset();
                smallvec![Self::tap(env)]
            },

            TallyAction::SetIncrementStep { input } => {
                state.counter.set_increment_step(&input);
                tracing::debug!(step = state.counter.increment_step, "Increment step changed");
                SmallVec::new()
            },

            TallyAction::IncrementByStep => {
                state.counter.increment_by_step();
                smallvec![Self::tap(env)]
            },

            TallyAction::SetDraftName { name } => {
                state.counter.set_draft_name(name);
                SmallVec::new()
            },

            TallyAction::FinishSession => {
                let now = env.clock.now();
                let id = state.history.next_id(now);
                let Some(entry) = state.counter.finish(id, now, &env.settings.placeholder_name)
                else {
                    tracing::debug!("Nothing to finish");
                    return SmallVec::new();
                };

                tracing::info!(id = %entry.id, name = %entry.name, count = entry.count, "Session finished");
                state.history.append(entry);

                let mut effects: SmallVec<[Effect<TallyAction>; 4]> = SmallVec::new();
                effects.extend(Self::persist(state, env));
                effects.push(Self::tap(env));
                effects
            },

            // ========== History ==========
            TallyAction::DeleteEntry { id } => {
                if !state.history.delete(id) {
                    tracing::debug!(%id, "No session with that id");
                    return SmallVec::new();
                }

                tracing::info!(%id, "Session deleted");
                Self::persist(state, env).into_iter().collect()
            },

            TallyAction::ClearHistory => {
                if !state.history.clear() {
                    tracing::debug!("History already empty");
                    return SmallVec::new();
                }

                state.notice_generation += 1;
                state.cleared_notice = true;
                tracing::info!("History cleared");

                let mut effects: SmallVec<[Effect<TallyAction>; 4]> = SmallVec::new();
                effects.extend(Self::persist(state, env));
                effects.push(Effect::Delay {
                    duration: env.settings.cleared_notice,
                    action: Box::new(TallyAction::ClearedNoticeExpired {
                        generation: state.notice_generation,
                    }),
                });
                effects
            },

            // ========== View ==========
            TallyAction::ShowView(view) => {
                state.view = view;
                SmallVec::new()
            },

            // ========== Effect feedback ==========
            TallyAction::PersistSucceeded => {
                state.last_persist_error = None;
                SmallVec::new()
            },

            TallyAction::PersistFailed { error } => {
                tracing::warn!(%error, "Failed to save history, keeping it in memory");
                state.last_persist_error = Some(error);
                SmallVec::new()
            },

            TallyAction::ClearedNoticeExpired { generation } => {
                // a later clear owns the notice now
                if generation == state.notice_generation {
                    state.cleared_notice = false;
                }
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::DEFAULT_HISTORY_KEY;
    use crate::types::SessionEntry;
    use tally_core::storage::SlotStore;
    use tally_testing::{InMemorySlotStore, RecordingFeedback, ReducerTest, assertions, test_clock};

    fn env() -> TallyEnvironment {
        let store: Arc<dyn SlotStore> = Arc::new(InMemorySlotStore::new());
        TallyEnvironment::new(
            Arc::new(test_clock()),
            HistoryRepository::new(store, DEFAULT_HISTORY_KEY),
            Arc::new(RecordingFeedback::new()),
        )
    }

    fn entry(id: i64, name: &str, count: i64) -> SessionEntry {
        SessionEntry {
            id: SessionId::new(id),
            name: name.to_string(),
            count,
            created_at: chrono::DateTime::from_timestamp_millis(id).unwrap(),
        }
    }

    fn with_history(entries: Vec<SessionEntry>) -> TallyState {
        TallyState {
            history: HistoryState::from_entries(entries),
            ..TallyState::default()
        }
    }

    #[test]
    fn increment_pulses() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .when_action(TallyAction::Increment)
            .then_state(|state| assert_eq!(state.counter.count, 1))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_feedback_effect(effects);
                assertions::assert_no_storage_effect(effects);
            })
            .run();
    }

    #[test]
    fn decrement_at_zero_stays_zero_and_still_pulses() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .when_action(TallyAction::Decrement)
            .then_state(|state| assert_eq!(state.counter.count, 0))
            .then_effects(assertions::assert_has_feedback_effect)
            .run();
    }

    #[test]
    fn step_input_is_lenient() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .given_action(TallyAction::SetIncrementStep {
                input: "abc".to_string(),
            })
            .when_action(TallyAction::IncrementByStep)
            .then_state(|state| {
                assert_eq!(state.counter.increment_step, 0);
                assert_eq!(state.counter.count, 0);
            })
            .then_effects(assertions::assert_has_feedback_effect)
            .run();
    }

    #[test]
    fn finish_at_zero_does_nothing() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .given_action(TallyAction::SetDraftName {
                name: "   ".to_string(),
            })
            .when_action(TallyAction::FinishSession)
            .then_state(|state| {
                assert!(state.history.is_empty());
                assert_eq!(state.counter.draft_name, "   ");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn finish_archives_and_persists() {
        let mut initial = TallyState::default();
        initial.counter.count = 7;
        initial.counter.draft_name = "Pushups".to_string();

        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(initial)
            .when_action(TallyAction::FinishSession)
            .then_state(|state| {
                assert_eq!(state.counter.count, 0);
                assert!(state.counter.draft_name.is_empty());
                let entry = &state.history.entries()[0];
                assert_eq!(entry.name, "Pushups");
                assert_eq!(entry.count, 7);
                assert_eq!(entry.id, SessionId::new(1_735_689_600_000));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_feedback_effect(effects);
                assert_eq!(
                    assertions::stored_value(effects),
                    r#"[{"id":1735689600000,"name":"Pushups","count":7,"date":"2025-01-01T00:00:00.000Z"}]"#
                );
            })
            .run();
    }

    #[test]
    fn finish_uses_configured_placeholder() {
        let environment = env().with_settings(TallySettings {
            placeholder_name: "Set".to_string(),
            ..TallySettings::default()
        });
        let mut initial = TallyState::default();
        initial.counter.count = 1;

        ReducerTest::new(TallyReducer::new())
            .with_env(environment)
            .given_state(initial)
            .when_action(TallyAction::FinishSession)
            .then_state(|state| assert_eq!(state.history.entries()[0].name, "Set"))
            .run();
    }

    #[test]
    fn delete_unknown_id_is_silent() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(with_history(vec![entry(1, "A", 1)]))
            .when_action(TallyAction::DeleteEntry {
                id: SessionId::new(2),
            })
            .then_state(|state| assert_eq!(state.history.len(), 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn delete_persists_remaining_entries() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(with_history(vec![entry(2, "B", 2), entry(1, "A", 1)]))
            .when_action(TallyAction::DeleteEntry {
                id: SessionId::new(2),
            })
            .then_state(|state| assert_eq!(state.history.entries()[0].name, "A"))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_storage_effect(effects);
                assert!(assertions::stored_value(effects).contains(r#""name":"A""#));
            })
            .run();
    }

    #[test]
    fn clear_raises_notice_and_schedules_expiry() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(with_history(vec![entry(1, "A", 1)]))
            .when_action(TallyAction::ClearHistory)
            .then_state(|state| {
                assert!(state.history.is_empty());
                assert!(state.cleared_notice);
                assert_eq!(state.notice_generation, 1);
            })
            .then_effects(|effects| {
                assertions::assert_has_storage_effect(effects);
                assertions::assert_has_delay_effect(effects);
                assert_eq!(assertions::stored_value(effects), "[]");
                assert!(matches!(
                    effects.last(),
                    Some(Effect::Delay { duration, action })
                        if *duration == Duration::from_secs(2)
                        && **action == TallyAction::ClearedNoticeExpired { generation: 1 }
                ));
            })
            .run();
    }

    #[test]
    fn clear_on_empty_history_is_silent() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .when_action(TallyAction::ClearHistory)
            .then_state(|state| assert!(!state.cleared_notice))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn stale_expiry_keeps_newer_notice() {
        let state = TallyState {
            cleared_notice: true,
            notice_generation: 2,
            ..TallyState::default()
        };

        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(state)
            .given_action(TallyAction::ClearedNoticeExpired { generation: 1 })
            .when_action(TallyAction::ShowView(View::History))
            .then_state(|state| {
                assert!(state.cleared_notice);
                assert_eq!(state.view, View::History);
            })
            .run();
    }

    #[test]
    fn persist_outcome_tracks_last_error() {
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(TallyState::default())
            .when_action(TallyAction::PersistFailed {
                error: "quota exceeded".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.last_persist_error.as_deref(), Some("quota exceeded"));
            })
            .run();

        let failed = TallyState {
            last_persist_error: Some("quota exceeded".to_string()),
            ..TallyState::default()
        };
        ReducerTest::new(TallyReducer::new())
            .with_env(env())
            .given_state(failed)
            .when_action(TallyAction::PersistSucceeded)
            .then_state(|state| assert!(state.last_persist_error.is_none()))
            .run();
    }
}
