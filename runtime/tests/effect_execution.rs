//! Integration tests for Store effect execution
//!
//! Covers the local effects (`Storage`, `Feedback`) that complete inside
//! `send`, the feedback loop they drive, and its per-turn limit.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/panic

use std::sync::Arc;
use std::time::Duration;
use tally_core::effect::Effect;
use tally_core::feedback::FeedbackSignal;
use tally_core::storage::SlotStore;
use tally_core::{SmallVec, pulse, reducer::Reducer, smallvec, write_slot};
use tally_runtime::{Store, StoreConfig, StoreError};
use tally_testing::{InMemorySlotStore, RecordingFeedback};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Bump the counter and store it
    Save,
    /// Store write succeeded
    Saved,
    /// Store write failed
    SaveFailed { error: String },
    /// Write that feeds itself back forever
    Echo,
    /// Pulse now, record later
    PulseThenLater,
    /// Delayed follow-up
    Later,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    value: u32,
    saved: u32,
    errors: Vec<String>,
    echoes: u32,
    later: u32,
}

struct TestEnvironment {
    slots: Arc<dyn SlotStore>,
    feedback: Arc<dyn FeedbackSignal>,
}

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Save => {
                state.value += 1;
                smallvec![write_slot! {
                    store: env.slots,
                    key: "value",
                    value: state.value.to_string(),
                    on_success: || Some(TestAction::Saved),
                    on_error: |error| Some(TestAction::SaveFailed { error: error.to_string() })
                }]
            },
            TestAction::Saved => {
                state.saved += 1;
                SmallVec::new()
            },
            TestAction::SaveFailed { error } => {
                state.errors.push(error);
                SmallVec::new()
            },
            TestAction::Echo => {
                state.echoes += 1;
                smallvec![write_slot! {
                    store: env.slots,
                    key: "echo",
                    value: state.echoes.to_string(),
                    on_success: || Some(TestAction::Echo),
                    on_error: |_error| None
                }]
            },
            TestAction::PulseThenLater => smallvec![Effect::chain(vec![
                pulse!(env.feedback, Duration::from_millis(50)),
                Effect::Delay {
                    duration: Duration::from_secs(1),
                    action: Box::new(TestAction::Later),
                },
            ])],
            TestAction::Later => {
                state.later += 1;
                SmallVec::new()
            },
        }
    }
}

fn setup() -> (
    Store<TestState, TestAction, TestEnvironment, TestReducer>,
    Arc<InMemorySlotStore>,
    Arc<RecordingFeedback>,
) {
    setup_with(StoreConfig::default())
}

fn setup_with(
    config: StoreConfig,
) -> (
    Store<TestState, TestAction, TestEnvironment, TestReducer>,
    Arc<InMemorySlotStore>,
    Arc<RecordingFeedback>,
) {
    let slots = Arc::new(InMemorySlotStore::new());
    let feedback = Arc::new(RecordingFeedback::new());
    let env = TestEnvironment {
        slots: Arc::clone(&slots) as Arc<dyn SlotStore>,
        feedback: Arc::clone(&feedback) as Arc<dyn FeedbackSignal>,
    };
    let store = Store::with_config(TestState::default(), TestReducer, env, config);
    (store, slots, feedback)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn storage_completes_before_send_returns() {
    let (store, slots, _) = setup();

    store.send(TestAction::Save).await.unwrap();

    assert_eq!(slots.get("value").as_deref(), Some("1"));
    assert_eq!(store.state(|s| s.saved).await, 1);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test]
async fn storage_failure_is_fed_back() {
    let (store, slots, _) = setup();
    slots.fail_writes(true);

    store.send(TestAction::Save).await.unwrap();

    let (value, saved, errors) = store
        .state(|s| (s.value, s.saved, s.errors.clone()))
        .await;
    assert_eq!(value, 1);
    assert_eq!(saved, 0);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("quota exceeded"));
    assert_eq!(slots.get("value"), None);
}

#[tokio::test]
async fn runaway_feedback_is_cut_off() {
    let (store, _, _) = setup();

    let result = store.send(TestAction::Echo).await;

    assert_eq!(result, Err(StoreError::FeedbackLimitExceeded(32)));
    assert_eq!(store.state(|s| s.echoes).await, 32);

    // the store is still usable afterwards
    store.send(TestAction::Save).await.unwrap();
    assert_eq!(store.state(|s| s.saved).await, 1);
}

#[tokio::test]
async fn feedback_limit_is_configurable() {
    let (store, slots, _) = setup_with(StoreConfig::default().with_max_feedback_actions(3));

    let result = store.send(TestAction::Echo).await;

    assert_eq!(result, Err(StoreError::FeedbackLimitExceeded(3)));
    assert_eq!(slots.get("echo").as_deref(), Some("3"));
}

#[tokio::test(start_paused = true)]
async fn sequential_runs_local_effects_inline() {
    let (store, _, feedback) = setup();

    store.send(TestAction::PulseThenLater).await.unwrap();
    assert_eq!(feedback.count(), 1);
    assert_eq!(store.state(|s| s.later).await, 0);
    assert_eq!(store.pending_effects(), 1);

    store.settle().await;
    assert_eq!(store.state(|s| s.later).await, 1);
}

#[tokio::test]
async fn concurrent_sends_are_serialized() {
    let (store, slots, _) = setup();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.send(TestAction::Save).await })
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            panic!("concurrent save task panicked: {e}");
        }
    }

    assert_eq!(store.state(|s| (s.value, s.saved)).await, (10, 10));
    assert_eq!(slots.get("value").as_deref(), Some("10"));
    assert_eq!(slots.write_count(), 10);
}
