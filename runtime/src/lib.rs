//! # Tally Runtime
//!
//! Runtime implementation for the tally reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, serializes dispatch and executes effects
//! - **Effect Executor**: Runs local effects inline, spawns delayed and async ones
//! - **Event Loop**: Manages the action → reducer → effects → action feedback loop
//!
//! ## Dispatch model
//!
//! One call to [`Store::send`] is one turn. The turn holds the dispatch lock
//! while it reduces the action, performs every `Storage` and `Feedback`
//! effect, and reduces any actions those effects feed back. Only then can the
//! next intent start. `Delay` and `Future` effects run on spawned tasks and
//! come back through `send` as their own turn.
//!
//! ## Example
//!
//! ```ignore
//! use tally_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tally_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{Mutex, Notify, RwLock};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Effects kept feeding actions back within a single turn
        ///
        /// The state changes already applied in the turn are kept; the
        /// remaining queued actions are dropped.
        #[error("More than {0} actions were fed back while processing one action")]
        FeedbackLimitExceeded(usize),
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use tally_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_max_feedback_actions(8);
/// assert_eq!(config.max_feedback_actions, 8);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of actions reduced in one turn, including the intent itself
    pub max_feedback_actions: usize,
}

impl StoreConfig {
    /// Set the per-turn action limit
    #[must_use]
    pub const fn with_max_feedback_actions(mut self, limit: usize) -> Self {
        self.max_feedback_actions = limit;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_feedback_actions: 32,
        }
    }
}

/// Guard that decrements the pending-effect counter on drop
///
/// Wakes `settle()` callers when the last background effect finishes,
/// even if the effect panicked.
struct PendingGuard {
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicUsize, Effect, Future, Mutex, Notify, Ordering, PendingGuard, Reducer,
        RwLock, StoreConfig, StoreError, VecDeque,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for projection reads)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a `Store` is cheap and yields a handle to the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: StoreConfig,
        /// Held for a whole turn so two intents never interleave.
        dispatch: Arc<Mutex<()>>,
        pending_effects: Arc<AtomicUsize>,
        idle: Arc<Notify>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: self.config.clone(),
                dispatch: Arc::clone(&self.dispatch),
                pending_effects: Arc::clone(&self.pending_effects),
                idle: Arc::clone(&self.idle),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (business logic)
        /// - `environment`: Injected dependencies
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config,
                dispatch: Arc::new(Mutex::new(())),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                idle: Arc::new(Notify::new()),
            }
        }

        /// Send an action to the store
        ///
        /// Reduces the action, executes its local effects, and reduces any
        /// actions those effects produce, all before returning. Background
        /// effects (`Delay`, `Future`) are spawned and tracked for
        /// [`Store::settle`].
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::FeedbackLimitExceeded`] if the turn reduces
        /// more actions than [`StoreConfig::max_feedback_actions`].
        ///
        /// # Example
        ///
        /// ```ignore
        /// store.send(TallyAction::Increment).await?;
        /// ```
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            let _turn = self.dispatch.lock().await;
            tracing::debug!("Processing action");

            let mut queue = VecDeque::from([action]);
            let mut reduced = 0usize;

            while let Some(action) = queue.pop_front() {
                reduced += 1;
                if reduced > self.config.max_feedback_actions {
                    tracing::warn!(
                        limit = self.config.max_feedback_actions,
                        dropped = queue.len() + 1,
                        "Feedback limit exceeded, dropping queued actions"
                    );
                    return Err(StoreError::FeedbackLimitExceeded(self.config.max_feedback_actions));
                }

                metrics::counter!("store.commands.total").increment(1);

                let effects = {
                    let mut state = self.state.write().await;
                    tracing::trace!("Acquired write lock on state");

                    let span = tracing::debug_span!("reducer_execution");
                    let _enter = span.enter();
                    self.reducer.reduce(&mut *state, action, &*self.environment)
                };

                tracing::trace!("Executing {} effects", effects.len());
                for effect in effects {
                    self.execute_effect(effect, &mut queue);
                }
            }

            tracing::debug!(reduced, "Action processing completed");
            Ok(())
        }

        /// Read a projection of the current state
        ///
        /// # Example
        ///
        /// ```ignore
        /// let count = store.state(|s| s.counter.count).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Number of background effects still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Wait until every spawned effect, and anything it spawned, has finished
        pub async fn settle(&self) {
            loop {
                let notified = self.idle.notified();
                if self.pending_effects.load(Ordering::SeqCst) == 0 {
                    return;
                }
                notified.await;
            }
        }

        /// Execute one effect description
        ///
        /// Local effects run inline; actions they produce are queued for the
        /// current turn.
        fn execute_effect(&self, effect: Effect<A>, queue: &mut VecDeque<A>) {
            metrics::counter!("store.effects.executed", "type" => effect.kind()).increment(1);

            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    for effect in effects {
                        self.execute_effect(effect, queue);
                    }
                },
                Effect::Sequential(effects) => {
                    tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                    self.execute_sequential(effects, queue);
                },
                Effect::Storage(write) => {
                    tracing::trace!(key = %write.key, "Executing Effect::Storage");
                    if let Some(action) = write.execute() {
                        queue.push_back(action);
                    }
                },
                Effect::Feedback(pulse) => {
                    tracing::trace!("Executing Effect::Feedback");
                    pulse.fire();
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    self.spawn_effect(async move {
                        tokio::time::sleep(duration).await;
                        Some(*action)
                    });
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    self.spawn_effect(fut);
                },
            }
        }

        /// Local children run inline in order; `Delay` and `Future` children
        /// run one after another on a single background task.
        fn execute_sequential(&self, effects: Vec<Effect<A>>, queue: &mut VecDeque<A>) {
            let mut background = Vec::new();
            for effect in effects {
                match effect {
                    Effect::Delay { .. } | Effect::Future(_) => background.push(effect),
                    local => self.execute_effect(local, queue),
                }
            }

            if background.is_empty() {
                return;
            }

            self.track_pending();
            let guard = self.pending_guard();
            let store = self.clone();

            tokio::spawn(async move {
                let _guard = guard;
                for effect in background {
                    let produced = match effect {
                        Effect::Delay { duration, action } => {
                            tokio::time::sleep(duration).await;
                            Some(*action)
                        },
                        Effect::Future(fut) => fut.await,
                        _ => None,
                    };
                    if let Some(action) = produced {
                        store.feed_back(action).await;
                    }
                }
                tracing::trace!("Effect::Sequential completed");
            });
        }

        fn spawn_effect<F>(&self, fut: F)
        where
            F: Future<Output = Option<A>> + Send + 'static,
        {
            self.track_pending();
            let guard = self.pending_guard();
            let store = self.clone();

            tokio::spawn(async move {
                let _guard = guard;
                if let Some(action) = fut.await {
                    tracing::trace!("Background effect produced an action, sending to store");
                    store.feed_back(action).await;
                } else {
                    tracing::trace!("Background effect completed with no action");
                }
            });
        }

        async fn feed_back(&self, action: A) {
            if let Err(error) = self.send(action).await {
                tracing::warn!(%error, "Fed-back action failed");
            }
        }

        fn track_pending(&self) {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
        }

        fn pending_guard(&self) -> PendingGuard {
            PendingGuard {
                pending: Arc::clone(&self.pending_effects),
                idle: Arc::clone(&self.idle),
            }
        }
    }
}

pub use store::Store;
