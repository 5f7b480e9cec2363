//! # Tally Testing
//!
//! Testing utilities and helpers for the tally reducer architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use tally_testing::{test_clock, InMemorySlotStore, RecordingFeedback};
//! use tally_runtime::Store;
//!
//! #[tokio::test]
//! async fn finishing_a_session() {
//!     let env = test_environment();
//!     let store = Store::new(TallyState::default(), TallyReducer::new(), env);
//!
//!     store.send(TallyAction::Increment).await?;
//!     store.send(TallyAction::FinishSession).await?;
//!
//!     let history = store.state(|s| s.history.len()).await;
//!     assert_eq!(history, 1);
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tally_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Mutex, Utc};
    use tally_core::feedback::FeedbackSignal;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_testing::mocks::FixedClock;
    /// use tally_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// # Example
    ///
    /// ```
    /// use tally_testing::mocks::ManualClock;
    /// use tally_testing::test_clock;
    /// use tally_core::environment::Clock;
    /// use chrono::Duration;
    ///
    /// let clock = ManualClock::new(test_clock().now());
    /// let start = clock.now();
    /// clock.advance(Duration::milliseconds(250));
    /// assert_eq!(clock.now() - start, Duration::milliseconds(250));
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::unwrap_used)]
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Feedback signal that counts pulses instead of emitting them
    #[derive(Debug, Default)]
    pub struct RecordingFeedback {
        pulses: Mutex<Vec<std::time::Duration>>,
    }

    impl RecordingFeedback {
        /// Create a recorder with no pulses
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of pulses emitted so far
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn count(&self) -> usize {
            self.pulses.lock().unwrap().len()
        }

        /// Durations of every pulse, oldest first
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn pulses(&self) -> Vec<std::time::Duration> {
            self.pulses.lock().unwrap().clone()
        }
    }

    impl FeedbackSignal for RecordingFeedback {
        #[allow(clippy::unwrap_used)]
        fn pulse(&self, duration: std::time::Duration) {
            self.pulses.lock().unwrap().push(duration);
        }
    }
}


/// In-memory slot store
pub mod slot_mocks;

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, RecordingFeedback, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use slot_mocks::InMemorySlotStore;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::feedback::FeedbackSignal;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_recording_feedback() {
        let feedback = RecordingFeedback::new();
        feedback.pulse(std::time::Duration::from_millis(50));
        feedback.pulse(std::time::Duration::from_millis(20));

        assert_eq!(feedback.count(), 2);
        assert_eq!(feedback.pulses()[1], std::time::Duration::from_millis(20));
    }
}
