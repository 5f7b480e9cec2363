//! The live counter.
//!
//! Holds the running count, the custom increment step and the working title
//! of the session in progress. Every method is a pure state change; the
//! reducer decides which effects follow.
//!
//! Two floors apply differently on purpose: [`CounterState::decrement`] never
//! goes below zero, while [`CounterState::increment_by_step`] with a negative
//! step may.

use crate::types::{SessionEntry, SessionId};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Step used by the custom increment until the user picks another one
pub const DEFAULT_INCREMENT_STEP: i64 = 5;

/// Name given to sessions finished with a blank draft name
pub const UNTITLED_SESSION: &str = "Untitled Counter";

/// Counter state for the session in progress
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Current count
    pub count: i64,
    /// Amount added by the custom increment, any sign
    pub increment_step: i64,
    /// Working title, committed on finish
    pub draft_name: String,
}

impl Default for CounterState {
    fn default() -> Self {
        Self::new(DEFAULT_INCREMENT_STEP)
    }
}

impl CounterState {
    /// Creates a zeroed counter with the given custom step
    #[must_use]
    pub const fn new(increment_step: i64) -> Self {
        Self {
            count: 0,
            increment_step,
            draft_name: String::new(),
        }
    }

    /// Adds one
    pub const fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Subtracts one, stopping at zero
    pub fn decrement(&mut self) {
        self.count = self.count.saturating_sub(1).max(0);
    }

    /// Sets the count back to zero; step and draft name are kept
    pub const fn reset(&mut self) {
        self.count = 0;
    }

    /// Sets the custom step from raw user input
    ///
    /// See [`parse_step`] for how the input is read.
    pub fn set_increment_step(&mut self, raw: &str) {
        self.increment_step = parse_step(raw);
    }

    /// Adds the custom step, which may be zero or negative
    pub const fn increment_by_step(&mut self) {
        self.count = self.count.saturating_add(self.increment_step);
    }

    /// Replaces the draft name
    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.draft_name = name.into();
    }

    /// Whether there is anything to archive
    ///
    /// Only an exact zero is refused; a count driven below zero by a
    /// negative step is archived as-is.
    #[must_use]
    pub const fn can_finish(&self) -> bool {
        self.count != 0
    }

    /// Archives the session in progress
    ///
    /// Returns `None` and leaves the counter untouched when there is nothing
    /// to archive. Otherwise returns the finished entry, resets the count and
    /// clears the draft name. The timestamp is kept to millisecond precision
    /// so the entry survives a storage round trip unchanged.
    pub fn finish(
        &mut self,
        id: SessionId,
        now: DateTime<Utc>,
        placeholder: &str,
    ) -> Option<SessionEntry> {
        if !self.can_finish() {
            return None;
        }

        let name = match self.draft_name.trim() {
            "" => placeholder.to_string(),
            trimmed => trimmed.to_string(),
        };

        let entry = SessionEntry {
            id,
            name,
            count: self.count,
            created_at: now.trunc_subsecs(3),
        };

        self.count = 0;
        self.draft_name.clear();
        Some(entry)
    }
}

/// Reads an increment step the way a permissive numeric field would.
///
/// Leading whitespace and one optional sign are accepted, then as many
/// decimal digits as follow. Anything after the digits is ignored. Input
/// without leading digits reads as `0`; values beyond `i64` saturate.
///
/// ```
/// use tally::counter::parse_step;
///
/// assert_eq!(parse_step("10"), 10);
/// assert_eq!(parse_step("  -3 reps"), -3);
/// assert_eq!(parse_step("abc"), 0);
/// assert_eq!(parse_step(""), 0);
/// ```
#[must_use]
pub fn parse_step(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            let digit = i64::from(digit - b'0');
            if negative {
                acc.saturating_mul(10).saturating_sub(digit)
            } else {
                acc.saturating_mul(10).saturating_add(digit)
            }
        })
}
