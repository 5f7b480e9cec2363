//! Read-only projections of [`TallyState`] for rendering.
//!
//! Nothing here mutates state. A front end picks a time zone, calls
//! [`Screen::project`] after each dispatch and draws the result; the
//! [`Display`](std::fmt::Display) impls are the plain-text rendering used by
//! the bundled binary.

use crate::reducer::TallyState;
use crate::types::{SessionEntry, SessionId};
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in an empty history right after it was cleared
pub const CLEARED_MESSAGE: &str = "History cleared!";

/// Shown in an empty history otherwise
pub const EMPTY_MESSAGE: &str = "No counters logged yet.";

/// Hint under the empty-history message
pub const EMPTY_HINT: &str = "Finish a counter on the counter screen to see it here.";

/// Which screen is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Live counter
    #[default]
    Counter,
    /// Archived sessions
    History,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::History => f.write_str("history"),
        }
    }
}

/// What the counter screen shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterView {
    /// Current count
    pub count: i64,
    /// Custom step, also the label of the step button
    pub increment_step: i64,
    /// Working title
    pub draft_name: String,
    /// Whether the finish button is enabled
    pub can_finish: bool,
    /// Most recent save failure, if not yet recovered
    pub persist_error: Option<String>,
}

impl CounterView {
    /// Projects the counter screen
    #[must_use]
    pub fn project(state: &TallyState) -> Self {
        Self {
            count: state.counter.count,
            increment_step: state.counter.increment_step,
            draft_name: state.counter.draft_name.clone(),
            can_finish: state.counter.can_finish(),
            persist_error: state.last_persist_error.clone(),
        }
    }
}

/// One line of the history screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    /// Target for a delete intent
    pub id: SessionId,
    /// Session name
    pub name: String,
    /// Final count
    pub count: i64,
    /// Local calendar date, e.g. `Oct 19, 2026`
    pub date_label: String,
}

impl HistoryRow {
    /// Projects one entry, dating it in `tz`
    #[must_use]
    pub fn project<Tz>(entry: &SessionEntry, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            count: entry.count,
            date_label: entry
                .created_at
                .with_timezone(tz)
                .format("%b %-d, %Y")
                .to_string(),
        }
    }
}

/// What the history screen shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryView {
    /// Sessions, newest first
    pub rows: Vec<HistoryRow>,
    /// Whether the clear button is enabled
    pub can_clear: bool,
    /// Message for an empty list; `None` when there are rows
    pub empty_message: Option<&'static str>,
}

impl HistoryView {
    /// Projects the history screen
    #[must_use]
    pub fn project<Tz>(state: &TallyState, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let rows: Vec<_> = state
            .history
            .entries()
            .iter()
            .map(|entry| HistoryRow::project(entry, tz))
            .collect();

        let empty_message = match (rows.is_empty(), state.cleared_notice) {
            (false, _) => None,
            (true, true) => Some(CLEARED_MESSAGE),
            (true, false) => Some(EMPTY_MESSAGE),
        };

        Self {
            can_clear: !rows.is_empty(),
            rows,
            empty_message,
        }
    }
}

/// The active screen, ready to draw
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Counter screen
    Counter(CounterView),
    /// History screen
    History(HistoryView),
}

impl Screen {
    /// Projects whichever screen `state.view` selects
    #[must_use]
    pub fn project<Tz>(state: &TallyState, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match state.view {
            View::Counter => Self::Counter(CounterView::project(state)),
            View::History => Self::History(HistoryView::project(state, tz)),
        }
    }
}

impl fmt::Display for CounterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TAP COUNTER")?;
        writeln!(f)?;
        writeln!(f, "    {}", self.count)?;
        writeln!(f)?;
        let name = if self.draft_name.is_empty() {
            "(unnamed)"
        } else {
            &self.draft_name
        };
        writeln!(f, "name: {name}")?;
        writeln!(f, "step: {:+}", self.increment_step)?;
        if !self.can_finish {
            writeln!(f, "(count something to finish)")?;
        }
        if let Some(error) = &self.persist_error {
            writeln!(f, "! history not saved: {error}")?;
        }
        Ok(())
    }
}

impl fmt::Display for HistoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HISTORY")?;
        writeln!(f)?;
        if let Some(message) = self.empty_message {
            writeln!(f, "{message}")?;
            return writeln!(f, "{EMPTY_HINT}");
        }
        for row in &self.rows {
            writeln!(
                f,
                "{:>15}  {:<24} {:>6}  {}",
                row.id, row.name, row.count, row.date_label
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter(view) => view.fmt(f),
            Self::History(view) => view.fmt(f),
        }
    }
}
