//! User feedback signals.
//!
//! Tapping the counter produces a short physical or audible pulse. The core
//! only asks for one; whether a device exists and whether the pulse actually
//! happened is never observed.

use std::sync::Arc;
use std::time::Duration;

/// Something that can emit a short feedback pulse.
///
/// Implementations must return promptly and swallow their own failures.
pub trait FeedbackSignal: Send + Sync {
    /// Emit a pulse lasting roughly `duration`.
    fn pulse(&self, duration: Duration);
}

/// Feedback signal that does nothing, for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl FeedbackSignal for NoFeedback {
    fn pulse(&self, _duration: Duration) {}
}

/// A pulse request carried by [`Effect::Feedback`](crate::effect::Effect::Feedback).
#[derive(Clone)]
pub struct FeedbackPulse {
    /// Device to pulse
    pub signal: Arc<dyn FeedbackSignal>,
    /// Pulse length
    pub duration: Duration,
}

impl FeedbackPulse {
    /// Create a pulse request for `signal`
    #[must_use]
    pub fn new(signal: Arc<dyn FeedbackSignal>, duration: Duration) -> Self {
        Self { signal, duration }
    }

    /// Fire the pulse
    pub fn fire(self) {
        self.signal.pulse(self.duration);
    }
}

impl std::fmt::Debug for FeedbackPulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackPulse")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
