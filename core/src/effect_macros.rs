//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect::Storage` and
//! `Effect::Feedback` values inside reducers.

/// Create an `Effect::Storage` writing `value` to `key`
///
/// # Example
///
/// ```rust,ignore
/// use tally_core::write_slot;
///
/// write_slot! {
///     store: env.store,
///     key: "workoutHistory",
///     value: encoded,
///     on_success: || Some(TallyAction::PersistSucceeded),
///     on_error: |error| Some(TallyAction::PersistFailed { error: error.to_string() })
/// }
/// ```
#[macro_export]
macro_rules! write_slot {
    (
        store: $store:expr,
        key: $key:expr,
        value: $value:expr,
        on_success: || $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Storage($crate::storage::SlotWrite {
            store: ::std::sync::Arc::clone(&$store),
            key: ::std::string::ToString::to_string(&$key),
            value: $value,
            on_success: ::std::boxed::Box::new(move || $success_body),
            on_error: ::std::boxed::Box::new(move |$error_param| $error_body),
        })
    };
}

/// Create an `Effect::Feedback` pulse
///
/// # Example
///
/// ```rust,ignore
/// use tally_core::pulse;
///
/// pulse!(env.feedback, Duration::from_millis(50))
/// ```
#[macro_export]
macro_rules! pulse {
    ($signal:expr, $duration:expr) => {
        $crate::effect::Effect::Feedback($crate::feedback::FeedbackPulse::new(
            ::std::sync::Arc::clone(&$signal),
            $duration,
        ))
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use crate::feedback::{FeedbackSignal, NoFeedback};
    use crate::storage::{SlotStore, StorageError};
    use std::sync::Arc;
    use std::time::Duration;

    struct NullStore;

    impl SlotStore for NullStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn write_slot_builds_storage_effect() {
        let store: Arc<dyn SlotStore> = Arc::new(NullStore);
        let effect: Effect<u8> = write_slot! {
            store: store,
            key: "history",
            value: "[]".to_string(),
            on_success: || Some(1),
            on_error: |_error| Some(2)
        };

        let Effect::Storage(write) = effect else {
            unreachable!("expected a storage effect");
        };
        assert_eq!(write.key, "history");
        assert_eq!(write.value, "[]");
        assert_eq!(write.execute(), Some(1));
    }

    #[test]
    fn pulse_builds_feedback_effect() {
        let signal: Arc<dyn FeedbackSignal> = Arc::new(NoFeedback);
        let effect: Effect<()> = pulse!(signal, Duration::from_millis(50));

        assert!(matches!(
            effect,
            Effect::Feedback(ref p) if p.duration == Duration::from_millis(50)
        ));
    }
}
