//! Configuration management for the tally binary.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that fail to parse fall back to their default.

use crate::counter::{DEFAULT_INCREMENT_STEP, UNTITLED_SESSION};
use crate::reducer::TallySettings;
use crate::repository::DEFAULT_HISTORY_KEY;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Directory holding the slot files (`TALLY_DATA_DIR`)
    pub data_dir: PathBuf,
    /// Slot key for the history (`TALLY_STORAGE_KEY`)
    pub storage_key: String,
    /// Custom step for a fresh counter (`TALLY_DEFAULT_STEP`)
    pub default_step: i64,
    /// How long the cleared notice stays up, in milliseconds (`TALLY_CLEARED_NOTICE_MS`)
    pub cleared_notice_ms: u64,
    /// Tap feedback length in milliseconds (`TALLY_FEEDBACK_MS`)
    pub feedback_ms: u64,
    /// Name for sessions finished without one (`TALLY_PLACEHOLDER_NAME`)
    pub placeholder_name: String,
    /// Default tracing filter when `RUST_LOG` is unset (`TALLY_LOG`)
    pub log_filter: String,
}

impl TallyConfig {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    ///
    /// # Example
    ///
    /// ```
    /// use tally::config::TallyConfig;
    ///
    /// let config = TallyConfig::from_lookup(|name| match name {
    ///     "TALLY_DEFAULT_STEP" => Some("10".to_string()),
    ///     "TALLY_FEEDBACK_MS" => Some("lots".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.default_step, 10);
    /// assert_eq!(config.feedback_ms, 50);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_dir: lookup("TALLY_DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map_or(defaults.data_dir, PathBuf::from),
            storage_key: lookup("TALLY_STORAGE_KEY")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.storage_key),
            default_step: lookup("TALLY_DEFAULT_STEP")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.default_step),
            cleared_notice_ms: lookup("TALLY_CLEARED_NOTICE_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.cleared_notice_ms),
            feedback_ms: lookup("TALLY_FEEDBACK_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.feedback_ms),
            placeholder_name: lookup("TALLY_PLACEHOLDER_NAME")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.placeholder_name),
            log_filter: lookup("TALLY_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Reducer settings derived from this configuration
    #[must_use]
    pub fn settings(&self) -> TallySettings {
        TallySettings {
            placeholder_name: self.placeholder_name.clone(),
            cleared_notice: Duration::from_millis(self.cleared_notice_ms),
            feedback_pulse: Duration::from_millis(self.feedback_ms),
        }
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        let data_dir = env::var_os("HOME")
            .map_or_else(|| PathBuf::from(".tally"), |home| PathBuf::from(home).join(".tally"));

        Self {
            data_dir,
            storage_key: DEFAULT_HISTORY_KEY.to_string(),
            default_step: DEFAULT_INCREMENT_STEP,
            cleared_notice_ms: 2000,
            feedback_ms: 50,
            placeholder_name: UNTITLED_SESSION.to_string(),
            log_filter: "tally=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryRepository, TallyState};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tally_core::storage::SlotStore;
    use tally_testing::InMemorySlotStore;

    fn config(vars: &[(&str, &str)]) -> TallyConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TallyConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config(&[]);
        assert_eq!(config.storage_key, "workoutHistory");
        assert_eq!(config.default_step, 5);
        assert_eq!(config.settings(), TallySettings::default());
        assert!(config.data_dir.ends_with(".tally"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config(&[
            ("TALLY_DATA_DIR", "/tmp/tally-data"),
            ("TALLY_STORAGE_KEY", "laps"),
            ("TALLY_DEFAULT_STEP", "-2"),
            ("TALLY_CLEARED_NOTICE_MS", "500"),
            ("TALLY_PLACEHOLDER_NAME", "  Set  "),
            ("TALLY_LOG", "tally=debug"),
        ]);

        assert_eq!(config.data_dir, PathBuf::from("/tmp/tally-data"));
        assert_eq!(config.storage_key, "laps");
        assert_eq!(config.default_step, -2);
        assert_eq!(config.log_filter, "tally=debug");

        let settings = config.settings();
        assert_eq!(settings.cleared_notice, Duration::from_millis(500));
        assert_eq!(settings.placeholder_name, "Set");
    }

    #[test]
    fn default_step_seeds_the_fresh_counter() {
        let config = config(&[("TALLY_DEFAULT_STEP", "-2")]);
        let slots: Arc<dyn SlotStore> = Arc::new(InMemorySlotStore::new());
        let repository = HistoryRepository::new(slots, config.storage_key.clone());

        let state = TallyState::hydrate(&repository, config.default_step);
        assert_eq!(state.counter.increment_step, -2);
        assert_eq!(state.counter.count, 0);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config(&[
            ("TALLY_DEFAULT_STEP", "five"),
            ("TALLY_CLEARED_NOTICE_MS", "-1"),
            ("TALLY_STORAGE_KEY", "   "),
            ("TALLY_PLACEHOLDER_NAME", ""),
        ]);

        assert_eq!(config.default_step, 5);
        assert_eq!(config.cleared_notice_ms, 2000);
        assert_eq!(config.storage_key, "workoutHistory");
        assert_eq!(config.placeholder_name, "Untitled Counter");
    }
}
