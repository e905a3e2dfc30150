//! Settings management
//!
//! Settings are JSON. Every field has a default, so a file only needs the
//! values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tandem_core::SchedulerConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timing: TimingSettings,
    pub window: WindowSettings,
    pub input: InputSettings,
}

/// Frame loop timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub fixed_interval_ms: f64,
    /// 0 renders as fast as the loop spins.
    pub render_interval_ms: f64,
    pub max_fixed_steps: u32,
    pub upload_budget_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub mouse_sensitivity: f32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            fixed_interval_ms: defaults.fixed_interval.as_secs_f64() * 1000.0,
            render_interval_ms: defaults.render_interval.as_secs_f64() * 1000.0,
            max_fixed_steps: defaults.max_fixed_steps,
            upload_budget_ms: defaults.upload_budget.as_secs_f64() * 1000.0,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Tandem".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
        }
    }
}

impl TimingSettings {
    /// Convert to the scheduler's config. Negative or non-finite values
    /// become zero; the scheduler clamps what it cannot use.
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            fixed_interval: millis(self.fixed_interval_ms),
            render_interval: millis(self.render_interval_ms),
            max_fixed_steps: self.max_fixed_steps,
            upload_budget: millis(self.upload_budget_ms),
        }
    }
}

fn millis(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::ZERO)
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// [`load`](Self::load), falling back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(%err, "using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = Settings::from_json_str(
            r#"{ "timing": { "fixed_interval_ms": 10.0 }, "input": { "mouse_sensitivity": 0.5 } }"#,
        )
        .unwrap();

        assert_eq!(settings.timing.fixed_interval_ms, 10.0);
        assert_eq!(settings.timing.max_fixed_steps, 5);
        assert_eq!(settings.input.mouse_sensitivity, 0.5);
        assert_eq!(settings.window, WindowSettings::default());

        let config = settings.timing.to_scheduler_config();
        assert_eq!(config.fixed_interval, Duration::from_millis(10));
        assert_eq!(config.upload_budget, Duration::from_millis(2));
    }

    #[test]
    fn json_round_trip() {
        let mut settings = Settings::default();
        settings.window.title = "Round trip".into();
        let json = settings.to_json_string().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn bad_input_is_an_error_not_a_panic() {
        assert!(matches!(Settings::from_json_str("{ nope"), Err(SettingsError::Parse(_))));
        assert!(matches!(
            Settings::load("no/such/settings.json"),
            Err(SettingsError::Io { .. })
        ));
        assert_eq!(Settings::load_or_default("no/such/settings.json"), Settings::default());
    }

    #[test]
    fn negative_intervals_become_zero() {
        let timing = TimingSettings {
            render_interval_ms: -5.0,
            ..TimingSettings::default()
        };
        assert_eq!(timing.to_scheduler_config().render_interval, Duration::ZERO);
    }
}
