//! Settings sections and their compiled defaults.

use serde::{Deserialize, Serialize};

/// Classifier tunables applied to every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Base key center name ("C", "Eb", "F#", ...).
    /// Default: C
    #[serde(default = "EngineSettings::default_base_key")]
    pub base_key: String,

    /// Show the V/ii and ii/vi bonus labels.
    /// Default: true
    #[serde(default = "EngineSettings::default_bonus_wedges")]
    pub bonus_wedges: bool,

    /// Minimum dwell before a changed function is lit.
    /// Default: 220
    #[serde(default = "EngineSettings::default_hysteresis_ms")]
    pub hysteresis_ms: u64,

    /// Window holding all taps of a triple-tap gesture.
    /// Default: 1500
    #[serde(default = "EngineSettings::default_tap_window_ms")]
    pub tap_window_ms: u64,

    /// Largest gap between consecutive taps.
    /// Default: 500
    #[serde(default = "EngineSettings::default_tap_max_gap_ms")]
    pub tap_max_gap_ms: u64,

    /// Keep the lit function when a triad grows into its seventh.
    /// Default: true
    #[serde(default = "EngineSettings::default_extension_merge")]
    pub extension_merge: bool,
}

impl EngineSettings {
    fn default_base_key() -> String {
        "C".to_string()
    }

    fn default_bonus_wedges() -> bool {
        true
    }

    fn default_hysteresis_ms() -> u64 {
        220
    }

    fn default_tap_window_ms() -> u64 {
        1500
    }

    fn default_tap_max_gap_ms() -> u64 {
        500
    }

    fn default_extension_merge() -> bool {
        true
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_key: Self::default_base_key(),
            bonus_wedges: Self::default_bonus_wedges(),
            hysteresis_ms: Self::default_hysteresis_ms(),
            tap_window_ms: Self::default_tap_window_ms(),
            tap_max_gap_ms: Self::default_tap_max_gap_ms(),
            extension_merge: Self::default_extension_merge(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `target=level` list).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
