//! Configuration loading for the keywheel classifier.
//!
//! Values stay as plain strings and numbers here; the binary converts
//! them into the classifier's own types and reports bad values there.
//!
//! # Usage
//!
//! ```rust,no_run
//! use wheelconf::WheelConfig;
//!
//! let config = WheelConfig::load_from(None).expect("Failed to load config");
//! println!("Base key: {}", config.engine.base_key);
//! println!("Hysteresis: {}ms", config.engine.hysteresis_ms);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/keywheel/config.toml` (system)
//! 2. `~/.config/keywheel/config.toml` (user)
//! 3. `./keywheel.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`KEYWHEEL_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [engine]
//! base_key = "C"
//! bonus_wedges = true
//! hysteresis_ms = 220
//! tap_window_ms = 1500
//! tap_max_gap_ms = 500
//! extension_merge = true
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{EngineSettings, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value {value:?} for {var}: expected {expected}")]
    EnvVar {
        var: String,
        value: String,
        expected: &'static str,
    },
}

/// Complete keywheel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WheelConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl WheelConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/keywheel/config.toml`
    /// 3. `~/.config/keywheel/config.toml`
    /// 4. `./keywheel.toml`, or `config_path` when given
    /// 5. Environment variables
    ///
    /// An explicit `config_path` must exist.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = WheelConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let layer = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, layer);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# keywheel configuration\n\n");

        output.push_str("[engine]\n");
        output.push_str(&format!("base_key = \"{}\"\n", self.engine.base_key));
        output.push_str(&format!("bonus_wedges = {}\n", self.engine.bonus_wedges));
        output.push_str(&format!("hysteresis_ms = {}\n", self.engine.hysteresis_ms));
        output.push_str(&format!("tap_window_ms = {}\n", self.engine.tap_window_ms));
        output.push_str(&format!("tap_max_gap_ms = {}\n", self.engine.tap_max_gap_ms));
        output.push_str(&format!(
            "extension_merge = {}\n",
            self.engine.extension_merge
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
