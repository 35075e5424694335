//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, WheelConfig};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in load order (system, user, local), optionally
/// with a CLI override path. Only files that exist are returned.
///
/// A CLI path replaces the local override. It is returned even when
/// missing so that loading reports it instead of silently skipping it.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/keywheel/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("keywheel/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(expand_path(&path.to_string_lossy()));
        return files;
    }

    // Local override (current directory)
    let local = PathBuf::from("keywheel.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// One config file's contents. Only keys present in the file are set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub engine: EngineLayer,
    #[serde(default)]
    pub telemetry: TelemetryLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineLayer {
    pub base_key: Option<String>,
    pub bonus_wedges: Option<bool>,
    pub hysteresis_ms: Option<u64>,
    pub tap_window_ms: Option<u64>,
    pub tap_max_gap_ms: Option<u64>,
    pub extension_merge: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryLayer {
    pub log_level: Option<String>,
}

/// Load one layer from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse one layer from a TOML string.
pub fn parse_toml(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

/// Merge a layer onto `base`; keys present in `overlay` win.
pub fn merge_configs(base: WheelConfig, overlay: ConfigLayer) -> WheelConfig {
    let mut merged = base;
    let engine = overlay.engine;

    if let Some(v) = engine.base_key {
        merged.engine.base_key = v;
    }
    if let Some(v) = engine.bonus_wedges {
        merged.engine.bonus_wedges = v;
    }
    if let Some(v) = engine.hysteresis_ms {
        merged.engine.hysteresis_ms = v;
    }
    if let Some(v) = engine.tap_window_ms {
        merged.engine.tap_window_ms = v;
    }
    if let Some(v) = engine.tap_max_gap_ms {
        merged.engine.tap_max_gap_ms = v;
    }
    if let Some(v) = engine.extension_merge {
        merged.engine.extension_merge = v;
    }
    if let Some(v) = overlay.telemetry.log_level {
        merged.telemetry.log_level = v;
    }

    merged
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut WheelConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |name| env::var(name).ok())
}

/// Apply overrides read through `lookup`, which maps a variable name to
/// its value.
pub fn apply_overrides_from(
    config: &mut WheelConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("KEYWHEEL_BASE_KEY") {
        config.engine.base_key = v;
        sources.env_overrides.push("KEYWHEEL_BASE_KEY".to_string());
    }
    if let Some(v) = lookup("KEYWHEEL_BONUS_WEDGES") {
        config.engine.bonus_wedges = parse_flag("KEYWHEEL_BONUS_WEDGES", &v)?;
        sources.env_overrides.push("KEYWHEEL_BONUS_WEDGES".to_string());
    }
    if let Some(v) = lookup("KEYWHEEL_HYSTERESIS_MS") {
        config.engine.hysteresis_ms = parse_millis("KEYWHEEL_HYSTERESIS_MS", &v)?;
        sources.env_overrides.push("KEYWHEEL_HYSTERESIS_MS".to_string());
    }
    if let Some(v) = lookup("KEYWHEEL_TAP_WINDOW_MS") {
        config.engine.tap_window_ms = parse_millis("KEYWHEEL_TAP_WINDOW_MS", &v)?;
        sources.env_overrides.push("KEYWHEEL_TAP_WINDOW_MS".to_string());
    }
    if let Some(v) = lookup("KEYWHEEL_TAP_MAX_GAP_MS") {
        config.engine.tap_max_gap_ms = parse_millis("KEYWHEEL_TAP_MAX_GAP_MS", &v)?;
        sources.env_overrides.push("KEYWHEEL_TAP_MAX_GAP_MS".to_string());
    }
    if let Some(v) = lookup("KEYWHEEL_EXTENSION_MERGE") {
        config.engine.extension_merge = parse_flag("KEYWHEEL_EXTENSION_MERGE", &v)?;
        sources.env_overrides.push("KEYWHEEL_EXTENSION_MERGE".to_string());
    }

    if let Some(v) = lookup("KEYWHEEL_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("KEYWHEEL_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVar {
            var: var.to_string(),
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}

fn parse_millis(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVar {
        var: var.to_string(),
        value: value.to_string(),
        expected: "milliseconds as a non-negative integer",
    })
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
