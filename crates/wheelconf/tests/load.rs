use std::fs;

use tempfile::TempDir;
use wheelconf::{ConfigError, WheelConfig};

#[test]
fn explicit_config_file_is_loaded_last() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.toml");
    fs::write(
        &path,
        r#"
[engine]
base_key = "Bb"
hysteresis_ms = 180
"#,
    )
    .unwrap();

    let (config, sources) = WheelConfig::load_with_sources_from(Some(&path)).unwrap();
    assert_eq!(config.engine.base_key, "Bb");
    assert_eq!(config.engine.hysteresis_ms, 180);
    assert_eq!(sources.files.last(), Some(&path));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[engine\nbase_key = ").unwrap();

    match WheelConfig::load_from(Some(&path)) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn empty_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();

    let config = WheelConfig::load_from(Some(&path)).unwrap();
    assert_eq!(config.engine, wheelconf::EngineSettings::default());
}
