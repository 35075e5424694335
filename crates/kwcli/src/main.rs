mod output;
mod script;
mod telemetry;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use keywheel::{EngineConfig, GestureTiming, HarmonyEngine, KeyCenter};
use tracing::{debug, info};
use wheelconf::{EngineSettings, WheelConfig};

use output::Printer;
use script::Action;

/// kwcli - replay timed note scripts through the harmonic classifier
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script of `<time_ms> [note ...]` lines; `-` or absent reads stdin
    script: Option<PathBuf>,

    /// Config file, replacing ./keywheel.toml
    #[arg(long, env = "KEYWHEEL_CONFIG")]
    config: Option<PathBuf>,

    /// Base key center (C, Eb, F#, ...)
    #[arg(short, long)]
    key: Option<String>,

    /// Hide the V/ii and ii/vi bonus labels
    #[arg(long)]
    no_bonus: bool,

    /// Minimum dwell before a changed function is lit
    #[arg(long)]
    hysteresis_ms: Option<u64>,

    /// Print one JSON object per event
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Command-line flags win over every config source.
    fn apply_overrides(&self, engine: &mut EngineSettings) {
        if let Some(key) = &self.key {
            engine.base_key = key.clone();
        }
        if self.no_bonus {
            engine.bonus_wedges = false;
        }
        if let Some(ms) = self.hysteresis_ms {
            engine.hysteresis_ms = ms;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = WheelConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load config")?;
    cli.apply_overrides(&mut config.engine);

    telemetry::init(&config.telemetry.log_level);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "config loaded");

    if cli.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let engine_config = engine_config(&config.engine)?;
    let text = read_script(cli.script.as_deref())?;
    let events = script::parse(&text)?;
    info!(
        events = events.len(),
        key = %engine_config.base_key,
        "replaying script"
    );

    let mut engine = HarmonyEngine::new(engine_config);
    let printer = Printer::new(cli.json, !cli.no_color && !cli.json);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for event in &events {
        match &event.action {
            Action::Hold(notes) => {
                let result = engine.process(notes.as_slice(), event.at_ms);
                if result.action.is_transition() {
                    info!(line = event.line, action = %result.action, chord = %result.display_name, "space change");
                }
                printer.chord(&mut out, event.at_ms, &result)?;
            }
            Action::Poll => {
                let outcome = engine.poll(event.at_ms);
                printer.poll(&mut out, event.at_ms, &outcome)?;
            }
        }
    }

    Ok(())
}

fn engine_config(settings: &EngineSettings) -> Result<EngineConfig> {
    let base_key: KeyCenter = settings
        .base_key
        .parse()
        .with_context(|| format!("invalid base key {:?}", settings.base_key))?;

    Ok(EngineConfig {
        base_key,
        bonus_wedges: settings.bonus_wedges,
        hysteresis_ms: settings.hysteresis_ms,
        gesture: GestureTiming {
            window_ms: settings.tap_window_ms,
            max_gap_ms: settings.tap_max_gap_ms,
        },
        extension_merge: settings.extension_merge,
    })
}

fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read script from stdin")?;
            Ok(text)
        }
    }
}
