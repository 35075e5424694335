//! Rendering classifier results, one line per script event.

use std::io::Write;

use anyhow::Result;
use keywheel::{ClassifyResult, GateOutcome, HarmonicFunction, Millis, Space};
use owo_colors::{OwoColorize, Style};
use serde_json::Value;

pub struct Printer {
    json: bool,
    color: bool,
}

impl Printer {
    pub fn new(json: bool, color: bool) -> Self {
        Self { json, color }
    }

    pub fn chord(&self, out: &mut impl Write, at_ms: Millis, result: &ClassifyResult) -> Result<()> {
        if self.json {
            let value = serde_json::to_value(result)?;
            return self.json_line(out, "chord", at_ms, value);
        }

        let name = if result.display_name.is_empty() {
            "-"
        } else {
            result.display_name.as_str()
        };

        let mut line = format!(
            "{:>7}ms  {}  {}  {}  {}",
            at_ms,
            self.paint(&format!("{name:<9}"), Style::new().bold()),
            self.function(result.function, result.should_update),
            self.paint(&format!("{:<4}", result.space), space_style(result.space)),
            if result.action.is_transition() {
                self.paint(&result.action.to_string(), Style::new().bright_yellow().bold())
            } else {
                self.paint("stay", Style::new().dimmed())
            },
        );

        if let Some(candidate) = result.candidate.filter(|&c| Some(c) != result.function) {
            line.push_str(&self.paint(&format!("  (pending {candidate})"), Style::new().dimmed()));
        }

        writeln!(out, "{line}")?;
        Ok(())
    }

    pub fn poll(&self, out: &mut impl Write, at_ms: Millis, outcome: &GateOutcome) -> Result<()> {
        if self.json {
            let value = serde_json::to_value(outcome)?;
            return self.json_line(out, "poll", at_ms, value);
        }

        writeln!(
            out,
            "{:>7}ms  {}  {}",
            at_ms,
            self.paint(&format!("{:<9}", "poll"), Style::new().dimmed()),
            self.function(outcome.stable_function, outcome.should_update),
        )?;
        Ok(())
    }

    fn json_line(&self, out: &mut impl Write, event: &str, at_ms: Millis, value: Value) -> Result<()> {
        let mut record = serde_json::Map::new();
        record.insert("event".to_string(), event.into());
        record.insert("at_ms".to_string(), at_ms.into());
        if let Value::Object(fields) = value {
            record.extend(fields);
        }
        writeln!(out, "{}", Value::Object(record))?;
        Ok(())
    }

    /// The lit function, marked with `*` when it changed on this event.
    fn function(&self, function: Option<HarmonicFunction>, updated: bool) -> String {
        let label = function.map_or("-", HarmonicFunction::label);
        let marker = if updated { "*" } else { " " };
        let text = format!("{label:<5}{marker}");
        match function {
            Some(f) if f.is_bonus() => self.paint(&text, Style::new().magenta()),
            Some(_) if updated => self.paint(&text, Style::new().bright_green().bold()),
            Some(_) => self.paint(&text, Style::new().green()),
            None => self.paint(&text, Style::new().dimmed()),
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

fn space_style(space: Space) -> Style {
    match space {
        Space::Home => Style::new().cyan(),
        Space::Sub => Style::new().blue(),
        Space::Par => Style::new().red(),
        Space::Rel => Style::new().yellow(),
    }
}
