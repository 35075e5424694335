//! Timed note scripts.
//!
//! ```text
//! # time  notes
//! 0       60 64 67 71
//! 250     C4 Eb4 G4
//! 400                 <- nothing held
//! 640     poll
//! ```

use anyhow::{bail, Context, Result};
use keywheel::{HeldNotes, Millis};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the held notes. Empty releases everything.
    Hold(HeldNotes),
    /// Re-run the stability gate without a note change.
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEvent {
    /// 1-based source line.
    pub line: usize,
    pub at_ms: Millis,
    pub action: Action,
}

pub fn parse(text: &str) -> Result<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    let mut last_ms = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (at_ms, action) =
            parse_line(trimmed).with_context(|| format!("line {line}: {trimmed:?}"))?;
        if at_ms < last_ms {
            bail!("line {line}: time {at_ms}ms is earlier than the previous event at {last_ms}ms");
        }
        last_ms = at_ms;

        events.push(ScriptEvent {
            line,
            at_ms,
            action,
        });
    }

    Ok(events)
}

fn parse_line(line: &str) -> Result<(Millis, Action)> {
    let mut tokens = line.split_whitespace();
    let time = tokens.next().context("missing time")?;
    let at_ms: Millis = time
        .strip_suffix("ms")
        .unwrap_or(time)
        .parse()
        .with_context(|| format!("invalid time {time:?}"))?;

    let rest: Vec<&str> = tokens.collect();
    if rest == ["poll"] {
        return Ok((at_ms, Action::Poll));
    }

    let notes = rest
        .iter()
        .map(|token| parse_note(token))
        .collect::<Result<Vec<u8>>>()?;
    Ok((at_ms, Action::Hold(HeldNotes::try_from(notes)?)))
}

/// A MIDI note number, or a scientific pitch name where C4 is 60.
fn parse_note(token: &str) -> Result<u8> {
    if let Ok(number) = token.parse::<u8>() {
        return Ok(number);
    }

    let invalid = || format!("invalid note {token:?}");
    let mut chars = token.chars();
    let letter: i16 = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => bail!(invalid()),
    };

    let rest = chars.as_str();
    let (accidental, octave) = if let Some(octave) = rest.strip_prefix('#') {
        (1, octave)
    } else if let Some(octave) = rest.strip_prefix('b') {
        (-1, octave)
    } else {
        (0, rest)
    };
    let octave: i16 = octave.parse().with_context(invalid)?;

    let number = (octave + 1) * 12 + letter + accidental;
    match u8::try_from(number) {
        Ok(n) if n <= 127 => Ok(n),
        _ => bail!("note {token:?} is outside the MIDI range 0-127"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(notes: &[u8]) -> Action {
        Action::Hold(HeldNotes::try_from(notes.to_vec()).unwrap())
    }

    #[test]
    fn parses_numbers_names_poll_and_release() {
        let events = parse(
            "# progression\n\
             0 60 64 67\n\
             \n\
             250ms C4 Eb4 G4\n\
             400\n\
             640 poll\n",
        )
        .unwrap();

        assert_eq!(
            events,
            vec![
                ScriptEvent {
                    line: 2,
                    at_ms: 0,
                    action: held(&[60, 64, 67]),
                },
                ScriptEvent {
                    line: 4,
                    at_ms: 250,
                    action: held(&[60, 63, 67]),
                },
                ScriptEvent {
                    line: 5,
                    at_ms: 400,
                    action: held(&[]),
                },
                ScriptEvent {
                    line: 6,
                    at_ms: 640,
                    action: Action::Poll,
                },
            ]
        );
    }

    #[test]
    fn note_names_cover_the_midi_range() {
        assert_eq!(parse_note("C-1").unwrap(), 0);
        assert_eq!(parse_note("A4").unwrap(), 69);
        assert_eq!(parse_note("F#3").unwrap(), 54);
        assert_eq!(parse_note("Cb4").unwrap(), 59);
        assert_eq!(parse_note("G9").unwrap(), 127);
        assert!(parse_note("G#9").is_err());
        assert!(parse_note("H2").is_err());
        assert!(parse_note("C").is_err());
    }

    #[test]
    fn out_of_range_number_is_rejected() {
        let err = parse("0 60 200").unwrap_err();
        assert!(format!("{err:#}").contains("200"));
    }

    #[test]
    fn time_must_not_go_backwards() {
        let err = parse("100 60\n50 62\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn equal_times_are_allowed() {
        assert_eq!(parse("10 60\n10 62\n").unwrap().len(), 2);
    }
}
