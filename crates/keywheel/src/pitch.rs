//! Pitch classes, pitch-class sets and key centers.
//!
//! Two frames are in play: *absolute* (0 = C) and *relative* (0 = the current
//! tonal center). `relative = (absolute - tonic + 12) % 12`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A note modulo one octave, 0–11.
pub type PitchClass = u8;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

pub fn note_name(pitch_class: PitchClass, use_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

pub const fn pitch_class(note: u8) -> PitchClass {
    note % 12
}

/// Express an absolute pitch class as a distance above `tonic`.
pub const fn to_relative(absolute: PitchClass, tonic: PitchClass) -> PitchClass {
    (absolute % 12 + 12 - tonic % 12) % 12
}

pub const fn to_absolute(relative: PitchClass, tonic: PitchClass) -> PitchClass {
    (relative % 12 + tonic % 12) % 12
}

const ALL_BITS: u16 = 0x0FFF;

/// A set of pitch classes stored as a 12-bit mask (bit `i` = pitch class `i`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", from = "Vec<u8>")]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub const EMPTY: Self = Self(0);

    pub const fn from_pitch_classes(pitch_classes: &[PitchClass]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < pitch_classes.len() {
            mask |= 1 << (pitch_classes[i] % 12);
            i += 1;
        }
        Self(mask)
    }

    /// Collapse absolute note numbers to their pitch classes.
    pub fn from_notes(notes: &[u8]) -> Self {
        notes
            .iter()
            .fold(Self::EMPTY, |set, &note| set.with(pitch_class(note)))
    }

    pub const fn with(self, pitch_class: PitchClass) -> Self {
        Self(self.0 | 1 << (pitch_class % 12))
    }

    pub const fn contains(self, pitch_class: PitchClass) -> bool {
        self.0 & (1 << (pitch_class % 12)) != 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Rotate an absolute set into the frame where `tonic` is 0.
    pub const fn relative_to(self, tonic: PitchClass) -> Self {
        let t = (tonic % 12) as u32;
        if t == 0 {
            return self;
        }
        Self(((self.0 >> t) | (self.0 << (12 - t))) & ALL_BITS)
    }

    /// Pitch classes in ascending order.
    pub fn iter(self) -> impl Iterator<Item = PitchClass> {
        (0..12u8).filter(move |&pc| self.contains(pc))
    }
}

impl fmt::Debug for PitchClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<PitchClassSet> for Vec<u8> {
    fn from(set: PitchClassSet) -> Self {
        set.iter().collect()
    }
}

impl From<Vec<u8>> for PitchClassSet {
    fn from(pitch_classes: Vec<u8>) -> Self {
        Self::from_pitch_classes(&pitch_classes)
    }
}

/// The currently held absolute note numbers, validated to the MIDI range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldNotes(Vec<u8>);

impl HeldNotes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for HeldNotes {
    type Error = Error;

    fn try_from(notes: Vec<u8>) -> Result<Self, Self::Error> {
        if let Some(&bad) = notes.iter().find(|&&n| n > 127) {
            return Err(Error::NoteOutOfRange(bad));
        }
        Ok(Self(notes))
    }
}

/// One of the twelve fixed key-center names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyCenter {
    #[default]
    C,
    Db,
    D,
    Eb,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl KeyCenter {
    pub const ALL: [KeyCenter; 12] = [
        KeyCenter::C,
        KeyCenter::Db,
        KeyCenter::D,
        KeyCenter::Eb,
        KeyCenter::E,
        KeyCenter::F,
        KeyCenter::FSharp,
        KeyCenter::G,
        KeyCenter::Ab,
        KeyCenter::A,
        KeyCenter::Bb,
        KeyCenter::B,
    ];

    pub const fn tonic(self) -> PitchClass {
        self as u8
    }

    pub const fn from_pitch_class(pitch_class: PitchClass) -> Self {
        Self::ALL[(pitch_class % 12) as usize]
    }

    pub const fn transpose(self, semitones: u8) -> Self {
        Self::from_pitch_class(to_absolute(semitones % 12, self.tonic()))
    }

    /// Whether chord roots in this key are spelled with flats.
    pub const fn prefers_flats(self) -> bool {
        matches!(
            self,
            KeyCenter::C
                | KeyCenter::F
                | KeyCenter::Bb
                | KeyCenter::Eb
                | KeyCenter::Ab
                | KeyCenter::Db
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            KeyCenter::C => "C",
            KeyCenter::Db => "Db",
            KeyCenter::D => "D",
            KeyCenter::Eb => "Eb",
            KeyCenter::E => "E",
            KeyCenter::F => "F",
            KeyCenter::FSharp => "F#",
            KeyCenter::G => "G",
            KeyCenter::Ab => "Ab",
            KeyCenter::A => "A",
            KeyCenter::Bb => "Bb",
            KeyCenter::B => "B",
        }
    }
}

impl fmt::Display for KeyCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCenter {
    type Err = Error;

    /// Accepts a letter with an optional single accidental (`#`, `b`, `♯`,
    /// `♭`), so enharmonic spellings such as `C#` or `Gb` resolve to the
    /// canonical key center.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let unknown = || Error::UnknownKey(s.to_string());

        let base: u8 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(unknown()),
        };

        let pitch_class = match chars.next() {
            None => base,
            Some('#') | Some('♯') => (base + 1) % 12,
            Some('b') | Some('♭') => (base + 11) % 12,
            Some(_) => return Err(unknown()),
        };

        if chars.next().is_some() {
            return Err(unknown());
        }

        Ok(Self::from_pitch_class(pitch_class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_conversion_wraps() {
        assert_eq!(to_relative(0, 7), 5);
        assert_eq!(to_relative(7, 7), 0);
        assert_eq!(to_relative(2, 10), 4);
        assert_eq!(to_absolute(5, 7), 0);
    }

    #[test]
    fn set_from_notes_collapses_octaves() {
        let set = PitchClassSet::from_notes(&[48, 60, 64, 79]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(0));
        assert!(set.contains(4));
        assert!(set.contains(7));
    }

    #[test]
    fn relative_rotation_matches_pointwise_conversion() {
        let abs = PitchClassSet::from_pitch_classes(&[7, 11, 2, 5]);
        let rel = abs.relative_to(7);
        assert_eq!(rel, PitchClassSet::from_pitch_classes(&[0, 4, 7, 10]));

        for tonic in 0..12 {
            let expected: PitchClassSet = abs
                .iter()
                .fold(PitchClassSet::EMPTY, |s, pc| s.with(to_relative(pc, tonic)));
            assert_eq!(abs.relative_to(tonic), expected, "tonic {tonic}");
        }
    }

    #[test]
    fn subset_check() {
        let triad = PitchClassSet::from_pitch_classes(&[0, 4, 7]);
        let seventh = PitchClassSet::from_pitch_classes(&[0, 4, 7, 11]);
        assert!(triad.is_subset_of(seventh));
        assert!(!seventh.is_subset_of(triad));
    }

    #[test]
    fn set_serializes_as_sorted_list() {
        let set = PitchClassSet::from_pitch_classes(&[9, 0, 4]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[0,4,9]");
        let back: PitchClassSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn key_parsing_accepts_enharmonics() {
        assert_eq!("C".parse::<KeyCenter>().unwrap(), KeyCenter::C);
        assert_eq!("f#".parse::<KeyCenter>().unwrap(), KeyCenter::FSharp);
        assert_eq!("Gb".parse::<KeyCenter>().unwrap(), KeyCenter::FSharp);
        assert_eq!("C#".parse::<KeyCenter>().unwrap(), KeyCenter::Db);
        assert_eq!(" Bb ".parse::<KeyCenter>().unwrap(), KeyCenter::Bb);
        assert!("H".parse::<KeyCenter>().is_err());
        assert!("Cbb".parse::<KeyCenter>().is_err());
        assert!("".parse::<KeyCenter>().is_err());
    }

    #[test]
    fn key_transpose_and_spelling_preference() {
        assert_eq!(KeyCenter::C.transpose(5), KeyCenter::F);
        assert_eq!(KeyCenter::C.transpose(3), KeyCenter::Eb);
        assert_eq!(KeyCenter::G.transpose(5), KeyCenter::C);
        assert!(KeyCenter::Eb.prefers_flats());
        assert!(!KeyCenter::E.prefers_flats());
    }

    #[test]
    fn held_notes_reject_out_of_range() {
        assert!(HeldNotes::try_from(vec![60, 64, 67]).is_ok());
        assert!(matches!(
            HeldNotes::try_from(vec![60, 200]),
            Err(Error::NoteOutOfRange(200))
        ));
    }
}
