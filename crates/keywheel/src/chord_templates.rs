use crate::pitch::{note_name, KeyCenter, PitchClass, PitchClassSet};
use crate::types::Quality;

/// A chord template: quality + interval set above the root.
pub struct ChordTemplate {
    pub quality: Quality,
    pub suffix: &'static str,
    pub intervals: PitchClassSet,
    /// Tie-break between templates covering the same number of notes.
    /// Higher carries more harmonic information.
    pub rank: u8,
}

impl ChordTemplate {
    const fn new(quality: Quality, suffix: &'static str, intervals: &[u8], rank: u8) -> Self {
        Self {
            quality,
            suffix,
            intervals: PitchClassSet::from_pitch_classes(intervals),
            rank,
        }
    }

    pub const fn size(&self) -> usize {
        self.intervals.len()
    }
}

/// All recognized chord templates, four-note chords first.
///
/// Suspended and augmented shapes name chords for display only; the
/// function mapper never assigns them a function.
pub static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new(Quality::Dominant7, "7", &[0, 4, 7, 10], 10),
    ChordTemplate::new(Quality::Major7, "maj7", &[0, 4, 7, 11], 9),
    ChordTemplate::new(Quality::Minor7, "m7", &[0, 3, 7, 10], 8),
    ChordTemplate::new(Quality::Minor, "m(maj7)", &[0, 3, 7, 11], 7),
    ChordTemplate::new(Quality::HalfDiminished7, "m7b5", &[0, 3, 6, 10], 6),
    ChordTemplate::new(Quality::Diminished7, "dim7", &[0, 3, 6, 9], 5),
    ChordTemplate::new(Quality::Major, "", &[0, 4, 7], 4),
    ChordTemplate::new(Quality::Minor, "m", &[0, 3, 7], 3),
    ChordTemplate::new(Quality::Diminished, "dim", &[0, 3, 6], 2),
    ChordTemplate::new(Quality::Augmented, "aug", &[0, 4, 8], 1),
    ChordTemplate::new(Quality::Suspended4, "sus4", &[0, 5, 7], 0),
    ChordTemplate::new(Quality::Suspended2, "sus2", &[0, 2, 7], 0),
];

/// Fixed root spellings for diminished and diminished-seventh chords:
/// leading-tone roots stay sharp, Eb and Bb stay flat regardless of key.
const DIMINISHED_ROOT_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#", "A", "Bb", "B",
];

/// Spell a chord root in the context of `key`.
pub fn spell_root(root: PitchClass, quality: Quality, key: KeyCenter) -> &'static str {
    match quality {
        Quality::Diminished | Quality::Diminished7 => DIMINISHED_ROOT_NAMES[(root % 12) as usize],
        Quality::HalfDiminished7 if root % 12 == 6 => "F#",
        _ => note_name(root, key.prefers_flats()),
    }
}

/// A winning template for a pitch-class set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordMatch {
    pub root: PitchClass,
    pub quality: Quality,
    pub name: String,
}

/// Match a set of pitch classes against chord templates.
///
/// Tries all 12 roots, starting at the bass pitch class so that symmetric
/// shapes (dim7, aug) take the bass as their root. A template matches when
/// all of its tones are present. The larger template wins; equal sizes fall
/// back to `rank`; remaining ties keep the root found first.
pub fn match_chord(
    pitch_classes: PitchClassSet,
    bass: PitchClass,
    key: KeyCenter,
) -> Option<ChordMatch> {
    if pitch_classes.len() < 3 {
        return None;
    }

    let mut best: Option<(PitchClass, &ChordTemplate)> = None;

    for offset in 0..12u8 {
        let root = (bass + offset) % 12;
        if !pitch_classes.contains(root) {
            continue;
        }
        let intervals = pitch_classes.relative_to(root);

        for template in TEMPLATES {
            if !template.intervals.is_subset_of(intervals) {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, current)) => {
                    (template.size(), template.rank) > (current.size(), current.rank)
                }
            };
            if better {
                best = Some((root, template));
            }
        }
    }

    best.map(|(root, template)| ChordMatch {
        root,
        quality: template.quality,
        name: format!(
            "{}{}",
            spell_root(root, template.quality, key),
            template.suffix
        ),
    })
}
