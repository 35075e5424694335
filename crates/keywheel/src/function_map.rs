//! Harmonic function mapping.
//!
//! Several function shapes are supersets or subsets of one another, so
//! matching runs in a fixed priority order:
//!
//! 1. diminished families, keyed by the chord *root* relative to the tonic
//! 2. the A7-family secondary dominant (V/ii)
//! 3. four-note seventh templates
//! 4. three-note triad templates
//!
//! Anything left over is an illegal/outside chord and maps to `None`.

use tracing::trace;

use crate::pitch::{to_relative, PitchClass, PitchClassSet};
use crate::types::{ChordIdentity, HarmonicFunction, MappedFunction, Quality};

use HarmonicFunction::*;

const fn shape(pcs: &[u8]) -> PitchClassSet {
    PitchClassSet::from_pitch_classes(pcs)
}

/// V/ii as a bare triad or with its seventh (A C# E [G] in C).
const SECONDARY_DOMINANT_OF_II: [PitchClassSet; 2] = [shape(&[9, 1, 4]), shape(&[9, 1, 4, 7])];

/// Seventh-chord templates. The vi seventh must precede the I seventh and
/// the ii seventh must precede IV: their sets double as added-sixth chords.
const SEVENTH_TEMPLATES: [(PitchClassSet, HarmonicFunction); 8] = [
    (shape(&[9, 0, 4, 7]), Submediant),
    (shape(&[2, 5, 9, 0]), Supertonic),
    (shape(&[7, 11, 2, 5]), Dominant),
    (shape(&[2, 6, 9, 0]), DominantOfDominant),
    (shape(&[4, 8, 11, 2]), DominantOfRelative),
    (shape(&[4, 7, 11, 2]), Mediant),
    (shape(&[5, 9, 0, 4]), Subdominant),
    (shape(&[0, 4, 7, 11]), Tonic),
];

const TRIAD_TEMPLATES: [(PitchClassSet, HarmonicFunction); 11] = [
    (shape(&[0, 4, 7]), Tonic),
    (shape(&[2, 5, 9]), Supertonic),
    (shape(&[2, 6, 9]), DominantOfDominant),
    (shape(&[4, 7, 11]), Mediant),
    (shape(&[4, 8, 11]), DominantOfRelative),
    (shape(&[5, 8, 0]), MinorSubdominant),
    (shape(&[5, 9, 0]), Subdominant),
    (shape(&[7, 11, 2]), Dominant),
    // Minor v still lights the dominant wedge.
    (shape(&[7, 10, 2]), Dominant),
    (shape(&[9, 0, 4]), Submediant),
    (shape(&[10, 2, 5]), Subtonic),
];

/// Outcome of the diminished-family rule.
enum DiminishedRule {
    /// Root is not one of the mapped diminished roots; keep matching.
    NotApplicable,
    /// Display the chord name but light nothing.
    DisplayOnly,
    Function(HarmonicFunction),
}

fn diminished_rule(relative_root: PitchClass, quality: Quality) -> DiminishedRule {
    match (relative_root, quality) {
        (6, _) => DiminishedRule::Function(DominantOfDominant),
        (8, Quality::HalfDiminished7) => DiminishedRule::DisplayOnly,
        (8, _) => DiminishedRule::Function(DominantOfRelative),
        (1, _) => DiminishedRule::Function(DominantOfSupertonic),
        (11, Quality::Diminished7) => DiminishedRule::Function(Dominant),
        (11, _) => DiminishedRule::Function(SupertonicOfRelative),
        _ => DiminishedRule::NotApplicable,
    }
}

/// Map a chord onto a harmonic function in the key whose tonic is `tonic`.
///
/// `relative` is the chord's pitch-class set relative to that tonic. Bonus
/// functions are produced only when `bonus_enabled` is set; otherwise their
/// shapes map to `None`. Pure: no state is read or written.
pub fn map_function(
    chord: &ChordIdentity,
    relative: PitchClassSet,
    tonic: PitchClass,
    bonus_enabled: bool,
) -> Option<MappedFunction> {
    if chord.is_empty {
        return None;
    }

    let function = match_function(chord, relative, tonic)?;
    if function.is_bonus() && !bonus_enabled {
        trace!(%function, "bonus function suppressed");
        return None;
    }

    let display_name = if chord.name.is_empty() {
        function.label().to_string()
    } else {
        chord.name.clone()
    };

    Some(MappedFunction {
        function,
        display_name,
        is_bonus: function.is_bonus(),
    })
}

fn match_function(
    chord: &ChordIdentity,
    relative: PitchClassSet,
    tonic: PitchClass,
) -> Option<HarmonicFunction> {
    if let Some(root) = chord.root {
        if chord.quality.is_diminished_family() {
            match diminished_rule(to_relative(root, tonic), chord.quality) {
                DiminishedRule::Function(function) => return Some(function),
                DiminishedRule::DisplayOnly => return None,
                DiminishedRule::NotApplicable => {}
            }
        }
    }

    if SECONDARY_DOMINANT_OF_II.contains(&relative) {
        return Some(DominantOfSupertonic);
    }

    let templates: &[(PitchClassSet, HarmonicFunction)] = match relative.len() {
        4 => &SEVENTH_TEMPLATES,
        3 => &TRIAD_TEMPLATES,
        _ => return None,
    };

    templates
        .iter()
        .find(|(set, _)| *set == relative)
        .map(|&(_, function)| function)
}
