use tracing::trace;

use crate::chord_templates::match_chord;
use crate::pitch::{pitch_class, KeyCenter, PitchClass, PitchClassSet};
use crate::types::{ChordIdentity, Quality};

/// Incomplete shapes that still imply a quality when no full template fits.
const STRUCTURAL_SHAPES: &[(&[u8], Quality)] = &[
    (&[0, 4, 10], Quality::Dominant7),
    (&[0, 4, 11], Quality::Major7),
    (&[0, 3, 10], Quality::Minor7),
    (&[0, 3, 9], Quality::Diminished7),
    (&[0, 4], Quality::Major),
    (&[0, 3], Quality::Minor),
];

/// Recognize the chord formed by the held notes.
///
/// Empty input yields [`ChordIdentity::empty`]. Otherwise the pitch classes
/// and bass are computed and the templates are searched for a spelled name
/// in the context of `key`. The quality is read back from that name, using
/// the template's own quality only when the suffix is not recognized.
/// Without a name the quality falls back to [`infer_quality`] and the root
/// stays undefined.
pub fn detect(held_notes: &[u8], key: KeyCenter) -> ChordIdentity {
    let Some(&bass_note) = held_notes.iter().min() else {
        return ChordIdentity::empty();
    };

    let pitch_classes = PitchClassSet::from_notes(held_notes);
    let bass = pitch_class(bass_note);

    let identity = match match_chord(pitch_classes, bass, key) {
        Some(m) => ChordIdentity {
            quality: match Quality::from_chord_name(&m.name) {
                Quality::Unknown => m.quality,
                named => named,
            },
            name: m.name,
            root: Some(m.root),
            pitch_classes,
            bass_note: Some(bass_note),
            is_empty: false,
        },
        None => ChordIdentity {
            name: String::new(),
            root: None,
            quality: infer_quality(pitch_classes, bass),
            pitch_classes,
            bass_note: Some(bass_note),
            is_empty: false,
        },
    };

    trace!(
        name = %identity.name,
        quality = %identity.quality,
        pitch_classes = ?identity.pitch_classes,
        %key,
        "detected chord"
    );

    identity
}

/// Structural quality check for sets that matched no template.
///
/// Looks for an exact omitted-fifth seventh or a bare third above any
/// held pitch class, trying the bass first.
pub fn infer_quality(pitch_classes: PitchClassSet, bass: PitchClass) -> Quality {
    for offset in 0..12u8 {
        let root = (bass + offset) % 12;
        if !pitch_classes.contains(root) {
            continue;
        }
        let intervals = pitch_classes.relative_to(root);
        for &(shape, quality) in STRUCTURAL_SHAPES {
            if intervals == PitchClassSet::from_pitch_classes(shape) {
                return quality;
            }
        }
    }
    Quality::Unknown
}
