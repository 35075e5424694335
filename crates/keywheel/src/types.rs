use serde::{Deserialize, Serialize};

use crate::pitch::{KeyCenter, PitchClass, PitchClassSet};

/// Caller-supplied wall-clock reading in milliseconds.
pub type Millis = u64;

/// Chord quality tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    Suspended2,
    Suspended4,
    Unknown,
}

impl Quality {
    /// Diminished triad, half-diminished seventh or fully diminished seventh.
    pub fn is_diminished_family(self) -> bool {
        matches!(
            self,
            Quality::Diminished | Quality::HalfDiminished7 | Quality::Diminished7
        )
    }

    /// Whether `self` is a four-note extension of the triad quality `triad`.
    pub fn extends(self, triad: Quality) -> bool {
        match triad {
            Quality::Major => matches!(self, Quality::Major7 | Quality::Dominant7),
            Quality::Minor => self == Quality::Minor7,
            Quality::Diminished => {
                matches!(self, Quality::HalfDiminished7 | Quality::Diminished7)
            }
            _ => false,
        }
    }

    /// Derive a quality from a spelled chord name such as `"F#m7b5"`.
    ///
    /// The detector derives a named chord's quality through this, keeping
    /// the template's quality only for suffixes it does not recognize.
    pub fn from_chord_name(name: &str) -> Quality {
        let suffix = name
            .trim_start_matches(|c: char| c.is_ascii_uppercase())
            .trim_start_matches(&['#', 'b'][..]);

        match suffix {
            "" => Quality::Major,
            "m" | "m(maj7)" => Quality::Minor,
            "dim" => Quality::Diminished,
            "aug" => Quality::Augmented,
            "7" => Quality::Dominant7,
            "maj7" => Quality::Major7,
            "m7" => Quality::Minor7,
            "m7b5" => Quality::HalfDiminished7,
            "dim7" => Quality::Diminished7,
            "sus2" => Quality::Suspended2,
            "sus4" => Quality::Suspended4,
            _ => Quality::Unknown,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Quality::Major => "major",
            Quality::Minor => "minor",
            Quality::Diminished => "diminished",
            Quality::Augmented => "augmented",
            Quality::Dominant7 => "dominant seventh",
            Quality::Major7 => "major seventh",
            Quality::Minor7 => "minor seventh",
            Quality::HalfDiminished7 => "half-diminished seventh",
            Quality::Diminished7 => "diminished seventh",
            Quality::Suspended2 => "sus2",
            Quality::Suspended4 => "sus4",
            Quality::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The chord recognized from a set of held notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordIdentity {
    /// Spelled chord symbol, e.g. "Cmaj7". Empty when no template matched.
    pub name: String,
    /// Absolute root pitch class, present only when `name` is non-empty.
    pub root: Option<PitchClass>,
    pub quality: Quality,
    /// Absolute pitch classes of all held notes.
    pub pitch_classes: PitchClassSet,
    /// Lowest held note number.
    pub bass_note: Option<u8>,
    pub is_empty: bool,
}

impl ChordIdentity {
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            root: None,
            quality: Quality::Unknown,
            pitch_classes: PitchClassSet::EMPTY,
            bass_note: None,
            is_empty: true,
        }
    }

    pub fn shape(&self) -> Option<ChordShape> {
        self.root.map(|root| ChordShape {
            root,
            quality: self.quality,
        })
    }
}

/// Root and quality of a named chord, kept across calls to detect
/// triad-to-seventh extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordShape {
    pub root: PitchClass,
    pub quality: Quality,
}

/// Harmonic function labels. The first ten are primary; `DominantOfSupertonic`
/// and `SupertonicOfRelative` are bonus labels layered over diminished shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmonicFunction {
    #[serde(rename = "I")]
    Tonic,
    #[serde(rename = "ii")]
    Supertonic,
    #[serde(rename = "V/V")]
    DominantOfDominant,
    #[serde(rename = "iii")]
    Mediant,
    #[serde(rename = "V/vi")]
    DominantOfRelative,
    #[serde(rename = "iv")]
    MinorSubdominant,
    #[serde(rename = "IV")]
    Subdominant,
    #[serde(rename = "V7")]
    Dominant,
    #[serde(rename = "vi")]
    Submediant,
    #[serde(rename = "♭VII")]
    Subtonic,
    #[serde(rename = "V/ii")]
    DominantOfSupertonic,
    #[serde(rename = "ii/vi")]
    SupertonicOfRelative,
}

impl HarmonicFunction {
    pub const PRIMARY: [HarmonicFunction; 10] = [
        HarmonicFunction::Tonic,
        HarmonicFunction::Supertonic,
        HarmonicFunction::DominantOfDominant,
        HarmonicFunction::Mediant,
        HarmonicFunction::DominantOfRelative,
        HarmonicFunction::MinorSubdominant,
        HarmonicFunction::Subdominant,
        HarmonicFunction::Dominant,
        HarmonicFunction::Submediant,
        HarmonicFunction::Subtonic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HarmonicFunction::Tonic => "I",
            HarmonicFunction::Supertonic => "ii",
            HarmonicFunction::DominantOfDominant => "V/V",
            HarmonicFunction::Mediant => "iii",
            HarmonicFunction::DominantOfRelative => "V/vi",
            HarmonicFunction::MinorSubdominant => "iv",
            HarmonicFunction::Subdominant => "IV",
            HarmonicFunction::Dominant => "V7",
            HarmonicFunction::Submediant => "vi",
            HarmonicFunction::Subtonic => "♭VII",
            HarmonicFunction::DominantOfSupertonic => "V/ii",
            HarmonicFunction::SupertonicOfRelative => "ii/vi",
        }
    }

    pub fn is_bonus(self) -> bool {
        matches!(
            self,
            HarmonicFunction::DominantOfSupertonic | HarmonicFunction::SupertonicOfRelative
        )
    }
}

impl std::fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the function mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedFunction {
    pub function: HarmonicFunction,
    pub display_name: String,
    pub is_bonus: bool,
}

/// The four tonal spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Space {
    #[default]
    Home,
    Sub,
    Par,
    Rel,
}

impl Space {
    /// The key used to name and map chords while this space is active.
    ///
    /// SUB sits on the subdominant (+5). PAR sits on the relative major of
    /// the parallel minor (+3), where the parallel tonic reads as vi.
    /// REL keeps the base tonic and only reinterprets the wheel.
    pub fn effective_key(self, base: KeyCenter) -> KeyCenter {
        match self {
            Space::Home | Space::Rel => base,
            Space::Sub => base.transpose(5),
            Space::Par => base.transpose(3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Space::Home => "HOME",
            Space::Sub => "SUB",
            Space::Par => "PAR",
            Space::Rel => "REL",
        }
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the transition evaluator decided for this input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum TransitionAction {
    Stay,
    Enter(Space),
    Exit(Space),
}

impl TransitionAction {
    pub fn target(self) -> Option<Space> {
        match self {
            TransitionAction::Stay => None,
            TransitionAction::Enter(space) | TransitionAction::Exit(space) => Some(space),
        }
    }

    pub fn is_transition(self) -> bool {
        self != TransitionAction::Stay
    }
}

impl std::fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionAction::Stay => f.write_str("stay"),
            TransitionAction::Enter(space) => write!(f, "enter {space}"),
            TransitionAction::Exit(space) => write!(f, "exit {space}"),
        }
    }
}

/// Why the evaluator reached its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    EmptyInput,
    TripleTap,
    /// A diminished bonus-wedge shape, which never moves HOME.
    BonusShape,
    /// A fixed chord shape that moves to another space.
    EntryShape,
    /// A whitelisted shape for the current space.
    RecognizedShape,
    /// HOME holds a full chord that is not a trigger shape.
    NoTrigger,
    /// Fewer than three pitch classes held.
    PartialChord,
    UnrecognizedChord,
    /// REL only leaves by gesture.
    GestureOnly,
}

/// One registered chord attack, used for triple-tap detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapEvent {
    pub function: HarmonicFunction,
    pub at_ms: Millis,
}

/// Everything the renderer and audio collaborators need from one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifyResult {
    /// Chord name to show, possibly empty.
    pub display_name: String,
    /// The confirmed (lit) function after the stability gate.
    pub function: Option<HarmonicFunction>,
    pub is_bonus: bool,
    /// Function mapped for this input before the stability gate.
    pub candidate: Option<HarmonicFunction>,
    pub action: TransitionAction,
    pub reason: TransitionReason,
    /// Space after this call.
    pub space: Space,
    pub effective_key: KeyCenter,
    /// Whether the lit function changed on this tick.
    pub should_update: bool,
    pub chord: ChordIdentity,
    /// Held pitch classes relative to `effective_key`.
    pub relative_pitch_classes: PitchClassSet,
}
