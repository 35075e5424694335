//! Real-time harmonic function classifier.
//!
//! Turns the set of currently held notes into a chord identity, maps that
//! chord onto a harmonic function relative to a tonal center, and tracks
//! movement between four tonal spaces (HOME, SUB, PAR, REL). A stability
//! gate keeps the lit function from flickering while notes are passing.
//!
//! # Example
//!
//! ```
//! use keywheel::{EngineConfig, HarmonicFunction, HarmonyEngine, KeyCenter};
//!
//! let mut engine = HarmonyEngine::new(EngineConfig::new(KeyCenter::C));
//!
//! // C E G B held at t=0ms
//! let result = engine.process(&[60, 64, 67, 71], 0);
//! assert_eq!(result.display_name, "Cmaj7");
//! assert_eq!(result.function, Some(HarmonicFunction::Tonic));
//! ```
//!
//! The core is synchronous and holds no shared state. Each session owns its
//! own [`EngineState`]; timestamps are supplied by the caller.

pub mod chord_templates;
pub mod detect;
pub mod engine;
pub mod function_map;
pub mod pitch;
pub mod stability;
pub mod transition;
pub mod types;

pub use detect::{detect, infer_quality};
pub use engine::{classify, EngineConfig, EngineState, HarmonyEngine};
pub use function_map::map_function;
pub use pitch::{HeldNotes, KeyCenter, PitchClass, PitchClassSet};
pub use stability::{is_extension, GateOutcome, StabilityState};
pub use transition::{evaluate, GestureTiming, SpaceDecision, TapHistory};
pub use types::{
    ChordIdentity, ChordShape, ClassifyResult, HarmonicFunction, MappedFunction, Millis,
    Quality, Space, TapEvent, TransitionAction, TransitionReason,
};

/// Errors from parsing classifier inputs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown key center: {0:?}")]
    UnknownKey(String),

    #[error("note number {0} is outside the MIDI range 0-127")]
    NoteOutOfRange(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
