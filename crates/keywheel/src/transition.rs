//! Tonal space transitions.
//!
//! Triggers are literal chord shapes in the *base* key, so the evaluator
//! always works on base-relative pitch classes no matter which space's
//! effective key produced the mapped function.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pitch::{to_relative, PitchClass, PitchClassSet};
use crate::types::{
    ChordIdentity, HarmonicFunction, Millis, Space, TapEvent, TransitionAction, TransitionReason,
};

const MAX_TAPS: usize = 16;

/// Timing bounds for the triple-tap gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureTiming {
    /// All taps of a gesture must fall inside this window.
    pub window_ms: Millis,
    /// Largest allowed gap between consecutive taps.
    pub max_gap_ms: Millis,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            window_ms: 1500,
            max_gap_ms: 500,
        }
    }
}

/// Rolling, time-ordered record of chord attacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapHistory {
    events: VecDeque<TapEvent>,
}

impl TapHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tap, dropping entries older than `window_ms` before `at_ms`.
    pub fn record(&mut self, function: HarmonicFunction, at_ms: Millis, window_ms: Millis) {
        let horizon = at_ms.saturating_sub(window_ms);
        while self.events.front().is_some_and(|e| e.at_ms < horizon) {
            self.events.pop_front();
        }
        if self.events.len() == MAX_TAPS {
            self.events.pop_front();
        }
        self.events.push_back(TapEvent { function, at_ms });
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TapEvent> {
        self.events.iter()
    }

    /// Whether a fresh attack of `function` at `now_ms` completes a triple tap.
    ///
    /// The run is the trailing sequence of consecutive taps on `function`
    /// plus the current attack. It needs three or more taps, all inside the
    /// window, with no gap wider than `max_gap_ms`.
    pub fn completes_triple_tap(
        &self,
        function: HarmonicFunction,
        now_ms: Millis,
        timing: GestureTiming,
    ) -> bool {
        let horizon = now_ms.saturating_sub(timing.window_ms);
        let mut count = 1;
        let mut later = now_ms;

        for event in self.events.iter().rev() {
            if event.function != function
                || event.at_ms < horizon
                || later.saturating_sub(event.at_ms) > timing.max_gap_ms
            {
                break;
            }
            count += 1;
            later = event.at_ms;
        }

        count >= 3
    }
}

/// The evaluator's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceDecision {
    pub action: TransitionAction,
    pub reason: TransitionReason,
}

impl SpaceDecision {
    const fn stay(reason: TransitionReason) -> Self {
        Self {
            action: TransitionAction::Stay,
            reason,
        }
    }

    const fn enter(target: Space) -> Self {
        Self {
            action: TransitionAction::Enter(target),
            reason: TransitionReason::EntryShape,
        }
    }

    const fn exit(target: Space) -> Self {
        Self {
            action: TransitionAction::Exit(target),
            reason: TransitionReason::EntryShape,
        }
    }
}

const fn shape(pcs: &[u8]) -> PitchClassSet {
    PitchClassSet::from_pitch_classes(pcs)
}

/// HOME -> SUB: minor v seventh (ii7 of the subdominant key) or the
/// dominant seventh of the subdominant key.
const SUB_ENTRY: [PitchClassSet; 2] = [shape(&[7, 10, 2, 5]), shape(&[0, 4, 7, 10])];

/// Parallel-minor family: i, iv, bIII, bVI.
const PAR_ENTRY: [PitchClassSet; 4] = [
    shape(&[0, 3, 7]),
    shape(&[5, 8, 0]),
    shape(&[3, 7, 10]),
    shape(&[8, 0, 3]),
];

/// SUB tonic, its ii, its V (triad or seventh), and the HOME tonic.
const SUB_STAY: [PitchClassSet; 6] = [
    shape(&[5, 9, 0]),
    shape(&[5, 9, 0, 4]),
    shape(&[7, 10, 2]),
    shape(&[7, 10, 2, 5]),
    shape(&[0, 4, 7]),
    shape(&[0, 4, 7, 10]),
];

const HOME_TONIC: PitchClassSet = shape(&[0, 4, 7]);
const SUB_TONIC: PitchClassSet = shape(&[5, 9, 0]);

/// Parallel family plus bVII and the base dominant.
const PAR_STAY: [PitchClassSet; 7] = [
    shape(&[0, 3, 7]),
    shape(&[5, 8, 0]),
    shape(&[3, 7, 10]),
    shape(&[8, 0, 3]),
    shape(&[10, 2, 5]),
    shape(&[7, 11, 2]),
    shape(&[7, 11, 2, 5]),
];

/// Diminished roots that carry bonus wedges in HOME.
const BONUS_WEDGE_ROOTS: [PitchClass; 4] = [1, 6, 8, 11];

fn gesture_target(space: Space, function: HarmonicFunction) -> Option<TransitionAction> {
    match (space, function) {
        (Space::Home, HarmonicFunction::Submediant) => Some(TransitionAction::Enter(Space::Rel)),
        (Space::Rel, HarmonicFunction::Tonic) => Some(TransitionAction::Exit(Space::Home)),
        (Space::Sub, HarmonicFunction::Dominant) => Some(TransitionAction::Exit(Space::Home)),
        (Space::Par, HarmonicFunction::DominantOfRelative) => {
            Some(TransitionAction::Exit(Space::Home))
        }
        _ => None,
    }
}

/// Decide whether to stay in `current`, enter another space or exit.
///
/// `tapped` is the mapped function when this input is a fresh attack, and
/// `None` otherwise; only fresh attacks count toward the triple-tap gesture.
/// An unrecognized chord is never an error and never leaves a space.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    chord: &ChordIdentity,
    base_relative: PitchClassSet,
    base_tonic: PitchClass,
    current: Space,
    taps: &TapHistory,
    tapped: Option<HarmonicFunction>,
    now_ms: Millis,
    timing: GestureTiming,
) -> SpaceDecision {
    if chord.is_empty {
        return SpaceDecision::stay(TransitionReason::EmptyInput);
    }

    if let Some(function) = tapped {
        if let Some(action) = gesture_target(current, function) {
            if taps.completes_triple_tap(function, now_ms, timing) {
                debug!(space = %current, %function, %action, "triple-tap gesture");
                return SpaceDecision {
                    action,
                    reason: TransitionReason::TripleTap,
                };
            }
        }
    }

    match current {
        Space::Home => evaluate_home(chord, base_relative, base_tonic),
        Space::Sub => evaluate_sub(base_relative),
        Space::Par => evaluate_par(base_relative),
        Space::Rel => SpaceDecision::stay(TransitionReason::GestureOnly),
    }
}

fn evaluate_home(
    chord: &ChordIdentity,
    base_relative: PitchClassSet,
    base_tonic: PitchClass,
) -> SpaceDecision {
    let is_bonus_wedge = chord.quality.is_diminished_family()
        && chord
            .root
            .is_some_and(|root| BONUS_WEDGE_ROOTS.contains(&to_relative(root, base_tonic)));
    if is_bonus_wedge {
        return SpaceDecision::stay(TransitionReason::BonusShape);
    }

    if SUB_ENTRY.contains(&base_relative) {
        return SpaceDecision::enter(Space::Sub);
    }
    if PAR_ENTRY.contains(&base_relative) {
        return SpaceDecision::enter(Space::Par);
    }

    if base_relative.len() < 3 {
        SpaceDecision::stay(TransitionReason::PartialChord)
    } else {
        SpaceDecision::stay(TransitionReason::NoTrigger)
    }
}

fn evaluate_sub(base_relative: PitchClassSet) -> SpaceDecision {
    // Notes released one at a time pass through fragments; never exit on them.
    if base_relative.len() < 3 {
        return SpaceDecision::stay(TransitionReason::PartialChord);
    }
    if SUB_STAY.contains(&base_relative) {
        return SpaceDecision::stay(TransitionReason::RecognizedShape);
    }
    if PAR_ENTRY.contains(&base_relative) {
        return SpaceDecision::enter(Space::Par);
    }
    SpaceDecision::stay(TransitionReason::UnrecognizedChord)
}

fn evaluate_par(base_relative: PitchClassSet) -> SpaceDecision {
    if base_relative.len() < 3 {
        return SpaceDecision::stay(TransitionReason::PartialChord);
    }
    if base_relative == HOME_TONIC {
        return SpaceDecision::exit(Space::Home);
    }
    if base_relative == SUB_TONIC {
        return SpaceDecision::exit(Space::Sub);
    }
    if PAR_STAY.contains(&base_relative) {
        return SpaceDecision::stay(TransitionReason::RecognizedShape);
    }
    SpaceDecision::stay(TransitionReason::UnrecognizedChord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;
    use crate::pitch::KeyCenter;
    use pretty_assertions::assert_eq;

    fn decide(notes: &[u8], space: Space) -> SpaceDecision {
        let chord = detect(notes, space.effective_key(KeyCenter::C));
        let base_relative = chord.pitch_classes.relative_to(0);
        evaluate(
            &chord,
            base_relative,
            0,
            space,
            &TapHistory::new(),
            None,
            0,
            GestureTiming::default(),
        )
    }

    fn taps(function: HarmonicFunction, times: &[Millis]) -> TapHistory {
        let mut history = TapHistory::new();
        for &t in times {
            history.record(function, t, 1500);
        }
        history
    }

    #[test]
    fn empty_input_stays() {
        let decision = decide(&[], Space::Sub);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::EmptyInput));
    }

    #[test]
    fn home_entries() {
        // C7 and Gm7 lead into SUB.
        assert_eq!(decide(&[60, 64, 67, 70], Space::Home).action, TransitionAction::Enter(Space::Sub));
        assert_eq!(decide(&[55, 58, 62, 65], Space::Home).action, TransitionAction::Enter(Space::Sub));
        // Cm, Fm, Eb, Ab lead into PAR.
        for notes in [[60, 63, 67], [65, 68, 72], [63, 67, 70], [68, 72, 75]] {
            assert_eq!(
                decide(&notes, Space::Home).action,
                TransitionAction::Enter(Space::Par),
                "{notes:?}"
            );
        }
    }

    #[test]
    fn home_stays_on_diatonic_and_dominant_shapes() {
        assert_eq!(decide(&[60, 64, 67], Space::Home).action, TransitionAction::Stay);
        assert_eq!(decide(&[55, 58, 62], Space::Home).action, TransitionAction::Stay);
        assert_eq!(decide(&[67, 71, 74, 77], Space::Home).action, TransitionAction::Stay);
    }

    #[test]
    fn bonus_wedges_never_move_home() {
        // C#dim7 shares three notes with C7.
        let decision = decide(&[61, 64, 67, 70], Space::Home);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::BonusShape));
        // G#dim7 shares three notes with Fm/Ab shapes.
        let decision = decide(&[68, 71, 74, 77], Space::Home);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::BonusShape));
    }

    #[test]
    fn sub_whitelist_and_onward() {
        for notes in [[65, 69, 72], [55, 58, 62], [60, 64, 67]] {
            assert_eq!(decide(&notes, Space::Sub).action, TransitionAction::Stay, "{notes:?}");
        }
        assert_eq!(decide(&[60, 64, 67, 70], Space::Sub).action, TransitionAction::Stay);
        assert_eq!(decide(&[60, 63, 67], Space::Sub).action, TransitionAction::Enter(Space::Par));
        let decision = decide(&[61, 65, 68], Space::Sub);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::UnrecognizedChord));
    }

    #[test]
    fn partial_chords_never_exit() {
        for space in [Space::Sub, Space::Par] {
            for notes in [&[60, 64][..], &[60][..], &[65, 69][..], &[63, 67][..]] {
                let decision = decide(notes, space);
                assert_eq!(
                    decision,
                    SpaceDecision::stay(TransitionReason::PartialChord),
                    "{space} {notes:?}"
                );
            }
        }
    }

    #[test]
    fn par_exits_and_whitelist() {
        assert_eq!(decide(&[60, 64, 67], Space::Par).action, TransitionAction::Exit(Space::Home));
        assert_eq!(decide(&[65, 69, 72], Space::Par).action, TransitionAction::Exit(Space::Sub));
        // The base dominant is allowed in PAR.
        let decision = decide(&[67, 71, 74], Space::Par);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::RecognizedShape));
        let decision = decide(&[62, 66, 69], Space::Par);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::UnrecognizedChord));
    }

    #[test]
    fn rel_ignores_shapes() {
        let decision = decide(&[60, 63, 67], Space::Rel);
        assert_eq!(decision, SpaceDecision::stay(TransitionReason::GestureOnly));
    }

    #[test]
    fn triple_tap_counts_current_attack() {
        let timing = GestureTiming::default();
        let history = taps(HarmonicFunction::Submediant, &[0, 300]);
        assert!(history.completes_triple_tap(HarmonicFunction::Submediant, 600, timing));
        assert!(!history.completes_triple_tap(HarmonicFunction::Tonic, 600, timing));

        let two = taps(HarmonicFunction::Submediant, &[300]);
        assert!(!two.completes_triple_tap(HarmonicFunction::Submediant, 600, timing));
    }

    #[test]
    fn triple_tap_gap_and_window_bounds() {
        let timing = GestureTiming::default();
        // Gap of 501ms between first and second tap.
        let history = taps(HarmonicFunction::Submediant, &[0, 501]);
        assert!(!history.completes_triple_tap(HarmonicFunction::Submediant, 900, timing));
        // Exactly at the max gap is allowed.
        let history = taps(HarmonicFunction::Submediant, &[0, 500]);
        assert!(history.completes_triple_tap(HarmonicFunction::Submediant, 1000, timing));
        // Window shorter than the run.
        let tight = GestureTiming {
            window_ms: 800,
            max_gap_ms: 500,
        };
        assert!(!history.completes_triple_tap(HarmonicFunction::Submediant, 1000, tight));
    }

    #[test]
    fn interleaved_function_breaks_run() {
        let mut history = TapHistory::new();
        history.record(HarmonicFunction::Submediant, 0, 1500);
        history.record(HarmonicFunction::Tonic, 200, 1500);
        history.record(HarmonicFunction::Submediant, 400, 1500);
        assert!(!history.completes_triple_tap(
            HarmonicFunction::Submediant,
            600,
            GestureTiming::default()
        ));
    }

    #[test]
    fn history_prunes_old_taps() {
        let mut history = TapHistory::new();
        history.record(HarmonicFunction::Tonic, 0, 1500);
        history.record(HarmonicFunction::Tonic, 1000, 1500);
        history.record(HarmonicFunction::Tonic, 2000, 1500);
        assert_eq!(history.len(), 2);
        for t in 0..40 {
            history.record(HarmonicFunction::Tonic, 2000 + t, 1500);
        }
        assert_eq!(history.len(), MAX_TAPS);
    }

    #[test]
    fn gesture_table() {
        let chord = detect(&[57, 60, 64], KeyCenter::C);
        let history = taps(HarmonicFunction::Submediant, &[0, 300]);
        let decision = evaluate(
            &chord,
            chord.pitch_classes,
            0,
            Space::Home,
            &history,
            Some(HarmonicFunction::Submediant),
            600,
            GestureTiming::default(),
        );
        assert_eq!(
            decision,
            SpaceDecision {
                action: TransitionAction::Enter(Space::Rel),
                reason: TransitionReason::TripleTap,
            }
        );

        // Same taps without a fresh attack do not fire.
        let decision = evaluate(
            &chord,
            chord.pitch_classes,
            0,
            Space::Home,
            &history,
            None,
            600,
            GestureTiming::default(),
        );
        assert_eq!(decision.action, TransitionAction::Stay);

        // vi has no gesture in SUB.
        assert_eq!(gesture_target(Space::Sub, HarmonicFunction::Submediant), None);
        assert_eq!(
            gesture_target(Space::Par, HarmonicFunction::DominantOfRelative),
            Some(TransitionAction::Exit(Space::Home))
        );
    }
}
