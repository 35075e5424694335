//! One classification pass per held-note change.
//!
//! Detector -> mapper (effective key) -> transition evaluator (base key) ->
//! pivot re-mapping in the destination key when a transition fires ->
//! stability gate.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::detect::detect;
use crate::function_map::map_function;
use crate::pitch::KeyCenter;
use crate::stability::{is_extension, GateOutcome, StabilityState};
use crate::transition::{evaluate, GestureTiming, TapHistory};
use crate::types::{
    ChordShape, ClassifyResult, HarmonicFunction, Millis, Space, TransitionAction,
};

/// Per-session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub base_key: KeyCenter,
    /// Enables the V/ii and ii/vi bonus labels.
    pub bonus_wedges: bool,
    pub hysteresis_ms: Millis,
    pub gesture: GestureTiming,
    /// Keep the lit function when a triad grows into its own seventh chord.
    pub extension_merge: bool,
}

impl EngineConfig {
    pub fn new(base_key: KeyCenter) -> Self {
        Self {
            base_key,
            bonus_wedges: true,
            hysteresis_ms: 220,
            gesture: GestureTiming::default(),
            extension_merge: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(KeyCenter::C)
    }
}

/// The complete persistent state of one classifier session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub space: Space,
    pub taps: TapHistory,
    pub stability: StabilityState,
    /// Function of the previous input; a different function is a fresh attack.
    pub last_attack: Option<HarmonicFunction>,
    /// Function of the currently held chord, eligible for promotion by `poll`.
    pub held_candidate: Option<HarmonicFunction>,
    /// Shape of the chord that currently lights the confirmed function.
    pub lit_shape: Option<ChordShape>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Classify the held notes at `now_ms` and fold the outcome into `state`.
pub fn classify(
    state: &mut EngineState,
    config: &EngineConfig,
    held_notes: &[u8],
    now_ms: Millis,
) -> ClassifyResult {
    let base = config.base_key;
    let mut effective = state.space.effective_key(base);

    let mut chord = detect(held_notes, effective);
    let mut relative = chord.pitch_classes.relative_to(effective.tonic());
    let mut mapped = map_function(&chord, relative, effective.tonic(), config.bonus_wedges);

    let provisional = mapped.as_ref().map(|m| m.function);
    let tapped = provisional.filter(|&f| state.last_attack != Some(f));

    let base_relative = chord.pitch_classes.relative_to(base.tonic());
    let decision = evaluate(
        &chord,
        base_relative,
        base.tonic(),
        state.space,
        &state.taps,
        tapped,
        now_ms,
        config.gesture,
    );

    let transitioned = decision.action.is_transition();
    if let Some(target) = decision.action.target() {
        let from = state.space;
        state.space = target;
        effective = target.effective_key(base);

        // The pivot chord is heard in the destination key.
        chord = detect(held_notes, effective);
        relative = chord.pitch_classes.relative_to(effective.tonic());
        mapped = map_function(&chord, relative, effective.tonic(), config.bonus_wedges);
        state.taps.clear();

        debug!(
            %from,
            to = %target,
            reason = ?decision.reason,
            chord = %chord.name,
            provisional = ?provisional,
            pivot = ?mapped.as_ref().map(|m| m.function),
            "space transition"
        );
    }

    let function = mapped.as_ref().map(|m| m.function);
    if let Some(f) = function {
        if transitioned || state.last_attack != Some(f) {
            state.taps.record(f, now_ms, config.gesture.window_ms);
        }
    }
    state.last_attack = function;

    let outcome = gate(state, config, function, chord.shape(), chord.is_empty, transitioned, now_ms);

    let display_name = match &mapped {
        Some(m) => m.display_name.clone(),
        None => chord.name.clone(),
    };

    trace!(
        chord = %display_name,
        candidate = ?function,
        lit = ?outcome.stable_function,
        space = %state.space,
        action = %decision.action,
        "classified"
    );

    ClassifyResult {
        display_name,
        function: outcome.stable_function,
        is_bonus: outcome.stable_function.is_some_and(HarmonicFunction::is_bonus),
        candidate: function,
        action: decision.action,
        reason: decision.reason,
        space: state.space,
        effective_key: effective,
        should_update: outcome.should_update,
        chord,
        relative_pitch_classes: relative,
    }
}

/// Route the final function through the stability gate.
///
/// Silence clears. A held chord without a function leaves the lit function
/// and any pending candidate alone. A seventh grown from the lit triad
/// keeps the lit function for as long as it is held. `lit_shape` stays on
/// the triad and the held candidate becomes the lit function.
fn gate(
    state: &mut EngineState,
    config: &EngineConfig,
    function: Option<HarmonicFunction>,
    shape: Option<ChordShape>,
    is_empty: bool,
    transitioned: bool,
    now_ms: Millis,
) -> GateOutcome {
    if is_empty {
        state.held_candidate = None;
        state.lit_shape = None;
        return state.stability.apply(None, now_ms, config.hysteresis_ms);
    }

    let Some(function) = function else {
        state.held_candidate = None;
        state.lit_shape = None;
        return state.stability.unchanged();
    };

    let merges = config.extension_merge
        && !transitioned
        && state.stability.last_function.is_some()
        && is_extension(state.lit_shape, shape);
    if merges {
        trace!(%function, "extension merge keeps lit function");
        state.held_candidate = state.stability.last_function;
        return state.stability.hold();
    }

    state.held_candidate = Some(function);
    let outcome = state.stability.apply(Some(function), now_ms, config.hysteresis_ms);
    state.lit_shape = match outcome.stable_function {
        Some(lit) if lit == function => shape,
        _ => None,
    };
    outcome
}

/// A classifier session: configuration plus its own state.
#[derive(Debug, Clone, Default)]
pub struct HarmonyEngine {
    config: EngineConfig,
    state: EngineState,
}

impl HarmonyEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn space(&self) -> Space {
        self.state.space
    }

    /// Classify a new held-note set.
    pub fn process(&mut self, held_notes: &[u8], now_ms: Millis) -> ClassifyResult {
        classify(&mut self.state, &self.config, held_notes, now_ms)
    }

    /// Re-run the stability gate for the held chord without a note change.
    ///
    /// The core schedules nothing itself; callers poll while a chord is
    /// held so a pending function can graduate once the window has passed.
    pub fn poll(&mut self, now_ms: Millis) -> GateOutcome {
        match self.state.held_candidate {
            Some(function) => {
                let outcome =
                    self.state
                        .stability
                        .apply(Some(function), now_ms, self.config.hysteresis_ms);
                if outcome.should_update {
                    self.state.lit_shape = None;
                }
                outcome
            }
            None => self.state.stability.unchanged(),
        }
    }

    /// Switch the base key. The space returns to HOME and history is dropped.
    pub fn set_base_key(&mut self, key: KeyCenter) {
        if key != self.config.base_key {
            debug!(from = %self.config.base_key, to = %key, "base key changed");
            self.config.base_key = key;
            self.reset();
        }
    }

    pub fn set_bonus_wedges(&mut self, enabled: bool) {
        self.config.bonus_wedges = enabled;
    }

    pub fn reset(&mut self) {
        self.state = EngineState::new();
    }

    /// Apply an externally decided action, e.g. from a UI control.
    pub fn force_space(&mut self, action: TransitionAction) {
        if let Some(target) = action.target() {
            self.state.space = target;
            self.state.taps.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransitionReason;
    use pretty_assertions::assert_eq;
    use HarmonicFunction::*;

    fn engine() -> HarmonyEngine {
        HarmonyEngine::new(EngineConfig::new(KeyCenter::C))
    }

    #[test]
    fn empty_input_clears_and_stays() {
        let mut engine = engine();
        engine.process(&[60, 64, 67], 0);
        let result = engine.process(&[], 100);
        assert_eq!(result.function, None);
        assert!(result.should_update);
        assert_eq!(result.action, TransitionAction::Stay);
        assert_eq!(result.reason, TransitionReason::EmptyInput);
        assert_eq!(result.display_name, "");
        assert!(result.chord.is_empty);
    }

    #[test]
    fn illegal_chord_keeps_lit_function() {
        let mut engine = engine();
        engine.process(&[60, 64, 67], 0);
        let result = engine.process(&[61, 65, 68], 100);
        assert_eq!(result.candidate, None);
        assert_eq!(result.function, Some(Tonic));
        assert!(!result.should_update);
        assert_eq!(result.display_name, "Db");
        assert_eq!(result.space, Space::Home);
    }

    #[test]
    fn partial_release_keeps_lit_function() {
        let mut engine = engine();
        engine.process(&[60, 64, 67], 0);
        let result = engine.process(&[60, 64], 50);
        assert_eq!(result.function, Some(Tonic));
        assert!(!result.should_update);
    }

    #[test]
    fn holding_a_chord_is_not_a_tap() {
        let mut engine = engine();
        for t in [0, 100, 200, 300] {
            engine.process(&[57, 60, 64], t);
        }
        assert_eq!(engine.space(), Space::Home);
        assert_eq!(engine.state().taps.len(), 1);
    }

    #[test]
    fn poll_promotes_held_candidate() {
        let mut engine = engine();
        engine.process(&[60, 64, 67], 0);
        let result = engine.process(&[65, 69, 72], 1000);
        assert_eq!(result.function, Some(Tonic));
        assert_eq!(result.candidate, Some(Subdominant));

        assert!(!engine.poll(1100).should_update);
        let outcome = engine.poll(1220);
        assert!(outcome.should_update);
        assert_eq!(outcome.stable_function, Some(Subdominant));
        assert!(!engine.poll(1300).should_update);
    }

    #[test]
    fn poll_without_held_chord_is_inert() {
        let mut engine = engine();
        engine.process(&[60, 64, 67], 0);
        engine.process(&[], 10);
        assert_eq!(
            engine.poll(1000),
            GateOutcome {
                should_update: false,
                stable_function: None,
            }
        );
    }

    #[test]
    fn extension_merge_holds_lit_function() {
        let mut state = EngineState::new();
        let config = EngineConfig::default();
        state.stability.apply(Some(Tonic), 0, config.hysteresis_ms);
        state.lit_shape = Some(ChordShape {
            root: 0,
            quality: crate::types::Quality::Major,
        });
        let seventh = Some(ChordShape {
            root: 0,
            quality: crate::types::Quality::Major7,
        });

        let outcome = gate(&mut state, &config, Some(Submediant), seventh, false, false, 10);
        assert_eq!(outcome.stable_function, Some(Tonic));
        assert!(!outcome.should_update);
        assert_eq!(state.stability.pending_function, None);
        assert_eq!(state.held_candidate, Some(Tonic));
        assert_eq!(state.lit_shape.map(|s| s.quality), Some(crate::types::Quality::Major));

        let no_merge = EngineConfig {
            extension_merge: false,
            ..config
        };
        gate(&mut state, &no_merge, Some(Submediant), seventh, false, false, 20);
        assert_eq!(state.stability.pending_function, Some(Submediant));
    }

    #[test]
    fn merged_seventh_stays_merged_while_held() {
        // Bdim lights ii/vi; Bdim7 alone would map to V7.
        let b_dim = [59, 62, 65];
        let b_dim7 = [59, 62, 65, 68];
        let mut engine = engine();

        let first = engine.process(&b_dim, 0);
        assert_eq!(first.function, Some(SupertonicOfRelative));

        let grown = engine.process(&b_dim7, 100);
        assert_eq!(grown.candidate, Some(Dominant));
        assert_eq!(grown.function, Some(SupertonicOfRelative));
        assert!(!grown.should_update);

        let outcome = engine.poll(1000);
        assert!(!outcome.should_update);
        assert_eq!(outcome.stable_function, Some(SupertonicOfRelative));

        for t in [1100, 1320, 2000] {
            let repeat = engine.process(&b_dim7, t);
            assert_eq!(repeat.function, grown.function, "t={t}");
            assert!(!repeat.should_update, "t={t}");
        }
        assert!(!engine.poll(2500).should_update);

        // A fresh attack of the seventh is no longer a merge.
        engine.process(&[], 2600);
        let fresh = engine.process(&b_dim7, 2700);
        assert_eq!(fresh.function, Some(Dominant));
    }

    #[test]
    fn set_base_key_resets_session() {
        let mut engine = engine();
        engine.process(&[60, 63, 67], 0);
        assert_eq!(engine.space(), Space::Par);
        engine.set_base_key(KeyCenter::G);
        assert_eq!(engine.space(), Space::Home);
        assert_eq!(engine.state(), &EngineState::new());

        let result = engine.process(&[67, 71, 74], 100);
        assert_eq!(result.function, Some(Tonic));
    }

    #[test]
    fn bonus_flag_follows_lit_function() {
        let mut engine = engine();
        let result = engine.process(&[61, 64, 67], 0);
        assert_eq!(result.function, Some(DominantOfSupertonic));
        assert!(result.is_bonus);

        engine.set_bonus_wedges(false);
        engine.process(&[], 10);
        let result = engine.process(&[61, 64, 67], 20);
        assert_eq!(result.function, None);
        assert!(!result.is_bonus);
        assert_eq!(result.display_name, "C#dim");
    }

    #[test]
    fn force_space_moves_without_chord() {
        let mut engine = engine();
        engine.force_space(TransitionAction::Enter(Space::Rel));
        assert_eq!(engine.space(), Space::Rel);
        engine.force_space(TransitionAction::Stay);
        assert_eq!(engine.space(), Space::Rel);
    }
}
