//! Minimum-dwell hysteresis for the lit function.
//!
//! A changed function is shown only after it has been the sole candidate
//! for the hysteresis window, so notes passing through on the way to the
//! next chord don't flash their own function.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ChordShape, HarmonicFunction, Millis};

/// Confirmed and pending functions for one session.
///
/// `pending_function` never equals `last_function` while both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityState {
    /// The lit function.
    pub last_function: Option<HarmonicFunction>,
    pub last_change_ms: Millis,
    /// Candidate waiting out the hysteresis window.
    pub pending_function: Option<HarmonicFunction>,
    pub pending_since_ms: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub should_update: bool,
    pub stable_function: Option<HarmonicFunction>,
}

impl StabilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lit function with no change requested.
    pub fn unchanged(&self) -> GateOutcome {
        GateOutcome {
            should_update: false,
            stable_function: self.last_function,
        }
    }

    /// Run one candidate through the gate at `now_ms`.
    ///
    /// `None` clears at once. The first function after silence is confirmed
    /// at once; hysteresis only guards changes between two real functions.
    pub fn apply(
        &mut self,
        candidate: Option<HarmonicFunction>,
        now_ms: Millis,
        hysteresis_ms: Millis,
    ) -> GateOutcome {
        let Some(candidate) = candidate else {
            self.last_function = None;
            self.last_change_ms = now_ms;
            self.pending_function = None;
            return GateOutcome {
                should_update: true,
                stable_function: None,
            };
        };

        if self.last_function == Some(candidate) {
            self.pending_function = None;
            return self.unchanged();
        }

        if self.last_function.is_none() {
            return self.confirm(candidate, now_ms);
        }

        if self.pending_function != Some(candidate) {
            self.pending_function = Some(candidate);
            self.pending_since_ms = now_ms;
        }

        if now_ms.saturating_sub(self.pending_since_ms) >= hysteresis_ms {
            debug!(
                from = ?self.last_function,
                to = %candidate,
                held_ms = now_ms.saturating_sub(self.pending_since_ms),
                "hysteresis passed"
            );
            return self.confirm(candidate, now_ms);
        }

        self.unchanged()
    }

    /// Keep the lit function and drop any pending candidate.
    pub fn hold(&mut self) -> GateOutcome {
        self.pending_function = None;
        self.unchanged()
    }

    fn confirm(&mut self, function: HarmonicFunction, now_ms: Millis) -> GateOutcome {
        self.last_function = Some(function);
        self.last_change_ms = now_ms;
        self.pending_function = None;
        GateOutcome {
            should_update: true,
            stable_function: Some(function),
        }
    }
}

/// Whether `current` is the seventh-chord form of the `previous` triad on
/// the same root, e.g. C followed by Cmaj7 or C7.
pub fn is_extension(previous: Option<ChordShape>, current: Option<ChordShape>) -> bool {
    match (previous, current) {
        (Some(prev), Some(cur)) => prev.root == cur.root && cur.quality.extends(prev.quality),
        _ => false,
    }
}
