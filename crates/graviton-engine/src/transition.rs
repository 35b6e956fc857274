//! Preset transition controller: fade out, reset under silence, fade in.
//!
//! Every full-state change (preset load, topology switch) is wrapped in
//! this sequence so stateful DSP is never cleared while audible. The
//! controller only owns the gain envelope; the engine performs the actual
//! reset when [`take_reset_due`](PresetTransition::take_reset_due) fires.

use graviton_core::LinearRamp;

/// Transition fade length, each direction.
pub const TRANSITION_FADE_MS: f32 = 60.0;

/// Where the transition state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    /// No transition; gain is unity.
    #[default]
    Idle,
    /// Gain ramping toward silence.
    FadingOut,
    /// State has been reset; gain ramping back to unity.
    FadingIn,
}

/// Gain envelope around full-state changes.
pub struct PresetTransition {
    phase: TransitionPhase,
    gain: LinearRamp,
    reset_due: bool,
}

impl PresetTransition {
    /// Idle controller at unity gain.
    pub fn new() -> Self {
        Self {
            phase: TransitionPhase::Idle,
            gain: LinearRamp::new(1.0, 48000.0, TRANSITION_FADE_MS),
            reset_due: false,
        }
    }

    /// Configure for the session sample rate. Resets to idle/unity.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.gain = LinearRamp::new(1.0, sample_rate, TRANSITION_FADE_MS);
        self.phase = TransitionPhase::Idle;
        self.reset_due = false;
    }

    /// Begin (or restart) a transition.
    ///
    /// A request while already fading restarts the fade-out from the
    /// current gain, so gain never jumps above its present level. A pending
    /// reset that has not been consumed yet stays pending.
    pub fn request(&mut self) {
        self.phase = TransitionPhase::FadingOut;
        self.gain.retarget(0.0);
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Current gain value.
    pub fn gain(&self) -> f32 {
        self.gain.value()
    }

    /// Whether a transition is in flight.
    pub fn is_active(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    /// Advance the state machine at a block boundary.
    ///
    /// Returns `true` exactly once per transition, at the moment gain has
    /// settled at silence: the caller must reset DSP state now, before the
    /// fade-in starts.
    pub fn take_reset_due(&mut self) -> bool {
        match self.phase {
            TransitionPhase::FadingOut if self.gain.is_settled() && self.gain.value() == 0.0 => {
                self.phase = TransitionPhase::FadingIn;
                self.gain.retarget(1.0);
                self.reset_due = true;
            }
            TransitionPhase::FadingIn if self.gain.is_settled() => {
                self.phase = TransitionPhase::Idle;
            }
            _ => {}
        }
        core::mem::take(&mut self.reset_due)
    }

    /// Apply the per-sample transition gain to a stereo block. Unity (and
    /// ramp-free) when idle.
    pub fn apply_gain(&mut self, left: &mut [f32], right: &mut [f32]) {
        if self.phase == TransitionPhase::Idle {
            return;
        }
        let n = left.len().min(right.len());
        for i in 0..n {
            let gain = self.gain.next();
            left[i] *= gain;
            right[i] *= gain;
        }
    }
}

impl Default for PresetTransition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = 128;

    fn run_block(t: &mut PresetTransition) -> (bool, f32) {
        let reset = t.take_reset_due();
        let mut l = [1.0f32; BLOCK];
        let mut r = [1.0f32; BLOCK];
        t.apply_gain(&mut l, &mut r);
        let peak = l.iter().fold(0.0f32, |p, s| p.max(s.abs()));
        (reset, peak)
    }

    #[test]
    fn idle_is_unity_and_never_resets() {
        let mut t = PresetTransition::new();
        t.prepare(48000.0);
        for _ in 0..10 {
            let (reset, peak) = run_block(&mut t);
            assert!(!reset);
            assert_eq!(peak, 1.0);
        }
    }

    #[test]
    fn full_cycle_fades_resets_once_then_returns_to_unity() {
        let mut t = PresetTransition::new();
        t.prepare(48000.0);
        t.request();

        let mut resets = 0;
        let mut max_peak: f32 = 0.0;
        for _ in 0..100 {
            let (reset, peak) = run_block(&mut t);
            if reset {
                resets += 1;
                // Reset fires only once gain has settled at silence.
                assert_eq!(t.phase(), TransitionPhase::FadingIn);
            }
            max_peak = max_peak.max(peak);
            if !t.is_active() {
                break;
            }
        }
        assert_eq!(resets, 1);
        assert_eq!(t.phase(), TransitionPhase::Idle);
        // Never exceeds the pre-fade amplitude.
        assert!(max_peak <= 1.0 + 1e-6);

        let (_, peak) = run_block(&mut t);
        assert_eq!(peak, 1.0);
    }

    #[test]
    fn second_request_mid_fade_restarts_without_spike() {
        let mut t = PresetTransition::new();
        t.prepare(48000.0);
        t.request();

        // Part-way down, ask again.
        for _ in 0..5 {
            run_block(&mut t);
        }
        let gain_at_rerequest = t.gain();
        t.request();
        assert_eq!(t.phase(), TransitionPhase::FadingOut);
        assert!(t.gain() <= gain_at_rerequest + 1e-6);

        let mut resets = 0;
        for _ in 0..120 {
            let (reset, peak) = run_block(&mut t);
            if reset {
                resets += 1;
            }
            assert!(peak <= 1.0 + 1e-6);
            if !t.is_active() {
                break;
            }
        }
        assert_eq!(resets, 1);
        assert_eq!(t.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn request_during_fade_in_fades_back_out_from_current_gain() {
        let mut t = PresetTransition::new();
        t.prepare(48000.0);
        t.request();

        // Drive to the fade-in phase.
        let mut reached_fade_in = false;
        for _ in 0..60 {
            run_block(&mut t);
            if t.phase() == TransitionPhase::FadingIn {
                reached_fade_in = true;
                break;
            }
        }
        assert!(reached_fade_in);

        // Partial fade-in, then a new request.
        for _ in 0..5 {
            run_block(&mut t);
        }
        let gain = t.gain();
        assert!(gain > 0.0 && gain < 1.0);
        t.request();
        assert_eq!(t.phase(), TransitionPhase::FadingOut);

        // Completes a second full cycle with exactly one more reset.
        let mut resets = 0;
        for _ in 0..120 {
            let (reset, _) = run_block(&mut t);
            if reset {
                resets += 1;
            }
            if !t.is_active() {
                break;
            }
        }
        assert_eq!(resets, 1);
    }
}
