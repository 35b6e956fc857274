//! Parameter smoothing primitives.
//!
//! Two smoother shapes cover every consumer in the engine:
//!
//! - [`LinearRamp`] — constant-rate ramp with a hard per-sample step bound.
//!   Used by the blend pipeline (where the zipper-noise bound is the
//!   contract) and for crossfade gains (exact arrival time matters).
//! - [`OnePoleLag`] — exponential lag. Used for per-connection modulation
//!   smoothing, where a natural RC-style settle is wanted and block-rate
//!   advancement must match per-sample advancement exactly.

use libm::{expf, powf};

/// Constant-rate smoother.
///
/// For any retarget, the per-sample change never exceeds
/// `|target - start| / (time_ms/1000 × sample_rate)`, which is the bound
/// that keeps parameter automation free of audible stepping.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    increment: f32,
    remaining: u32,
    sample_rate: f32,
    time_ms: f32,
}

impl LinearRamp {
    /// Ramp starting (settled) at `initial`.
    pub fn new(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            remaining: 0,
            sample_rate,
            time_ms,
        }
    }

    /// Update the sample rate. An in-flight ramp keeps its old increment;
    /// the next retarget uses the new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set the ramp time in milliseconds.
    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms;
    }

    /// Begin ramping toward `target`.
    ///
    /// Retargeting to the current target is a no-op, so repeated identical
    /// automation writes never restart the ramp.
    pub fn retarget(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 {
            return;
        }
        self.target = target;
        let samples = (self.time_ms / 1000.0 * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.remaining = samples;
        }
    }

    /// Jump to `value` with no ramp (preset resets).
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.current += self.increment;
            self.remaining -= 1;
            if self.remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Advance `n` samples at once, returning the value after the block.
    ///
    /// Equivalent to calling [`next`](Self::next) `n` times.
    pub fn advance_by(&mut self, n: u32) -> f32 {
        if self.remaining == 0 {
            return self.current;
        }
        if n >= self.remaining {
            self.current = self.target;
            self.remaining = 0;
        } else {
            self.current += self.increment * n as f32;
            self.remaining -= n;
        }
        self.current
    }

    /// Fill `out` with consecutive per-sample values.
    pub fn fill(&mut self, out: &mut [f32]) {
        for slot in out.iter_mut() {
            *slot = self.next();
        }
    }

    /// Current value without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once the ramp has arrived at its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }
}

/// One-pole exponential lag.
///
/// The block-rate method [`advance_by`](Self::advance_by) uses the closed
/// form `target + (current - target) * (1 - a)^n`, so advancing a whole
/// block in one call produces the same value as stepping per sample. The
/// modulation matrix relies on this to smooth each connection at block
/// rate without losing per-sample equivalence.
#[derive(Debug, Clone)]
pub struct OnePoleLag {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    time_ms: f32,
}

impl OnePoleLag {
    /// Lag settled at `initial`.
    pub fn new(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        let mut lag = Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate,
            time_ms,
        };
        lag.recalculate();
        lag
    }

    /// Update the sample rate and recompute the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Set the time constant in milliseconds (0 disables smoothing).
    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms;
        self.recalculate();
    }

    /// Set the value the lag settles toward.
    #[inline]
    pub fn retarget(&mut self, target: f32) {
        self.target = target;
    }

    /// Reset current and target to `value`.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Advance `n` samples in closed form.
    pub fn advance_by(&mut self, n: u32) -> f32 {
        if n > 0 {
            let decay = powf(1.0 - self.coeff, n as f32);
            self.current = self.target + (self.current - self.target) * decay;
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// True once within epsilon of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    fn recalculate(&mut self) {
        if self.time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}
