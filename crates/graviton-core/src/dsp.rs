//! Minimal delay-based DSP building blocks for the routing modules.
//!
//! The routing graph needs just enough signal processing to have something
//! real to route: a fractional delay line, a damped feedback comb, a
//! Schroeder allpass, and a one-pole tone filter. All buffers are sized at
//! construction (in `prepare`), never in the audio path.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::math::flush_denormal;

/// Fixed-capacity delay line with linear-interpolated fractional reads.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Delay line holding up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Push one sample.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read `delay` samples back from the write head, with linear
    /// interpolation for fractional delays. Delays beyond capacity clamp.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let clamped = delay.clamp(0.0, (len - 1) as f32);
        let whole = clamped as usize;
        let frac = clamped - whole as f32;

        let a = self.buffer[(self.write_pos + len - 1 - whole) % len];
        let b = self.buffer[(self.write_pos + 2 * len - 2 - whole) % len];
        a + (b - a) * frac
    }

    /// Maximum delay in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Feedback comb filter with one-pole damping in the loop.
#[derive(Debug, Clone)]
pub struct Comb {
    delay: DelayLine,
    delay_samples: f32,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl Comb {
    /// Comb with the given maximum and initial delay.
    pub fn new(capacity: usize, delay_samples: f32) -> Self {
        Self {
            delay: DelayLine::new(capacity),
            delay_samples,
            feedback: 0.5,
            damping: 0.2,
            filter_state: 0.0,
        }
    }

    /// Set the loop gain (clamped below 1 to stay stable).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.98);
    }

    /// Set in-loop damping (0 = bright, 1 = dark).
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    /// Set the active delay length in samples.
    pub fn set_delay_samples(&mut self, delay_samples: f32) {
        self.delay_samples = delay_samples.clamp(1.0, (self.delay.capacity() - 1) as f32);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.delay.read(self.delay_samples);
        self.filter_state = flush_denormal(out * (1.0 - self.damping) + self.filter_state * self.damping);
        self.delay.write(input + self.filter_state * self.feedback);
        out
    }

    /// Clear delay and filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.filter_state = 0.0;
    }
}

/// Schroeder allpass diffuser.
#[derive(Debug, Clone)]
pub struct Allpass {
    delay: DelayLine,
    delay_samples: f32,
    gain: f32,
}

impl Allpass {
    /// Allpass with the given maximum and initial delay.
    pub fn new(capacity: usize, delay_samples: f32) -> Self {
        Self {
            delay: DelayLine::new(capacity),
            delay_samples,
            gain: 0.5,
        }
    }

    /// Set the allpass coefficient.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(-0.98, 0.98);
    }

    /// Set the active delay length in samples.
    pub fn set_delay_samples(&mut self, delay_samples: f32) {
        self.delay_samples = delay_samples.clamp(1.0, (self.delay.capacity() - 1) as f32);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read(self.delay_samples);
        let feed = input + delayed * self.gain;
        self.delay.write(flush_denormal(feed));
        delayed - feed * self.gain
    }

    /// Clear delay state.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}

/// One-pole lowpass tone filter.
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
}

impl OnePole {
    /// Filter with cutoff coefficient in (0, 1]: 1 = bypass, small = dark.
    pub fn new(coeff: f32) -> Self {
        Self {
            state: 0.0,
            coeff: coeff.clamp(1.0e-4, 1.0),
        }
    }

    /// Set the cutoff coefficient.
    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(1.0e-4, 1.0);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(self.state + self.coeff * (input - self.state));
        self.state
    }

    /// Clear filter state.
    pub fn clear(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_line_integer_reads() {
        let mut delay = DelayLine::new(16);
        for i in 0..8 {
            delay.write(i as f32);
        }
        // delay=0 is the most recent write.
        assert_eq!(delay.read(0.0), 7.0);
        assert_eq!(delay.read(3.0), 4.0);
    }

    #[test]
    fn delay_line_fractional_interpolates() {
        let mut delay = DelayLine::new(16);
        delay.write(0.0);
        delay.write(1.0);
        let v = delay.read(0.5);
        assert!((v - 0.5).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn delay_line_clear() {
        let mut delay = DelayLine::new(8);
        delay.write(1.0);
        delay.clear();
        assert_eq!(delay.read(0.0), 0.0);
    }

    #[test]
    fn comb_is_stable() {
        let mut comb = Comb::new(128, 64.0);
        comb.set_feedback(0.9);
        comb.set_damping(0.3);
        for i in 0..10000 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let out = comb.process(input);
            assert!(out.is_finite());
            assert!(out.abs() < 10.0);
        }
    }

    #[test]
    fn comb_feedback_clamps() {
        let mut comb = Comb::new(64, 32.0);
        comb.set_feedback(5.0);
        for i in 0..50000 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let out = comb.process(input);
            assert!(out.abs() < 100.0, "runaway at sample {i}");
        }
    }

    #[test]
    fn allpass_passes_energy() {
        let mut ap = Allpass::new(64, 32.0);
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;
        for i in 0..4096 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let out = ap.process(input);
            energy_in += input * input;
            energy_out += out * out;
            assert!(out.is_finite());
        }
        // Allpass preserves energy to within rounding.
        assert!((energy_out - energy_in).abs() < 0.05, "in={energy_in} out={energy_out}");
    }

    #[test]
    fn one_pole_settles_to_dc() {
        let mut lp = OnePole::new(0.1);
        let mut out = 0.0;
        for _ in 0..500 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-3);
    }
}
