//! Modulation source generators.
//!
//! Four autonomous generators feed the modulation matrix. Each advances its
//! internal state exactly once per audio block (never per connection) and
//! exposes one or more bipolar axes in [-1, 1]:
//!
//! - [`ChaosAttractor`] — Lorenz system at control rate, axes x/y/z.
//! - [`AudioFollower`] — RMS and peak of the input with ballistics.
//! - [`BrownianMotion`] — bounded random walk, two independent axes.
//! - [`EnvelopeTracker`] — input level plus its block-to-block slope.
//!
//! Determinism: given the same seed/initial state and the same sequence of
//! [`BlockStats`], every generator reproduces the same axis values. The
//! random walk uses its own xorshift state rather than a shared RNG so a
//! preset reload replays identically.

use libm::expf;

/// Per-block input statistics, computed once by the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockStats {
    /// Root-mean-square level of the block, 0..1 for full-scale audio.
    pub rms: f32,
    /// Absolute peak of the block.
    pub peak: f32,
    /// Samples in the block.
    pub len: usize,
}

/// Lorenz attractor advanced at control rate.
///
/// The classic sigma/rho/beta system, integrated once per block with a
/// time step proportional to block duration. The orbit never repeats but
/// is fully deterministic from its initial state, which gives slow,
/// organic, correlated motion across the three axes.
#[derive(Debug, Clone)]
pub struct ChaosAttractor {
    x: f32,
    y: f32,
    z: f32,
    sample_rate: f32,
    /// Control-rate speed multiplier.
    rate: f32,
}

const LORENZ_SIGMA: f32 = 10.0;
const LORENZ_RHO: f32 = 28.0;
const LORENZ_BETA: f32 = 8.0 / 3.0;

impl ChaosAttractor {
    /// Attractor at its canonical starting point.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            x: 0.1,
            y: 0.0,
            z: 1.05,
            sample_rate,
            rate: 1.5,
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Advance the orbit by one block.
    pub fn advance_block(&mut self, stats: &BlockStats) {
        // Sub-step the integration: a single Euler step over a whole block
        // at large dt makes the orbit blow up.
        let block_secs = stats.len as f32 / self.sample_rate.max(1.0);
        let steps = 4;
        let dt = (block_secs * self.rate / steps as f32).min(0.02);
        for _ in 0..steps {
            let dx = LORENZ_SIGMA * (self.y - self.x);
            let dy = self.x * (LORENZ_RHO - self.z) - self.y;
            let dz = self.x * self.y - LORENZ_BETA * self.z;
            self.x += dx * dt;
            self.y += dy * dt;
            self.z += dz * dt;
        }
    }

    /// Axis value in [-1, 1]. Axis 0 = x, 1 = y, 2 = z; out-of-range
    /// indices clamp to z.
    pub fn axis(&self, index: usize) -> f32 {
        let v = match index {
            0 => self.x / 20.0,
            1 => self.y / 27.0,
            _ => (self.z - LORENZ_RHO) / 27.0,
        };
        v.clamp(-1.0, 1.0)
    }

    /// Restore the canonical starting point.
    pub fn reset(&mut self) {
        self.x = 0.1;
        self.y = 0.0;
        self.z = 1.05;
    }
}

/// Input level follower with attack/release ballistics.
///
/// Tracks block RMS and block peak through separate one-pole stages so a
/// connection can choose between the smooth loudness contour (axis 0) and
/// the snappier transient contour (axis 1). Both axes are mapped from
/// unipolar level to bipolar [-1, 1].
#[derive(Debug, Clone)]
pub struct AudioFollower {
    rms_state: f32,
    peak_state: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: f32,
}

impl AudioFollower {
    /// Follower with 15 ms attack / 200 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            rms_state: 0.0,
            peak_state: 0.0,
            attack_ms: 15.0,
            release_ms: 200.0,
            sample_rate,
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Advance both followers by one block.
    pub fn advance_block(&mut self, stats: &BlockStats) {
        let block_secs = stats.len as f32 / self.sample_rate.max(1.0);
        self.rms_state = follow(self.rms_state, stats.rms, block_secs, self.attack_ms, self.release_ms);
        self.peak_state = follow(
            self.peak_state,
            stats.peak,
            block_secs,
            self.attack_ms * 0.25,
            self.release_ms,
        );
    }

    /// Axis 0 = RMS contour, axis 1 = peak contour, both in [-1, 1].
    pub fn axis(&self, index: usize) -> f32 {
        let level = if index == 0 { self.rms_state } else { self.peak_state };
        (level.clamp(0.0, 1.0) * 2.0 - 1.0).clamp(-1.0, 1.0)
    }

    /// Clear both followers.
    pub fn reset(&mut self) {
        self.rms_state = 0.0;
        self.peak_state = 0.0;
    }
}

/// One block of attack/release following at block rate.
fn follow(state: f32, input: f32, block_secs: f32, attack_ms: f32, release_ms: f32) -> f32 {
    let tau_ms = if input > state { attack_ms } else { release_ms };
    let tau = (tau_ms / 1000.0).max(1.0e-4);
    let a = 1.0 - expf(-block_secs / tau);
    state + a * (input - state)
}

/// Bounded random walk with two independent axes.
///
/// Each block, every axis takes a small uniform step and reflects off the
/// ±1 boundaries. State is a private xorshift32 word, so the walk is
/// reproducible from its seed regardless of what else uses randomness.
#[derive(Debug, Clone)]
pub struct BrownianMotion {
    axes: [f32; 2],
    rng_state: u32,
    /// Step scale per block, in axis units.
    step: f32,
}

impl BrownianMotion {
    /// Walk seeded with `seed` (0 is remapped to a fixed nonzero word).
    pub fn new(seed: u32) -> Self {
        Self {
            axes: [0.0; 2],
            rng_state: if seed == 0 { 0x9E37_79B9 } else { seed },
            step: 0.02,
        }
    }

    /// Advance both axes by one block.
    pub fn advance_block(&mut self, _stats: &BlockStats) {
        for axis in &mut self.axes {
            let r = xorshift32(&mut self.rng_state);
            // Uniform in [-1, 1].
            let unit = (r as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let mut next = *axis + unit * self.step;
            if next > 1.0 {
                next = 2.0 - next;
            } else if next < -1.0 {
                next = -2.0 - next;
            }
            *axis = next.clamp(-1.0, 1.0);
        }
    }

    /// Axis value in [-1, 1]; indices past the last axis clamp.
    pub fn axis(&self, index: usize) -> f32 {
        self.axes[index.min(self.axes.len() - 1)]
    }

    /// Return both axes to zero (keeps the RNG sequence position).
    pub fn reset(&mut self) {
        self.axes = [0.0; 2];
    }
}

#[inline]
fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

/// Envelope tracker producing level and slope axes.
///
/// Axis 0 is a bipolar-mapped attack/release envelope of the input peak.
/// Axis 1 is the normalized block-to-block slope of that envelope, which
/// leads transients: positive while the input swells, negative while it
/// decays.
#[derive(Debug, Clone)]
pub struct EnvelopeTracker {
    level: f32,
    prev_level: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: f32,
}

impl EnvelopeTracker {
    /// Tracker with 5 ms attack / 120 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            level: 0.0,
            prev_level: 0.0,
            attack_ms: 5.0,
            release_ms: 120.0,
            sample_rate,
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Advance by one block.
    pub fn advance_block(&mut self, stats: &BlockStats) {
        let block_secs = stats.len as f32 / self.sample_rate.max(1.0);
        self.prev_level = self.level;
        self.level = follow(self.level, stats.peak, block_secs, self.attack_ms, self.release_ms);
    }

    /// Axis 0 = level, axis 1 = slope, both in [-1, 1].
    pub fn axis(&self, index: usize) -> f32 {
        if index == 0 {
            (self.level.clamp(0.0, 1.0) * 2.0 - 1.0).clamp(-1.0, 1.0)
        } else {
            // Slope per block, scaled so a full swing over ~10 blocks pins
            // the axis.
            ((self.level - self.prev_level) * 10.0).clamp(-1.0, 1.0)
        }
    }

    /// Clear the envelope.
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.prev_level = 0.0;
    }
}
