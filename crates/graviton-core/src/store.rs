//! Lock-free parameter store shared between the UI and audio threads.
//!
//! [`ParamStore`] holds the current value of every automatable parameter as
//! an atomic f32 bit pattern. The UI/host thread writes with `set()`; the
//! audio thread takes one [`ParamSnapshot`] per block and works from that.
//!
//! Relaxed ordering is sufficient: every consumed value goes through the
//! blend pipeline's ramp, so a one-block-stale read cannot produce an
//! audible discontinuity. The snapshot also sanitizes non-finite values to
//! the parameter default, which is the single trust boundary for host data.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::math::sanitize;
use crate::params::{PARAM_COUNT, ParamKey};

/// Per-block value snapshot of all parameters.
///
/// Plain copyable array, indexed by [`ParamKey`]. The sequence scheduler
/// overwrites entries in place before macro blending runs.
#[derive(Debug, Clone, Copy)]
pub struct ParamSnapshot {
    values: [f32; PARAM_COUNT],
}

impl ParamSnapshot {
    /// Snapshot with every parameter at its default.
    pub fn defaults() -> Self {
        let mut values = [0.0; PARAM_COUNT];
        for key in ParamKey::ALL {
            values[key.index()] = key.spec().default;
        }
        Self { values }
    }

    /// Value for one parameter.
    #[inline]
    pub fn get(&self, key: ParamKey) -> f32 {
        self.values[key.index()]
    }

    /// Overwrite one parameter (clamped to its range).
    #[inline]
    pub fn set(&mut self, key: ParamKey, value: f32) {
        self.values[key.index()] = key.spec().clamp(value);
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Atomic store of current parameter values.
///
/// Written by the UI/host thread, read by the audio thread. Values are
/// stored as f32 bit patterns in `AtomicU32` (f32 atomics do not exist).
pub struct ParamStore {
    values: [AtomicU32; PARAM_COUNT],
}

impl ParamStore {
    /// Store initialized to every parameter's default value.
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                AtomicU32::new(ParamKey::from_index(i).spec().default.to_bits())
            }),
        }
    }

    /// Set a parameter value (UI thread).
    ///
    /// The value is clamped to the parameter's declared range; non-finite
    /// input is replaced by the default before clamping.
    pub fn set(&self, key: ParamKey, value: f32) {
        let spec = key.spec();
        let clamped = spec.clamp(sanitize(value, spec.default));
        self.values[key.index()].store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Current value of a parameter.
    #[inline]
    pub fn get(&self, key: ParamKey) -> f32 {
        f32::from_bits(self.values[key.index()].load(Ordering::Relaxed))
    }

    /// Fill `out` with the current value of every parameter.
    ///
    /// Called once at the start of each audio block. Non-finite bit
    /// patterns (possible if a host writes raw automation data) are
    /// replaced with the parameter default.
    pub fn snapshot(&self, out: &mut ParamSnapshot) {
        for key in ParamKey::ALL {
            let raw = f32::from_bits(self.values[key.index()].load(Ordering::Relaxed));
            out.values[key.index()] = key.spec().clamp(sanitize(raw, key.spec().default));
        }
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}
