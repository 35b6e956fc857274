//! Parameter smoothing and blend pipeline.
//!
//! Reconciles the competing value sources for every parameter into one
//! coherent, zipper-free value per block (or per sample for the hot
//! parameters). Order per block, per parameter:
//!
//! 1. blend: `target = lerp(user, macro_target, influence)` — lerping
//!    *before* smoothing is what keeps macros and manual edits from
//!    fighting (at influence 0 the user value passes through exactly);
//! 2. smooth: one [`LinearRamp`] per parameter advances toward the target;
//! 3. modulate: the matrix offset (scaled by the parameter's span) is
//!    added *after* smoothing;
//! 4. clamp to the parameter's declared range.
//!
//! The eight hot parameters are ramped per sample into reusable buffers
//! sized at [`MAX_BLOCK_SIZE`]; the rest advance at block rate. A settled
//! bitmask skips ramps that have arrived — a pure performance cache that
//! never changes observable output.

use graviton_core::{LinearRamp, PARAM_COUNT, ParamKey, ParamSnapshot, lerp};

use crate::macros::MacroTargets;

/// Largest block `prepare` will size the per-sample buffers for.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Number of per-sample ("hot") parameters: the first eight table entries.
pub const HOT_PARAM_COUNT: usize = 8;

/// The smoothing/blend pipeline.
pub struct BlendPipeline {
    ramps: [LinearRamp; PARAM_COUNT],
    /// Per-sample buffers for the hot parameters, post-modulation.
    hot: [Vec<f32>; HOT_PARAM_COUNT],
    /// Post-smoothing, pre-modulation block values.
    smoothed: [f32; PARAM_COUNT],
    /// Post-modulation, clamped block values.
    finals: [f32; PARAM_COUNT],
    /// Bit i set while parameter i's ramp is still moving.
    active: u32,
    block_len: usize,
}

impl BlendPipeline {
    /// Pipeline with every parameter settled at its default.
    pub fn new() -> Self {
        let ramps = core::array::from_fn(|i| {
            let spec = ParamKey::from_index(i).spec();
            LinearRamp::new(spec.default, 48000.0, spec.smoothing_ms)
        });
        let mut finals = [0.0; PARAM_COUNT];
        for key in ParamKey::ALL {
            finals[key.index()] = key.spec().default;
        }
        Self {
            ramps,
            hot: core::array::from_fn(|_| Vec::new()),
            smoothed: finals,
            finals,
            active: 0,
            block_len: 0,
        }
    }

    /// Size buffers and configure ramp rates. Allocation happens here and
    /// never in the per-block path.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        let block = block_size.min(MAX_BLOCK_SIZE);
        for (i, ramp) in self.ramps.iter_mut().enumerate() {
            ramp.set_sample_rate(sample_rate);
            ramp.set_time_ms(ParamKey::from_index(i).spec().smoothing_ms);
        }
        for buf in &mut self.hot {
            buf.resize(block, 0.0);
        }
        self.block_len = block;
    }

    /// Blend user values against macro targets and retarget every ramp.
    ///
    /// `snapshot` already carries any sequence overrides; `influence` is
    /// the macro system's authority for this block.
    pub fn retarget(&mut self, snapshot: &ParamSnapshot, targets: &MacroTargets, influence: f32) {
        for key in ParamKey::ALL {
            let user = snapshot.get(key);
            let target = match targets.get(key) {
                Some(macro_target) => lerp(user, macro_target, influence),
                None => user,
            };
            self.ramps[key.index()].retarget(key.spec().clamp(target));
        }
    }

    /// Advance all ramps by `num_samples`.
    ///
    /// Hot parameters fill their per-sample buffers; the rest advance in
    /// one step. Settled ramps skip the per-sample loop via the activity
    /// mask (observable output is identical either way).
    pub fn advance(&mut self, num_samples: usize) {
        let n = num_samples.min(self.block_len);
        self.active = 0;
        for key in ParamKey::ALL {
            let i = key.index();
            let ramp = &mut self.ramps[i];
            if i < HOT_PARAM_COUNT {
                let buf = &mut self.hot[i][..n];
                if ramp.is_settled() {
                    buf.fill(ramp.value());
                } else {
                    ramp.fill(buf);
                }
            } else {
                ramp.advance_by(n as u32);
            }
            self.smoothed[i] = ramp.value();
            if !ramp.is_settled() {
                self.active |= 1 << i;
            }
        }
    }

    /// Add matrix offsets (scaled by each parameter's span) and clamp.
    ///
    /// Must run after [`advance`](Self::advance); offsets are block-rate
    /// constants so hot buffers shift uniformly.
    pub fn apply_modulation(&mut self, offsets: &[f32; PARAM_COUNT]) {
        for key in ParamKey::ALL {
            let i = key.index();
            let spec = key.spec();
            let offset = offsets[i] * spec.span();
            self.finals[i] = spec.clamp(self.smoothed[i] + offset);
            if i < HOT_PARAM_COUNT {
                for sample in &mut self.hot[i] {
                    *sample = spec.clamp(*sample + offset);
                }
            }
        }
    }

    /// Final block-rate value for a parameter (post modulation and clamp).
    #[inline]
    pub fn value(&self, key: ParamKey) -> f32 {
        self.finals[key.index()]
    }

    /// Per-sample values for a hot parameter; `None` for block-rate ones.
    pub fn samples(&self, key: ParamKey) -> Option<&[f32]> {
        let i = key.index();
        if i < HOT_PARAM_COUNT {
            Some(&self.hot[i])
        } else {
            None
        }
    }

    /// Whether a parameter's ramp is still moving. Performance metadata
    /// only — never part of the value contract.
    pub fn is_active(&self, key: ParamKey) -> bool {
        self.active & (1 << key.index()) != 0
    }

    /// Snap every ramp directly to the snapshot's values (preset resets,
    /// executed only while the transition controller holds silence).
    pub fn snap_to(&mut self, snapshot: &ParamSnapshot) {
        for key in ParamKey::ALL {
            let i = key.index();
            let v = key.spec().clamp(snapshot.get(key));
            self.ramps[i].snap(v);
            self.smoothed[i] = v;
            self.finals[i] = v;
        }
        self.active = 0;
        for buf in &mut self.hot {
            let len = buf.len();
            buf.clear();
            buf.resize(len, 0.0);
        }
        for key in ParamKey::ALL.iter().take(HOT_PARAM_COUNT) {
            let v = self.finals[key.index()];
            self.hot[key.index()].fill(v);
        }
    }
}

impl Default for BlendPipeline {
    fn default() -> Self {
        Self::new()
    }
}
