//! The six routable DSP modules.
//!
//! Each module is deliberately small: a handful of combs, allpasses and
//! delay reads from `graviton-core`. The interesting part is the contract —
//! `prepare` allocates everything up front, `push_params` consumes the
//! pipeline's finished values once per block (scalars for most parameters,
//! per-sample buffers for the hot ones), and `process` mutates the stereo
//! block in place with no allocation.

use graviton_core::{Allpass, Comb, DelayLine, OnePole, ParamKey};

use crate::pipeline::BlendPipeline;

/// Identifies one routable module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Feedback comb tank, the body of the reverberant field.
    Tank,
    /// Series allpass diffuser.
    Diffuser,
    /// Short tuned combs for metallic character.
    Resonator,
    /// Scattered multi-tap delay reads.
    Grains,
    /// Pitch-bending modulated delay.
    Warp,
    /// Long late-field feedback wash.
    Bloom,
}

impl ModuleKind {
    /// Every module, in declaration order.
    pub const ALL: [ModuleKind; 6] = [
        ModuleKind::Tank,
        ModuleKind::Diffuser,
        ModuleKind::Resonator,
        ModuleKind::Grains,
        ModuleKind::Warp,
        ModuleKind::Bloom,
    ];

    /// Index into a per-module storage array, declaration order.
    pub const fn index(self) -> usize {
        match self {
            ModuleKind::Tank => 0,
            ModuleKind::Diffuser => 1,
            ModuleKind::Resonator => 2,
            ModuleKind::Grains => 3,
            ModuleKind::Warp => 4,
            ModuleKind::Bloom => 5,
        }
    }

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Tank => "tank",
            ModuleKind::Diffuser => "diffuser",
            ModuleKind::Resonator => "resonator",
            ModuleKind::Grains => "grains",
            ModuleKind::Warp => "warp",
            ModuleKind::Bloom => "bloom",
        }
    }
}

/// One block's finished parameter values, as seen by the modules.
///
/// Thin view over the pipeline: scalars for block-rate parameters,
/// per-sample slices for the hot ones, both post-modulation and clamped.
pub struct BlockParams<'a> {
    pipeline: &'a BlendPipeline,
    num_samples: usize,
}

impl<'a> BlockParams<'a> {
    /// View for one block of `num_samples`.
    pub fn new(pipeline: &'a BlendPipeline, num_samples: usize) -> Self {
        Self {
            pipeline,
            num_samples,
        }
    }

    /// Block-rate value for any parameter.
    #[inline]
    pub fn value(&self, key: ParamKey) -> f32 {
        self.pipeline.value(key)
    }

    /// Per-sample values for a hot parameter, trimmed to the block length.
    pub fn samples(&self, key: ParamKey) -> Option<&[f32]> {
        self.pipeline
            .samples(key)
            .map(|s| &s[..self.num_samples.min(s.len())])
    }

    /// Samples in this block.
    pub fn len(&self) -> usize {
        self.num_samples
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }
}

/// A routable DSP module.
pub trait DspModule: Send {
    /// Which module this is.
    fn kind(&self) -> ModuleKind;

    /// Allocate internal buffers for the session format.
    fn prepare(&mut self, sample_rate: f32, block_size: usize);

    /// Clear all internal state (delay lines, filters).
    fn reset(&mut self);

    /// Consume this block's parameter values. Called once per block before
    /// [`process`](Self::process); hot buffers are copied here because the
    /// pipeline's borrow does not outlive the call.
    fn push_params(&mut self, params: &BlockParams<'_>);

    /// Process one stereo block in place.
    fn process(&mut self, left: &mut [f32], right: &mut [f32]);
}

fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Feedback comb tank. Four parallel combs per channel with mutually prime
/// delay ratios; loop gain follows the per-sample `Time` buffer.
pub struct TankModule {
    combs_l: Vec<Comb>,
    combs_r: Vec<Comb>,
    time_buf: Vec<f32>,
    block_len: usize,
    mass: f32,
    damping: f32,
    sample_rate: f32,
}

/// Base comb delays in ms, mutually prime-ish so modes don't stack.
const TANK_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
/// Right channel offset keeps the image decorrelated.
const TANK_SPREAD_MS: f32 = 0.6;

impl TankModule {
    /// Unprepared tank.
    pub fn new() -> Self {
        Self {
            combs_l: Vec::new(),
            combs_r: Vec::new(),
            time_buf: Vec::new(),
            block_len: 0,
            mass: 0.5,
            damping: 0.3,
            sample_rate: 48000.0,
        }
    }
}

impl Default for TankModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for TankModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Tank
    }

    fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        self.sample_rate = sample_rate;
        let cap = ms_to_samples(TANK_DELAYS_MS[3] * 2.0 + TANK_SPREAD_MS, sample_rate) as usize + 4;
        self.combs_l = TANK_DELAYS_MS
            .iter()
            .map(|&ms| Comb::new(cap, ms_to_samples(ms, sample_rate)))
            .collect();
        self.combs_r = TANK_DELAYS_MS
            .iter()
            .map(|&ms| Comb::new(cap, ms_to_samples(ms + TANK_SPREAD_MS, sample_rate)))
            .collect();
        self.time_buf = vec![0.0; block_size];
    }

    fn reset(&mut self) {
        for comb in self.combs_l.iter_mut().chain(&mut self.combs_r) {
            comb.clear();
        }
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        self.mass = params.value(ParamKey::Mass);
        self.damping = 1.0 - params.value(ParamKey::Tone);
        if let Some(time) = params.samples(ParamKey::Time) {
            let n = time.len().min(self.time_buf.len());
            self.time_buf[..n].copy_from_slice(&time[..n]);
            self.block_len = n;
        }
        // Delay scale and damping move at block rate.
        let scale = 0.5 + self.mass;
        for (i, (l, r)) in self.combs_l.iter_mut().zip(&mut self.combs_r).enumerate() {
            l.set_delay_samples(ms_to_samples(TANK_DELAYS_MS[i] * scale, self.sample_rate));
            r.set_delay_samples(ms_to_samples(
                (TANK_DELAYS_MS[i] + TANK_SPREAD_MS) * scale,
                self.sample_rate,
            ));
            l.set_damping(self.damping);
            r.set_damping(self.damping);
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len()).min(self.block_len);
        for i in 0..n {
            let feedback = 0.55 + self.time_buf[i] * 0.43;
            let mut wet_l = 0.0;
            let mut wet_r = 0.0;
            for (cl, cr) in self.combs_l.iter_mut().zip(&mut self.combs_r) {
                cl.set_feedback(feedback);
                cr.set_feedback(feedback);
                wet_l += cl.process(left[i]);
                wet_r += cr.process(right[i]);
            }
            left[i] = left[i] * 0.4 + wet_l * 0.25;
            right[i] = right[i] * 0.4 + wet_r * 0.25;
        }
    }
}

/// Series allpass diffuser; density controls the allpass coefficient,
/// shape spreads the stage delays.
pub struct DiffuserModule {
    stages_l: Vec<Allpass>,
    stages_r: Vec<Allpass>,
    density_buf: Vec<f32>,
    block_len: usize,
    sample_rate: f32,
}

const DIFFUSER_DELAYS_MS: [f32; 4] = [4.7, 3.6, 12.7, 9.3];

impl DiffuserModule {
    /// Unprepared diffuser.
    pub fn new() -> Self {
        Self {
            stages_l: Vec::new(),
            stages_r: Vec::new(),
            density_buf: Vec::new(),
            block_len: 0,
            sample_rate: 48000.0,
        }
    }
}

impl Default for DiffuserModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for DiffuserModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Diffuser
    }

    fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        self.sample_rate = sample_rate;
        let cap = ms_to_samples(DIFFUSER_DELAYS_MS[2] * 2.0, sample_rate) as usize + 4;
        self.stages_l = DIFFUSER_DELAYS_MS
            .iter()
            .map(|&ms| Allpass::new(cap, ms_to_samples(ms, sample_rate)))
            .collect();
        self.stages_r = DIFFUSER_DELAYS_MS
            .iter()
            .map(|&ms| Allpass::new(cap, ms_to_samples(ms * 1.07, sample_rate)))
            .collect();
        self.density_buf = vec![0.0; block_size];
    }

    fn reset(&mut self) {
        for stage in self.stages_l.iter_mut().chain(&mut self.stages_r) {
            stage.clear();
        }
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        if let Some(density) = params.samples(ParamKey::Density) {
            let n = density.len().min(self.density_buf.len());
            self.density_buf[..n].copy_from_slice(&density[..n]);
            self.block_len = n;
        }
        let shape = params.value(ParamKey::Shape);
        let spread = 0.8 + shape * 0.6;
        for (i, (l, r)) in self.stages_l.iter_mut().zip(&mut self.stages_r).enumerate() {
            l.set_delay_samples(ms_to_samples(DIFFUSER_DELAYS_MS[i] * spread, self.sample_rate));
            r.set_delay_samples(ms_to_samples(
                DIFFUSER_DELAYS_MS[i] * 1.07 * spread,
                self.sample_rate,
            ));
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len()).min(self.block_len);
        for i in 0..n {
            let gain = 0.3 + self.density_buf[i] * 0.5;
            let mut l = left[i];
            let mut r = right[i];
            for (sl, sr) in self.stages_l.iter_mut().zip(&mut self.stages_r) {
                sl.set_gain(gain);
                sr.set_gain(gain);
                l = sl.process(l);
                r = sr.process(r);
            }
            left[i] = l;
            right[i] = r;
        }
    }
}

/// Two short tuned combs per channel for metallic resonance.
pub struct ResonatorModule {
    combs_l: Vec<Comb>,
    combs_r: Vec<Comb>,
    sample_rate: f32,
    gravity: f32,
    mix: f32,
}

const RESONATOR_DELAYS_MS: [f32; 2] = [2.9, 5.3];

impl ResonatorModule {
    /// Unprepared resonator.
    pub fn new() -> Self {
        Self {
            combs_l: Vec::new(),
            combs_r: Vec::new(),
            sample_rate: 48000.0,
            gravity: 0.0,
            mix: 0.0,
        }
    }
}

impl Default for ResonatorModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for ResonatorModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Resonator
    }

    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = sample_rate;
        let cap = ms_to_samples(RESONATOR_DELAYS_MS[1] * 3.0, sample_rate) as usize + 4;
        self.combs_l = RESONATOR_DELAYS_MS
            .iter()
            .map(|&ms| Comb::new(cap, ms_to_samples(ms, sample_rate)))
            .collect();
        self.combs_r = RESONATOR_DELAYS_MS
            .iter()
            .map(|&ms| Comb::new(cap, ms_to_samples(ms * 1.04, sample_rate)))
            .collect();
    }

    fn reset(&mut self) {
        for comb in self.combs_l.iter_mut().chain(&mut self.combs_r) {
            comb.clear();
        }
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        self.gravity = params.value(ParamKey::Gravity);
        self.mix = params.value(ParamKey::Material);
        // Material tunes the combs: 0 = long/dull, 1 = short/ringing.
        let material = params.value(ParamKey::Material);
        let scale = 2.0 - material * 1.5;
        for (i, (l, r)) in self.combs_l.iter_mut().zip(&mut self.combs_r).enumerate() {
            l.set_delay_samples(ms_to_samples(RESONATOR_DELAYS_MS[i] * scale, self.sample_rate));
            r.set_delay_samples(ms_to_samples(
                RESONATOR_DELAYS_MS[i] * 1.04 * scale,
                self.sample_rate,
            ));
            let feedback = 0.3 + self.gravity * 0.6;
            l.set_feedback(feedback);
            r.set_feedback(feedback);
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len());
        let wet = self.mix * 0.5;
        for i in 0..n {
            let mut res_l = 0.0;
            let mut res_r = 0.0;
            for (cl, cr) in self.combs_l.iter_mut().zip(&mut self.combs_r) {
                res_l += cl.process(left[i]);
                res_r += cr.process(right[i]);
            }
            left[i] += res_l * wet;
            right[i] += res_r * wet;
        }
    }
}

/// Scattered multi-tap delay reads ("grains").
pub struct GrainsModule {
    delay_l: DelayLine,
    delay_r: DelayLine,
    sample_rate: f32,
    grain: f32,
    scatter: f32,
}

const GRAIN_TAPS_MS: [f32; 3] = [23.0, 61.0, 97.0];
const GRAIN_MAX_MS: f32 = 250.0;

impl GrainsModule {
    /// Unprepared grains.
    pub fn new() -> Self {
        Self {
            delay_l: DelayLine::new(1),
            delay_r: DelayLine::new(1),
            sample_rate: 48000.0,
            grain: 0.0,
            scatter: 0.0,
        }
    }
}

impl Default for GrainsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for GrainsModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Grains
    }

    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = sample_rate;
        let cap = ms_to_samples(GRAIN_MAX_MS, sample_rate) as usize + 4;
        self.delay_l = DelayLine::new(cap);
        self.delay_r = DelayLine::new(cap);
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        self.grain = params.value(ParamKey::Grain);
        self.scatter = params.value(ParamKey::Scatter);
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len());
        let tap_gain = self.grain / GRAIN_TAPS_MS.len() as f32;
        // Scatter pushes taps out toward the capacity limit.
        let stretch = 1.0 + self.scatter * 1.5;
        for i in 0..n {
            self.delay_l.write(left[i]);
            self.delay_r.write(right[i]);
            let mut wet_l = 0.0;
            let mut wet_r = 0.0;
            for (t, &ms) in GRAIN_TAPS_MS.iter().enumerate() {
                let delay = ms_to_samples(ms * stretch, self.sample_rate);
                // Alternate tap panning across the channels.
                if t % 2 == 0 {
                    wet_l += self.delay_l.read(delay);
                    wet_r += self.delay_r.read(delay * 1.11);
                } else {
                    wet_l += self.delay_r.read(delay);
                    wet_r += self.delay_l.read(delay * 1.11);
                }
            }
            left[i] += wet_l * tap_gain;
            right[i] += wet_r * tap_gain;
        }
    }
}

/// Modulated delay: the per-sample `Warp` buffer bends the read position.
pub struct WarpModule {
    delay_l: DelayLine,
    delay_r: DelayLine,
    warp_buf: Vec<f32>,
    block_len: usize,
    sample_rate: f32,
}

const WARP_BASE_MS: f32 = 11.0;
const WARP_RANGE_MS: f32 = 8.0;

impl WarpModule {
    /// Unprepared warp.
    pub fn new() -> Self {
        Self {
            delay_l: DelayLine::new(1),
            delay_r: DelayLine::new(1),
            warp_buf: Vec::new(),
            block_len: 0,
            sample_rate: 48000.0,
        }
    }
}

impl Default for WarpModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for WarpModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Warp
    }

    fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        self.sample_rate = sample_rate;
        let cap = ms_to_samples(WARP_BASE_MS + WARP_RANGE_MS, sample_rate) as usize + 4;
        self.delay_l = DelayLine::new(cap);
        self.delay_r = DelayLine::new(cap);
        self.warp_buf = vec![0.0; block_size];
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        if let Some(warp) = params.samples(ParamKey::Warp) {
            let n = warp.len().min(self.warp_buf.len());
            self.warp_buf[..n].copy_from_slice(&warp[..n]);
            self.block_len = n;
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len()).min(self.block_len);
        for i in 0..n {
            let bend = self.warp_buf[i];
            let delay = ms_to_samples(WARP_BASE_MS + bend * WARP_RANGE_MS, self.sample_rate);
            self.delay_l.write(left[i]);
            self.delay_r.write(right[i]);
            // Opposite bend per channel widens the warp.
            let warped_l = self.delay_l.read(delay);
            let warped_r = self
                .delay_r
                .read(ms_to_samples(WARP_BASE_MS + (1.0 - bend) * WARP_RANGE_MS, self.sample_rate));
            left[i] = left[i] * (1.0 - bend * 0.5) + warped_l * bend * 0.5;
            right[i] = right[i] * (1.0 - bend * 0.5) + warped_r * bend * 0.5;
        }
    }
}

/// Long late-field wash: input diffused then recirculated through a long
/// damped loop whose gain follows the per-sample `Bloom` buffer.
pub struct BloomModule {
    diffuse_l: Allpass,
    diffuse_r: Allpass,
    loop_l: DelayLine,
    loop_r: DelayLine,
    damp_l: OnePole,
    damp_r: OnePole,
    bloom_buf: Vec<f32>,
    block_len: usize,
    loop_samples: f32,
    haze: f32,
}

const BLOOM_DIFFUSE_MS: f32 = 17.0;
const BLOOM_LOOP_MS: f32 = 180.0;

impl BloomModule {
    /// Unprepared bloom.
    pub fn new() -> Self {
        Self {
            diffuse_l: Allpass::new(1, 1.0),
            diffuse_r: Allpass::new(1, 1.0),
            loop_l: DelayLine::new(1),
            loop_r: DelayLine::new(1),
            damp_l: OnePole::new(0.4),
            damp_r: OnePole::new(0.4),
            bloom_buf: Vec::new(),
            block_len: 0,
            loop_samples: 1.0,
            haze: 0.0,
        }
    }
}

impl Default for BloomModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for BloomModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Bloom
    }

    fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        let diffuse = ms_to_samples(BLOOM_DIFFUSE_MS, sample_rate);
        self.diffuse_l = Allpass::new(diffuse as usize + 4, diffuse);
        self.diffuse_r = Allpass::new(diffuse as usize + 4, diffuse * 0.93);
        self.loop_samples = ms_to_samples(BLOOM_LOOP_MS, sample_rate);
        let cap = self.loop_samples as usize + 4;
        self.loop_l = DelayLine::new(cap);
        self.loop_r = DelayLine::new(cap);
        self.bloom_buf = vec![0.0; block_size];
    }

    fn reset(&mut self) {
        self.diffuse_l.clear();
        self.diffuse_r.clear();
        self.loop_l.clear();
        self.loop_r.clear();
        self.damp_l.clear();
        self.damp_r.clear();
    }

    fn push_params(&mut self, params: &BlockParams<'_>) {
        if let Some(bloom) = params.samples(ParamKey::Bloom) {
            let n = bloom.len().min(self.bloom_buf.len());
            self.bloom_buf[..n].copy_from_slice(&bloom[..n]);
            self.block_len = n;
        }
        self.haze = params.value(ParamKey::Haze);
        let coeff = 1.0 - self.haze * 0.9;
        self.damp_l.set_coeff(coeff);
        self.damp_r.set_coeff(coeff);
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len()).min(self.block_len);
        for i in 0..n {
            let bloom = self.bloom_buf[i];
            let feedback = bloom * 0.85;

            let diffused_l = self.diffuse_l.process(left[i]);
            let diffused_r = self.diffuse_r.process(right[i]);

            // Cross-coupled loop: left feeds right and vice versa.
            let tail_l = self.loop_l.read(self.loop_samples);
            let tail_r = self.loop_r.read(self.loop_samples * 0.97);
            self.loop_l
                .write(self.damp_l.process(diffused_l + tail_r * feedback));
            self.loop_r
                .write(self.damp_r.process(diffused_r + tail_l * feedback));

            left[i] += tail_l * bloom * 0.6;
            right[i] += tail_r * bloom * 0.6;
        }
    }
}

/// Construct a module by kind.
pub fn build_module(kind: ModuleKind) -> Box<dyn DspModule> {
    match kind {
        ModuleKind::Tank => Box::new(TankModule::new()),
        ModuleKind::Diffuser => Box::new(DiffuserModule::new()),
        ModuleKind::Resonator => Box::new(ResonatorModule::new()),
        ModuleKind::Grains => Box::new(GrainsModule::new()),
        ModuleKind::Warp => Box::new(WarpModule::new()),
        ModuleKind::Bloom => Box::new(BloomModule::new()),
    }
}
