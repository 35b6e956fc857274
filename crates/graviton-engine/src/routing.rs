//! Routing graph: which modules run, in what order, and how the active set
//! is swapped without a pop.
//!
//! Topology selects *which* modules are active; processing mode permutes
//! their order. A mode change is gated by a 50 ms crossfade: gain ramps to
//! silence, the order is swapped and every module reset, then gain ramps
//! back. Topology swaps are expected to arrive under the preset transition
//! controller's silence, so `load_topology` applies immediately (and is a
//! no-op for the already-active topology).

use graviton_core::LinearRamp;
use tracing::warn;

use crate::modules::{BlockParams, DspModule, ModuleKind, build_module};

/// Mode crossfade length.
pub const MODE_FADE_MS: f32 = 50.0;

/// Named module topologies. Each is a fixed ordered list of active modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Diffusion into a comb tank; the classic chamber.
    #[default]
    Traditional,
    /// Resonant combs feeding scattered grain taps.
    MetallicGranular,
    /// Tank with a long late-field bloom behind it.
    DeepField,
    /// Warped delay into bloom, almost no early body.
    Shimmerwash,
    /// Everything before the bloom: the densest preset.
    EventHorizon,
    /// Grains first, diffused into the wash.
    DustChoir,
    /// Resonator-forward lattice with a tank tail.
    SingingLattice,
    /// Warp, grains and resonator only; no reverberant body.
    NullPoint,
}

impl Topology {
    /// Every topology, selector order.
    pub const ALL: [Topology; 8] = [
        Topology::Traditional,
        Topology::MetallicGranular,
        Topology::DeepField,
        Topology::Shimmerwash,
        Topology::EventHorizon,
        Topology::DustChoir,
        Topology::SingingLattice,
        Topology::NullPoint,
    ];

    /// Topology for a selector index; out-of-range clamps to Traditional.
    pub fn from_index(index: usize) -> Topology {
        *Self::ALL.get(index).unwrap_or(&Topology::Traditional)
    }

    /// Selector index.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            Topology::Traditional => "traditional",
            Topology::MetallicGranular => "metallicGranular",
            Topology::DeepField => "deepField",
            Topology::Shimmerwash => "shimmerwash",
            Topology::EventHorizon => "eventHorizon",
            Topology::DustChoir => "dustChoir",
            Topology::SingingLattice => "singingLattice",
            Topology::NullPoint => "nullPoint",
        }
    }

    /// Look up a topology by its stable name.
    pub fn from_str_name(name: &str) -> Option<Topology> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Active modules in their base (Focused) order.
    pub const fn modules(self) -> &'static [ModuleKind] {
        match self {
            Topology::Traditional => &[ModuleKind::Diffuser, ModuleKind::Tank],
            Topology::MetallicGranular => {
                &[ModuleKind::Diffuser, ModuleKind::Resonator, ModuleKind::Grains]
            }
            Topology::DeepField => &[ModuleKind::Diffuser, ModuleKind::Tank, ModuleKind::Bloom],
            Topology::Shimmerwash => &[ModuleKind::Diffuser, ModuleKind::Warp, ModuleKind::Bloom],
            Topology::EventHorizon => &[
                ModuleKind::Diffuser,
                ModuleKind::Tank,
                ModuleKind::Warp,
                ModuleKind::Bloom,
            ],
            Topology::DustChoir => &[ModuleKind::Grains, ModuleKind::Diffuser, ModuleKind::Bloom],
            Topology::SingingLattice => {
                &[ModuleKind::Resonator, ModuleKind::Diffuser, ModuleKind::Tank]
            }
            Topology::NullPoint => &[ModuleKind::Warp, ModuleKind::Grains, ModuleKind::Resonator],
        }
    }
}

/// Orthogonal reordering of the active module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// The topology's declared order.
    #[default]
    Focused,
    /// Rotated by one: the tail-maker runs first and gets re-fed.
    Blooming,
    /// Reversed order.
    Entropic,
}

impl ProcessingMode {
    /// Every mode, selector order.
    pub const ALL: [ProcessingMode; 3] = [
        ProcessingMode::Focused,
        ProcessingMode::Blooming,
        ProcessingMode::Entropic,
    ];

    /// Mode for a selector index; out-of-range clamps to Focused.
    pub fn from_index(index: usize) -> ProcessingMode {
        *Self::ALL.get(index).unwrap_or(&ProcessingMode::Focused)
    }

    /// Selector index.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }

    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::Focused => "focused",
            ProcessingMode::Blooming => "blooming",
            ProcessingMode::Entropic => "entropic",
        }
    }

    /// Look up a mode by its stable name.
    pub fn from_str_name(name: &str) -> Option<ProcessingMode> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }

    /// Apply this ordering to a base list, writing into `out`.
    fn order(self, base: &[ModuleKind], out: &mut [ModuleKind; 6]) -> usize {
        let len = base.len().min(out.len());
        match self {
            ProcessingMode::Focused => out[..len].copy_from_slice(&base[..len]),
            ProcessingMode::Blooming => {
                for (i, slot) in out[..len].iter_mut().enumerate() {
                    *slot = base[(i + len - 1) % len];
                }
            }
            ProcessingMode::Entropic => {
                for (i, slot) in out[..len].iter_mut().enumerate() {
                    *slot = base[len - 1 - i];
                }
            }
        }
        len
    }
}

/// Mode crossfade state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeState {
    Stable,
    FadingOut { pending: ProcessingMode },
    FadingIn,
}

/// Owns the module instances and executes the active topology each block.
pub struct RoutingGraph {
    modules: [Box<dyn DspModule>; 6],
    topology: Topology,
    mode: ProcessingMode,
    /// Active processing order, first `active_len` entries valid.
    order: [ModuleKind; 6],
    active_len: usize,
    fade: FadeState,
    fade_gain: LinearRamp,
    prepared: bool,
}

impl RoutingGraph {
    /// Graph with every module constructed but unprepared.
    pub fn new() -> Self {
        let modules = [
            build_module(ModuleKind::Tank),
            build_module(ModuleKind::Diffuser),
            build_module(ModuleKind::Resonator),
            build_module(ModuleKind::Grains),
            build_module(ModuleKind::Warp),
            build_module(ModuleKind::Bloom),
        ];
        let mut graph = Self {
            modules,
            topology: Topology::Traditional,
            mode: ProcessingMode::Focused,
            order: [ModuleKind::Tank; 6],
            active_len: 0,
            fade: FadeState::Stable,
            fade_gain: LinearRamp::new(1.0, 48000.0, MODE_FADE_MS),
            prepared: false,
        };
        graph.rebuild_order();
        graph
    }

    /// Allocate every module's resources up front; nothing allocates after.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, _channels: usize) {
        for module in &mut self.modules {
            module.prepare(sample_rate, block_size);
        }
        self.fade_gain = LinearRamp::new(1.0, sample_rate, MODE_FADE_MS);
        self.prepared = true;
    }

    /// Switch the active topology. Idempotent: re-loading the current
    /// topology changes nothing. Callers are expected to hold transition
    /// silence around a genuine switch; the swap itself is immediate.
    pub fn load_topology(&mut self, topology: Topology) {
        if topology == self.topology {
            return;
        }
        self.topology = topology;
        self.rebuild_order();
        self.reset();
    }

    /// Switch the processing mode with no crossfade. Only valid while the
    /// caller holds transition silence (preset application).
    pub fn set_processing_mode_immediate(&mut self, mode: ProcessingMode) {
        self.mode = mode;
        self.rebuild_order();
        self.reset();
        self.fade = FadeState::Stable;
        self.fade_gain.snap(1.0);
    }

    /// Request a processing-mode change, starting (or re-targeting) the
    /// crossfade. Requesting the current mode outside a fade is a no-op.
    pub fn set_processing_mode(&mut self, mode: ProcessingMode) {
        match self.fade {
            FadeState::Stable if mode == self.mode => {}
            FadeState::Stable => {
                self.fade = FadeState::FadingOut { pending: mode };
                self.fade_gain.retarget(0.0);
            }
            // A second request mid-fade restarts the fade-out from the
            // current gain; state is never corrupted, just re-targeted.
            FadeState::FadingOut { .. } | FadeState::FadingIn => {
                self.fade = FadeState::FadingOut { pending: mode };
                self.fade_gain.retarget(0.0);
            }
        }
    }

    /// Active topology.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Active (or pending, while fading) processing mode.
    pub fn processing_mode(&self) -> ProcessingMode {
        match self.fade {
            FadeState::FadingOut { pending } => pending,
            _ => self.mode,
        }
    }

    /// Whether a mode crossfade is in flight.
    pub fn is_fading(&self) -> bool {
        self.fade != FadeState::Stable
    }

    /// Current crossfade gain (1.0 when stable). Exposed for metering.
    pub fn mode_fade_gain(&self) -> f32 {
        self.fade_gain.value()
    }

    /// Active module order for this block.
    pub fn active_order(&self) -> &[ModuleKind] {
        &self.order[..self.active_len]
    }

    /// Clear every module's internal state.
    pub fn reset(&mut self) {
        for module in &mut self.modules {
            module.reset();
        }
    }

    /// Process one stereo block through the active order, then apply the
    /// mode crossfade gain per sample.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], params: &BlockParams<'_>) {
        if !self.prepared {
            warn!("routing graph processed before prepare; passing audio through");
            return;
        }

        // Fade boundary checks happen at block start only: the module set
        // is mutated exactly when the gain has settled at silence.
        match self.fade {
            FadeState::FadingOut { pending } if self.fade_gain.is_settled() => {
                self.mode = pending;
                self.rebuild_order();
                self.reset();
                self.fade = FadeState::FadingIn;
                self.fade_gain.retarget(1.0);
            }
            FadeState::FadingIn if self.fade_gain.is_settled() => {
                self.fade = FadeState::Stable;
            }
            _ => {}
        }

        for slot in 0..self.active_len {
            let module = &mut self.modules[self.order[slot].index()];
            module.push_params(params);
            module.process(left, right);
        }

        if self.fade == FadeState::Stable {
            return;
        }
        let n = left.len().min(right.len());
        for i in 0..n {
            let gain = self.fade_gain.next();
            left[i] *= gain;
            right[i] *= gain;
        }
    }

    fn rebuild_order(&mut self) {
        self.active_len = self.mode.order(self.topology.modules(), &mut self.order);
    }
}

impl Default for RoutingGraph {
    fn default() -> Self {
        Self::new()
    }
}
