//! Top-level engine: one audio-thread object orchestrating the whole
//! control plane, plus the shared handle the control thread talks to.
//!
//! Concurrency is exactly two roles. The control thread writes parameters
//! through atomics, parks connection lists / timelines / presets in mutex
//! slots, and raises a dirty flag; the audio thread consumes everything at
//! the start of the next block via `try_lock`, so a contended lock just
//! defers the swap one block. Nothing in [`GravitonEngine::process`]
//! allocates, blocks, or panics.
//!
//! Per-block order: pending requests → store snapshot → sequence overrides
//! → macro blend targets → pipeline advance → modulation offsets → routing
//! graph → transition gain.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use graviton_core::{BlockStats, PARAM_COUNT, ParamKey, ParamSnapshot, ParamStore};
use tracing::{debug, warn};

use crate::macros::{MACRO_DEFAULT, MAX_MACROS, MacroMapper, MacroMode};
use crate::matrix::{Connection, ModulationMatrix};
use crate::modules::BlockParams;
use crate::pipeline::{BlendPipeline, MAX_BLOCK_SIZE};
use crate::routing::{ProcessingMode, RoutingGraph, Topology};
use crate::sequence::{SequenceScheduler, Timeline, Transport};
use crate::transition::PresetTransition;

/// Sentinel for "no selector request pending".
const NO_REQUEST: usize = usize::MAX;

/// Fixed capacity of the retired-preset list. Pushes never reallocate;
/// `request_preset` drains the list before a new payload can arrive, so
/// the capacity is never reached in practice.
const RETIRED_CAPACITY: usize = 8;

/// A complete state payload: everything a preset load replaces at once.
///
/// Applied only under transition silence, never mid-signal.
#[derive(Debug, Clone)]
pub struct PresetState {
    /// All 28 parameter values.
    pub params: ParamSnapshot,
    /// Macro policy.
    pub macro_mode: MacroMode,
    /// Macro knob values (unused slots at rest).
    pub macro_values: [f32; MAX_MACROS],
    /// Routing topology.
    pub topology: Topology,
    /// Module processing order.
    pub processing_mode: ProcessingMode,
    /// Modulation connections.
    pub connections: Vec<Connection>,
    /// Timeline automation.
    pub timeline: Timeline,
}

impl PresetState {
    /// The init state: defaults everywhere, no connections, no timeline.
    pub fn init() -> Self {
        Self {
            params: ParamSnapshot::defaults(),
            macro_mode: MacroMode::default(),
            macro_values: [MACRO_DEFAULT; MAX_MACROS],
            topology: Topology::default(),
            processing_mode: ProcessingMode::default(),
            connections: Vec::new(),
            timeline: Timeline::new(),
        }
    }
}

impl Default for PresetState {
    fn default() -> Self {
        Self::init()
    }
}

/// The control-thread handle. Cheap to clone behind an [`Arc`]; every
/// method here is safe to call while the audio thread is running.
pub struct SharedControls {
    store: ParamStore,
    macro_mode: AtomicUsize,
    macros: [AtomicU32; MAX_MACROS],
    topology_request: AtomicUsize,
    mode_request: AtomicUsize,

    pending_connections: Mutex<Option<Vec<Connection>>>,
    connections_dirty: AtomicBool,
    /// Control-side mirror of the committed list, for editors.
    committed_connections: Mutex<Vec<Connection>>,

    pending_timeline: Mutex<Option<Timeline>>,
    timeline_dirty: AtomicBool,

    pending_preset: Mutex<Option<PresetState>>,
    preset_dirty: AtomicBool,

    /// Spent preset payloads parked by the audio thread. Their heap
    /// buffers (connections, timeline) are freed here, never in the
    /// audio callback.
    retired: Mutex<Vec<PresetState>>,

    /// Per-destination modulation meters, f32 bit patterns.
    meters: [AtomicU32; PARAM_COUNT],
}

impl SharedControls {
    fn new() -> Self {
        Self {
            store: ParamStore::new(),
            macro_mode: AtomicUsize::new(MacroMode::default().index()),
            macros: core::array::from_fn(|_| AtomicU32::new(MACRO_DEFAULT.to_bits())),
            topology_request: AtomicUsize::new(NO_REQUEST),
            mode_request: AtomicUsize::new(NO_REQUEST),
            pending_connections: Mutex::new(None),
            connections_dirty: AtomicBool::new(false),
            committed_connections: Mutex::new(Vec::new()),
            pending_timeline: Mutex::new(None),
            timeline_dirty: AtomicBool::new(false),
            pending_preset: Mutex::new(None),
            preset_dirty: AtomicBool::new(false),
            retired: Mutex::new(Vec::with_capacity(RETIRED_CAPACITY)),
            meters: core::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// The atomic parameter store (relaxed reads/writes, clamped on set).
    pub fn store(&self) -> &ParamStore {
        &self.store
    }

    /// Set one macro knob; out-of-range indices are ignored.
    pub fn set_macro(&self, index: usize, value: f32) {
        if let Some(slot) = self.macros.get(index) {
            slot.store(value.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        }
    }

    /// Current macro knob value.
    pub fn macro_value(&self, index: usize) -> f32 {
        self.macros
            .get(index)
            .map_or(MACRO_DEFAULT, |s| f32::from_bits(s.load(Ordering::Relaxed)))
    }

    /// Switch the macro mapping policy.
    pub fn set_macro_mode(&self, mode: MacroMode) {
        self.macro_mode.store(mode.index(), Ordering::Relaxed);
    }

    /// Active macro mapping policy.
    pub fn macro_mode(&self) -> MacroMode {
        MacroMode::from_index(self.macro_mode.load(Ordering::Relaxed))
    }

    /// Request a topology switch by selector index (clamped). Applied at
    /// the next block boundary, behind a transition fade.
    pub fn request_topology(&self, index: usize) {
        self.topology_request.store(index, Ordering::Release);
    }

    /// Request a processing-mode switch by selector index (clamped).
    /// Applied at the next block boundary via the mode crossfade.
    pub fn request_processing_mode(&self, index: usize) {
        self.mode_request.store(index, Ordering::Release);
    }

    /// Replace the modulation connection list. Committed at the next block
    /// boundary; the audio thread never sees a half-edited list.
    pub fn set_connections(&self, list: Vec<Connection>) {
        if let Ok(mut mirror) = self.committed_connections.lock() {
            mirror.clear();
            mirror.extend(list.iter().map(|c| c.clamped()));
        }
        if let Ok(mut slot) = self.pending_connections.lock() {
            *slot = Some(list);
            self.connections_dirty.store(true, Ordering::Release);
        }
    }

    /// Drop every connection.
    pub fn clear_connections(&self) {
        self.set_connections(Vec::new());
    }

    /// Replace the connection list with a sparse random patch (3-6
    /// connections).
    pub fn randomize_sparse(&self, rng: &mut fastrand::Rng) {
        self.set_connections(crate::matrix::randomize_sparse(rng));
    }

    /// Replace the connection list with a dense random patch (10-16
    /// connections).
    pub fn randomize_dense(&self, rng: &mut fastrand::Rng) {
        self.set_connections(crate::matrix::randomize_dense(rng));
    }

    /// The most recently set connection list, for editors.
    pub fn connections(&self) -> Vec<Connection> {
        self.committed_connections
            .lock()
            .map(|mirror| mirror.clone())
            .unwrap_or_default()
    }

    /// Load a new automation timeline, committed at the next block boundary.
    pub fn load_timeline(&self, timeline: Timeline) {
        if let Ok(mut slot) = self.pending_timeline.lock() {
            *slot = Some(timeline);
            self.timeline_dirty.store(true, Ordering::Release);
        }
    }

    /// Drop every payload the audio thread has retired since the last
    /// call. Runs automatically on [`request_preset`](Self::request_preset);
    /// hosts may also call it from a housekeeping tick.
    pub fn reclaim(&self) {
        if let Ok(mut retired) = self.retired.lock() {
            retired.clear();
        }
    }

    /// Request a full preset load. The engine fades to silence, applies
    /// the whole payload, and fades back in.
    pub fn request_preset(&self, preset: PresetState) {
        self.reclaim();
        if let Ok(mut mirror) = self.committed_connections.lock() {
            mirror.clear();
            mirror.extend(preset.connections.iter().map(|c| c.clamped()));
        }
        if let Ok(mut slot) = self.pending_preset.lock() {
            *slot = Some(preset);
            self.preset_dirty.store(true, Ordering::Release);
        }
    }

    /// Current modulation offset for a destination (UI metering).
    pub fn modulation(&self, destination: ParamKey) -> f32 {
        f32::from_bits(self.meters[destination.index()].load(Ordering::Relaxed))
    }
}

/// The audio-thread engine.
pub struct GravitonEngine {
    controls: Arc<SharedControls>,
    matrix: ModulationMatrix,
    mapper: MacroMapper,
    scheduler: SequenceScheduler,
    pipeline: BlendPipeline,
    graph: RoutingGraph,
    transition: PresetTransition,

    snapshot: ParamSnapshot,
    macro_buf: [f32; MAX_MACROS],
    /// State payloads waiting for transition silence.
    queued_preset: Option<PresetState>,
    queued_topology: Option<Topology>,
    /// Spent payload waiting to be parked in the controls' retired list.
    /// Holding it here keeps its buffers alive until the control thread
    /// can free them.
    spent_preset: Option<PresetState>,
    block_size: usize,
    prepared: bool,
}

impl GravitonEngine {
    /// Engine in its init state, not yet prepared.
    pub fn new() -> Self {
        Self {
            controls: Arc::new(SharedControls::new()),
            matrix: ModulationMatrix::new(48000.0),
            mapper: MacroMapper::default(),
            scheduler: SequenceScheduler::new(),
            pipeline: BlendPipeline::new(),
            graph: RoutingGraph::new(),
            transition: PresetTransition::new(),
            snapshot: ParamSnapshot::defaults(),
            macro_buf: [MACRO_DEFAULT; MAX_MACROS],
            queued_preset: None,
            queued_topology: None,
            spent_preset: None,
            block_size: 0,
            prepared: false,
        }
    }

    /// Handle for the control thread. Clone freely.
    pub fn controls(&self) -> Arc<SharedControls> {
        Arc::clone(&self.controls)
    }

    /// Allocate every buffer for the session format. Must be called before
    /// [`process`](Self::process); nothing allocates afterwards.
    ///
    /// `block_size` is capped at [`MAX_BLOCK_SIZE`]; per call, `process`
    /// handles at most that many samples and leaves any excess untouched,
    /// so hosts with larger buffers must split them.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, channels: usize) {
        let block_size = block_size.min(MAX_BLOCK_SIZE);
        debug!(sample_rate, block_size, channels, "engine prepare");
        self.matrix.prepare(sample_rate);
        self.scheduler.prepare(sample_rate);
        self.pipeline.prepare(sample_rate, block_size);
        self.graph.prepare(sample_rate, block_size, channels);
        self.transition.prepare(sample_rate);
        self.block_size = block_size;
        self.prepared = true;
    }

    /// Active topology.
    pub fn topology(&self) -> Topology {
        self.graph.topology()
    }

    /// Active (or pending) processing mode.
    pub fn processing_mode(&self) -> ProcessingMode {
        self.graph.processing_mode()
    }

    /// Whether a preset transition is in flight.
    pub fn transitioning(&self) -> bool {
        self.transition.is_active()
    }

    /// Process one stereo block in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], transport: Option<Transport>) {
        if !self.prepared {
            warn!("engine processed before prepare; passing audio through");
            return;
        }
        let n = left.len().min(right.len()).min(self.block_size);
        let left = &mut left[..n];
        let right = &mut right[..n];

        // 1. Block boundary: consume control-thread requests, then let the
        // transition state machine fire its one silent reset point.
        self.consume_requests();
        if self.transition.take_reset_due() {
            self.apply_queued_state();
        }

        // 2. Parameter store snapshot (sanitizing non-finite values).
        self.controls.store.snapshot(&mut self.snapshot);

        // 3. Sequence overrides land in the snapshot before macro blending,
        // so timeline automation behaves exactly like a knob move.
        self.scheduler.process(transport, n);
        self.scheduler.apply_overrides(&mut self.snapshot);

        // 4. Macro blend targets.
        for (slot, value) in self.macro_buf.iter_mut().zip(&self.controls.macros) {
            *slot = f32::from_bits(value.load(Ordering::Relaxed));
        }
        self.mapper
            .set_mode(MacroMode::from_index(self.controls.macro_mode.load(Ordering::Relaxed)));
        let count = self.mapper.mode().macro_count();
        let influence = self.mapper.influence(&self.macro_buf[..count]);
        let targets = self.mapper.compute_targets(&self.macro_buf[..count]);
        self.pipeline.retarget(&self.snapshot, &targets, influence);

        // 5. Smooth.
        self.pipeline.advance(n);

        // 6. Modulation offsets, measured from the pre-processing input.
        let stats = block_stats(left, right);
        self.matrix.process(&stats, n as u32);
        self.pipeline.apply_modulation(self.matrix.offsets());
        for key in ParamKey::ALL {
            self.controls.meters[key.index()]
                .store(self.matrix.modulation(key).to_bits(), Ordering::Relaxed);
        }

        // 7. Routing graph.
        let params = BlockParams::new(&self.pipeline, n);
        self.graph.process(left, right, &params);

        // 8. Transition gain.
        self.transition.apply_gain(left, right);
    }

    /// Consume every pending control-thread request. `try_lock` failures
    /// leave the dirty flag set so the swap retries next block.
    fn consume_requests(&mut self) {
        self.park_spent();

        let topology_index = self.controls.topology_request.swap(NO_REQUEST, Ordering::Acquire);
        if topology_index != NO_REQUEST {
            let topology = Topology::from_index(topology_index);
            // Re-loading the active topology is idempotent: no fade.
            if topology != self.graph.topology() || self.queued_topology.is_some() {
                self.queued_topology = Some(topology);
                self.transition.request();
            }
        }

        let mode_index = self.controls.mode_request.swap(NO_REQUEST, Ordering::Acquire);
        if mode_index != NO_REQUEST {
            self.graph.set_processing_mode(ProcessingMode::from_index(mode_index));
        }

        if self.controls.preset_dirty.load(Ordering::Acquire) {
            if let Ok(mut slot) = self.controls.pending_preset.try_lock() {
                if let Some(preset) = slot.take() {
                    self.queued_preset = Some(preset);
                    self.transition.request();
                }
                self.controls.preset_dirty.store(false, Ordering::Release);
            }
        }

        if self.controls.connections_dirty.load(Ordering::Acquire) {
            if let Ok(mut slot) = self.controls.pending_connections.try_lock() {
                if let Some(list) = slot.take() {
                    self.matrix.commit(&list);
                    // Park the buffer back so it is freed off the audio
                    // thread.
                    *slot = Some(list);
                }
                self.controls.connections_dirty.store(false, Ordering::Release);
            }
        }

        if self.controls.timeline_dirty.load(Ordering::Acquire) {
            if let Ok(mut slot) = self.controls.pending_timeline.try_lock() {
                if let Some(timeline) = slot.take() {
                    let old = self.scheduler.replace_timeline(timeline);
                    *slot = Some(old);
                }
                self.controls.timeline_dirty.store(false, Ordering::Release);
            }
        }
    }

    /// Move the spent payload into the controls' retired list so its
    /// buffers are freed on the control thread. A contended lock or a full
    /// list just keeps the payload parked here for the next attempt.
    fn park_spent(&mut self) {
        if self.spent_preset.is_none() {
            return;
        }
        if let Ok(mut retired) = self.controls.retired.try_lock()
            && retired.len() < retired.capacity()
        {
            retired.extend(self.spent_preset.take());
        }
    }

    /// Apply queued full-state changes. Only ever called while the
    /// transition holds silence.
    fn apply_queued_state(&mut self) {
        if let Some(topology) = self.queued_topology.take() {
            self.graph.load_topology(topology);
        }
        let Some(mut preset) = self.queued_preset.take() else {
            self.graph.reset();
            return;
        };

        for key in ParamKey::ALL {
            self.controls.store.set(key, preset.params.get(key));
        }
        self.snapshot = preset.params;
        self.pipeline.snap_to(&preset.params);

        self.controls.macro_mode.store(preset.macro_mode.index(), Ordering::Relaxed);
        for (slot, &value) in self.controls.macros.iter().zip(&preset.macro_values) {
            slot.store(value.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        }
        self.mapper.set_mode(preset.macro_mode);

        self.graph.load_topology(preset.topology);
        self.graph.set_processing_mode_immediate(preset.processing_mode);
        self.graph.reset();

        self.matrix.commit(&preset.connections);
        self.matrix.reset();

        // The displaced timeline rides out inside the spent payload; both
        // it and the payload's own buffers are freed by the control thread
        // once park_spent lands them in the retired list.
        let incoming = core::mem::take(&mut preset.timeline);
        preset.timeline = self.scheduler.replace_timeline(incoming);
        self.scheduler.reset();

        self.park_spent();
        self.spent_preset = Some(preset);
    }
}

impl Default for GravitonEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn block_stats(left: &[f32], right: &[f32]) -> BlockStats {
    let n = left.len().min(right.len());
    let mut sum_sq = 0.0f32;
    let mut peak = 0.0f32;
    for i in 0..n {
        let mono = (left[i] + right[i]) * 0.5;
        sum_sq += mono * mono;
        peak = peak.max(mono.abs());
    }
    let rms = if n > 0 {
        libm::sqrtf(sum_sq / n as f32)
    } else {
        0.0
    };
    BlockStats { rms, peak, len: n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SourceKind;

    const BLOCK: usize = 128;

    fn prepared_engine() -> GravitonEngine {
        let mut engine = GravitonEngine::new();
        engine.prepare(48000.0, BLOCK, 2);
        engine
    }

    fn run_blocks(engine: &mut GravitonEngine, blocks: usize) -> f32 {
        let mut peak: f32 = 0.0;
        for _ in 0..blocks {
            let mut l = [0.1f32; BLOCK];
            let mut r = [0.1f32; BLOCK];
            engine.process(&mut l, &mut r, None);
            for &s in l.iter().chain(r.iter()) {
                assert!(s.is_finite());
                peak = peak.max(s.abs());
            }
        }
        peak
    }

    #[test]
    fn processes_cleanly_with_defaults() {
        let mut engine = prepared_engine();
        let peak = run_blocks(&mut engine, 50);
        assert!(peak > 0.0);
    }

    #[test]
    fn unprepared_engine_is_a_passthrough() {
        let mut engine = GravitonEngine::new();
        let mut l = [0.5f32; BLOCK];
        let mut r = [0.5f32; BLOCK];
        engine.process(&mut l, &mut r, None);
        assert_eq!(l, [0.5f32; BLOCK]);
    }

    #[test]
    fn oversized_blocks_clamp_to_the_buffer_limit() {
        let mut engine = GravitonEngine::new();
        engine.prepare(48000.0, 2 * MAX_BLOCK_SIZE, 2);

        let mut l = vec![0.1f32; 2 * MAX_BLOCK_SIZE];
        let mut r = vec![0.1f32; 2 * MAX_BLOCK_SIZE];
        engine.process(&mut l, &mut r, None);
        for &s in l.iter().chain(r.iter()) {
            assert!(s.is_finite());
        }
        // Samples past the cap are left untouched, never half-processed.
        assert!(l[MAX_BLOCK_SIZE..].iter().all(|&s| s == 0.1));
    }

    #[test]
    fn store_writes_reach_the_pipeline() {
        let mut engine = prepared_engine();
        let controls = engine.controls();
        controls.store().set(ParamKey::Mix, 0.9);
        run_blocks(&mut engine, 100);
        // The snapshot reflects the write after smoothing has settled.
        let mut snap = ParamSnapshot::defaults();
        controls.store().snapshot(&mut snap);
        assert!((snap.get(ParamKey::Mix) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn invalid_topology_index_clamps_to_default() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        controls.request_topology(9);
        run_blocks(&mut engine, 80);
        assert_eq!(engine.topology(), Topology::Traditional);
        assert!(!engine.transitioning() || engine.topology() == Topology::Traditional);
    }

    #[test]
    fn topology_request_rides_the_transition() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        controls.request_topology(Topology::DeepField.index());
        // One block in, the transition should be fading.
        run_blocks(&mut engine, 1);
        assert!(engine.transitioning());
        assert_eq!(engine.topology(), Topology::Traditional, "swap before silence");

        run_blocks(&mut engine, 120);
        assert!(!engine.transitioning());
        assert_eq!(engine.topology(), Topology::DeepField);
    }

    #[test]
    fn repeated_topology_request_is_idempotent() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        controls.request_topology(Topology::DeepField.index());
        run_blocks(&mut engine, 120);
        assert!(!engine.transitioning());

        // Same topology again: no new transition.
        controls.request_topology(Topology::DeepField.index());
        run_blocks(&mut engine, 1);
        assert!(!engine.transitioning());
        assert_eq!(engine.topology(), Topology::DeepField);
    }

    #[test]
    fn preset_load_applies_full_state_after_fade() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        let mut preset = PresetState::init();
        preset.params.set(ParamKey::Time, 0.2);
        preset.params.set(ParamKey::Density, 0.9);
        preset.topology = Topology::Shimmerwash;
        preset.processing_mode = ProcessingMode::Entropic;
        preset.macro_mode = MacroMode::Expressive;
        preset.connections = vec![Connection::new(
            SourceKind::BrownianMotion,
            0,
            ParamKey::Drift,
            0.4,
        )];
        controls.request_preset(preset);

        run_blocks(&mut engine, 1);
        assert!(engine.transitioning());

        run_blocks(&mut engine, 150);
        assert!(!engine.transitioning());
        assert_eq!(engine.topology(), Topology::Shimmerwash);
        assert_eq!(engine.processing_mode(), ProcessingMode::Entropic);
        assert_eq!(controls.macro_mode(), MacroMode::Expressive);

        let mut snap = ParamSnapshot::defaults();
        controls.store().snapshot(&mut snap);
        assert!((snap.get(ParamKey::Time) - 0.2).abs() < 1e-6);
        assert!((snap.get(ParamKey::Density) - 0.9).abs() < 1e-6);
        assert_eq!(controls.connections().len(), 1);
    }

    #[test]
    fn spent_preset_buffers_are_parked_for_the_control_thread() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        let mut first = PresetState::init();
        first.connections = vec![Connection::new(
            SourceKind::ChaosAttractor,
            0,
            ParamKey::Drift,
            0.3,
        )];
        first.timeline = Timeline::from_keyframes(vec![crate::sequence::Keyframe {
            param: ParamKey::Mix,
            start: 0.0,
            end: 10.0,
            from: 0.5,
            to: 0.5,
            curve: crate::matrix::CurveShape::Linear,
        }]);
        controls.request_preset(first);
        run_blocks(&mut engine, 150);

        // The first payload has been applied and parked, not dropped in
        // the audio callback.
        assert!(engine.spent_preset.is_none());
        assert_eq!(controls.retired.lock().unwrap().len(), 1);

        // A second load drains the retired list on the control thread and
        // eventually parks its own payload, carrying the first preset's
        // displaced timeline out with it.
        controls.request_preset(PresetState::init());
        run_blocks(&mut engine, 150);

        assert!(engine.spent_preset.is_none());
        let retired = controls.retired.lock().unwrap();
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].timeline.keyframes().len(), 1);
    }

    #[test]
    fn connections_commit_at_block_boundary() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        controls.set_connections(vec![Connection::new(
            SourceKind::ChaosAttractor,
            0,
            ParamKey::Bloom,
            0.5,
        )]);
        run_blocks(&mut engine, 20);
        // The meter shows a live (nonzero at some point) modulation value.
        let mut saw_movement = false;
        for _ in 0..50 {
            run_blocks(&mut engine, 1);
            if controls.modulation(ParamKey::Bloom).abs() > 1e-4 {
                saw_movement = true;
                break;
            }
        }
        assert!(saw_movement, "committed connection never modulated");
        assert_eq!(controls.connections().len(), 1);
    }

    #[test]
    fn macro_knobs_steer_hot_params() {
        let mut engine = prepared_engine();
        let controls = engine.controls();
        controls.set_macro_mode(MacroMode::Expressive);
        controls.set_macro(1, 1.0); // gravity knob hard up

        run_blocks(&mut engine, 400);
        // Gravity macro pulls Time upward from its default.
        let meter = controls.modulation(ParamKey::Time);
        assert!(meter.abs() < 1.0); // meter reads modulation, not macros
        // The engine keeps processing cleanly under full macro authority.
        let peak = run_blocks(&mut engine, 10);
        assert!(peak.is_finite());
    }

    #[test]
    fn timeline_loads_and_overrides() {
        let mut engine = prepared_engine();
        let controls = engine.controls();

        let mut timeline = Timeline::new();
        timeline.push(crate::sequence::Keyframe {
            param: ParamKey::Mix,
            start: 0.0,
            end: 60.0,
            from: 1.0,
            to: 1.0,
            curve: crate::matrix::CurveShape::Linear,
        });
        controls.load_timeline(timeline);

        run_blocks(&mut engine, 200);
        let mut snap = ParamSnapshot::defaults();
        controls.store().snapshot(&mut snap);
        // The store itself is untouched; overrides live in the block path.
        assert_eq!(snap.get(ParamKey::Mix), ParamKey::Mix.spec().default);
    }
}
