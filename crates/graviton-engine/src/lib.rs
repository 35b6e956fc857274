//! Real-time control plane for the graviton effect.
//!
//! This crate decides *which* DSP runs, with *what* parameter values, and
//! how those values evolve safely over time:
//!
//! - [`matrix`] — many-to-many modulation (chaos, followers, random walks)
//!   with per-connection smoothing and curves;
//! - [`macros`] — a few high-level knobs blended against manual edits;
//! - [`sequence`] — timeline keyframe automation with free-run fallback;
//! - [`pipeline`] — the blend/smooth/modulate/clamp order for all 28
//!   parameters;
//! - [`routing`] / [`modules`] — selectable module topologies with
//!   click-free crossfaded swaps;
//! - [`transition`] — fade-out/reset/fade-in around full-state changes;
//! - [`engine`] — the per-block orchestration and the control-thread
//!   handle.
//!
//! The audio path never allocates, locks (beyond `try_lock` swaps at block
//! boundaries), or panics.

pub mod engine;
pub mod macros;
pub mod matrix;
pub mod modules;
pub mod pipeline;
pub mod routing;
pub mod sequence;
pub mod transition;

pub use engine::{GravitonEngine, PresetState, SharedControls};
pub use macros::{MACRO_DEFAULT, MAX_MACROS, MacroMapper, MacroMode, MacroTargets};
pub use matrix::{
    Connection, CurveShape, MAX_CONNECTIONS, ModulationMatrix, SourceKind, randomize_dense,
    randomize_sparse,
};
pub use modules::{BlockParams, DspModule, ModuleKind};
pub use pipeline::{BlendPipeline, HOT_PARAM_COUNT, MAX_BLOCK_SIZE};
pub use routing::{MODE_FADE_MS, ProcessingMode, RoutingGraph, Topology};
pub use sequence::{Keyframe, PlaybackMode, SequenceScheduler, Timeline, Transport};
pub use transition::{PresetTransition, TRANSITION_FADE_MS, TransitionPhase};
