//! Timeline automation: keyframe spans that override parameter values.
//!
//! The scheduler advances a playhead each block, preferring the host
//! transport position when one is supplied and free-running on elapsed
//! samples otherwise. Overrides are fed into the parameter snapshot
//! *before* macro blending, so sequenced automation behaves exactly like a
//! manual knob move.

use graviton_core::{ParamKey, ParamSnapshot, lerp, sanitize};

use crate::matrix::CurveShape;

/// Host transport state read once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    /// Playhead position in seconds.
    pub position_seconds: f64,
    /// Whether the host is rolling.
    pub playing: bool,
}

/// What the playhead does when it runs past the last span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    /// Play through once; positions past the end yield no overrides.
    #[default]
    OneShot,
    /// Wrap the playhead modulo the timeline duration.
    Loop,
}

impl PlaybackMode {
    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            PlaybackMode::OneShot => "oneShot",
            PlaybackMode::Loop => "loop",
        }
    }

    /// Look up a mode by its stable name.
    pub fn from_str_name(name: &str) -> Option<PlaybackMode> {
        match name {
            "oneShot" => Some(PlaybackMode::OneShot),
            "loop" => Some(PlaybackMode::Loop),
            _ => None,
        }
    }
}

/// One automation span for a single parameter, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Parameter the span drives.
    pub param: ParamKey,
    /// Span start in seconds.
    pub start: f64,
    /// Span end in seconds; spans with `end <= start` are ignored.
    pub end: f64,
    /// Value at `start`.
    pub from: f32,
    /// Value at `end`.
    pub to: f32,
    /// Interpolation shape between `from` and `to`.
    pub curve: CurveShape,
}

impl Keyframe {
    /// Whether `position` falls inside this span.
    fn contains(&self, position: f64) -> bool {
        self.end > self.start && position >= self.start && position < self.end
    }

    /// Interpolated value at `position`, which must be inside the span.
    fn value_at(&self, position: f64) -> f32 {
        let t = ((position - self.start) / (self.end - self.start)) as f32;
        // The curve is monotonic on [0, 1] and fixes both endpoints, so
        // shaping the phase never leaves the from..to range.
        let t = self.curve.apply(t.clamp(0.0, 1.0));
        let spec = self.param.spec();
        spec.clamp(lerp(
            sanitize(self.from, spec.default),
            sanitize(self.to, spec.default),
            t,
        ))
    }
}

/// An ordered set of keyframe spans. Built on the UI thread, committed to
/// the scheduler at a block boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
    mode: PlaybackMode,
}

impl Timeline {
    /// Empty one-shot timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot timeline from a span list.
    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Self {
        Self {
            keyframes,
            mode: PlaybackMode::OneShot,
        }
    }

    /// Same timeline with a different playback mode.
    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the playback mode.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Playback mode.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Append one span.
    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    /// All spans, in insertion order.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Whether the timeline holds no spans.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// End of the last valid span, in seconds. The loop length.
    pub fn duration(&self) -> f64 {
        self.keyframes
            .iter()
            .filter(|kf| kf.end > kf.start)
            .fold(0.0, |acc, kf| acc.max(kf.end))
    }
}

/// Advances a timeline cursor and yields per-parameter overrides.
pub struct SequenceScheduler {
    timeline: Timeline,
    sample_rate: f64,
    /// Free-run cursor in seconds, used when no transport is supplied.
    free_cursor: f64,
    /// Position evaluated for the current block.
    position: f64,
}

impl SequenceScheduler {
    /// Scheduler with an empty timeline.
    pub fn new() -> Self {
        Self {
            timeline: Timeline::new(),
            sample_rate: 48000.0,
            free_cursor: 0.0,
            position: 0.0,
        }
    }

    /// Configure for the session sample rate.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = f64::from(sample_rate.max(1.0));
    }

    /// Replace the timeline. Called only at a block boundary.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.timeline = timeline;
    }

    /// Swap in a new timeline, returning the displaced one so the caller
    /// can dispose of it off the audio thread.
    pub fn replace_timeline(&mut self, timeline: Timeline) -> Timeline {
        core::mem::replace(&mut self.timeline, timeline)
    }

    /// Currently loaded timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Advance the cursor for one block.
    ///
    /// With a transport the playhead tracks `position_seconds` exactly (and
    /// the free-run cursor resynchronizes to it). Without one the cursor
    /// free-runs on accumulated samples.
    pub fn process(&mut self, transport: Option<Transport>, num_samples: usize) {
        match transport {
            Some(t) => {
                self.position = t.position_seconds.max(0.0);
                self.free_cursor = self.position;
                if t.playing {
                    self.free_cursor += num_samples as f64 / self.sample_rate;
                }
            }
            None => {
                self.position = self.free_cursor;
                self.free_cursor += num_samples as f64 / self.sample_rate;
            }
        }
    }

    /// Override for one parameter at the current cursor, if any span is
    /// active. Overlapping spans: the latest-starting active span wins.
    pub fn value(&self, param: ParamKey) -> Option<f32> {
        let position = self.effective_position();
        let mut winner: Option<&Keyframe> = None;
        for kf in &self.timeline.keyframes {
            if kf.param == param && kf.contains(position) {
                match winner {
                    Some(w) if w.start >= kf.start => {}
                    _ => winner = Some(kf),
                }
            }
        }
        winner.map(|kf| kf.value_at(position))
    }

    /// The playhead the spans are evaluated at: wrapped modulo the
    /// timeline duration when looping, raw otherwise.
    fn effective_position(&self) -> f64 {
        if self.timeline.mode == PlaybackMode::Loop {
            let duration = self.timeline.duration();
            if duration > 0.0 {
                return self.position % duration;
            }
        }
        self.position
    }

    /// Write every active override into `snapshot`.
    pub fn apply_overrides(&self, snapshot: &mut ParamSnapshot) {
        if self.timeline.is_empty() {
            return;
        }
        for key in ParamKey::ALL {
            if let Some(v) = self.value(key) {
                snapshot.set(key, v);
            }
        }
    }

    /// Rewind the free-run cursor to zero.
    pub fn reset(&mut self) {
        self.free_cursor = 0.0;
        self.position = 0.0;
    }
}

impl Default for SequenceScheduler {
    fn default() -> Self {
        Self::new()
    }
}
