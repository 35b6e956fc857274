//! Many-to-many modulation matrix.
//!
//! The matrix owns one instance of each source generator and a committed
//! list of [`Connection`]s. Once per block it advances every source exactly
//! once (never per connection), then folds each enabled connection's shaped,
//! depth-scaled, individually smoothed contribution into a per-destination
//! running sum.
//!
//! Smoothing happens *per connection*, before summation: two connections
//! with different smoothing times targeting the same destination settle
//! independently, which is audibly different from smoothing the sum.
//!
//! The committed list is only replaced by [`commit`](ModulationMatrix::commit),
//! which the engine calls at a block boundary — the audio thread never
//! observes a half-mutated list.

use graviton_core::{
    AudioFollower, BlockStats, BrownianMotion, ChaosAttractor, EnvelopeTracker, OnePoleLag,
    PARAM_COUNT, ParamKey,
};

/// Maximum number of simultaneously committed connections.
pub const MAX_CONNECTIONS: usize = 32;

/// Seed for the brownian source (fixed for preset reproducibility).
const BROWNIAN_SEED: u32 = 0x5EED_51D3;

/// Modulation source generator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Lorenz attractor (3 axes).
    ChaosAttractor,
    /// RMS/peak input follower (2 axes).
    AudioFollower,
    /// Bounded random walk (2 axes).
    BrownianMotion,
    /// Level/slope envelope tracker (2 axes).
    EnvelopeTracker,
}

impl SourceKind {
    /// All source kinds.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::ChaosAttractor,
        SourceKind::AudioFollower,
        SourceKind::BrownianMotion,
        SourceKind::EnvelopeTracker,
    ];

    /// Number of axes this source exposes.
    pub const fn axis_count(self) -> usize {
        match self {
            SourceKind::ChaosAttractor => 3,
            SourceKind::AudioFollower
            | SourceKind::BrownianMotion
            | SourceKind::EnvelopeTracker => 2,
        }
    }

    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::ChaosAttractor => "chaosAttractor",
            SourceKind::AudioFollower => "audioFollower",
            SourceKind::BrownianMotion => "brownianMotion",
            SourceKind::EnvelopeTracker => "envelopeTracker",
        }
    }

    /// Look up a source kind by its stable name.
    pub fn from_str_name(name: &str) -> Option<SourceKind> {
        SourceKind::ALL.iter().copied().find(|s| s.as_str() == name)
    }
}

/// Shaping function applied to a connection's bipolar source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveShape {
    /// Identity.
    #[default]
    Linear,
    /// Exponential emphasis: small inputs compressed, extremes preserved.
    Exponential,
    /// Cubic S-curve: extra sensitivity around zero, soft saturation at
    /// the extremes.
    SCurve,
}

impl CurveShape {
    /// All curve shapes.
    pub const ALL: [CurveShape; 3] = [CurveShape::Linear, CurveShape::Exponential, CurveShape::SCurve];

    /// Apply the shape to a value in [-1, 1]; output stays in [-1, 1].
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        let x = x.clamp(-1.0, 1.0);
        match self {
            CurveShape::Linear => x,
            CurveShape::Exponential => x.signum() * x * x,
            CurveShape::SCurve => (x * (1.5 - 0.5 * x * x)).clamp(-1.0, 1.0),
        }
    }

    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            CurveShape::Linear => "linear",
            CurveShape::Exponential => "exponential",
            CurveShape::SCurve => "sCurve",
        }
    }

    /// Look up a curve by its stable name.
    pub fn from_str_name(name: &str) -> Option<CurveShape> {
        CurveShape::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

/// One source-axis → destination routing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Source generator.
    pub source: SourceKind,
    /// Axis within the source (clamped to the source's axis count).
    pub source_axis: usize,
    /// Destination parameter.
    pub destination: ParamKey,
    /// Bipolar depth in [-1, 1].
    pub depth: f32,
    /// Per-connection smoothing time in milliseconds.
    pub smoothing_ms: f32,
    /// Shaping function.
    pub curve: CurveShape,
    /// Disabled connections contribute exactly zero.
    pub enabled: bool,
}

impl Connection {
    /// A unity-depth linear connection, enabled, with 50 ms smoothing.
    pub fn new(source: SourceKind, source_axis: usize, destination: ParamKey, depth: f32) -> Self {
        Self {
            source,
            source_axis,
            destination,
            depth,
            smoothing_ms: 50.0,
            curve: CurveShape::Linear,
            enabled: true,
        }
        .clamped()
    }

    /// Clamp depth, smoothing, and axis into their valid ranges.
    pub fn clamped(mut self) -> Self {
        self.depth = self.depth.clamp(-1.0, 1.0);
        self.smoothing_ms = self.smoothing_ms.clamp(0.0, 2000.0);
        self.source_axis = self.source_axis.min(self.source.axis_count() - 1);
        self
    }
}

/// The modulation matrix.
pub struct ModulationMatrix {
    chaos: ChaosAttractor,
    follower: AudioFollower,
    brownian: BrownianMotion,
    tracker: EnvelopeTracker,

    connections: Vec<Connection>,
    /// One lag per connection, parallel to `connections`.
    lags: Vec<OnePoleLag>,

    /// Per-destination accumulated (smoothed, pre-clamp) sums for the
    /// current block.
    sums: [f32; PARAM_COUNT],

    sample_rate: f32,
}

impl ModulationMatrix {
    /// Matrix with no connections.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            chaos: ChaosAttractor::new(sample_rate),
            follower: AudioFollower::new(sample_rate),
            brownian: BrownianMotion::new(BROWNIAN_SEED),
            tracker: EnvelopeTracker::new(sample_rate),
            connections: Vec::with_capacity(MAX_CONNECTIONS),
            lags: Vec::with_capacity(MAX_CONNECTIONS),
            sums: [0.0; PARAM_COUNT],
            sample_rate,
        }
    }

    /// Configure for a sample rate. Allocates nothing beyond the
    /// pre-reserved connection capacity.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.chaos.set_sample_rate(sample_rate);
        self.follower.set_sample_rate(sample_rate);
        self.tracker.set_sample_rate(sample_rate);
        for lag in &mut self.lags {
            lag.set_sample_rate(sample_rate);
        }
    }

    /// Replace the committed connection list.
    ///
    /// Called by the engine at a block boundary only. Lists longer than
    /// [`MAX_CONNECTIONS`] are truncated. Existing lags are preserved
    /// positionally so an edit to connection N does not restart the
    /// smoothing of the others.
    pub fn commit(&mut self, list: &[Connection]) {
        let take = list.len().min(MAX_CONNECTIONS);
        if list.len() > MAX_CONNECTIONS {
            tracing::warn!(
                requested = list.len(),
                max = MAX_CONNECTIONS,
                "connection list truncated"
            );
        }
        self.connections.clear();
        self.connections
            .extend(list[..take].iter().map(|c| c.clamped()));
        // Grow/shrink the lag bank to match; surviving indices keep state.
        while self.lags.len() < take {
            self.lags.push(OnePoleLag::new(0.0, self.sample_rate, 50.0));
        }
        self.lags.truncate(take);
        for (lag, conn) in self.lags.iter_mut().zip(&self.connections) {
            lag.set_time_ms(conn.smoothing_ms);
        }
    }

    /// Remove every connection.
    pub fn clear(&mut self) {
        self.connections.clear();
        self.lags.clear();
        self.sums = [0.0; PARAM_COUNT];
    }

    /// The committed connection list.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Advance all sources once and rebuild the per-destination sums.
    ///
    /// Real-time safe: no allocation, no locks.
    pub fn process(&mut self, stats: &BlockStats, num_samples: u32) {
        self.chaos.advance_block(stats);
        self.follower.advance_block(stats);
        self.brownian.advance_block(stats);
        self.tracker.advance_block(stats);

        self.sums = [0.0; PARAM_COUNT];
        for i in 0..self.connections.len().min(self.lags.len()) {
            let conn = self.connections[i];
            // Disabled connections settle toward zero so re-enabling does
            // not jump, but they never contribute to the sums.
            let target = if conn.enabled {
                let raw = self.source_axis_value(conn.source, conn.source_axis);
                conn.curve.apply(raw) * conn.depth
            } else {
                0.0
            };
            let lag = &mut self.lags[i];
            lag.retarget(target);
            let value = lag.advance_by(num_samples);
            if conn.enabled {
                self.sums[conn.destination.index()] += value;
            }
        }
    }

    /// The destination's accumulated, already-smoothed contribution for the
    /// current block. Pre-clamp: stacked connections may exceed [-1, 1].
    #[inline]
    pub fn modulation(&self, destination: ParamKey) -> f32 {
        self.sums[destination.index()]
    }

    /// All per-destination sums, indexed by [`ParamKey`].
    #[inline]
    pub fn offsets(&self) -> &[f32; PARAM_COUNT] {
        &self.sums
    }

    /// Reset every source generator and connection lag.
    pub fn reset(&mut self) {
        self.chaos.reset();
        self.follower.reset();
        self.brownian.reset();
        self.tracker.reset();
        for lag in &mut self.lags {
            lag.reset(0.0);
        }
        self.sums = [0.0; PARAM_COUNT];
    }

    fn source_axis_value(&self, source: SourceKind, axis: usize) -> f32 {
        match source {
            SourceKind::ChaosAttractor => self.chaos.axis(axis),
            SourceKind::AudioFollower => self.follower.axis(axis),
            SourceKind::BrownianMotion => self.brownian.axis(axis),
            SourceKind::EnvelopeTracker => self.tracker.axis(axis),
        }
    }
}

/// Generate a sparse random connection set (3–6 connections).
///
/// UI-thread helper; the result goes through the normal commit path.
pub fn randomize_sparse(rng: &mut fastrand::Rng) -> Vec<Connection> {
    let count = rng.usize(3..=6);
    random_connections(rng, count)
}

/// Generate a dense random connection set (10–16 connections).
pub fn randomize_dense(rng: &mut fastrand::Rng) -> Vec<Connection> {
    let count = rng.usize(10..=16);
    random_connections(rng, count)
}

fn random_connections(rng: &mut fastrand::Rng, count: usize) -> Vec<Connection> {
    (0..count)
        .map(|_| {
            let source = SourceKind::ALL[rng.usize(0..SourceKind::ALL.len())];
            Connection {
                source,
                source_axis: rng.usize(0..source.axis_count()),
                destination: ParamKey::from_index(rng.usize(0..PARAM_COUNT)),
                depth: rng.f32() * 1.6 - 0.8,
                smoothing_ms: 20.0 + rng.f32() * 400.0,
                curve: CurveShape::ALL[rng.usize(0..CurveShape::ALL.len())],
                enabled: true,
            }
            .clamped()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent(n: usize) -> BlockStats {
        BlockStats {
            rms: 0.0,
            peak: 0.0,
            len: n,
        }
    }

    #[test]
    fn empty_matrix_yields_zero() {
        let mut matrix = ModulationMatrix::new(48000.0);
        matrix.process(&silent(256), 256);
        for key in ParamKey::ALL {
            assert_eq!(matrix.modulation(key), 0.0);
        }
    }

    #[test]
    fn disabled_connections_do_not_affect_output() {
        let mut matrix = ModulationMatrix::new(48000.0);
        let mut conn = Connection::new(SourceKind::ChaosAttractor, 0, ParamKey::Bloom, 0.8);
        conn.enabled = false;
        matrix.commit(&[conn]);

        for _ in 0..100 {
            matrix.process(&silent(256), 256);
            assert_eq!(matrix.modulation(ParamKey::Bloom), 0.0);
        }
    }

    #[test]
    fn connections_to_same_destination_sum() {
        let mut matrix = ModulationMatrix::new(48000.0);
        // Two followers at rest input 1.0 → axis value approaches +1.
        let a = Connection {
            smoothing_ms: 10.0,
            ..Connection::new(SourceKind::AudioFollower, 0, ParamKey::Bloom, 0.3)
        };
        let b = Connection {
            smoothing_ms: 10.0,
            ..Connection::new(SourceKind::AudioFollower, 1, ParamKey::Bloom, 0.2)
        };
        matrix.commit(&[a, b]);

        let loud = BlockStats {
            rms: 1.0,
            peak: 1.0,
            len: 256,
        };
        for _ in 0..500 {
            matrix.process(&loud, 256);
        }
        let sum = matrix.modulation(ParamKey::Bloom);
        assert!(
            (sum - 0.5).abs() < 0.02,
            "expected summed modulation near 0.5, got {sum}"
        );
    }

    #[test]
    fn per_connection_smoothing_is_honored() {
        let mut matrix = ModulationMatrix::new(48000.0);
        let fast = Connection {
            smoothing_ms: 1.0,
            ..Connection::new(SourceKind::AudioFollower, 0, ParamKey::Time, 1.0)
        };
        let slow = Connection {
            smoothing_ms: 1000.0,
            ..Connection::new(SourceKind::AudioFollower, 0, ParamKey::Mass, 1.0)
        };
        matrix.commit(&[fast, slow]);

        let loud = BlockStats {
            rms: 1.0,
            peak: 1.0,
            len: 256,
        };
        for _ in 0..20 {
            matrix.process(&loud, 256);
        }
        // The fast lag has mostly settled; the slow one is still far away.
        assert!(matrix.modulation(ParamKey::Time) > matrix.modulation(ParamKey::Mass) + 0.1);
    }

    #[test]
    fn deterministic_given_same_state_and_list() {
        let list = vec![
            Connection::new(SourceKind::ChaosAttractor, 1, ParamKey::Warp, 0.5),
            Connection::new(SourceKind::BrownianMotion, 0, ParamKey::Drift, -0.4),
        ];
        let mut a = ModulationMatrix::new(48000.0);
        let mut b = ModulationMatrix::new(48000.0);
        a.commit(&list);
        b.commit(&list);

        for _ in 0..300 {
            a.process(&silent(128), 128);
            b.process(&silent(128), 128);
        }
        for key in ParamKey::ALL {
            assert_eq!(a.modulation(key), b.modulation(key));
        }
    }

    #[test]
    fn commit_truncates_oversized_lists() {
        let mut matrix = ModulationMatrix::new(48000.0);
        let list: Vec<Connection> = (0..MAX_CONNECTIONS + 10)
            .map(|_| Connection::new(SourceKind::BrownianMotion, 0, ParamKey::Haze, 0.1))
            .collect();
        matrix.commit(&list);
        assert_eq!(matrix.connections().len(), MAX_CONNECTIONS);
    }

    #[test]
    fn connection_clamping() {
        let conn = Connection {
            source: SourceKind::AudioFollower,
            source_axis: 99,
            destination: ParamKey::Time,
            depth: 3.0,
            smoothing_ms: -5.0,
            curve: CurveShape::Linear,
            enabled: true,
        }
        .clamped();
        assert_eq!(conn.depth, 1.0);
        assert_eq!(conn.smoothing_ms, 0.0);
        assert_eq!(conn.source_axis, 1);
    }

    #[test]
    fn curves_preserve_range_and_sign() {
        for curve in CurveShape::ALL {
            for i in -10..=10 {
                let x = i as f32 / 10.0;
                let y = curve.apply(x);
                assert!((-1.0..=1.0).contains(&y), "{curve:?}({x}) = {y}");
                if x != 0.0 {
                    assert_eq!(y.signum(), x.signum(), "{curve:?} flipped sign at {x}");
                }
            }
            assert_eq!(curve.apply(0.0), 0.0);
            assert_eq!(curve.apply(1.0), 1.0);
            assert_eq!(curve.apply(-1.0), -1.0);
        }
    }

    #[test]
    fn source_and_curve_names_round_trip() {
        for s in SourceKind::ALL {
            assert_eq!(SourceKind::from_str_name(s.as_str()), Some(s));
        }
        for c in CurveShape::ALL {
            assert_eq!(CurveShape::from_str_name(c.as_str()), Some(c));
        }
        assert_eq!(SourceKind::from_str_name("lfo"), None);
    }

    #[test]
    fn randomizers_respect_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let sparse = randomize_sparse(&mut rng);
        assert!((3..=6).contains(&sparse.len()));
        let dense = randomize_dense(&mut rng);
        assert!((10..=16).contains(&dense.len()));
        for conn in sparse.iter().chain(&dense) {
            assert!((-1.0..=1.0).contains(&conn.depth));
            assert!(conn.source_axis < conn.source.axis_count());
            assert!(conn.enabled);
        }
    }
}
