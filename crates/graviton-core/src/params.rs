//! Automatable parameter keys and their static specifications.
//!
//! The engine exposes a closed set of 28 automatable parameters. Each has a
//! stable string key (the host-facing identifier), a numeric range, a
//! default, and a smoothing time. The eight most audible parameters are
//! flagged `per_sample` and are ramped sample-accurately by the blend
//! pipeline; the rest advance at block rate.
//!
//! The set is deliberately a closed enum rather than an open registry:
//! modulation destinations, preset keys, and the atomic store all index the
//! same fixed table, so an out-of-range index can always be clamped instead
//! of failing.

/// Number of automatable parameters.
pub const PARAM_COUNT: usize = 28;

/// Identifier for one automatable parameter.
///
/// The first eight variants are the "hot" parameters ramped per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ParamKey {
    /// Reverb time scale.
    Time,
    /// Virtual mass / size of the space.
    Mass,
    /// Echo density.
    Density,
    /// Late-field blooming amount.
    Bloom,
    /// Gravity well depth (feedback pull).
    Gravity,
    /// Early reflection shape.
    Shape,
    /// Spectral warp amount.
    Warp,
    /// Slow stereo drift.
    Drift,
    /// Material character (metallic vs. soft).
    Material,
    /// High-frequency air.
    Air,
    /// Spectral tilt.
    Tilt,
    /// Stereo width.
    Width,
    /// Wet/dry mix.
    Mix,
    /// Pre-delay in milliseconds.
    PreDelay,
    /// Tail decay.
    Decay,
    /// Shimmer (octave-up regeneration) amount.
    Shimmer,
    /// Granulation amount.
    Grain,
    /// Grain scatter.
    Scatter,
    /// Global feedback.
    Feedback,
    /// Tone control.
    Tone,
    /// Internal motion rate.
    MotionRate,
    /// Internal motion depth.
    MotionDepth,
    /// Rotational swirl.
    Swirl,
    /// Diffuse haze.
    Haze,
    /// Envelope attack.
    Attack,
    /// Envelope release.
    Release,
    /// Low cut frequency in Hz.
    LowCut,
    /// High cut frequency in Hz.
    HighCut,
}

/// Static specification for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable string key consumed by the host automation system.
    pub key: &'static str,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Default value (also the non-finite fallback).
    pub default: f32,
    /// Ramp time for the blend pipeline, in milliseconds.
    pub smoothing_ms: f32,
    /// Whether the blend pipeline ramps this parameter per sample.
    pub per_sample: bool,
}

impl ParamSpec {
    /// Clamp a value to this parameter's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Width of the valid range.
    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

const fn spec(
    key: &'static str,
    min: f32,
    max: f32,
    default: f32,
    smoothing_ms: f32,
    per_sample: bool,
) -> ParamSpec {
    ParamSpec {
        key,
        min,
        max,
        default,
        smoothing_ms,
        per_sample,
    }
}

/// Specification table, indexed by `ParamKey as usize`.
static SPECS: [ParamSpec; PARAM_COUNT] = [
    spec("time", 0.0, 1.0, 0.5, 60.0, true),
    spec("mass", 0.0, 1.0, 0.5, 60.0, true),
    spec("density", 0.0, 1.0, 0.5, 50.0, true),
    spec("bloom", 0.0, 1.0, 0.3, 50.0, true),
    spec("gravity", 0.0, 1.0, 0.5, 50.0, true),
    spec("shape", 0.0, 1.0, 0.5, 50.0, true),
    spec("warp", 0.0, 1.0, 0.0, 50.0, true),
    spec("drift", 0.0, 1.0, 0.2, 80.0, true),
    spec("material", 0.0, 1.0, 0.5, 30.0, false),
    spec("air", 0.0, 1.0, 0.5, 30.0, false),
    spec("tilt", 0.0, 1.0, 0.5, 30.0, false),
    spec("width", 0.0, 1.0, 0.8, 30.0, false),
    spec("mix", 0.0, 1.0, 0.35, 20.0, false),
    spec("preDelay", 0.0, 200.0, 20.0, 40.0, false),
    spec("decay", 0.0, 1.0, 0.5, 30.0, false),
    spec("shimmer", 0.0, 1.0, 0.0, 30.0, false),
    spec("grain", 0.0, 1.0, 0.0, 30.0, false),
    spec("scatter", 0.0, 1.0, 0.3, 30.0, false),
    spec("feedback", 0.0, 1.0, 0.4, 30.0, false),
    spec("tone", 0.0, 1.0, 0.5, 30.0, false),
    spec("motionRate", 0.0, 1.0, 0.3, 30.0, false),
    spec("motionDepth", 0.0, 1.0, 0.2, 30.0, false),
    spec("swirl", 0.0, 1.0, 0.0, 30.0, false),
    spec("haze", 0.0, 1.0, 0.2, 30.0, false),
    spec("attack", 0.0, 1.0, 0.2, 30.0, false),
    spec("release", 0.0, 1.0, 0.5, 30.0, false),
    spec("lowCut", 20.0, 500.0, 20.0, 40.0, false),
    spec("highCut", 1000.0, 20000.0, 18000.0, 40.0, false),
];

impl ParamKey {
    /// All parameters, in table order.
    pub const ALL: [ParamKey; PARAM_COUNT] = [
        ParamKey::Time,
        ParamKey::Mass,
        ParamKey::Density,
        ParamKey::Bloom,
        ParamKey::Gravity,
        ParamKey::Shape,
        ParamKey::Warp,
        ParamKey::Drift,
        ParamKey::Material,
        ParamKey::Air,
        ParamKey::Tilt,
        ParamKey::Width,
        ParamKey::Mix,
        ParamKey::PreDelay,
        ParamKey::Decay,
        ParamKey::Shimmer,
        ParamKey::Grain,
        ParamKey::Scatter,
        ParamKey::Feedback,
        ParamKey::Tone,
        ParamKey::MotionRate,
        ParamKey::MotionDepth,
        ParamKey::Swirl,
        ParamKey::Haze,
        ParamKey::Attack,
        ParamKey::Release,
        ParamKey::LowCut,
        ParamKey::HighCut,
    ];

    /// Table index of this parameter.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parameter at a table index, clamped to the valid range.
    ///
    /// Out-of-range indices return the last parameter rather than panicking;
    /// callers that need a "safe default" behavior should validate upstream.
    #[inline]
    pub fn from_index(index: usize) -> ParamKey {
        ParamKey::ALL[index.min(PARAM_COUNT - 1)]
    }

    /// Static specification for this parameter.
    #[inline]
    pub fn spec(self) -> &'static ParamSpec {
        &SPECS[self as usize]
    }

    /// Stable string key (host/preset identifier).
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.spec().key
    }

    /// Look up a parameter by its stable string key.
    pub fn from_str_key(key: &str) -> Option<ParamKey> {
        ParamKey::ALL.iter().copied().find(|p| p.as_str() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        for (i, key) in ParamKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
            assert_eq!(ParamKey::from_index(i), *key);
            let s = key.spec();
            assert!(s.min < s.max, "{}: empty range", s.key);
            assert!(
                s.default >= s.min && s.default <= s.max,
                "{}: default outside range",
                s.key
            );
            assert!(s.smoothing_ms > 0.0);
        }
    }

    #[test]
    fn string_keys_are_unique_and_round_trip() {
        for key in ParamKey::ALL {
            assert_eq!(ParamKey::from_str_key(key.as_str()), Some(key));
        }
        assert_eq!(ParamKey::from_str_key("nonsense"), None);
    }

    #[test]
    fn out_of_range_index_clamps() {
        assert_eq!(ParamKey::from_index(999), ParamKey::HighCut);
        assert_eq!(ParamKey::from_index(0), ParamKey::Time);
    }

    #[test]
    fn hot_params_are_the_first_eight() {
        for (i, key) in ParamKey::ALL.iter().enumerate() {
            assert_eq!(key.spec().per_sample, i < 8, "{}", key.as_str());
        }
    }

    #[test]
    fn spec_clamp() {
        let s = ParamKey::PreDelay.spec();
        assert_eq!(s.clamp(-5.0), 0.0);
        assert_eq!(s.clamp(500.0), 200.0);
        assert_eq!(s.clamp(50.0), 50.0);
        assert_eq!(s.span(), 200.0);
    }
}
