//! Macro mapping: a few high-level knobs steering many base parameters.
//!
//! Two interchangeable mapping policies exist: [`MacroMode::Thematic`]
//! (five scene-building knobs) and [`MacroMode::Expressive`] (three
//! performance knobs). Exactly one is active at a time.
//!
//! `compute_targets` is a pure function of the macro vector — no hidden
//! history — so the same knob positions always produce the same targets.
//! The blend policy lives with the pipeline: the macro system contributes a
//! *target* which is lerped against the user value by [`influence`] before
//! smoothing, so at influence 0 the macros are fully transparent.

use graviton_core::{PARAM_COUNT, ParamKey, lerp};

/// Maximum macro knob count across modes.
pub const MAX_MACROS: usize = 5;

/// Rest position of every macro knob.
pub const MACRO_DEFAULT: f32 = 0.5;

/// Active macro mapping policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroMode {
    /// Five scene-building knobs: Orbit, Bloomfield, Texture, Motion, Space.
    #[default]
    Thematic,
    /// Three performance knobs: Energy, Gravity, Color.
    Expressive,
}

impl MacroMode {
    /// Number of macro knobs in this mode.
    pub const fn macro_count(self) -> usize {
        match self {
            MacroMode::Thematic => 5,
            MacroMode::Expressive => 3,
        }
    }

    /// Influence sensitivity: how fast knob deviation from rest saturates
    /// the macro system's authority.
    const fn sensitivity(self) -> f32 {
        match self {
            // Five knobs, gentler per-knob weight.
            MacroMode::Thematic => 0.8,
            // Three knobs that should take over quickly when performed.
            MacroMode::Expressive => 1.2,
        }
    }

    /// Selector index for this mode.
    pub const fn index(self) -> usize {
        match self {
            MacroMode::Thematic => 0,
            MacroMode::Expressive => 1,
        }
    }

    /// Mode at an integer selector index, clamping out-of-range to Thematic.
    pub fn from_index(index: usize) -> MacroMode {
        match index {
            1 => MacroMode::Expressive,
            _ => MacroMode::Thematic,
        }
    }

    /// Stable name used by the preset schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            MacroMode::Thematic => "thematic",
            MacroMode::Expressive => "expressive",
        }
    }

    /// Look up a mode by its stable name.
    pub fn from_str_name(name: &str) -> Option<MacroMode> {
        match name {
            "thematic" => Some(MacroMode::Thematic),
            "expressive" => Some(MacroMode::Expressive),
            _ => None,
        }
    }
}

/// Computed per-parameter macro targets for one block.
///
/// `None` means the active policy does not govern that parameter and the
/// user value passes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct MacroTargets {
    targets: [Option<f32>; PARAM_COUNT],
}

impl MacroTargets {
    /// Target for one parameter, if governed.
    #[inline]
    pub fn get(&self, key: ParamKey) -> Option<f32> {
        self.targets[key.index()]
    }

    fn none() -> Self {
        Self {
            targets: [None; PARAM_COUNT],
        }
    }

    fn set(&mut self, key: ParamKey, value: f32) {
        self.targets[key.index()] = Some(key.spec().clamp(value));
    }
}

/// Stateless macro-to-parameter mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroMapper {
    mode: MacroMode,
}

impl MacroMapper {
    /// Mapper with the given policy.
    pub fn new(mode: MacroMode) -> Self {
        Self { mode }
    }

    /// Active policy.
    pub fn mode(&self) -> MacroMode {
        self.mode
    }

    /// Switch policy.
    pub fn set_mode(&mut self, mode: MacroMode) {
        self.mode = mode;
    }

    /// Macro authority in [0, 1]: 0 with every knob at rest, saturating as
    /// knobs deviate.
    pub fn influence(&self, macros: &[f32]) -> f32 {
        let count = self.mode.macro_count().min(macros.len());
        let deviation: f32 = macros[..count]
            .iter()
            .map(|m| (m.clamp(0.0, 1.0) - MACRO_DEFAULT).abs())
            .sum();
        (deviation * self.mode.sensitivity()).clamp(0.0, 1.0)
    }

    /// Compute one target per governed base parameter.
    ///
    /// Pure: no state is read besides the mode, none is written. Missing
    /// knob values (short slice) are treated as resting.
    pub fn compute_targets(&self, macros: &[f32]) -> MacroTargets {
        let knob = |i: usize| -> f32 {
            macros.get(i).copied().unwrap_or(MACRO_DEFAULT).clamp(0.0, 1.0)
        };
        let mut out = MacroTargets::none();
        match self.mode {
            MacroMode::Thematic => {
                // Orbit: overall size and persistence of the space.
                let orbit = knob(0);
                out.set(ParamKey::Time, lerp(0.2, 1.0, orbit));
                out.set(ParamKey::Mass, lerp(0.25, 0.95, orbit));
                out.set(ParamKey::Decay, lerp(0.3, 0.9, orbit));

                // Bloomfield: late-field wash.
                let bloomfield = knob(1);
                out.set(ParamKey::Bloom, bloomfield);
                out.set(ParamKey::Haze, lerp(0.0, 0.8, bloomfield));
                out.set(ParamKey::Shimmer, lerp(0.0, 0.6, bloomfield * bloomfield));

                // Texture: granularity and surface character.
                let texture = knob(2);
                out.set(ParamKey::Density, lerp(0.2, 1.0, texture));
                out.set(ParamKey::Grain, lerp(0.0, 0.9, texture));
                out.set(ParamKey::Scatter, lerp(0.1, 0.8, texture));
                out.set(ParamKey::Material, texture);

                // Motion: internal movement.
                let motion = knob(3);
                out.set(ParamKey::Drift, lerp(0.0, 0.9, motion));
                out.set(ParamKey::Swirl, lerp(0.0, 0.8, motion));
                out.set(ParamKey::MotionRate, motion);
                out.set(ParamKey::MotionDepth, lerp(0.05, 0.7, motion));
                out.set(ParamKey::Warp, lerp(0.0, 0.6, motion * motion));

                // Space: image and placement.
                let space = knob(4);
                out.set(ParamKey::Width, lerp(0.4, 1.0, space));
                out.set(ParamKey::Air, space);
                out.set(ParamKey::Mix, lerp(0.15, 0.7, space));
            }
            MacroMode::Expressive => {
                // Energy: how much the effect breathes with playing.
                let energy = knob(0);
                out.set(ParamKey::Density, lerp(0.3, 1.0, energy));
                out.set(ParamKey::Bloom, lerp(0.1, 0.9, energy));
                out.set(ParamKey::MotionDepth, lerp(0.0, 0.8, energy));
                out.set(ParamKey::Attack, lerp(0.6, 0.05, energy));

                // Gravity: pull of the tail.
                let gravity = knob(1);
                out.set(ParamKey::Gravity, gravity);
                out.set(ParamKey::Time, lerp(0.25, 1.0, gravity));
                out.set(ParamKey::Feedback, lerp(0.2, 0.8, gravity));
                out.set(ParamKey::Mass, lerp(0.3, 0.9, gravity));

                // Color: spectral balance.
                let color = knob(2);
                out.set(ParamKey::Tone, color);
                out.set(ParamKey::Tilt, color);
                out.set(ParamKey::Air, lerp(0.1, 0.95, color));
                out.set(ParamKey::Material, lerp(0.2, 0.9, color));
            }
        }
        out
    }
}
