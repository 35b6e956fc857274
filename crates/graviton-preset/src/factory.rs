//! Factory scenes bundled with the library.
//!
//! Embedded at compile time so a handful of starting points are always
//! available without external files.

use crate::error::PresetError;
use crate::preset::ScenePreset;

/// Names of the factory scenes, lookup order.
pub static FACTORY_SCENE_NAMES: &[&str] = &["init", "deep_orbit", "dust_and_wire", "event_horizon"];

/// TOML content for factory scenes.
static FACTORY_SCENES_TOML: &[(&str, &str)] = &[
    ("init", INIT_SCENE),
    ("deep_orbit", DEEP_ORBIT_SCENE),
    ("dust_and_wire", DUST_AND_WIRE_SCENE),
    ("event_horizon", EVENT_HORIZON_SCENE),
];

/// Init scene: defaults everywhere, no modulation.
const INIT_SCENE: &str = r#"
name = "Init"
description = "Default state - traditional topology, no modulation"
topology = "traditional"
processing_mode = "focused"
macro_mode = "thematic"
macros = [0.5, 0.5, 0.5, 0.5, 0.5]
"#;

/// Slow, massive field with drifting chaos.
const DEEP_ORBIT_SCENE: &str = r#"
name = "Deep Orbit"
description = "Slow massive field, chaos drifting the image"
topology = "deepField"
processing_mode = "focused"
macro_mode = "thematic"
macros = [0.75, 0.6, 0.35, 0.4, 0.65]

[params]
time = 0.85
mass = 0.8
bloom = 0.6
drift = 0.3
mix = 0.45

[[connections]]
source = "chaosAttractor"
destination = "drift"
source_axis = 0
depth = 0.25
smoothing_ms = 200.0
curve = "sCurve"

[[connections]]
source = "chaosAttractor"
destination = "swirl"
source_axis = 2
depth = 0.2
smoothing_ms = 350.0
"#;

/// Granular, metallic, responsive to playing dynamics.
const DUST_AND_WIRE_SCENE: &str = r#"
name = "Dust and Wire"
description = "Granular metallic scatter that breathes with the input"
topology = "metallicGranular"
processing_mode = "entropic"
macro_mode = "expressive"
macros = [0.7, 0.45, 0.6]

[params]
density = 0.7
grain = 0.8
scatter = 0.6
material = 0.75
mix = 0.5

[[connections]]
source = "audioFollower"
destination = "density"
source_axis = 0
depth = 0.4
smoothing_ms = 60.0
curve = "exponential"

[[connections]]
source = "envelopeTracker"
destination = "grain"
source_axis = 1
depth = 0.3
smoothing_ms = 40.0

[[connections]]
source = "brownianMotion"
destination = "scatter"
source_axis = 0
depth = 0.2
smoothing_ms = 500.0
"#;

/// Everything-on showcase behind the densest topology.
const EVENT_HORIZON_SCENE: &str = r#"
name = "Event Horizon"
description = "Maximum density, warped and blooming"
topology = "eventHorizon"
processing_mode = "blooming"
macro_mode = "thematic"
macros = [0.8, 0.85, 0.55, 0.7, 0.8]

[params]
time = 0.95
mass = 0.85
bloom = 0.9
warp = 0.5
haze = 0.7
mix = 0.6

[[connections]]
source = "chaosAttractor"
destination = "warp"
source_axis = 1
depth = 0.35
smoothing_ms = 150.0
curve = "sCurve"

[[connections]]
source = "audioFollower"
destination = "bloom"
source_axis = 1
depth = 0.3
smoothing_ms = 80.0
"#;

/// Load a factory scene by name.
pub fn factory_scene(name: &str) -> Result<ScenePreset, PresetError> {
    let (_, toml) = FACTORY_SCENES_TOML
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| PresetError::SceneNotFound(name.to_string()))?;
    ScenePreset::from_toml(toml)
}

/// All factory scenes, parse order.
pub fn factory_scenes() -> Vec<ScenePreset> {
    FACTORY_SCENES_TOML
        .iter()
        .filter_map(|(_, toml)| ScenePreset::from_toml(toml).ok())
        .collect()
}
