//! Preset persistence for the graviton effect.
//!
//! The persistence boundary of the control plane: scenes are TOML files
//! naming everything by stable string keys, converted to and from the
//! engine's [`PresetState`](graviton_engine::PresetState) payload with
//! typed errors for unknown names and clamping for out-of-range values.

pub mod error;
pub mod factory;
pub mod preset;
pub mod schema;

pub use error::PresetError;
pub use factory::{FACTORY_SCENE_NAMES, factory_scene, factory_scenes};
pub use preset::ScenePreset;
pub use schema::{ConnectionRecord, KeyframeRecord};
