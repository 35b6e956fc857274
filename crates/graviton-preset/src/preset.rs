//! Scene preset file format and operations.

use std::collections::BTreeMap;
use std::path::Path;

use graviton_core::{ParamKey, ParamSnapshot};
use graviton_engine::{
    MACRO_DEFAULT, MAX_MACROS, MacroMode, PlaybackMode, PresetState, ProcessingMode, Timeline,
    Topology,
};
use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::schema::{ConnectionRecord, KeyframeRecord};

/// A complete scene stored on disk.
///
/// Scenes are TOML files holding parameter values by stable key, the
/// routing/processing selection, the macro state, and the modulation
/// connection list.
///
/// # TOML Format
///
/// ```toml
/// name = "Deep Orbit"
/// description = "Slow, massive field"
/// topology = "deepField"
/// processing_mode = "focused"
/// macro_mode = "thematic"
/// macros = [0.7, 0.6, 0.4, 0.3, 0.5]
///
/// [params]
/// time = 0.85
/// mass = 0.7
///
/// [[connections]]
/// source = "chaosAttractor"
/// destination = "drift"
/// depth = 0.3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenePreset {
    /// Name of the scene.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Routing topology by stable name.
    #[serde(default = "default_topology")]
    pub topology: String,

    /// Processing mode by stable name.
    #[serde(default = "default_processing_mode")]
    pub processing_mode: String,

    /// Macro mapping policy by stable name.
    #[serde(default = "default_macro_mode")]
    pub macro_mode: String,

    /// Macro knob values; missing entries read as resting.
    #[serde(default)]
    pub macros: Vec<f32>,

    /// Sequence playback mode by stable name (`"oneShot"` or `"loop"`).
    #[serde(default = "default_playback_mode")]
    pub playback_mode: String,

    /// Parameter values by stable key. Keys this build does not know are
    /// skipped on load so newer files still open.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,

    /// Modulation connections.
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,

    /// Sequence automation spans.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<KeyframeRecord>,
}

fn default_topology() -> String {
    Topology::Traditional.as_str().to_string()
}

fn default_processing_mode() -> String {
    ProcessingMode::Focused.as_str().to_string()
}

fn default_macro_mode() -> String {
    MacroMode::Thematic.as_str().to_string()
}

fn default_playback_mode() -> String {
    PlaybackMode::OneShot.as_str().to_string()
}

impl ScenePreset {
    /// A new empty scene at init state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            topology: default_topology(),
            processing_mode: default_processing_mode(),
            macro_mode: default_macro_mode(),
            macros: Vec::new(),
            playback_mode: default_playback_mode(),
            params: BTreeMap::new(),
            connections: Vec::new(),
            sequence: Vec::new(),
        }
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load a scene from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PresetError::read_file(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load a scene from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PresetError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the scene to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| PresetError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| PresetError::write_file(path, e))
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, PresetError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convert to an engine state payload.
    ///
    /// Unknown topology/mode/source names are typed errors; unknown
    /// parameter keys are skipped; all values are clamped into range.
    pub fn to_state(&self) -> Result<PresetState, PresetError> {
        let topology = Topology::from_str_name(&self.topology)
            .ok_or_else(|| PresetError::UnknownTopology(self.topology.clone()))?;
        let processing_mode = ProcessingMode::from_str_name(&self.processing_mode)
            .ok_or_else(|| PresetError::UnknownProcessingMode(self.processing_mode.clone()))?;
        let macro_mode = MacroMode::from_str_name(&self.macro_mode)
            .ok_or_else(|| PresetError::UnknownMacroMode(self.macro_mode.clone()))?;

        let mut params = ParamSnapshot::defaults();
        for (key, &value) in &self.params {
            if let Some(param) = ParamKey::from_str_key(key) {
                params.set(param, value);
            }
        }

        let mut macro_values = [MACRO_DEFAULT; MAX_MACROS];
        for (slot, &value) in macro_values.iter_mut().zip(&self.macros) {
            *slot = value.clamp(0.0, 1.0);
        }

        let connections = self
            .connections
            .iter()
            .map(ConnectionRecord::to_connection)
            .collect::<Result<Vec<_>, _>>()?;

        let playback_mode = PlaybackMode::from_str_name(&self.playback_mode)
            .ok_or_else(|| PresetError::UnknownPlaybackMode(self.playback_mode.clone()))?;
        let keyframes = self
            .sequence
            .iter()
            .map(KeyframeRecord::to_keyframe)
            .collect::<Result<Vec<_>, _>>()?;
        let timeline = Timeline::from_keyframes(keyframes).with_mode(playback_mode);

        Ok(PresetState {
            params,
            macro_mode,
            macro_values,
            topology,
            processing_mode,
            connections,
            timeline,
        })
    }

    /// Build a scene from an engine state payload.
    pub fn from_state(name: impl Into<String>, state: &PresetState) -> Self {
        let mut params = BTreeMap::new();
        for key in ParamKey::ALL {
            params.insert(key.as_str().to_string(), state.params.get(key));
        }
        Self {
            name: name.into(),
            description: None,
            topology: state.topology.as_str().to_string(),
            processing_mode: state.processing_mode.as_str().to_string(),
            macro_mode: state.macro_mode.as_str().to_string(),
            macros: state.macro_values[..state.macro_mode.macro_count()].to_vec(),
            playback_mode: state.timeline.mode().as_str().to_string(),
            params,
            connections: state
                .connections
                .iter()
                .map(ConnectionRecord::from_connection)
                .collect(),
            sequence: state
                .timeline
                .keyframes()
                .iter()
                .map(KeyframeRecord::from_keyframe)
                .collect(),
        }
    }
}
