//! Serialized connection and keyframe schema.
//!
//! Connections and sequence spans are stored by stable string names rather
//! than enum indices so preset files survive reordering of the enums.
//! Unknown names fail with a typed error; numeric fields are clamped into
//! range on the way in.

use graviton_core::ParamKey;
use graviton_engine::{Connection, CurveShape, Keyframe, SourceKind};
use serde::{Deserialize, Serialize};

use crate::error::PresetError;

/// One modulation connection as stored in a preset file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionRecord {
    /// Source generator name (e.g. `"chaosAttractor"`).
    pub source: String,

    /// Destination parameter key (e.g. `"bloom"`).
    pub destination: String,

    /// Axis within the source.
    #[serde(default)]
    pub source_axis: usize,

    /// Bipolar depth.
    pub depth: f32,

    /// Per-connection smoothing time in milliseconds.
    #[serde(default = "default_smoothing_ms")]
    pub smoothing_ms: f32,

    /// Curve shape name (e.g. `"linear"`).
    #[serde(default = "default_curve")]
    pub curve: String,

    /// Whether the connection is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_smoothing_ms() -> f32 {
    50.0
}

fn default_curve() -> String {
    CurveShape::Linear.as_str().to_string()
}

fn default_enabled() -> bool {
    true
}

impl ConnectionRecord {
    /// Record for an engine connection.
    pub fn from_connection(connection: &Connection) -> Self {
        Self {
            source: connection.source.as_str().to_string(),
            destination: connection.destination.as_str().to_string(),
            source_axis: connection.source_axis,
            depth: connection.depth,
            smoothing_ms: connection.smoothing_ms,
            curve: connection.curve.as_str().to_string(),
            enabled: connection.enabled,
        }
    }

    /// Convert to an engine connection, failing on unknown names. Depth,
    /// smoothing, and axis are clamped into their valid ranges.
    pub fn to_connection(&self) -> Result<Connection, PresetError> {
        let source = SourceKind::from_str_name(&self.source)
            .ok_or_else(|| PresetError::UnknownSource(self.source.clone()))?;
        let destination = ParamKey::from_str_key(&self.destination)
            .ok_or_else(|| PresetError::UnknownDestination(self.destination.clone()))?;
        let curve = CurveShape::from_str_name(&self.curve)
            .ok_or_else(|| PresetError::UnknownCurve(self.curve.clone()))?;
        Ok(Connection {
            source,
            source_axis: self.source_axis,
            destination,
            depth: self.depth,
            smoothing_ms: self.smoothing_ms,
            curve,
            enabled: self.enabled,
        }
        .clamped())
    }
}

/// One sequence automation span as stored in a preset file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyframeRecord {
    /// Parameter key the span drives (e.g. `"drift"`).
    pub param: String,

    /// Span start in seconds.
    pub start: f64,

    /// Span end in seconds.
    pub end: f64,

    /// Value at `start`.
    pub from: f32,

    /// Value at `end`.
    pub to: f32,

    /// Interpolation shape name (e.g. `"linear"`).
    #[serde(default = "default_curve")]
    pub curve: String,
}

impl KeyframeRecord {
    /// Record for an engine keyframe.
    pub fn from_keyframe(keyframe: &Keyframe) -> Self {
        Self {
            param: keyframe.param.as_str().to_string(),
            start: keyframe.start,
            end: keyframe.end,
            from: keyframe.from,
            to: keyframe.to,
            curve: keyframe.curve.as_str().to_string(),
        }
    }

    /// Convert to an engine keyframe, failing on unknown names. Values are
    /// clamped by the scheduler at evaluation time.
    pub fn to_keyframe(&self) -> Result<Keyframe, PresetError> {
        let param = ParamKey::from_str_key(&self.param)
            .ok_or_else(|| PresetError::UnknownDestination(self.param.clone()))?;
        let curve = CurveShape::from_str_name(&self.curve)
            .ok_or_else(|| PresetError::UnknownCurve(self.curve.clone()))?;
        Ok(Keyframe {
            param,
            start: self.start,
            end: self.end,
            from: self.from,
            to: self.to,
            curve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_field() {
        let mut original = Connection::new(SourceKind::BrownianMotion, 1, ParamKey::Swirl, -0.35);
        original.smoothing_ms = 120.0;
        original.curve = CurveShape::SCurve;
        original.enabled = false;

        let record = ConnectionRecord::from_connection(&original);
        let back = record.to_connection().unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn unknown_names_are_typed_errors() {
        let mut record = ConnectionRecord::from_connection(&Connection::new(
            SourceKind::ChaosAttractor,
            0,
            ParamKey::Time,
            0.5,
        ));
        record.source = "warbleizer".to_string();
        assert!(matches!(
            record.to_connection(),
            Err(PresetError::UnknownSource(_))
        ));

        record.source = SourceKind::ChaosAttractor.as_str().to_string();
        record.destination = "loudness".to_string();
        assert!(matches!(
            record.to_connection(),
            Err(PresetError::UnknownDestination(_))
        ));

        record.destination = ParamKey::Time.as_str().to_string();
        record.curve = "wiggle".to_string();
        assert!(matches!(
            record.to_connection(),
            Err(PresetError::UnknownCurve(_))
        ));
    }

    #[test]
    fn out_of_range_fields_clamp_on_load() {
        let record = ConnectionRecord {
            source: "audioFollower".to_string(),
            destination: "bloom".to_string(),
            source_axis: 7,
            depth: 3.0,
            smoothing_ms: -10.0,
            curve: "linear".to_string(),
            enabled: true,
        };
        let connection = record.to_connection().unwrap();
        assert_eq!(connection.depth, 1.0);
        assert_eq!(connection.smoothing_ms, 0.0);
        assert!(connection.source_axis < SourceKind::AudioFollower.axis_count());
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let record: ConnectionRecord = toml::from_str(
            r#"
            source = "envelopeTracker"
            destination = "drift"
            depth = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(record.smoothing_ms, 50.0);
        assert_eq!(record.curve, "linear");
        assert!(record.enabled);
        assert_eq!(record.source_axis, 0);
        record.to_connection().unwrap();
    }

    #[test]
    fn keyframe_round_trips_every_field() {
        let original = Keyframe {
            param: ParamKey::Swirl,
            start: 1.5,
            end: 4.0,
            from: 0.1,
            to: 0.8,
            curve: CurveShape::SCurve,
        };
        let record = KeyframeRecord::from_keyframe(&original);
        assert_eq!(record.curve, "sCurve");
        assert_eq!(record.to_keyframe().unwrap(), original);
    }

    #[test]
    fn keyframe_curve_defaults_to_linear() {
        let record: KeyframeRecord = toml::from_str(
            r#"
            param = "bloom"
            start = 0.0
            end = 2.0
            from = 0.2
            to = 0.9
            "#,
        )
        .unwrap();
        let keyframe = record.to_keyframe().unwrap();
        assert_eq!(keyframe.curve, CurveShape::Linear);
    }

    #[test]
    fn keyframe_unknown_names_are_typed_errors() {
        let mut record = KeyframeRecord {
            param: "loudness".to_string(),
            start: 0.0,
            end: 1.0,
            from: 0.0,
            to: 1.0,
            curve: "linear".to_string(),
        };
        assert!(matches!(
            record.to_keyframe(),
            Err(PresetError::UnknownDestination(_))
        ));

        record.param = "bloom".to_string();
        record.curve = "wiggle".to_string();
        assert!(matches!(
            record.to_keyframe(),
            Err(PresetError::UnknownCurve(_))
        ));
    }
}
