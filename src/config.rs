//! Sequencer configuration
//!
//! A configuration lists layers, each with an id, an audio source and its
//! timed actions:
//!
//! ```json
//! {
//!   "layers": [
//!     {
//!       "id": "rain",
//!       "file": "rain.wav",
//!       "actions": [
//!         { "type": "play", "start": 0, "loop": true },
//!         { "type": "volume", "start": 0, "from": 0, "to": 1, "duration": 2 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Unknown action types are rejected in [`ParseMode::Strict`]. In
//! [`ParseMode::Lenient`] they are logged and skipped so the rest of the
//! layer still loads.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::actions::{ActionDescriptor, ActionKind};
use crate::error::{Result, SequencerError};

/// How to treat actions whose `"type"` is not recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Reject the whole configuration
    #[default]
    Strict,
    /// Warn and drop just that action
    Lenient,
}

/// Top-level sequencer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// One layer: an audio source and the actions that drive it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Unique layer id, also the target id used in timer ids
    pub id: String,
    /// Source reference handed to the loader
    pub file: String,
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
}

impl LayerConfig {
    pub fn new(id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            actions: Vec::new(),
        }
    }

    /// Append an action (builder style)
    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    layers: Vec<RawLayer>,
}

#[derive(Deserialize)]
struct RawLayer {
    id: String,
    file: String,
    #[serde(default)]
    actions: Vec<Value>,
}

impl SequencerConfig {
    pub fn new(layers: Vec<LayerConfig>) -> Self {
        Self { layers }
    }

    /// Parse JSON, rejecting unknown action types
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::parse(json, ParseMode::Strict)
    }

    /// Parse JSON, skipping unknown action types with a warning
    pub fn from_json_str_lenient(json: &str) -> Result<Self> {
        Self::parse(json, ParseMode::Lenient)
    }

    /// Parse and validate a JSON configuration
    pub fn parse(json: &str, mode: ParseMode) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let layers = raw
            .layers
            .into_iter()
            .map(|layer| parse_layer(layer, mode))
            .collect::<Result<Vec<_>>>()?;

        let config = Self { layers };
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file, rejecting unknown action types
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_mode(path, ParseMode::Strict)
    }

    /// Read a configuration file, skipping unknown action types
    pub fn load_lenient(path: &Path) -> Result<Self> {
        Self::load_with_mode(path, ParseMode::Lenient)
    }

    /// Read, parse and validate a configuration file
    pub fn load_with_mode(path: &Path, mode: ParseMode) -> Result<Self> {
        if !path.exists() {
            return Err(SequencerError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }
        let json = fs::read_to_string(path)?;
        Self::parse(&json, mode)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Check ids and numeric fields
    ///
    /// - layer ids are non-empty and unique
    /// - `start` and `duration` are finite and non-negative
    /// - `from` and `to`, when present, are finite
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for layer in &self.layers {
            if layer.id.trim().is_empty() {
                return Err(SequencerError::InvalidConfig {
                    reason: format!("layer with source '{}' has an empty id", layer.file),
                });
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(SequencerError::DuplicateLayer {
                    id: layer.id.clone(),
                });
            }

            for (index, action) in layer.actions.iter().enumerate() {
                validate_action(action).map_err(|reason| SequencerError::InvalidAction {
                    layer: layer.id.clone(),
                    index,
                    reason,
                })?;
            }
        }

        Ok(())
    }
}

fn parse_layer(raw: RawLayer, mode: ParseMode) -> Result<LayerConfig> {
    let mut actions = Vec::with_capacity(raw.actions.len());

    for (index, value) in raw.actions.into_iter().enumerate() {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Err(SequencerError::InvalidAction {
                layer: raw.id,
                index,
                reason: "missing \"type\" field".to_string(),
            });
        };

        if ActionKind::from_name(kind).is_none() {
            match mode {
                ParseMode::Strict => {
                    return Err(SequencerError::UnknownActionKind {
                        layer: raw.id,
                        kind: kind.to_string(),
                    });
                }
                ParseMode::Lenient => {
                    warn!(layer = %raw.id, kind, index, "skipping unknown action type");
                    continue;
                }
            }
        }

        let action = serde_json::from_value(value).map_err(|e| SequencerError::InvalidAction {
            layer: raw.id.clone(),
            index,
            reason: e.to_string(),
        })?;
        actions.push(action);
    }

    Ok(LayerConfig {
        id: raw.id,
        file: raw.file,
        actions,
    })
}

fn validate_action(action: &ActionDescriptor) -> std::result::Result<(), String> {
    let start = action.start();
    if !start.is_finite() || start < 0.0 {
        return Err(format!("start must be a non-negative number, got {}", start));
    }

    if let ActionDescriptor::Volume(ramp) | ActionDescriptor::Pan(ramp) = action {
        if !ramp.duration.is_finite() || ramp.duration < 0.0 {
            return Err(format!(
                "duration must be a non-negative number, got {}",
                ramp.duration
            ));
        }
        for (name, value) in [("from", ramp.from), ("to", ramp.to)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(format!("{} must be a finite number", name));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Easing, PlayAction, RampAction};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const RAIN: &str = r#"{
        "layers": [
            {
                "id": "rain",
                "file": "rain.wav",
                "actions": [
                    { "type": "play", "start": 0, "loop": true },
                    { "type": "volume", "from": 0, "to": 1, "duration": 2, "ease": "linear" }
                ]
            },
            { "id": "birds", "file": "birds.wav" }
        ]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = SequencerConfig::from_json_str(RAIN).unwrap();
        assert_eq!(config.layers.len(), 2);

        let rain = config.layer("rain").unwrap();
        assert_eq!(rain.file, "rain.wav");
        assert_eq!(
            rain.actions,
            vec![
                ActionDescriptor::Play(PlayAction {
                    start: 0.0,
                    looping: true
                }),
                ActionDescriptor::Volume(RampAction {
                    start: 0.0,
                    from: Some(0.0),
                    to: Some(1.0),
                    duration: 2.0,
                    ease: Easing::Linear,
                }),
            ]
        );
        assert!(config.layer("birds").unwrap().actions.is_empty());
    }

    #[test]
    fn test_strict_rejects_unknown_kind() {
        let json = r#"{"layers": [{"id": "rain", "file": "rain.wav",
            "actions": [{"type": "reverb", "wet": 0.5}]}]}"#;

        match SequencerConfig::from_json_str(json) {
            Err(SequencerError::UnknownActionKind { layer, kind }) => {
                assert_eq!(layer, "rain");
                assert_eq!(kind, "reverb");
            }
            other => panic!("Expected UnknownActionKind, got: {:?}", other),
        }
    }

    #[test]
    fn test_lenient_skips_unknown_kind_only() {
        let json = r#"{"layers": [{"id": "rain", "file": "rain.wav", "actions": [
            {"type": "reverb", "wet": 0.5},
            {"type": "play"},
            {"type": "pan", "to": -0.5}
        ]}]}"#;

        let config = SequencerConfig::from_json_str_lenient(json).unwrap();
        let kinds: Vec<_> = config.layers[0].actions.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![ActionKind::Play, ActionKind::Pan]);
    }

    #[test]
    fn test_missing_type_is_invalid() {
        let json = r#"{"layers": [{"id": "rain", "file": "rain.wav", "actions": [{"start": 1}]}]}"#;
        let err = SequencerConfig::from_json_str_lenient(json).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ACTION");
    }

    #[test]
    fn test_malformed_known_action_is_invalid() {
        let json = r#"{"layers": [{"id": "rain", "file": "rain.wav",
            "actions": [{"type": "volume", "to": "loud"}]}]}"#;

        match SequencerConfig::from_json_str(json) {
            Err(SequencerError::InvalidAction { layer, index, .. }) => {
                assert_eq!(layer, "rain");
                assert_eq!(index, 0);
            }
            other => panic!("Expected InvalidAction, got: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_layer_ids_rejected() {
        let json = r#"{"layers": [
            {"id": "rain", "file": "a.wav"},
            {"id": "rain", "file": "b.wav"}
        ]}"#;
        let err = SequencerConfig::from_json_str(json).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_LAYER");
    }

    #[test]
    fn test_negative_start_rejected() {
        let config = SequencerConfig::new(vec![LayerConfig::new("rain", "rain.wav").with_action(
            ActionDescriptor::Play(PlayAction {
                start: -1.0,
                looping: false,
            }),
        )]);
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_ACTION");
    }

    #[test]
    fn test_negative_duration_rejected() {
        let config = SequencerConfig::new(vec![LayerConfig::new("rain", "rain.wav").with_action(
            ActionDescriptor::Volume(RampAction {
                duration: -2.0,
                ..RampAction::default()
            }),
        )]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let config = SequencerConfig::new(vec![LayerConfig::new("  ", "rain.wav")]);
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.json");
        let config = SequencerConfig::from_json_str(RAIN).unwrap();
        fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        let loaded = SequencerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SequencerConfig::load_lenient(Path::new("/nonexistent/scene.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
