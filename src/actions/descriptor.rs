//! Declarative action descriptors
//!
//! Actions are read from layer configuration as JSON objects tagged by
//! `"type"`:
//!
//! ```json
//! { "type": "play", "start": 0, "loop": true }
//! { "type": "volume", "start": 2, "from": 0, "to": 0.8, "duration": 4, "ease": "easeIn" }
//! { "type": "pan", "start": 6, "to": -0.5 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::easing::Easing;
use super::ramp::RampParam;

/// Kinds of action the sequencer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Play,
    Volume,
    Pan,
}

impl ActionKind {
    /// Every supported kind
    pub const ALL: [ActionKind; 3] = [ActionKind::Play, ActionKind::Volume, ActionKind::Pan];

    /// Configuration tag of this kind
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Play => "play",
            ActionKind::Volume => "volume",
            ActionKind::Pan => "pan",
        }
    }

    /// Look up a configuration tag
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Timer id for this kind on `target_id`: `"<kind>_<target>"`
    ///
    /// A target therefore has at most one pending timer per kind, and a
    /// later action of the same kind preempts an earlier pending one.
    pub fn timer_id(self, target_id: &str) -> String {
        format!("{}_{}", self.name(), target_id)
    }
}

impl From<RampParam> for ActionKind {
    fn from(param: RampParam) -> Self {
        match param {
            RampParam::Volume => ActionKind::Volume,
            RampParam::Pan => ActionKind::Pan,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timed action on a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionDescriptor {
    Play(PlayAction),
    Volume(RampAction),
    Pan(RampAction),
}

impl ActionDescriptor {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionDescriptor::Play(_) => ActionKind::Play,
            ActionDescriptor::Volume(_) => ActionKind::Volume,
            ActionDescriptor::Pan(_) => ActionKind::Pan,
        }
    }

    /// Offset in seconds from the playback epoch
    pub fn start(&self) -> f64 {
        match self {
            ActionDescriptor::Play(play) => play.start,
            ActionDescriptor::Volume(ramp) | ActionDescriptor::Pan(ramp) => ramp.start,
        }
    }
}

/// Start playback, optionally looping
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayAction {
    #[serde(default)]
    pub start: f64,
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

/// Set or ramp a scalar parameter (volume or pan)
///
/// Unset `from`/`to` take the parameter's neutral value: 1.0 for volume,
/// 0.0 for pan. A zero `duration` sets `to` directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RampAction {
    #[serde(default)]
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f32>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub ease: Easing,
}

impl RampAction {
    /// Starting value for `param`
    pub fn from_value(&self, param: RampParam) -> f32 {
        self.from.unwrap_or_else(|| param.default_value())
    }

    /// Final value for `param`
    pub fn to_value(&self, param: RampParam) -> f32 {
        self.to.unwrap_or_else(|| param.default_value())
    }

    /// Whether this action animates rather than jumps
    pub fn is_animated(&self) -> bool {
        self.duration > 0.0
    }
}
