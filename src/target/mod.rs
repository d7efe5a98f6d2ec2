//! Audio Target Module
//!
//! Capability contracts at the boundary of the sequencer:
//! - [`AudioTarget`]: a playable, controllable audio object owned by a layer
//! - [`AudioLoader`]: resolves a source reference to an `AudioTarget`
//! - Built-in WAV loader and in-memory buffer voice

mod handle;
mod voice;
mod wav;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use handle::{LoadedTarget, TargetHandle};
pub use voice::{BufferVoice, DecodedAudio};
pub use wav::{decode_wav, WavLoader};

/// Operations a target actually supports.
///
/// Queried once when a layer takes ownership of the target. Handlers check
/// the flags before calling, and an operation the target lacks is skipped
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub play: bool,
    pub stop: bool,
    pub volume: bool,
    pub pan: bool,
    pub dispose: bool,
}

impl Capabilities {
    /// Every operation supported
    pub const ALL: Capabilities = Capabilities {
        play: true,
        stop: true,
        volume: true,
        pan: true,
        dispose: true,
    };

    /// No operation supported
    pub const NONE: Capabilities = Capabilities {
        play: false,
        stop: false,
        volume: false,
        pan: false,
        dispose: false,
    };
}

/// Point-in-time view of a target, for diagnostics and reporting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetStatus {
    pub id: String,
    pub playing: bool,
    pub looping: bool,
    pub volume: f32,
    pub pan: f32,
}

/// A playable audio object driven by scheduled actions.
///
/// Every operation has a no-op default; implementors override the ones
/// they support and advertise them through [`AudioTarget::capabilities`].
/// Volume is expected in `0.0..=1.0` and pan in `-1.0..=1.0`; callers clamp
/// before delivering values.
pub trait AudioTarget: Send {
    /// Operations this target supports
    fn capabilities(&self) -> Capabilities;

    /// Stamp the target with the id of the layer that owns it
    fn set_id(&mut self, _id: &str) {}

    /// Set whether the next `play()` loops
    fn set_loop(&mut self, _looping: bool) {}

    fn play(&mut self) {}

    fn stop(&mut self) {}

    /// Move playback forward by `elapsed` of timeline time
    ///
    /// Called once per sequencer tick while the timeline runs. Targets that
    /// play on their own clock can ignore it.
    fn advance(&mut self, _elapsed: Duration) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_pan(&mut self, _pan: f32) {}

    /// Release any resources held by the target
    fn dispose(&mut self) {}

    /// Current state, if the target can report it
    fn status(&self) -> Option<TargetStatus> {
        None
    }
}

/// Resolves a source reference to a ready-to-use [`AudioTarget`].
///
/// Loads may run concurrently for different layers. A failed load is
/// reported as an `Err` and contained to that layer by the caller.
#[async_trait]
pub trait AudioLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<Box<dyn AudioTarget>>;
}
