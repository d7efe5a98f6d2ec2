//! In-memory buffer voice
//!
//! The target produced by the built-in WAV loader. It holds decoded audio
//! shared with the loader's cache and tracks the parameters the scheduler
//! drives. Routing samples to an output device is left to the host.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::{AudioTarget, Capabilities, TargetStatus};

/// Decoded, interleaved audio shared between voices of the same source
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Interleaved samples in `-1.0..=1.0`
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    /// Number of sample frames per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Playable voice over a decoded buffer
#[derive(Debug, Clone)]
pub struct BufferVoice {
    audio: Arc<DecodedAudio>,
    id: String,
    playing: bool,
    looping: bool,
    /// Seconds into the buffer
    position: f64,
    volume: f32,
    pan: f32,
    play_count: u32,
    disposed: bool,
}

impl BufferVoice {
    /// Create a stopped voice at full volume, centered
    pub fn new(audio: Arc<DecodedAudio>) -> Self {
        Self {
            audio,
            id: String::new(),
            playing: false,
            looping: false,
            position: 0.0,
            volume: 1.0,
            pan: 0.0,
            play_count: 0,
            disposed: false,
        }
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Playback position in seconds
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// How many times playback has been (re)started
    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl AudioTarget for BufferVoice {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Start from the beginning, restarting if already playing
    fn play(&mut self) {
        if self.disposed {
            trace!(voice = %self.id, "play ignored on disposed voice");
            return;
        }
        if self.playing {
            self.stop();
        }
        self.position = 0.0;
        self.playing = true;
        self.play_count += 1;
    }

    fn stop(&mut self) {
        if self.playing {
            self.playing = false;
        }
    }

    /// A one-shot voice stops at the end of its buffer; a looping one wraps
    fn advance(&mut self, elapsed: Duration) {
        if !self.playing {
            return;
        }
        let length = self.audio.duration_secs();
        self.position += elapsed.as_secs_f64();
        if self.position < length {
            return;
        }

        if self.looping && length > 0.0 {
            self.position %= length;
        } else {
            trace!(voice = %self.id, "reached end of buffer");
            self.position = length;
            self.playing = false;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    fn dispose(&mut self) {
        self.stop();
        self.disposed = true;
    }

    fn status(&self) -> Option<TargetStatus> {
        Some(TargetStatus {
            id: self.id.clone(),
            playing: self.playing,
            looping: self.looping,
            volume: self.volume,
            pan: self.pan,
        })
    }
}
