//! Soundscape - Layered Audio Timeline Sequencer
//!
//! Plays a soundscape made of independent audio layers. Each layer loads
//! one audio source and carries timed actions (play, volume, pan) that run
//! against a shared logical clock.
//!
//! # Architecture
//!
//! - [`engine`]: injectable clocks and the timeline scheduler
//! - [`actions`]: action descriptors, easing and parameter ramps
//! - [`target`]: audio target capabilities and the built-in WAV loader
//! - [`layers`]: audio layers and the sequencer that ties them together
//! - [`config`]: JSON configuration parsing and validation

pub mod actions;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod layers;
pub mod target;

pub use actions::{ActionDescriptor, ActionKind, Easing};
pub use config::{LayerConfig, ParseMode, SequencerConfig};
pub use engine::{Clock, ManualClock, Scheduler, SystemClock, TickReport};
pub use error::{Result, SequencerError};
pub use layers::{AudioLayer, AudioSequencer, RunSummary};
pub use target::{AudioLoader, AudioTarget, Capabilities, TargetStatus, WavLoader};
