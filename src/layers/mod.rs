//! Layer Model Module
//!
//! Implements the layered soundscape:
//! - Audio layers: one source and its timed actions
//! - Audio sequencer: concurrent loading and the shared timeline

mod layer;
mod sequencer;

pub use layer::AudioLayer;
pub use sequencer::{AudioSequencer, RunSummary};
