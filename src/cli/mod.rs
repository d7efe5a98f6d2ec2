//! CLI Module
//!
//! Command-line interface for the soundscape sequencer.

pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Soundscape - layered audio timeline player
#[derive(Parser, Debug)]
#[command(name = "soundscape-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a sequencer configuration
    #[command(name = "validate")]
    Validate {
        /// Path to the JSON configuration
        config: PathBuf,

        /// Skip unknown action types instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },

    /// Load the layers of a configuration and play its timeline
    #[command(name = "run")]
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the JSON configuration
    pub config: PathBuf,

    /// Skip unknown action types instead of rejecting them
    #[arg(long)]
    pub lenient: bool,

    /// How long to run the timeline, in seconds
    #[arg(long, default_value_t = 10.0)]
    pub seconds: f64,

    /// Scheduler ticks per second
    #[arg(long, default_value_t = 60)]
    pub tick_hz: u32,

    /// Seconds between layer status reports (0 disables them)
    #[arg(long, default_value_t = 1.0)]
    pub report_every: f64,

    /// Advance a simulated clock frame by frame instead of waiting
    #[arg(long)]
    pub simulate: bool,

    /// Directory audio sources are resolved against (defaults to the config's directory)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Time between scheduler ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    /// Directory used to resolve relative audio sources
    pub fn resolve_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => self
                .config
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
