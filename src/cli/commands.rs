//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::RunArgs;
use crate::actions::ActionDescriptor;
use crate::config::{ParseMode, SequencerConfig};
use crate::engine::ManualClock;
use crate::error::{Result, SequencerError};
use crate::layers::AudioSequencer;
use crate::target::WavLoader;

fn parse_mode(lenient: bool) -> ParseMode {
    if lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    }
}

/// Parse and validate a configuration, then print a summary of it.
pub fn validate(path: &Path, lenient: bool) -> Result<()> {
    info!("Validating configuration: {}", path.display());

    let config = SequencerConfig::load_with_mode(path, parse_mode(lenient))?;

    println!("Configuration OK: {}", path.display());
    println!("{:-<60}", "");
    for layer in &config.layers {
        println!("{:<16} {}", layer.id, layer.file);
        for action in &layer.actions {
            println!("    {}", describe_action(action));
        }
    }
    println!("{:-<60}", "");
    println!(
        "{} layer(s), {} action(s)",
        config.layers.len(),
        config.layers.iter().map(|l| l.actions.len()).sum::<usize>()
    );

    Ok(())
}

/// Load every layer of a configuration and drive its timeline.
pub async fn run(args: &RunArgs) -> Result<()> {
    let duration = Duration::try_from_secs_f64(args.seconds).map_err(|_| {
        SequencerError::InvalidConfig {
            reason: format!("--seconds must be a non-negative number, got {}", args.seconds),
        }
    })?;

    let config = SequencerConfig::load_with_mode(&args.config, parse_mode(args.lenient))?;
    let loader = Arc::new(WavLoader::with_base_dir(args.resolve_base_dir()));
    let frame_interval = args.frame_interval();
    let mut reporter = Reporter::new(args.report_every);

    info!(
        "Running {} for {:.1}s at {} Hz{}",
        args.config.display(),
        args.seconds,
        args.tick_hz,
        if args.simulate { " (simulated)" } else { "" }
    );

    if args.simulate {
        let clock = Arc::new(ManualClock::new());
        let mut sequencer = AudioSequencer::with_clock(config, loader, clock.clone());
        start(&mut sequencer).await;

        let mut fired = 0;
        while sequencer.is_running() && sequencer.current_time() < duration.as_secs_f64() {
            clock.advance(frame_interval);
            fired += sequencer.tick().fired;
            reporter.observe(&sequencer);
        }
        finish(&mut sequencer, fired);
    } else {
        let mut sequencer = AudioSequencer::new(config, loader);
        start(&mut sequencer).await;

        let summary = sequencer
            .run_for_with(duration, frame_interval, |sequencer, _| {
                reporter.observe(sequencer)
            })
            .await;
        finish(&mut sequencer, summary.fired);
    }

    Ok(())
}

async fn start(sequencer: &mut AudioSequencer) {
    sequencer.start().await;
    if !sequencer.is_initialized() {
        let failed: Vec<_> = sequencer.failed_layers().collect();
        warn!("Continuing without layer(s): {}", failed.join(", "));
    }
    println!("Started with {} layer(s)", sequencer.loaded_count());
}

fn finish(sequencer: &mut AudioSequencer, fired: usize) {
    print_snapshot(sequencer);
    println!("Fired {} timer(s) in {:.2}s", fired, sequencer.current_time());
    sequencer.dispose();
}

/// Prints a snapshot every `every` seconds of timeline
struct Reporter {
    every: f64,
    next: f64,
}

impl Reporter {
    fn new(every: f64) -> Self {
        Self { every, next: 0.0 }
    }

    fn observe(&mut self, sequencer: &AudioSequencer) {
        if self.every.is_nan() || self.every <= 0.0 {
            return;
        }
        let now = sequencer.current_time();
        if now >= self.next {
            print_snapshot(sequencer);
            while self.next <= now {
                self.next += self.every;
            }
        }
    }
}

fn print_snapshot(sequencer: &AudioSequencer) {
    println!("[{:>7.2}s]", sequencer.current_time());
    for layer in sequencer.layers() {
        match layer.status() {
            Some(status) => println!(
                "    {:<16} {:<8} vol {:.2}  pan {:+.2}{}",
                status.id,
                if status.playing { "playing" } else { "idle" },
                status.volume,
                status.pan,
                if status.looping { "  (loop)" } else { "" }
            ),
            None => println!("    {:<16} (no status)", layer.id()),
        }
    }
}

fn describe_action(action: &ActionDescriptor) -> String {
    match action {
        ActionDescriptor::Play(play) => format!(
            "@{:>6.2}s play{}",
            play.start,
            if play.looping { " (loop)" } else { "" }
        ),
        ActionDescriptor::Volume(ramp) | ActionDescriptor::Pan(ramp) => {
            let from = ramp
                .from
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "default".to_string());
            let to = ramp
                .to
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "default".to_string());
            if ramp.is_animated() {
                format!(
                    "@{:>6.2}s {} {} -> {} over {:.2}s ({})",
                    ramp.start,
                    action.kind(),
                    from,
                    to,
                    ramp.duration,
                    ramp.ease
                )
            } else {
                format!("@{:>6.2}s {} = {}", ramp.start, action.kind(), to)
            }
        }
    }
}
