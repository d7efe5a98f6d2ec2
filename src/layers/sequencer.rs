//! Audio Sequencer
//!
//! Ties the layers of a soundscape to one scheduler. Layers load
//! concurrently; a layer that fails to load is left out of playback and
//! reported through [`AudioSequencer::is_initialized`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use soundscape::{AudioSequencer, SequencerConfig, WavLoader};
//!
//! # async fn demo() -> soundscape::Result<()> {
//! let config = SequencerConfig::load(std::path::Path::new("scene.json"))?;
//! let mut sequencer = AudioSequencer::new(config, Arc::new(WavLoader::new()));
//!
//! sequencer.start().await;
//! sequencer
//!     .run_for(Duration::from_secs(10), Duration::from_millis(16))
//!     .await;
//! sequencer.dispose();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::layer::AudioLayer;
use crate::config::{LayerConfig, SequencerConfig};
use crate::engine::{Clock, Scheduler, SystemClock, TickReport};
use crate::target::AudioLoader;

/// Totals from a [`AudioSequencer::run_for`] session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames (ticks) driven
    pub frames: u64,
    /// Timers fired across all frames
    pub fired: usize,
}

/// Layered timeline player
pub struct AudioSequencer {
    loader: Arc<dyn AudioLoader>,
    scheduler: Scheduler,
    /// Layer definitions, kept so a disposed sequencer can be initialized again
    configs: Vec<LayerConfig>,
    /// Every configured layer, in configuration order
    layers: Vec<AudioLayer>,
    /// Clock reading at which layer playback was last advanced
    advanced_at: Option<Duration>,
    initialized: bool,
}

impl AudioSequencer {
    /// Create a sequencer on the wall clock
    pub fn new(config: SequencerConfig, loader: Arc<dyn AudioLoader>) -> Self {
        Self::with_clock(config, loader, Arc::new(SystemClock::new()))
    }

    /// Create a sequencer on an injected clock
    pub fn with_clock(
        config: SequencerConfig,
        loader: Arc<dyn AudioLoader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let layers = config.layers.iter().cloned().map(AudioLayer::from_config).collect();

        Self {
            loader,
            scheduler: Scheduler::with_clock(clock),
            configs: config.layers,
            layers,
            advanced_at: None,
            initialized: false,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load every layer that is not loaded yet, concurrently
    ///
    /// Returns `true` only when every layer is loaded. Layers that failed
    /// stay out of playback and are retried by the next call. After
    /// [`dispose`](Self::dispose) the layers are rebuilt from configuration.
    pub async fn init(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        if self.layers.is_empty() && !self.configs.is_empty() {
            debug!(layers = self.configs.len(), "rebuilding layers");
            self.layers = self.configs.iter().cloned().map(AudioLayer::from_config).collect();
        }

        let loader = Arc::clone(&self.loader);
        let pending: Vec<_> = self.layers.iter_mut().filter(|l| !l.is_loaded()).collect();
        let attempted = pending.len();

        let results = join_all(pending.into_iter().map(|layer| layer.init(loader.as_ref()))).await;
        let failed = results.iter().filter(|loaded| !**loaded).count();

        self.initialized = failed == 0;
        if self.initialized {
            info!(layers = self.layers.len(), "sequencer initialized");
        } else {
            warn!(failed, attempted, "sequencer initialized with failed layers");
        }
        self.initialized
    }

    /// Start the timeline and schedule every loaded layer's actions
    ///
    /// Runs [`init`](Self::init) first if the sequencer is not fully
    /// initialized. Starting again restarts the timeline from now.
    pub async fn start(&mut self) {
        if !self.initialized {
            self.init().await;
        }

        self.scheduler.start();
        self.advanced_at = Some(self.scheduler.clock().now());
        for layer in self.layers.iter().filter(|l| l.is_loaded()) {
            layer.schedule_actions(&mut self.scheduler);
        }
        debug!(layers = self.loaded_count(), "sequencer started");
    }

    /// Stop the timeline and every layer. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.advanced_at = None;
        for layer in &self.layers {
            layer.stop();
        }
    }

    /// Service due timers and ramps once
    ///
    /// Layer playback is first moved forward by the time since the previous
    /// tick, so a one-shot voice that ran out stops before new plays fire.
    pub fn tick(&mut self) -> TickReport {
        if let Some(last) = self.advanced_at {
            let now = self.scheduler.clock().now();
            let elapsed = now.saturating_sub(last);
            self.advanced_at = Some(now);
            for layer in &self.layers {
                layer.advance(elapsed);
            }
        }
        self.scheduler.tick()
    }

    /// Drive [`tick`](Self::tick) every `frame_interval` for `duration`
    pub async fn run_for(&mut self, duration: Duration, frame_interval: Duration) -> RunSummary {
        self.run_for_with(duration, frame_interval, |_, _| {}).await
    }

    /// Like [`run_for`](Self::run_for), calling `on_frame` after each tick
    ///
    /// Ends once `duration` has passed on the timeline or in frames,
    /// whichever comes first, or as soon as the sequencer is stopped.
    pub async fn run_for_with<F>(
        &mut self,
        duration: Duration,
        frame_interval: Duration,
        mut on_frame: F,
    ) -> RunSummary
    where
        F: FnMut(&AudioSequencer, TickReport),
    {
        let mut summary = RunSummary::default();
        if frame_interval.is_zero() {
            warn!("zero frame interval, nothing to run");
            return summary;
        }

        let end = duration.as_secs_f64();
        let max_frames = duration.as_nanos().div_ceil(frame_interval.as_nanos()) as u64;
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.scheduler.is_running() && summary.frames < max_frames {
            interval.tick().await;
            let report = self.tick();
            summary.frames += 1;
            summary.fired += report.fired;
            on_frame(self, report);

            if self.current_time() >= end {
                break;
            }
        }

        debug!(frames = summary.frames, fired = summary.fired, "run finished");
        summary
    }

    /// Stop and release every layer. Idempotent.
    ///
    /// The configuration is kept; a later [`init`](Self::init) or
    /// [`start`](Self::start) loads the layers again.
    pub fn dispose(&mut self) {
        self.stop();
        for layer in &mut self.layers {
            layer.dispose();
        }
        if !self.layers.is_empty() {
            debug!(layers = self.layers.len(), "sequencer disposed");
        }
        self.layers.clear();
        self.initialized = false;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// A loaded layer by id
    ///
    /// Layers that failed to load are not returned.
    pub fn get_layer(&self, id: &str) -> Option<&AudioLayer> {
        self.layers.iter().find(|l| l.is_loaded() && l.id() == id)
    }

    /// Loaded layers, in configuration order
    pub fn layers(&self) -> impl Iterator<Item = &AudioLayer> {
        self.layers.iter().filter(|l| l.is_loaded())
    }

    /// Ids of configured layers that are not loaded
    pub fn failed_layers(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter(|l| !l.is_loaded()).map(AudioLayer::id)
    }

    pub fn loaded_count(&self) -> usize {
        self.layers().count()
    }

    /// `true` once every configured layer has loaded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Seconds on the timeline since the last start
    pub fn current_time(&self) -> f64 {
        self.scheduler.current_time()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl std::fmt::Debug for AudioSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSequencer")
            .field("scheduler", &self.scheduler)
            .field("layers", &self.layers)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
