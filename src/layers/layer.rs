//! Audio Layer
//!
//! One audio source plus the timed actions that drive it. The layer is the
//! sole owner of its loaded target; scheduled callbacks only see a weak
//! [`TargetHandle`](crate::target::TargetHandle).

use std::time::Duration;

use tracing::{debug, error, trace};

use crate::actions::{schedule_action, ActionDescriptor};
use crate::config::LayerConfig;
use crate::engine::Scheduler;
use crate::target::{AudioLoader, LoadedTarget, TargetStatus};

/// A single layer of the soundscape
#[derive(Debug)]
pub struct AudioLayer {
    id: String,
    source: String,
    actions: Vec<ActionDescriptor>,
    target: Option<LoadedTarget>,
}

impl AudioLayer {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        actions: Vec<ActionDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            actions,
            target: None,
        }
    }

    pub fn from_config(config: LayerConfig) -> Self {
        Self::new(config.id, config.file, config.actions)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load the layer's source through `loader`
    ///
    /// Returns `false` on failure after logging it; the error never leaves
    /// the layer. Already-loaded layers return `true` without reloading.
    pub async fn init(&mut self, loader: &dyn AudioLoader) -> bool {
        if self.target.is_some() {
            return true;
        }

        match loader.load(&self.source).await {
            Ok(target) => {
                let target = LoadedTarget::new(&self.id, target);
                debug!(
                    layer = %self.id,
                    source = %self.source,
                    capabilities = ?target.capabilities(),
                    "layer loaded"
                );
                self.target = Some(target);
                true
            }
            Err(e) => {
                error!(
                    layer = %self.id,
                    source = %self.source,
                    code = e.error_code(),
                    "failed to load layer: {}",
                    e
                );
                false
            }
        }
    }

    /// Register every action of this layer with `scheduler`
    ///
    /// Does nothing until the layer is loaded.
    pub fn schedule_actions(&self, scheduler: &mut Scheduler) {
        let Some(target) = &self.target else {
            trace!(layer = %self.id, "layer not loaded, nothing to schedule");
            return;
        };

        let handle = target.handle();
        for action in &self.actions {
            schedule_action(action, &handle, scheduler);
        }
        debug!(layer = %self.id, actions = self.actions.len(), "layer actions scheduled");
    }

    /// Move the target's playback forward, if loaded
    pub fn advance(&self, elapsed: Duration) {
        if let Some(target) = &self.target {
            target.advance(elapsed);
        }
    }

    /// Stop playback, if loaded and the target can stop
    pub fn stop(&self) {
        if let Some(target) = &self.target {
            target.stop();
        }
    }

    /// Stop and release the target. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(target) = self.target.take() {
            target.dispose();
            debug!(layer = %self.id, "layer disposed");
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source reference handed to the loader
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub fn is_loaded(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&LoadedTarget> {
        self.target.as_ref()
    }

    /// Current target state, when loaded and the target reports one
    pub fn status(&self) -> Option<TargetStatus> {
        self.target.as_ref().and_then(LoadedTarget::status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Easing, PlayAction, RampAction};
    use crate::engine::ManualClock;
    use crate::error::{Result, SequencerError};
    use crate::target::{AudioTarget, BufferVoice, DecodedAudio};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct SilenceLoader;

    #[async_trait]
    impl AudioLoader for SilenceLoader {
        async fn load(&self, source: &str) -> Result<Box<dyn AudioTarget>> {
            if source.starts_with("missing") {
                return Err(SequencerError::LoadFailed {
                    source_ref: source.to_string(),
                    reason: "not found".to_string(),
                });
            }
            let audio = DecodedAudio {
                sample_rate: 8000,
                channels: 1,
                samples: vec![0.0; 8000],
            };
            Ok(Box::new(BufferVoice::new(Arc::new(audio))))
        }
    }

    fn rain_layer(source: &str) -> AudioLayer {
        AudioLayer::new(
            "rain",
            source,
            vec![
                ActionDescriptor::Play(PlayAction {
                    start: 0.0,
                    looping: true,
                }),
                ActionDescriptor::Volume(RampAction {
                    start: 0.0,
                    from: Some(0.0),
                    to: Some(1.0),
                    duration: 2.0,
                    ease: Easing::Linear,
                }),
            ],
        )
    }

    fn running_scheduler() -> (Arc<ManualClock>, Scheduler) {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::with_clock(clock.clone());
        scheduler.start();
        (clock, scheduler)
    }

    #[tokio::test]
    async fn test_init_success_stamps_id() {
        let mut layer = rain_layer("rain.wav");
        assert!(layer.init(&SilenceLoader).await);
        assert!(layer.is_loaded());
        assert_eq!(layer.status().unwrap().id, "rain");
    }

    #[tokio::test]
    async fn test_init_failure_is_contained() {
        let mut layer = rain_layer("missing.wav");
        assert!(!layer.init(&SilenceLoader).await);
        assert!(!layer.is_loaded());
        assert!(layer.status().is_none());
    }

    #[tokio::test]
    async fn test_unloaded_layer_schedules_nothing() {
        let (_clock, mut scheduler) = running_scheduler();
        let layer = rain_layer("missing.wav");
        layer.schedule_actions(&mut scheduler);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[tokio::test]
    async fn test_scheduled_actions_drive_target() {
        let (clock, mut scheduler) = running_scheduler();
        let mut layer = rain_layer("rain.wav");
        layer.init(&SilenceLoader).await;

        layer.schedule_actions(&mut scheduler);
        assert_eq!(scheduler.pending_timers(), 2);

        let report = scheduler.tick();
        assert_eq!(report.fired, 2);
        assert_eq!(report.ramps_active, 1);

        clock.advance_secs(1.0);
        scheduler.tick();
        let status = layer.status().unwrap();
        assert!(status.playing);
        assert!(status.looping);
        approx::assert_relative_eq!(status.volume, 0.5);
    }

    #[tokio::test]
    async fn test_advance_reaches_end_of_one_shot() {
        let mut layer = AudioLayer::new("birds", "birds.wav", Vec::new());
        layer.advance(Duration::from_secs(1));

        layer.init(&SilenceLoader).await;
        layer.target().unwrap().handle().play(false);
        layer.advance(Duration::from_millis(500));
        assert!(layer.status().unwrap().playing);

        layer.advance(Duration::from_millis(500));
        assert!(!layer.status().unwrap().playing);
    }

    #[tokio::test]
    async fn test_stop_and_dispose() {
        let mut layer = rain_layer("rain.wav");

        // Never loaded: both are safe no-ops.
        layer.stop();
        layer.dispose();

        layer.init(&SilenceLoader).await;
        let handle = layer.target().unwrap().handle();
        assert!(handle.play(false));
        layer.stop();
        assert!(!layer.status().unwrap().playing);

        layer.dispose();
        assert!(!layer.is_loaded());
        assert!(!handle.is_alive());
        layer.dispose();
    }
}
