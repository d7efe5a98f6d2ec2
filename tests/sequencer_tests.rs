//! Sequencer Tests
//!
//! Timeline behaviour of the scheduler and sequencer on a simulated clock.

use std::sync::Arc;

use approx::assert_relative_eq;
use async_trait::async_trait;
use parking_lot::Mutex;

use soundscape::actions::{interpolate, PlayAction, RampAction, RampState};
use soundscape::error::SequencerError;
use soundscape::target::{BufferVoice, DecodedAudio};
use soundscape::{
    ActionDescriptor, AudioLoader, AudioSequencer, AudioTarget, Easing, LayerConfig, ManualClock,
    Result, Scheduler, SequencerConfig,
};

/// In-memory loader; sources starting with "broken" fail
struct MemoryLoader;

#[async_trait]
impl AudioLoader for MemoryLoader {
    async fn load(&self, source: &str) -> Result<Box<dyn AudioTarget>> {
        if source.starts_with("broken") {
            return Err(SequencerError::LoadFailed {
                source_ref: source.to_string(),
                reason: "unreadable".to_string(),
            });
        }
        let audio = DecodedAudio {
            sample_rate: 22050,
            channels: 2,
            samples: vec![0.0; 22050 * 2],
        };
        Ok(Box::new(BufferVoice::new(Arc::new(audio))))
    }
}

fn play(start: f64, looping: bool) -> ActionDescriptor {
    ActionDescriptor::Play(PlayAction { start, looping })
}

fn volume_ramp(start: f64, from: f32, to: f32, duration: f64) -> ActionDescriptor {
    ActionDescriptor::Volume(RampAction {
        start,
        from: Some(from),
        to: Some(to),
        duration,
        ease: Easing::Linear,
    })
}

fn sequencer(config: SequencerConfig) -> (Arc<ManualClock>, AudioSequencer) {
    let clock = Arc::new(ManualClock::new());
    let sequencer = AudioSequencer::with_clock(config, Arc::new(MemoryLoader), clock.clone());
    (clock, sequencer)
}

// === Interpolation ===

#[test]
fn test_linear_interpolation_is_exact_at_endpoints() {
    for (a, b) in [(0.0_f64, 1.0), (-1.0, 1.0), (0.3, 0.7), (5.0, -5.0)] {
        assert_eq!(interpolate(a, b, 0.0, Easing::Linear), a);
        assert_eq!(interpolate(a, b, 1.0, Easing::Linear), b);
        for step in 1..10 {
            let progress = step as f64 / 10.0;
            assert_relative_eq!(
                interpolate(a, b, progress, Easing::Linear),
                a + (b - a) * progress,
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_progress_is_clamped_before_easing() {
    for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
        assert_eq!(interpolate(0.2_f32, 0.9, 1.5, easing), interpolate(0.2, 0.9, 1.0, easing));
        assert_eq!(interpolate(0.2_f32, 0.9, -0.5, easing), interpolate(0.2, 0.9, 0.0, easing));
    }
}

// === Scheduler ===

#[test]
fn test_overdue_event_fires_once_synchronously() {
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::with_clock(clock.clone());
    scheduler.start();
    clock.advance_secs(3.0);

    let fired = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&fired);
    scheduler.schedule_event(move |_| *counter.lock() += 1, 1.0, "play_rain");

    assert_eq!(*fired.lock(), 1);
    assert!(!scheduler.has_timer("play_rain"));

    clock.advance_secs(10.0);
    scheduler.tick();
    assert_eq!(*fired.lock(), 1);
}

#[test]
fn test_same_id_keeps_only_latest_event() {
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::with_clock(clock.clone());
    scheduler.start();

    let log = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&log);
    let second = Arc::clone(&log);
    scheduler.schedule_event(move |_| first.lock().push("first"), 1.0, "volume_rain");
    scheduler.schedule_event(move |_| second.lock().push("second"), 2.0, "volume_rain");

    clock.advance_secs(5.0);
    scheduler.tick();
    assert_eq!(*log.lock(), vec!["second"]);
}

#[test]
fn test_stop_cancels_pending_events() {
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::with_clock(clock.clone());
    scheduler.start();

    let fired = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&fired);
    scheduler.schedule_event(move |_| *flag.lock() = true, 1.0, "play_rain");
    scheduler.stop();

    clock.advance_secs(2.0);
    scheduler.tick();
    scheduler.start();
    scheduler.tick();

    assert!(!*fired.lock());
    assert_eq!(scheduler.pending_timers(), 0);
}

// === Sequencer ===

#[tokio::test]
async fn test_partial_load_still_plays_loaded_layers() {
    let config = SequencerConfig::new(vec![
        LayerConfig::new("rain", "rain.wav").with_action(play(0.0, true)),
        LayerConfig::new("thunder", "broken.wav").with_action(play(0.0, false)),
        LayerConfig::new("wind", "wind.wav").with_action(play(0.5, true)),
    ]);
    let (clock, mut sequencer) = sequencer(config);

    assert!(!sequencer.init().await);
    assert!(!sequencer.is_initialized());
    assert!(sequencer.get_layer("rain").is_some());
    assert!(sequencer.get_layer("wind").is_some());
    assert!(sequencer.get_layer("thunder").is_none());

    sequencer.start().await;
    clock.advance_secs(1.0);
    sequencer.tick();

    for id in ["rain", "wind"] {
        let status = sequencer.get_layer(id).unwrap().status().unwrap();
        assert!(status.playing, "{} should be playing", id);
        assert!(status.looping);
    }
}

#[tokio::test]
async fn test_volume_ramp_end_to_end() {
    let config = SequencerConfig::new(vec![LayerConfig::new("rain", "rain.wav")
        .with_action(play(0.0, true))
        .with_action(volume_ramp(0.0, 0.0, 1.0, 2.0))]);
    let (clock, mut sequencer) = sequencer(config);
    sequencer.start().await;
    sequencer.tick();

    // ~60 Hz frames
    let frame = 1.0 / 60.0;
    while sequencer.current_time() < 1.0 {
        clock.advance_secs(frame);
        sequencer.tick();
    }
    let status = sequencer.get_layer("rain").unwrap().status().unwrap();
    assert!(status.playing);
    assert_relative_eq!(status.volume, 0.5, epsilon = 0.02);

    while sequencer.current_time() < 2.0 {
        clock.advance_secs(frame);
        sequencer.tick();
    }
    let report = sequencer.tick();
    assert_eq!(report.ramps_active, 0);
    assert_eq!(sequencer.scheduler().ramp_state("volume_rain"), None);
    assert_eq!(
        sequencer.get_layer("rain").unwrap().status().unwrap().volume,
        1.0
    );

    clock.advance_secs(1.0);
    sequencer.tick();
    assert_eq!(
        sequencer.get_layer("rain").unwrap().status().unwrap().volume,
        1.0
    );
}

#[tokio::test]
async fn test_delayed_ramp_waits_for_its_start() {
    let config = SequencerConfig::new(vec![
        LayerConfig::new("rain", "rain.wav").with_action(volume_ramp(1.0, 1.0, 0.0, 1.0))
    ]);
    let (clock, mut sequencer) = sequencer(config);
    sequencer.start().await;

    clock.advance_secs(0.5);
    sequencer.tick();
    assert_eq!(sequencer.scheduler().ramp_state("volume_rain"), None);

    clock.advance_secs(0.5);
    sequencer.tick();
    assert_eq!(
        sequencer.scheduler().ramp_state("volume_rain"),
        Some(RampState::Running { loop_start: 1.0 })
    );

    clock.advance_secs(0.25);
    sequencer.tick();
    let volume = sequencer.get_layer("rain").unwrap().status().unwrap().volume;
    assert_relative_eq!(volume, 0.75, epsilon = 1e-6);
}

#[tokio::test]
async fn test_stop_cancels_ramps_and_timers() {
    let config = SequencerConfig::new(vec![LayerConfig::new("rain", "rain.wav")
        .with_action(play(0.0, true))
        .with_action(volume_ramp(0.0, 0.0, 1.0, 4.0))
        .with_action(ActionDescriptor::Pan(RampAction {
            start: 5.0,
            to: Some(-1.0),
            ..RampAction::default()
        }))]);
    let (clock, mut sequencer) = sequencer(config);
    sequencer.start().await;
    clock.advance_secs(1.0);
    sequencer.tick();

    assert!(sequencer.scheduler().has_timer("pan_rain"));
    assert_eq!(sequencer.scheduler().active_ramps(), 1);

    sequencer.stop();
    assert_eq!(sequencer.scheduler().pending_timers(), 0);
    assert_eq!(sequencer.scheduler().active_ramps(), 0);

    let frozen = sequencer.get_layer("rain").unwrap().status().unwrap();
    assert!(!frozen.playing);

    clock.advance_secs(10.0);
    sequencer.tick();
    let later = sequencer.get_layer("rain").unwrap().status().unwrap();
    assert_eq!(later.volume, frozen.volume);
    assert_eq!(later.pan, 0.0);
}

#[tokio::test]
async fn test_restart_measures_from_new_epoch() {
    let config = SequencerConfig::new(vec![
        LayerConfig::new("rain", "rain.wav").with_action(play(2.0, false))
    ]);
    let (clock, mut sequencer) = sequencer(config);

    sequencer.start().await;
    clock.advance_secs(1.0);
    sequencer.stop();
    assert_eq!(sequencer.current_time(), 0.0);

    clock.advance_secs(5.0);
    sequencer.start().await;
    assert_eq!(sequencer.scheduler().pending_timers(), 1);

    clock.advance_secs(1.5);
    sequencer.tick();
    assert!(!sequencer.get_layer("rain").unwrap().status().unwrap().playing);

    clock.advance_secs(0.5);
    sequencer.tick();
    assert!(sequencer.get_layer("rain").unwrap().status().unwrap().playing);
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let config = SequencerConfig::new(vec![
        LayerConfig::new("rain", "rain.wav").with_action(play(0.0, true)),
        LayerConfig::new("wind", "wind.wav").with_action(play(0.0, true)),
    ]);
    let (_clock, mut sequencer) = sequencer(config);
    sequencer.start().await;
    sequencer.tick();

    let handle = sequencer.get_layer("rain").unwrap().target().unwrap().handle();
    sequencer.dispose();
    sequencer.dispose();

    assert!(!sequencer.is_initialized());
    assert!(!sequencer.is_running());
    assert_eq!(sequencer.layers().count(), 0);
    assert!(!handle.is_alive());
    assert!(!handle.play(true));
}
