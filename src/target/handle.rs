//! Ownership wrappers around a loaded target
//!
//! A layer holds the only strong reference ([`LoadedTarget`]). Scheduled
//! callbacks and ramps hold a [`TargetHandle`], which is weak: once the layer
//! disposes its target, late callbacks find nothing to drive.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::{AudioTarget, Capabilities, TargetStatus};

type SharedTarget = Arc<Mutex<Box<dyn AudioTarget>>>;

/// A target owned by exactly one layer
pub struct LoadedTarget {
    id: Arc<str>,
    capabilities: Capabilities,
    inner: SharedTarget,
}

impl LoadedTarget {
    /// Take ownership of a freshly loaded target, stamping it with `id`
    pub fn new(id: &str, mut target: Box<dyn AudioTarget>) -> Self {
        target.set_id(id);
        let capabilities = target.capabilities();

        Self {
            id: Arc::from(id),
            capabilities,
            inner: Arc::new(Mutex::new(target)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Weak handle for scheduled callbacks
    pub fn handle(&self) -> TargetHandle {
        TargetHandle {
            id: Arc::clone(&self.id),
            capabilities: self.capabilities,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Stop playback if the target supports it
    pub fn stop(&self) -> bool {
        if !self.capabilities.stop {
            return false;
        }
        self.inner.lock().stop();
        true
    }

    /// Move playback forward by `elapsed`
    pub fn advance(&self, elapsed: Duration) {
        self.inner.lock().advance(elapsed);
    }

    /// Stop, then release the target's resources
    pub fn dispose(self) {
        self.stop();
        if self.capabilities.dispose {
            self.inner.lock().dispose();
        }
    }

    pub fn status(&self) -> Option<TargetStatus> {
        self.inner.lock().status()
    }
}

impl fmt::Debug for LoadedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedTarget")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Weak, capability-checked access to a layer's target
#[derive(Clone)]
pub struct TargetHandle {
    id: Arc<str>,
    capabilities: Capabilities,
    inner: Weak<Mutex<Box<dyn AudioTarget>>>,
}

impl TargetHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether the owning layer still holds the target
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Set the loop flag and start playback
    pub fn play(&self, looping: bool) -> bool {
        self.apply(self.capabilities.play, "play", |target| {
            target.set_loop(looping);
            target.play();
        })
    }

    /// Deliver a volume value, clamped to `0.0..=1.0`
    pub fn set_volume(&self, volume: f32) -> bool {
        let volume = volume.clamp(0.0, 1.0);
        self.apply(self.capabilities.volume, "volume", |target| {
            target.set_volume(volume)
        })
    }

    /// Deliver a pan value, clamped to `-1.0..=1.0`
    pub fn set_pan(&self, pan: f32) -> bool {
        let pan = pan.clamp(-1.0, 1.0);
        self.apply(self.capabilities.pan, "pan", |target| target.set_pan(pan))
    }

    fn apply(
        &self,
        supported: bool,
        operation: &str,
        op: impl FnOnce(&mut dyn AudioTarget),
    ) -> bool {
        if !supported {
            trace!(target_id = %self.id, operation, "target lacks capability, skipping");
            return false;
        }
        let Some(inner) = self.inner.upgrade() else {
            trace!(target_id = %self.id, operation, "target already released");
            return false;
        };
        let mut guard = inner.lock();
        op(&mut **guard);
        true
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
