//! Time sources for the scheduler
//!
//! The scheduler never reads wall time directly. It asks an injected
//! [`Clock`], so real playback uses [`SystemClock`] while tests and dry
//! runs drive a [`ManualClock`] forward explicitly.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source.
///
/// `now()` is measured from an arbitrary origin fixed when the clock was
/// created. Only differences between readings are meaningful.
pub trait Clock: Send + Sync {
    /// Current time since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall-clock time backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock that only moves when told to
///
/// # Example
/// ```
/// use std::time::Duration;
/// use soundscape::engine::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Create a manual clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }

    /// Move the clock forward by a number of seconds
    pub fn advance_secs(&self, secs: f64) {
        if let Ok(delta) = Duration::try_from_secs_f64(secs.max(0.0)) {
            self.advance(delta);
        }
    }

    /// Jump to an absolute reading. Moving backwards is ignored to keep the
    /// clock monotonic.
    pub fn set(&self, now: Duration) {
        let mut current = self.now.lock();
        if now > *current {
            *current = now;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish()
    }
}
