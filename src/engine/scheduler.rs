//! Timeline scheduler
//!
//! Owns the logical playback clock (an epoch on an injected [`Clock`]) and a
//! registry of one-shot timers keyed by a caller-supplied id. Timers are
//! serviced by [`Scheduler::tick`], which the host calls once per frame;
//! the same tick advances every in-flight parameter ramp.
//!
//! Rules:
//! - At most one pending timer per id. Registering under a live id cancels
//!   the earlier timer (last writer wins).
//! - An event whose due time has already passed fires synchronously inside
//!   `schedule_event` and registers nothing (catch-up policy). The callback
//!   receives the scheduler, so it may schedule further events, including
//!   under its own id. That reentrancy is intended.
//! - While stopped, `schedule_event` is a silent no-op and
//!   `current_time()` reads 0.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::clock::{Clock, SystemClock};
use crate::actions::{Ramp, RampState};

/// Callback run when a timer fires (or immediately, when overdue)
pub type EventCallback = Box<dyn FnOnce(&mut Scheduler) + Send>;

/// What a single [`Scheduler::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Timers fired during this tick
    pub fired: usize,
    /// Ramps still in flight after this tick
    pub ramps_active: usize,
}

struct PendingTimer {
    seq: u64,
    callback: EventCallback,
}

/// Queue entry (min-heap by due time, then registration order)
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    /// Clock reading at which the timer fires
    due: Duration,
    seq: u64,
    id: String,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Shared logical clock plus timer and ramp registry
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    /// Clock reading when playback began; `Some` exactly while running
    epoch: Option<Duration>,
    timers: HashMap<String, PendingTimer>,
    queue: BinaryHeap<QueueEntry>,
    ramps: Vec<(String, Ramp)>,
    next_seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Scheduler on wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Scheduler on an injected time source
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use soundscape::engine::{ManualClock, Scheduler};
    ///
    /// let clock = Arc::new(ManualClock::new());
    /// let mut scheduler = Scheduler::with_clock(clock.clone());
    /// scheduler.start();
    /// clock.advance_secs(1.5);
    /// assert_eq!(scheduler.current_time(), 1.5);
    /// ```
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            epoch: None,
            timers: HashMap::new(),
            queue: BinaryHeap::new(),
            ramps: Vec::new(),
            next_seq: 0,
        }
    }

    /// The time source this scheduler reads
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin (or restart) the logical timeline from now
    ///
    /// Calling this while running moves the epoch only. A pending timer
    /// still fires after the delay it was armed with.
    pub fn start(&mut self) {
        let restarted = self.epoch.is_some();
        self.epoch = Some(self.clock.now());
        debug!(restarted, pending = self.timers.len(), "scheduler started");
    }

    /// Stop the timeline and cancel every pending timer and ramp
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.epoch.take().is_none() && self.timers.is_empty() && self.ramps.is_empty() {
            return;
        }

        let cancelled = self.timers.len();
        self.timers.clear();
        self.queue.clear();

        for (_, ramp) in &mut self.ramps {
            ramp.cancel();
        }
        let ramps = self.ramps.len();
        self.ramps.clear();

        debug!(cancelled, ramps, "scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.epoch.is_some()
    }

    /// Seconds since the epoch, or 0 while stopped
    pub fn current_time(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    fn elapsed(&self) -> Duration {
        match self.epoch {
            Some(epoch) => self.clock.now().saturating_sub(epoch),
            None => Duration::ZERO,
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Run `callback` at `start_secs` on the logical timeline
    ///
    /// - Not running: dropped silently.
    /// - Already overdue: runs now, synchronously, and nothing is registered.
    ///   A pending timer under the same id is left alone on this path.
    /// - Otherwise: replaces any pending timer under `timer_id`.
    pub fn schedule_event<F>(&mut self, callback: F, start_secs: f64, timer_id: impl Into<String>)
    where
        F: FnOnce(&mut Scheduler) + Send + 'static,
    {
        let timer_id = timer_id.into();
        if !self.is_running() {
            trace!(%timer_id, "scheduler inactive, dropping event");
            return;
        }

        let elapsed = self.elapsed();
        let delay_ms = start_secs * 1000.0 - elapsed.as_secs_f64() * 1000.0;

        if delay_ms < 0.0 {
            debug!(%timer_id, late_ms = -delay_ms, "event overdue, firing immediately");
            callback(self);
            return;
        }

        let due = Duration::try_from_secs_f64(delay_ms / 1000.0)
            .ok()
            .and_then(|delay| self.clock.now().checked_add(delay));
        let Some(due) = due else {
            warn!(%timer_id, start_secs, "ignoring event with invalid start time");
            return;
        };

        if self.forget(&timer_id) {
            debug!(%timer_id, "preempting pending timer");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueueEntry {
            due,
            seq,
            id: timer_id.clone(),
        });
        self.timers.insert(
            timer_id,
            PendingTimer {
                seq,
                callback: Box::new(callback),
            },
        );
    }

    /// Cancel the pending timer under `timer_id`, if any
    pub fn cancel_event(&mut self, timer_id: &str) -> bool {
        self.forget(timer_id)
    }

    /// Drop the timer under `timer_id` together with its queue entry
    fn forget(&mut self, timer_id: &str) -> bool {
        if self.timers.remove(timer_id).is_none() {
            return false;
        }
        self.queue.retain(|entry| entry.id != timer_id);
        true
    }

    /// Number of timers waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_timer(&self, timer_id: &str) -> bool {
        self.timers.contains_key(timer_id)
    }

    fn is_live(&self, entry: &QueueEntry) -> bool {
        self.timers
            .get(&entry.id)
            .is_some_and(|timer| timer.seq == entry.seq)
    }

    // ========================================================================
    // Ramps
    // ========================================================================

    /// Register a ramp to be advanced on every tick
    ///
    /// A ramp already running under `ramp_id` is cancelled and replaced.
    /// Ignored while stopped.
    pub fn start_ramp(&mut self, ramp_id: impl Into<String>, ramp: Ramp) {
        let ramp_id = ramp_id.into();
        if !self.is_running() {
            trace!(%ramp_id, "scheduler inactive, dropping ramp");
            return;
        }

        match self.ramps.iter_mut().find(|(id, _)| *id == ramp_id) {
            Some((_, existing)) => {
                debug!(%ramp_id, "replacing in-flight ramp");
                existing.cancel();
                *existing = ramp;
            }
            None => self.ramps.push((ramp_id, ramp)),
        }
    }

    /// Number of ramps still in flight
    pub fn active_ramps(&self) -> usize {
        self.ramps.len()
    }

    /// State of the ramp registered under `ramp_id`, while it is in flight
    pub fn ramp_state(&self, ramp_id: &str) -> Option<RampState> {
        self.ramps
            .iter()
            .find(|(id, _)| id == ramp_id)
            .map(|(_, ramp)| ramp.state())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Service the timeline once
    ///
    /// Fires every timer that has come due, in due order, then advances each
    /// in-flight ramp against the logical clock. Timers registered by a
    /// callback during this tick wait for the next one.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_running() {
            return report;
        }

        let now = self.clock.now();
        let horizon = self.next_seq;
        let mut deferred = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.due > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if !self.is_live(&entry) {
                continue;
            }
            if entry.seq >= horizon {
                deferred.push(entry);
                continue;
            }

            if let Some(timer) = self.timers.remove(&entry.id) {
                trace!(timer_id = %entry.id, "timer fired");
                (timer.callback)(self);
                report.fired += 1;
            }

            if !self.is_running() {
                return report;
            }
        }
        self.queue.extend(deferred);

        report.ramps_active = self.advance_ramps();
        report
    }

    fn advance_ramps(&mut self) -> usize {
        let now = self.current_time();
        let running = self.is_running();

        for (id, ramp) in &mut self.ramps {
            if ramp.tick(now, running) == RampState::Completed {
                trace!(ramp_id = %id, "ramp completed");
            }
        }
        self.ramps.retain(|(_, ramp)| !ramp.state().is_finished());
        self.ramps.len()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.is_running())
            .field("current_time", &self.current_time())
            .field("pending_timers", &self.timers.len())
            .field("active_ramps", &self.ramps.len())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
