//! Parameter ramp state machine
//!
//! A ramp moves one target parameter from `from` to `to` over `duration`
//! seconds of *scheduler* time. The start of the ramp is captured from the
//! scheduler clock on its first tick, so a late or coarse tick source delays
//! individual updates but never stretches the ramp as a whole.
//!
//! ```text
//! Scheduled --tick--> Running --tick (progress >= 1)--> Completed
//!     |                  |
//!     +---- stop / replace / tick while stopped ----> Cancelled
//! ```

use std::fmt;

use super::easing::{interpolate, Easing};
use crate::target::TargetHandle;

/// Which target parameter a ramp drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RampParam {
    Volume,
    Pan,
}

impl RampParam {
    /// Value assumed when an action leaves `from` or `to` unset
    pub fn default_value(self) -> f32 {
        match self {
            RampParam::Volume => 1.0,
            RampParam::Pan => 0.0,
        }
    }

    /// Push `value` to the matching setter on `target`
    pub fn apply(self, target: &TargetHandle, value: f32) -> bool {
        match self {
            RampParam::Volume => target.set_volume(value),
            RampParam::Pan => target.set_pan(value),
        }
    }
}

impl fmt::Display for RampParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RampParam::Volume => write!(f, "volume"),
            RampParam::Pan => write!(f, "pan"),
        }
    }
}

/// Lifecycle of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RampState {
    /// Registered, waiting for its first tick
    #[default]
    Scheduled,
    /// Started at `loop_start` seconds on the scheduler clock
    Running { loop_start: f64 },
    /// Final value delivered
    Completed,
    /// Stopped before completion
    Cancelled,
}

impl RampState {
    pub fn is_finished(self) -> bool {
        matches!(self, RampState::Completed | RampState::Cancelled)
    }
}

/// A continuous parameter change on one target
#[derive(Debug, Clone)]
pub struct Ramp {
    target: TargetHandle,
    param: RampParam,
    from: f32,
    to: f32,
    duration: f64,
    easing: Easing,
    state: RampState,
    last_value: Option<f32>,
}

impl Ramp {
    pub fn new(
        target: TargetHandle,
        param: RampParam,
        from: f32,
        to: f32,
        duration: f64,
        easing: Easing,
    ) -> Self {
        Self {
            target,
            param,
            from,
            to,
            duration,
            easing,
            state: RampState::Scheduled,
            last_value: None,
        }
    }

    pub fn target_id(&self) -> &str {
        self.target.id()
    }

    pub fn param(&self) -> RampParam {
        self.param
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    /// Last value pushed to the target
    pub fn last_value(&self) -> Option<f32> {
        self.last_value
    }

    /// Stop the ramp without pushing anything further
    pub fn cancel(&mut self) {
        if !self.state.is_finished() {
            self.state = RampState::Cancelled;
        }
    }

    /// Advance one step at scheduler time `now`
    ///
    /// Checks `running` first: a ramp ticked after its scheduler stopped
    /// cancels itself instead of pushing a stale value.
    pub fn tick(&mut self, now: f64, running: bool) -> RampState {
        if self.state.is_finished() {
            return self.state;
        }
        if !running {
            self.state = RampState::Cancelled;
            return self.state;
        }

        let loop_start = match self.state {
            RampState::Running { loop_start } => loop_start,
            _ => now,
        };
        let progress = ramp_progress(now - loop_start, self.duration);
        let value = interpolate(self.from as f64, self.to as f64, progress, self.easing) as f32;

        self.param.apply(&self.target, value);
        self.last_value = Some(value);

        self.state = if progress >= 1.0 {
            RampState::Completed
        } else {
            RampState::Running { loop_start }
        };
        self.state
    }
}

fn ramp_progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}
