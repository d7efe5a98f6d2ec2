//! Actions Module
//!
//! Declarative timed actions and the machinery that executes them:
//! - Action descriptors (play, volume, pan)
//! - Easing curves and interpolation
//! - Ramp state machine for animated parameter changes
//! - Handlers that register actions with the scheduler

mod descriptor;
mod easing;
mod handlers;
mod ramp;

pub use descriptor::{ActionDescriptor, ActionKind, PlayAction, RampAction};
pub use easing::{interpolate, Easing};
pub use handlers::{schedule_action, schedule_param, schedule_play};
pub use ramp::{Ramp, RampParam, RampState};
