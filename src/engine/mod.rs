//! Timing Engine Module
//!
//! Core timing machinery:
//! - Injectable clocks (wall-clock and simulated)
//! - Timeline scheduler with preemptible one-shot timers and ramp ticking

pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{EventCallback, Scheduler, TickReport};
