//! Action handlers
//!
//! One strategy per [`ActionDescriptor`] variant. A handler turns a
//! descriptor into scheduler registrations against one target; it never
//! touches the target directly.

use tracing::trace;

use super::descriptor::{ActionDescriptor, ActionKind, PlayAction, RampAction};
use super::ramp::{Ramp, RampParam};
use crate::engine::Scheduler;
use crate::target::TargetHandle;

/// Register `action` for `target` on the scheduler
pub fn schedule_action(
    action: &ActionDescriptor,
    target: &TargetHandle,
    scheduler: &mut Scheduler,
) {
    match action {
        ActionDescriptor::Play(play) => schedule_play(play, target, scheduler),
        ActionDescriptor::Volume(volume) => {
            schedule_param(RampParam::Volume, volume, target, scheduler)
        }
        ActionDescriptor::Pan(pan) => schedule_param(RampParam::Pan, pan, target, scheduler),
    }
}

/// At `start`: set the loop flag and play
pub fn schedule_play(play: &PlayAction, target: &TargetHandle, scheduler: &mut Scheduler) {
    let handle = target.clone();
    let looping = play.looping;

    scheduler.schedule_event(
        move |_| {
            trace!(target_id = handle.id(), looping, "play");
            handle.play(looping);
        },
        play.start,
        ActionKind::Play.timer_id(target.id()),
    );
}

/// At `start`: jump to `to`, or begin a ramp when `duration > 0`
///
/// A ramp replaces any ramp already running under the same id. An instant
/// set does not: it writes `to` once and a ramp still in flight for the
/// parameter overwrites it on its next step.
pub fn schedule_param(
    param: RampParam,
    action: &RampAction,
    target: &TargetHandle,
    scheduler: &mut Scheduler,
) {
    let timer_id = ActionKind::from(param).timer_id(target.id());
    let handle = target.clone();
    let to = action.to_value(param);

    if !action.is_animated() {
        scheduler.schedule_event(
            move |_| {
                trace!(target_id = handle.id(), %param, value = to, "set");
                param.apply(&handle, to);
            },
            action.start,
            timer_id,
        );
        return;
    }

    let ramp = Ramp::new(
        handle,
        param,
        action.from_value(param),
        to,
        action.duration,
        action.ease,
    );
    let ramp_id = timer_id.clone();

    scheduler.schedule_event(
        move |scheduler| scheduler.start_ramp(ramp_id, ramp),
        action.start,
        timer_id,
    );
}
