use crate::models::Lifter;

use super::rules::{self, Cascade};

/// Rule chain deciding who lifts next.
pub fn lifting_order_cascade() -> Cascade<'static> {
    Cascade::new()
        .then("forced_as_current", rules::forced_as_current)
        .then("finished_last", rules::finished_last)
        .then("lift_phase", rules::lift_phase)
        .then("next_requested_weight", rules::next_requested_weight)
        .then("attempts_done", rules::attempts_done)
        .then("previous_lift_time", rules::previous_lift_time)
        .then("lot_number", rules::lot_number)
}

/// Sorts lifters into lifting order, numbers them from 1 and flags the
/// first lifter still lifting as current.
pub fn lifting_order(lifters: &mut [Lifter]) {
    lifting_order_cascade().sort(lifters);

    let mut current_assigned = false;
    for (i, lifter) in lifters.iter_mut().enumerate() {
        lifter.lift_order_rank = (i + 1) as u32;
        lifter.is_current_lifter = !current_assigned && !lifter.is_finished();
        current_assigned |= lifter.is_current_lifter;
    }

    if let Some(current) = lifters.iter().find(|l| l.is_current_lifter) {
        tracing::debug!(
            lifter = %current.full_name(),
            weight = ?current.next_attempt_requested_weight(),
            attempt = current.attempts_done() + 1,
            "current lifter"
        );
    }
}

pub fn current_lifter(lifters: &[Lifter]) -> Option<&Lifter> {
    lifters.iter().find(|l| l.is_current_lifter)
}
