//! Single-field tie-break rules and the combinator that chains them.
//!
//! Each rule is a pure `(&Lifter, &Lifter) -> Ordering`. `Option` fields follow
//! Rust's ordering, so a missing value sorts before a present one unless the
//! rule documents otherwise.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::models::{Category, LiftType, Lifter};

use super::RankingConfig;

pub type Rule<'a> = Box<dyn Fn(&Lifter, &Lifter) -> Ordering + 'a>;

/// Returns the first ordering that is not `Equal`.
pub fn first_non_equal(orderings: impl IntoIterator<Item = Ordering>) -> Ordering {
    orderings
        .into_iter()
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// An ordered list of named rules; the first rule that separates two lifters decides.
pub struct Cascade<'a> {
    rules: Vec<(&'static str, Rule<'a>)>,
}

impl<'a> Cascade<'a> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn then(mut self, name: &'static str, rule: impl Fn(&Lifter, &Lifter) -> Ordering + 'a) -> Self {
        self.rules.push((name, Box::new(rule)));
        self
    }

    pub fn then_if(
        self,
        enabled: bool,
        name: &'static str,
        rule: impl Fn(&Lifter, &Lifter) -> Ordering + 'a,
    ) -> Self {
        if enabled { self.then(name, rule) } else { self }
    }

    pub fn compare(&self, a: &Lifter, b: &Lifter) -> Ordering {
        first_non_equal(self.rules.iter().map(|(_, rule)| rule(a, b)))
    }

    /// Name of the rule that separates `a` and `b`, if any.
    pub fn deciding_rule(&self, a: &Lifter, b: &Lifter) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|(_, rule)| rule(a, b).is_ne())
            .map(|(name, _)| *name)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(name, _)| *name).collect()
    }

    pub fn sort(&self, lifters: &mut [Lifter]) {
        lifters.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for Cascade<'_> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn forced_as_current(a: &Lifter, b: &Lifter) -> Ordering {
    b.forced_as_current.cmp(&a.forced_as_current)
}

/// Lifters with all six attempts done go after everyone still lifting.
pub fn finished_last(a: &Lifter, b: &Lifter) -> Ordering {
    a.is_finished().cmp(&b.is_finished())
}

pub fn lift_phase(a: &Lifter, b: &Lifter) -> Ordering {
    a.lift_type().cmp(&b.lift_type())
}

/// Missing or zero requests count as infinitely heavy.
fn requested_weight_key(lifter: &Lifter) -> i32 {
    lifter
        .next_attempt_requested_weight()
        .filter(|w| *w > 0)
        .unwrap_or(i32::MAX)
}

pub fn next_requested_weight(a: &Lifter, b: &Lifter) -> Ordering {
    requested_weight_key(a).cmp(&requested_weight_key(b))
}

pub fn attempts_done(a: &Lifter, b: &Lifter) -> Ordering {
    a.attempts_done().cmp(&b.attempts_done())
}

/// Time of the previous lift, treated as the epoch (`None`) on the first
/// attempt of each lift so snatch timing never leaks into the clean & jerk.
fn effective_lift_time(lifter: &Lifter) -> Option<DateTime<Utc>> {
    if lifter.attempts_done() % crate::models::ATTEMPTS_PER_LIFT == 0 {
        None
    } else {
        lifter.last_lift_time
    }
}

pub fn previous_lift_time(a: &Lifter, b: &Lifter) -> Ordering {
    effective_lift_time(a).cmp(&effective_lift_time(b))
}

pub fn lot_number(a: &Lifter, b: &Lifter) -> Ordering {
    a.lot_number.cmp(&b.lot_number)
}

pub fn start_number(a: &Lifter, b: &Lifter) -> Ordering {
    a.start_number.cmp(&b.start_number)
}

pub fn last_name(a: &Lifter, b: &Lifter) -> Ordering {
    a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase())
}

pub fn first_name(a: &Lifter, b: &Lifter) -> Ordering {
    a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase())
}

pub fn gender(a: &Lifter, b: &Lifter) -> Ordering {
    a.gender.cmp(&b.gender)
}

pub fn age_group(a: &Lifter, b: &Lifter) -> Ordering {
    a.age_group.cmp(&b.age_group)
}

pub fn age_group_descending(a: &Lifter, b: &Lifter) -> Ordering {
    age_group(a, b).reverse()
}

pub fn registration_category(a: &Lifter, b: &Lifter) -> Ordering {
    a.registration_category.cmp(&b.registration_category)
}

pub fn computed_category(a: &Lifter, b: &Lifter) -> Ordering {
    a.category.cmp(&b.category)
}

/// The category a ranking groups by under the given configuration.
pub fn ranking_category<'l>(lifter: &'l Lifter, config: &RankingConfig) -> Option<&'l Category> {
    if config.use_registration_category {
        lifter.registration_category.as_ref()
    } else {
        lifter.category.as_ref()
    }
}

pub fn category(config: &RankingConfig) -> impl Fn(&Lifter, &Lifter) -> Ordering + '_ {
    move |a, b| ranking_category(a, config).cmp(&ranking_category(b, config))
}

pub fn session_weigh_in(a: &Lifter, b: &Lifter) -> Ordering {
    let time = |l: &Lifter| l.session.as_ref().and_then(|s| s.weigh_in_time);
    time(a).cmp(&time(b))
}

pub fn session_name(a: &Lifter, b: &Lifter) -> Ordering {
    let name = |l: &Lifter| l.session.as_ref().map(|s| s.name.clone());
    name(a).cmp(&name(b))
}

/// Lighter lifter first.
pub fn body_weight(a: &Lifter, b: &Lifter) -> Ordering {
    a.body_weight.cmp(&b.body_weight)
}

/// Smaller best clean & jerk first: the total was reached earlier in the session.
pub fn best_clean_jerk_ascending(a: &Lifter, b: &Lifter) -> Ordering {
    a.best_clean_jerk().cmp(&b.best_clean_jerk())
}

/// The lifter who made their best weight on an earlier attempt wins.
pub fn best_attempt_number(lift: LiftType) -> impl Fn(&Lifter, &Lifter) -> Ordering {
    move |a, b| a.best_attempt_number(lift).cmp(&b.best_attempt_number(lift))
}

/// Walks backwards over the attempts of `lift` made before the best one;
/// the smaller weight attempted wins.
pub fn previous_attempts(lift: LiftType) -> impl Fn(&Lifter, &Lifter) -> Ordering {
    move |a, b| {
        let decisive = a.best_attempt_number(lift).min(b.best_attempt_number(lift));
        let (a_slots, b_slots) = (a.slots(lift), b.slots(lift));
        first_non_equal((1..decisive).rev().map(|n| {
            a_slots[n - 1]
                .attempted_weight()
                .cmp(&b_slots[n - 1].attempted_weight())
        }))
    }
}
