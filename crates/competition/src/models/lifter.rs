use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AgeGroup, AttemptSlot, Category, CompetitionSession, Gender, LiftType, PerRanking};
use crate::{CompetitionError, Result};

pub const ATTEMPTS_PER_LIFT: usize = 3;
pub const TOTAL_ATTEMPTS: usize = 2 * ATTEMPTS_PER_LIFT;

/// A registered athlete and everything recorded on their lifter card.
///
/// Lifters live for the whole competition. The ordering engine writes the rank
/// fields and the current-lifter flag; everything else is maintained by the
/// registration desk and the marshal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lifter {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub body_weight: Option<Decimal>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub age_group: Option<AgeGroup>,
    /// Category computed from body weight at weigh-in.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub registration_category: Option<Category>,
    #[serde(default)]
    pub session: Option<CompetitionSession>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub lot_number: Option<u32>,
    #[serde(default)]
    pub start_number: Option<u32>,
    #[serde(default)]
    pub snatch: [AttemptSlot; ATTEMPTS_PER_LIFT],
    #[serde(default)]
    pub clean_jerk: [AttemptSlot; ATTEMPTS_PER_LIFT],
    #[serde(default)]
    pub last_lift_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom_score: Option<f64>,

    #[serde(default)]
    pub lift_order_rank: u32,
    #[serde(default)]
    pub ranks: PerRanking,
    #[serde(default)]
    pub category_ranks: PerRanking,
    #[serde(default)]
    pub points: PerRanking,

    #[serde(default)]
    pub forced_as_current: bool,
    #[serde(default)]
    pub invited: bool,
    #[serde(default)]
    pub team_member: bool,
    #[serde(default)]
    pub is_current_lifter: bool,
}

impl Lifter {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender,
            body_weight: None,
            birth_year: None,
            age_group: None,
            category: None,
            registration_category: None,
            session: None,
            team: None,
            lot_number: None,
            start_number: None,
            snatch: Default::default(),
            clean_jerk: Default::default(),
            last_lift_time: None,
            custom_score: None,
            lift_order_rank: 0,
            ranks: PerRanking::default(),
            category_ranks: PerRanking::default(),
            points: PerRanking::default(),
            forced_as_current: false,
            invited: false,
            team_member: false,
            is_current_lifter: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name.to_uppercase(), self.first_name)
    }

    pub fn age(&self, competition_year: i32) -> Option<u32> {
        self.birth_year
            .and_then(|y| u32::try_from(competition_year - y).ok())
    }

    /// Attempt `n` counted over the whole session (1-3 snatch, 4-6 clean & jerk).
    pub fn attempt(&self, n: usize) -> Option<&AttemptSlot> {
        match n {
            1..=3 => self.snatch.get(n - 1),
            4..=6 => self.clean_jerk.get(n - 4),
            _ => None,
        }
    }

    fn attempt_mut(&mut self, n: usize) -> Result<&mut AttemptSlot> {
        match n {
            1..=3 => Ok(&mut self.snatch[n - 1]),
            4..=6 => Ok(&mut self.clean_jerk[n - 4]),
            _ => Err(CompetitionError::NoSuchAttempt(n)),
        }
    }

    pub fn slots(&self, lift: LiftType) -> &[AttemptSlot; ATTEMPTS_PER_LIFT] {
        match lift {
            LiftType::Snatch => &self.snatch,
            LiftType::CleanJerk => &self.clean_jerk,
        }
    }

    pub fn attempts_done(&self) -> usize {
        self.snatch
            .iter()
            .chain(self.clean_jerk.iter())
            .filter(|slot| slot.is_done())
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.attempts_done() >= TOTAL_ATTEMPTS
    }

    /// Phase of the next attempt.
    pub fn lift_type(&self) -> LiftType {
        if self.attempts_done() < ATTEMPTS_PER_LIFT {
            LiftType::Snatch
        } else {
            LiftType::CleanJerk
        }
    }

    pub fn next_attempt_requested_weight(&self) -> Option<i32> {
        self.attempt(self.attempts_done() + 1)
            .and_then(AttemptSlot::requested_weight)
    }

    pub fn best(&self, lift: LiftType) -> i32 {
        self.slots(lift)
            .iter()
            .filter_map(|slot| slot.actual)
            .filter(|w| *w > 0)
            .max()
            .unwrap_or(0)
    }

    /// 1-based attempt number within the lift at which the best weight was made, 0 if none.
    pub fn best_attempt_number(&self, lift: LiftType) -> usize {
        let best = self.best(lift);
        if best <= 0 {
            return 0;
        }
        self.slots(lift)
            .iter()
            .position(|slot| slot.actual == Some(best))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn best_snatch(&self) -> i32 {
        self.best(LiftType::Snatch)
    }

    pub fn best_clean_jerk(&self) -> i32 {
        self.best(LiftType::CleanJerk)
    }

    pub fn best_snatch_attempt_number(&self) -> usize {
        self.best_attempt_number(LiftType::Snatch)
    }

    pub fn best_clean_jerk_attempt_number(&self) -> usize {
        self.best_attempt_number(LiftType::CleanJerk)
    }

    /// Zero unless both lifts have at least one good attempt.
    pub fn total(&self) -> i32 {
        let snatch = self.best_snatch();
        let clean_jerk = self.best_clean_jerk();
        if snatch > 0 && clean_jerk > 0 {
            snatch + clean_jerk
        } else {
            0
        }
    }

    pub fn declare(&mut self, attempt: usize, weight: i32) -> Result<()> {
        let slot = self.editable_slot(attempt, weight)?;
        slot.declaration = Some(weight);
        Ok(())
    }

    /// Records a weight change, first into change1 then into change2.
    pub fn change(&mut self, attempt: usize, weight: i32) -> Result<()> {
        let slot = self.editable_slot(attempt, weight)?;
        if slot.change1.is_none() {
            slot.change1 = Some(weight);
        } else if slot.change2.is_none() {
            slot.change2 = Some(weight);
        } else {
            return Err(CompetitionError::TooManyChanges(attempt));
        }
        Ok(())
    }

    fn editable_slot(&mut self, attempt: usize, weight: i32) -> Result<&mut AttemptSlot> {
        if weight <= 0 {
            return Err(CompetitionError::InvalidWeight { attempt, weight });
        }
        let slot = self.attempt_mut(attempt)?;
        if slot.is_done() {
            return Err(CompetitionError::AlreadyLifted(attempt));
        }
        Ok(slot)
    }

    /// Records the outcome of the next attempt at the requested weight and
    /// returns the signed actual weight.
    pub fn record_lift(&mut self, good: bool, at: DateTime<Utc>) -> Result<i32> {
        if self.is_finished() {
            return Err(CompetitionError::Finished);
        }
        let n = self.attempts_done() + 1;
        let weight = self
            .next_attempt_requested_weight()
            .filter(|w| *w > 0)
            .ok_or(CompetitionError::NoRequestedWeight(n))?;
        let actual = if good { weight } else { -weight };
        self.complete_attempt(n, actual, at)?;
        Ok(actual)
    }

    /// Records a forfeited attempt (actual weight 0).
    pub fn forfeit(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.is_finished() {
            return Err(CompetitionError::Finished);
        }
        let n = self.attempts_done() + 1;
        self.complete_attempt(n, 0, at)
    }

    fn complete_attempt(&mut self, n: usize, actual: i32, at: DateTime<Utc>) -> Result<()> {
        let slot = self.attempt_mut(n)?;
        slot.actual = Some(actual);
        let progression = slot.automatic_progression();
        self.last_lift_time = Some(at);

        // no carry-over from the last snatch into the first clean & jerk
        if n % ATTEMPTS_PER_LIFT != 0 {
            let next = self.attempt_mut(n + 1)?;
            if next.declaration.is_none() {
                next.declaration = progression;
            }
        }
        tracing::debug!(
            lifter = %self.full_name(),
            attempt = n,
            actual,
            "attempt recorded"
        );
        Ok(())
    }
}

/// Lightweight identity handle for a lifter, held by the clock as its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifterRef {
    pub id: Uuid,
    pub name: String,
    pub attempts_done: usize,
}

impl From<&Lifter> for LifterRef {
    fn from(lifter: &Lifter) -> Self {
        Self {
            id: lifter.id,
            name: lifter.full_name(),
            attempts_done: lifter.attempts_done(),
        }
    }
}
