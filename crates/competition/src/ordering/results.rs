use std::cmp::Ordering;

use crate::coefficients::{self, CoefficientTable};
use crate::models::{LiftType, Lifter, RankingType};

use super::RankingConfig;
use super::rules::{self, Cascade};

/// Inputs a results ranking needs besides the lifters themselves.
#[derive(Clone, Copy)]
pub struct ScoreContext<'a> {
    pub config: &'a RankingConfig,
    pub coefficients: Option<&'a dyn CoefficientTable>,
}

impl<'a> ScoreContext<'a> {
    pub fn new(config: &'a RankingConfig) -> Self {
        Self {
            config,
            coefficients: None,
        }
    }

    pub fn with_coefficients(mut self, table: &'a dyn CoefficientTable) -> Self {
        self.coefficients = Some(table);
        self
    }

    /// Ranking metric; zero or less means the lifter does not place.
    pub fn score(&self, lifter: &Lifter, ranking: RankingType) -> f64 {
        match ranking {
            RankingType::Snatch => f64::from(lifter.best_snatch()),
            RankingType::CleanJerk => f64::from(lifter.best_clean_jerk()),
            RankingType::Total => f64::from(lifter.total()),
            RankingType::Sinclair => match (self.coefficients, self.config.competition_year) {
                (Some(table), Some(year)) if self.config.masters => {
                    coefficients::smm_score(lifter, table, year)
                }
                (Some(table), _) => coefficients::sinclair_score(lifter, table),
                (None, _) => 0.0,
            },
            RankingType::Custom => lifter.custom_score.unwrap_or(0.0),
        }
    }

    /// Whether the ranking is split by bodyweight category.
    pub fn groups_by_category(&self, ranking: RankingType) -> bool {
        match ranking {
            RankingType::Snatch | RankingType::CleanJerk | RankingType::Total => true,
            RankingType::Sinclair | RankingType::Custom => self.config.use_category_sinclair,
        }
    }
}

/// Rule chain for a results ranking; biggest result first.
pub fn results_order_cascade<'a>(ranking: RankingType, ctx: ScoreContext<'a>) -> Cascade<'a> {
    let masters = ctx.config.masters;
    let cascade = Cascade::new()
        .then_if(masters, "gender", rules::gender)
        .then_if(masters, "age_group_descending", rules::age_group_descending)
        .then_if(
            ctx.groups_by_category(ranking),
            "category",
            rules::category(ctx.config),
        )
        .then("score_descending", move |a: &Lifter, b: &Lifter| {
            ctx.score(b, ranking).total_cmp(&ctx.score(a, ranking))
        })
        .then("body_weight", rules::body_weight);

    let cascade = match ranking {
        RankingType::Total => cascade
            .then("best_clean_jerk", rules::best_clean_jerk_ascending)
            .then(
                "best_clean_jerk_attempt",
                rules::best_attempt_number(LiftType::CleanJerk),
            )
            .then(
                "previous_clean_jerk_attempts",
                rules::previous_attempts(LiftType::CleanJerk),
            ),
        RankingType::CleanJerk => cascade
            .then(
                "best_clean_jerk_attempt",
                rules::best_attempt_number(LiftType::CleanJerk),
            )
            .then(
                "previous_clean_jerk_attempts",
                rules::previous_attempts(LiftType::CleanJerk),
            ),
        RankingType::Snatch => cascade
            .then(
                "best_snatch_attempt",
                rules::best_attempt_number(LiftType::Snatch),
            )
            .then(
                "previous_snatch_attempts",
                rules::previous_attempts(LiftType::Snatch),
            ),
        RankingType::Sinclair | RankingType::Custom => cascade,
    };

    cascade.then("lot_number", rules::lot_number)
}

pub fn results_order(lifters: &mut [Lifter], ranking: RankingType, ctx: ScoreContext<'_>) {
    results_order_cascade(ranking, ctx).sort(lifters);
}

/// Equal when two lifters fall into the same ranking group.
pub(super) fn same_group(a: &Lifter, b: &Lifter, ranking: RankingType, ctx: &ScoreContext<'_>) -> bool {
    let mut key = Vec::with_capacity(3);
    if ctx.config.masters {
        key.push(rules::gender(a, b));
        key.push(rules::age_group(a, b));
    }
    if ctx.groups_by_category(ranking) {
        key.push(rules::category(ctx.config)(a, b));
    }
    rules::first_non_equal(key) == Ordering::Equal
}
