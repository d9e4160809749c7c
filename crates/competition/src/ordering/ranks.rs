use crate::models::{Lifter, RankingType};

use super::results::{ScoreContext, results_order, same_group};

/// Team points for a placing, 28-25-23-22-21... down to 1.
pub fn team_points_for_rank(rank: i32) -> i32 {
    match rank {
        r if r <= 0 => 0,
        1 => 28,
        2 => 25,
        r => (26 - r).max(1),
    }
}

/// Sorts into results order and writes `ranks` and `points` for `ranking`.
///
/// The counter restarts at 1 in each category (and masters gender/age group).
/// Invited lifters get -1 and do not use up a place. Lifters without a result
/// get 0, but the counter still moves past them.
pub fn assign_ranks(lifters: &mut [Lifter], ranking: RankingType, ctx: ScoreContext<'_>) {
    results_order(lifters, ranking, ctx);

    let mut rank = 1;
    for i in 0..lifters.len() {
        if i > 0 && !same_group(&lifters[i - 1], &lifters[i], ranking, &ctx) {
            rank = 1;
        }
        let score = ctx.score(&lifters[i], ranking);
        let lifter = &mut lifters[i];
        let value = if lifter.invited {
            -1
        } else if score <= 0.0 {
            // TODO: confirm with the rulebook whether non-placing lifters should
            // consume a place; assign_category_ranks does not.
            rank += 1;
            0
        } else {
            rank += 1;
            rank - 1
        };

        lifter.ranks.set(ranking, value);
        let points = if lifter.team_member {
            team_points_for_rank(value)
        } else {
            0
        };
        lifter.points.set(ranking, points);
    }

    tracing::debug!(ranking = %ranking, lifters = lifters.len(), "ranks assigned");
}

/// Per-registration-category ranks written into `category_ranks`.
///
/// Unlike [`assign_ranks`], lifters without a result do not advance the counter.
pub fn assign_category_ranks(lifters: &mut [Lifter], ranking: RankingType, ctx: ScoreContext<'_>) {
    let config = super::RankingConfig {
        use_registration_category: true,
        use_category_sinclair: true,
        ..ctx.config.clone()
    };
    let ctx = ScoreContext {
        config: &config,
        coefficients: ctx.coefficients,
    };
    results_order(lifters, ranking, ctx);

    let mut rank = 1;
    for i in 0..lifters.len() {
        if i > 0 && !same_group(&lifters[i - 1], &lifters[i], ranking, &ctx) {
            rank = 1;
        }
        let score = ctx.score(&lifters[i], ranking);
        let lifter = &mut lifters[i];
        let value = if lifter.invited {
            -1
        } else if score <= 0.0 {
            0
        } else {
            rank += 1;
            rank - 1
        };
        lifter.category_ranks.set(ranking, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttemptSlot, Category, Gender};
    use crate::ordering::RankingConfig;
    use rust_decimal::Decimal;

    fn slot(actual: i32) -> AttemptSlot {
        AttemptSlot {
            actual: Some(actual),
            ..Default::default()
        }
    }

    fn lifter(name: &str, cat: &str, lot: u32, total_split: (i32, i32)) -> Lifter {
        let mut l = Lifter::new(name, name, Gender::M);
        l.lot_number = Some(lot);
        l.body_weight = Some(Decimal::from(70));
        let category = Category::new(cat, Gender::M, Decimal::from(if cat == "M73" { 73 } else { 81 }));
        l.category = Some(category.clone());
        l.registration_category = Some(category);
        l.snatch = [slot(total_split.0), slot(0), slot(0)];
        l.clean_jerk = [slot(total_split.1), slot(0), slot(0)];
        l
    }

    fn rank_of(lifters: &[Lifter], name: &str) -> i32 {
        lifters
            .iter()
            .find(|l| l.first_name == name)
            .map(|l| l.ranks.total)
            .unwrap()
    }

    #[test]
    fn test_points_table() {
        let points: Vec<_> = (0..=4).map(team_points_for_rank).collect();
        assert_eq!(points, vec![0, 28, 25, 23, 22]);
        assert_eq!(team_points_for_rank(25), 1);
        assert_eq!(team_points_for_rank(40), 1);
        assert_eq!(team_points_for_rank(-1), 0);
    }

    #[test]
    fn test_counter_restarts_per_category() {
        let config = RankingConfig::default();
        let mut lifters = vec![
            lifter("A", "M73", 1, (100, 120)),
            lifter("B", "M73", 2, (90, 110)),
            lifter("C", "M81", 3, (80, 100)),
        ];
        assign_ranks(&mut lifters, RankingType::Total, ScoreContext::new(&config));
        assert_eq!(rank_of(&lifters, "A"), 1);
        assert_eq!(rank_of(&lifters, "B"), 2);
        assert_eq!(rank_of(&lifters, "C"), 1);
    }

    #[test]
    fn test_invited_does_not_take_a_place() {
        let config = RankingConfig::default();
        let mut guest = lifter("Guest", "M73", 1, (120, 140));
        guest.invited = true;
        let mut lifters = vec![guest, lifter("A", "M73", 2, (100, 120))];
        assign_ranks(&mut lifters, RankingType::Total, ScoreContext::new(&config));
        assert_eq!(rank_of(&lifters, "Guest"), -1);
        assert_eq!(rank_of(&lifters, "A"), 1);
    }

    #[test]
    fn test_team_points_only_for_team_members() {
        let config = RankingConfig::default();
        let mut a = lifter("A", "M73", 1, (100, 120));
        a.team_member = true;
        let b = lifter("B", "M73", 2, (90, 110));
        let mut lifters = vec![b, a];
        assign_ranks(&mut lifters, RankingType::Total, ScoreContext::new(&config));
        assert_eq!(lifters[0].points.total, 28);
        assert_eq!(lifters[1].points.total, 0);
    }

    // Results ranks and category ranks disagree on whether a lifter without a
    // total uses up a place; both behaviours are kept as they are.
    #[test]
    fn test_zero_total_counter_discrepancy() {
        let config = RankingConfig::default();
        let mut bombed = lifter("Bombed", "M73", 1, (100, -120));
        bombed.clean_jerk = [slot(-120), slot(-120), slot(-120)];
        let mut guest = lifter("Guest", "M73", 3, (0, 0));
        guest.snatch = [slot(-50), slot(-50), slot(-50)];
        guest.invited = true;
        let a = lifter("A", "M73", 2, (90, 110));
        let mut lifters = vec![bombed, a, guest];
        let ctx = ScoreContext::new(&config);

        assign_ranks(&mut lifters, RankingType::Total, ctx);
        assign_category_ranks(&mut lifters, RankingType::Total, ctx);

        let find = |name: &str| lifters.iter().find(|l| l.first_name == name).unwrap();
        assert_eq!(find("A").ranks.total, 1);
        assert_eq!(find("Bombed").ranks.total, 0);
        assert_eq!(find("Guest").ranks.total, -1);
        assert_eq!(find("A").category_ranks.total, 1);
        assert_eq!(find("Bombed").category_ranks.total, 0);
    }
}
