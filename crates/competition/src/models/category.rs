use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Gender;

/// A bodyweight category. The upper bound is inclusive; open categories use a
/// large upper bound (e.g. 999).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub gender: Gender,
    pub maximum_weight: Decimal,
}

impl Category {
    pub fn new(code: impl Into<String>, gender: Gender, maximum_weight: Decimal) -> Self {
        Self {
            code: code.into(),
            gender,
            maximum_weight,
        }
    }

    pub fn contains(&self, body_weight: Decimal) -> bool {
        body_weight <= self.maximum_weight
    }

    /// Smallest category of the given gender that admits `body_weight`.
    pub fn for_body_weight<'a>(
        categories: &'a [Category],
        gender: Gender,
        body_weight: Decimal,
    ) -> Option<&'a Category> {
        categories
            .iter()
            .filter(|c| c.gender == gender && c.contains(body_weight))
            .min_by(|a, b| a.maximum_weight.cmp(&b.maximum_weight))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gender
            .cmp(&other.gender)
            .then_with(|| self.maximum_weight.cmp(&other.maximum_weight))
            .then_with(|| self.code.cmp(&other.code))
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
