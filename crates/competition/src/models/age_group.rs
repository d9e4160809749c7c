use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Gender;

pub const MASTERS_MIN_AGE: u32 = 35;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeGroup {
    pub code: String,
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeGroup {
    /// Five-year masters bracket (35-39, 40-44, ...), open-ended from 80.
    pub fn masters_for_age(gender: Gender, age: u32) -> Option<Self> {
        if age < MASTERS_MIN_AGE {
            return None;
        }
        let min_age = (age / 5 * 5).min(80);
        let max_age = if min_age == 80 { 999 } else { min_age + 4 };
        Some(Self {
            code: format!("{}{}", gender.as_str(), min_age),
            min_age,
            max_age,
        })
    }
}

impl Ord for AgeGroup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_age
            .cmp(&other.min_age)
            .then_with(|| self.max_age.cmp(&other.max_age))
            .then_with(|| self.code.cmp(&other.code))
    }
}

impl PartialOrd for AgeGroup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets() {
        assert!(AgeGroup::masters_for_age(Gender::M, 34).is_none());
        let g = AgeGroup::masters_for_age(Gender::M, 37).unwrap();
        assert_eq!((g.code.as_str(), g.min_age, g.max_age), ("M35", 35, 39));
        let g = AgeGroup::masters_for_age(Gender::F, 86).unwrap();
        assert_eq!((g.code.as_str(), g.min_age, g.max_age), ("F80", 80, 999));
    }
}
