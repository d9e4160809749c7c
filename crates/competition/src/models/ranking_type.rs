use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CompetitionError;

/// What a results ranking is computed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingType {
    Snatch,
    CleanJerk,
    #[default]
    Total,
    Sinclair,
    Custom,
}

impl RankingType {
    pub const ALL: [RankingType; 5] = [
        Self::Snatch,
        Self::CleanJerk,
        Self::Total,
        Self::Sinclair,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snatch => "snatch",
            Self::CleanJerk => "clean_jerk",
            Self::Total => "total",
            Self::Sinclair => "sinclair",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for RankingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingType {
    type Err = CompetitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "snatch" => Ok(Self::Snatch),
            "clean_jerk" | "cleanjerk" | "cj" => Ok(Self::CleanJerk),
            "total" => Ok(Self::Total),
            "sinclair" => Ok(Self::Sinclair),
            "custom" => Ok(Self::Custom),
            other => Err(CompetitionError::Validation(format!(
                "Unknown ranking type '{}'",
                other
            ))),
        }
    }
}

/// One integer per ranking type; used for ranks and for team points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerRanking {
    pub snatch: i32,
    pub clean_jerk: i32,
    pub total: i32,
    pub sinclair: i32,
    pub custom: i32,
}

impl PerRanking {
    pub fn get(&self, ranking: RankingType) -> i32 {
        match ranking {
            RankingType::Snatch => self.snatch,
            RankingType::CleanJerk => self.clean_jerk,
            RankingType::Total => self.total,
            RankingType::Sinclair => self.sinclair,
            RankingType::Custom => self.custom,
        }
    }

    pub fn set(&mut self, ranking: RankingType, value: i32) {
        let slot = match ranking {
            RankingType::Snatch => &mut self.snatch,
            RankingType::CleanJerk => &mut self.clean_jerk,
            RankingType::Total => &mut self.total,
            RankingType::Sinclair => &mut self.sinclair,
            RankingType::Custom => &mut self.custom,
        };
        *slot = value;
    }
}
