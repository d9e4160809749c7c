use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::models::{Gender, Lifter};

/// Lookup for bodyweight and age normalisation factors.
///
/// The ordering engine never computes coefficients itself; Sinclair and SMM
/// scores are always obtained through an injected table.
pub trait CoefficientTable: Send + Sync {
    fn sinclair_factor(&self, gender: Gender, body_weight: Decimal) -> Option<f64>;

    /// Masters age factor (SMM). Tables without age data return `None`.
    fn age_factor(&self, _age: u32) -> Option<f64> {
        None
    }
}

/// Sinclair formula version
///
/// Factor = 10^(A · log10(BW / b)²) for BW below b, 1.0 at or above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinclairCoefficients {
    pub cycle: String,
    pub men_a: f64,
    pub men_b: f64,
    pub women_a: f64,
    pub women_b: f64,
}

/// Formula constants for a specific gender
#[derive(Debug, Clone, Copy)]
pub struct SinclairConstants {
    pub a: f64,
    pub b: f64,
}

impl SinclairCoefficients {
    /// Coefficients published for the 2021-2024 Olympic cycle.
    pub fn cycle_2020() -> Self {
        Self {
            cycle: "2020".to_string(),
            men_a: 0.722762521,
            men_b: 193.609,
            women_a: 0.787004341,
            women_b: 153.757,
        }
    }

    pub fn constants_for_gender(&self, gender: Gender) -> SinclairConstants {
        match gender {
            Gender::M => SinclairConstants {
                a: self.men_a,
                b: self.men_b,
            },
            Gender::F => SinclairConstants {
                a: self.women_a,
                b: self.women_b,
            },
        }
    }
}

impl Default for SinclairCoefficients {
    fn default() -> Self {
        Self::cycle_2020()
    }
}

impl CoefficientTable for SinclairCoefficients {
    fn sinclair_factor(&self, gender: Gender, body_weight: Decimal) -> Option<f64> {
        let bw = body_weight.to_f64().filter(|bw| *bw > 0.0)?;
        let constants = self.constants_for_gender(gender);
        if bw >= constants.b {
            return Some(1.0);
        }
        let log = (bw / constants.b).log10();
        Some(10f64.powf(constants.a * log * log))
    }
}

/// Sinclair total, 0.0 when the lifter has no total or no usable body weight.
pub fn sinclair_score(lifter: &Lifter, table: &dyn CoefficientTable) -> f64 {
    let total = lifter.total();
    if total <= 0 {
        return 0.0;
    }
    lifter
        .body_weight
        .and_then(|bw| table.sinclair_factor(lifter.gender, bw))
        .map(|factor| f64::from(total) * factor)
        .unwrap_or(0.0)
}

/// Sinclair total multiplied by the masters age factor (1.0 when unknown).
pub fn smm_score(lifter: &Lifter, table: &dyn CoefficientTable, competition_year: i32) -> f64 {
    let age_factor = lifter
        .age(competition_year)
        .and_then(|age| table.age_factor(age))
        .unwrap_or(1.0);
    sinclair_score(lifter, table) * age_factor
}
