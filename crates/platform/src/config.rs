use anyhow::{Context, Result};
use competition::RankingConfig;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::decisions::DecisionTiming;

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PlatformConfig {
    #[validate(range(max = 10000, message = "Show delay must be at most 10 s"))]
    pub decision_show_delay_ms: u64,

    #[validate(range(min = 1, max = 60000, message = "Reversal delay must be between 1 ms and 60 s"))]
    pub decision_reversal_delay_ms: u64,

    #[validate(range(min = 1, max = 60000, message = "Reset delay must be between 1 ms and 60 s"))]
    pub decision_reset_delay_ms: u64,

    #[validate(range(min = 10, max = 1000, message = "Clock tick must be between 10 and 1000 ms"))]
    pub clock_tick_ms: u64,

    #[validate(range(min = 100, max = 5000, message = "PA clock tick must be between 100 and 5000 ms"))]
    pub pa_clock_tick_ms: u64,

    pub use_registration_category: bool,
    pub use_category_sinclair: bool,
    pub masters: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            decision_show_delay_ms: 1_000,
            decision_reversal_delay_ms: 3_000,
            decision_reset_delay_ms: 5_000,
            clock_tick_ms: 100,
            pa_clock_tick_ms: 1_000,
            use_registration_category: false,
            use_category_sinclair: false,
            masters: false,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

impl PlatformConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            decision_show_delay_ms: parse_or(
                &lookup,
                "DECISION_SHOW_DELAY_MS",
                defaults.decision_show_delay_ms,
            )?,
            decision_reversal_delay_ms: parse_or(
                &lookup,
                "DECISION_REVERSAL_DELAY_MS",
                defaults.decision_reversal_delay_ms,
            )?,
            decision_reset_delay_ms: parse_or(
                &lookup,
                "DECISION_RESET_DELAY_MS",
                defaults.decision_reset_delay_ms,
            )?,
            clock_tick_ms: parse_or(&lookup, "CLOCK_TICK_MS", defaults.clock_tick_ms)?,
            pa_clock_tick_ms: parse_or(&lookup, "PA_CLOCK_TICK_MS", defaults.pa_clock_tick_ms)?,
            use_registration_category: parse_or(
                &lookup,
                "USE_REGISTRATION_CATEGORY",
                defaults.use_registration_category,
            )?,
            use_category_sinclair: parse_or(
                &lookup,
                "USE_CATEGORY_SINCLAIR",
                defaults.use_category_sinclair,
            )?,
            masters: parse_or(&lookup, "MASTERS", defaults.masters)?,
        };
        config
            .validate()
            .context("Invalid platform configuration")?;
        Ok(config)
    }

    pub fn decision_timing(&self) -> DecisionTiming {
        DecisionTiming {
            show_delay: Duration::from_millis(self.decision_show_delay_ms),
            reversal_delay: Duration::from_millis(self.decision_reversal_delay_ms),
            reset_delay: Duration::from_millis(self.decision_reset_delay_ms),
        }
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms)
    }

    pub fn pa_clock_tick(&self) -> Duration {
        Duration::from_millis(self.pa_clock_tick_ms)
    }

    pub fn ranking_config(&self, competition_year: Option<i32>) -> RankingConfig {
        RankingConfig {
            use_registration_category: self.use_registration_category,
            use_category_sinclair: self.use_category_sinclair,
            masters: self.masters,
            competition_year,
        }
    }
}
