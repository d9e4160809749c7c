pub mod coefficients;
pub mod error;
pub mod models;
pub mod ordering;
pub mod roster;

pub use error::{CompetitionError, Result};
pub use models::{Lifter, LifterRef, RankingType};
pub use ordering::RankingConfig;
