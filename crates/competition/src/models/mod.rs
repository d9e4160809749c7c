mod age_group;
mod attempt;
mod category;
mod gender;
mod lifter;
mod ranking_type;
mod session;

pub use age_group::{AgeGroup, MASTERS_MIN_AGE};
pub use attempt::{AttemptSlot, LiftType};
pub use category::Category;
pub use gender::Gender;
pub use lifter::{ATTEMPTS_PER_LIFT, Lifter, LifterRef, TOTAL_ATTEMPTS};
pub use ranking_type::{PerRanking, RankingType};
pub use session::CompetitionSession;
