//! Lifting order, start lists and results rankings.
//!
//! Every operation takes the lifters as a plain slice and sorts it in place;
//! rank fields are written back onto the lifters.

mod display;
mod lifting;
mod lots;
mod ranks;
mod results;
pub mod rules;

pub use display::{display_order, registration_order, start_order, weigh_in_order};
pub use lifting::{current_lifter, lifting_order, lifting_order_cascade};
pub use lots::{assign_lot_numbers, assign_start_numbers, draw_lots};
pub use ranks::{assign_category_ranks, assign_ranks, team_points_for_rank};
pub use results::{ScoreContext, results_order, results_order_cascade};

use serde::{Deserialize, Serialize};

/// Competition-wide ranking switches, passed explicitly into every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Group results by registration category instead of the weigh-in category.
    pub use_registration_category: bool,
    /// Rank Sinclair and custom scores inside each category rather than across them.
    pub use_category_sinclair: bool,
    /// Masters competition: results grouped by gender and age group first.
    pub masters: bool,
    /// Year used to compute ages for masters age factors.
    pub competition_year: Option<i32>,
}
