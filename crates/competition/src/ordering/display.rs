use crate::models::Lifter;

use super::RankingConfig;
use super::rules::{self, Cascade};

/// Scoreboard order: category, then lot number. Masters competitions list age groups first.
pub fn display_order(lifters: &mut [Lifter], config: &RankingConfig) {
    Cascade::new()
        .then_if(config.masters, "age_group", rules::age_group)
        .then("category", rules::category(config))
        .then("lot_number", rules::lot_number)
        .then("last_name", rules::last_name)
        .then("first_name", rules::first_name)
        .sort(lifters);
}

/// Registration list: by session, then registration category and name.
pub fn registration_order(lifters: &mut [Lifter], config: &RankingConfig) {
    Cascade::new()
        .then("session_weigh_in", rules::session_weigh_in)
        .then("session_name", rules::session_name)
        .then_if(config.masters, "age_group", rules::age_group)
        .then("registration_category", rules::registration_category)
        .then("last_name", rules::last_name)
        .then("first_name", rules::first_name)
        .then("lot_number", rules::lot_number)
        .sort(lifters);
}

/// Weigh-in list: by session weigh-in time, then start number.
pub fn weigh_in_order(lifters: &mut [Lifter]) {
    Cascade::new()
        .then("session_weigh_in", rules::session_weigh_in)
        .then("session_name", rules::session_name)
        .then("start_number", rules::start_number)
        .then("lot_number", rules::lot_number)
        .then("last_name", rules::last_name)
        .then("first_name", rules::first_name)
        .sort(lifters);
}

/// Order in which start numbers are handed out within a session.
pub fn start_order(lifters: &mut [Lifter]) {
    Cascade::new()
        .then("session_name", rules::session_name)
        .then("registration_category", rules::registration_category)
        .then("lot_number", rules::lot_number)
        .then("last_name", rules::last_name)
        .then("first_name", rules::first_name)
        .sort(lifters);
}
