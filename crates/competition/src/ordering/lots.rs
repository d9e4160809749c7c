use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::Lifter;

use super::display::start_order;

/// Gives every lifter without a lot number the next free number, in the
/// current slice order. Existing lot numbers are kept.
pub fn assign_lot_numbers(lifters: &mut [Lifter]) {
    let mut next = lifters.iter().filter_map(|l| l.lot_number).max().unwrap_or(0);
    for lifter in lifters.iter_mut().filter(|l| l.lot_number.is_none()) {
        next += 1;
        lifter.lot_number = Some(next);
    }
}

/// Random draw: lot numbers 1..=n shuffled over all lifters.
pub fn draw_lots<R: Rng + ?Sized>(lifters: &mut [Lifter], rng: &mut R) {
    let mut lots: Vec<u32> = (1..=lifters.len() as u32).collect();
    lots.shuffle(rng);
    for (lifter, lot) in lifters.iter_mut().zip(lots) {
        lifter.lot_number = Some(lot);
    }
    tracing::info!(lifters = lifters.len(), "lots drawn");
}

/// Sorts into start order and numbers lifters from 1 within each session.
pub fn assign_start_numbers(lifters: &mut [Lifter]) {
    start_order(lifters);
    let mut previous_session: Option<String> = None;
    let mut number = 0;
    for lifter in lifters.iter_mut() {
        let session = lifter.session.as_ref().map(|s| s.name.clone());
        if session != previous_session {
            number = 0;
            previous_session = session;
        }
        number += 1;
        lifter.start_number = Some(number);
    }
}
