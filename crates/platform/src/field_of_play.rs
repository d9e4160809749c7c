//! One competition platform: lifting order, clocks and referee panel for a
//! single session.

use chrono::{Datelike, Utc};
use competition::coefficients::CoefficientTable;
use competition::models::RankingType;
use competition::ordering::{self, ScoreContext};
use competition::roster::Roster;
use competition::{Lifter, LifterRef, RankingConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clock::{ClockKind, ClockReason, CompetitionClock};
use crate::config::PlatformConfig;
use crate::decisions::{DecisionController, DecisionListener, DecisionSet};
use crate::error::{PlatformError, Result};
use crate::signal::{BuzzerListener, SignalSink};

/// What the platform waits for from the referee panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelEvent {
    Locked(bool),
    Reset,
}

/// Forwards the locked decision and the panel reset to the platform.
struct PanelListener {
    events: mpsc::UnboundedSender<PanelEvent>,
}

impl DecisionListener for PanelListener {
    fn on_block(&self, decisions: &DecisionSet) -> anyhow::Result<()> {
        match decisions.is_good_lift() {
            Some(good) => Ok(self.events.send(PanelEvent::Locked(good))?),
            None => anyhow::bail!("decision locked without a majority"),
        }
    }

    fn on_reset(&self) -> anyhow::Result<()> {
        Ok(self.events.send(PanelEvent::Reset)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcome {
    pub lifter: LifterRef,
    pub attempt: usize,
    pub weight: i32,
    pub good: bool,
}

pub struct FieldOfPlay {
    name: String,
    lifters: Vec<Lifter>,
    ranking: RankingConfig,
    clock: CompetitionClock,
    pa_clock: CompetitionClock,
    referees: DecisionController,
    panel: mpsc::UnboundedReceiver<PanelEvent>,
}

impl FieldOfPlay {
    pub fn new(roster: Roster, config: &PlatformConfig, signal: Arc<dyn SignalSink>) -> Self {
        let clock = CompetitionClock::with_tick(ClockKind::Primary, config.clock_tick());
        clock.set_buzzer(Some(Arc::new(BuzzerListener::new(signal.clone()))));
        let pa_clock = CompetitionClock::with_tick(ClockKind::PublicAddress, config.pa_clock_tick());

        let referees =
            DecisionController::referee(config.decision_timing(), Some(clock.clone()), signal);
        let (tx, rx) = mpsc::unbounded_channel();
        referees.add_listener(Arc::new(PanelListener { events: tx }));

        let year = roster.session.weigh_in_time.map(|t| t.year());

        Self {
            name: roster.session.name,
            lifters: roster.lifters,
            ranking: config.ranking_config(year),
            clock,
            pa_clock,
            referees,
            panel: rx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifters(&self) -> &[Lifter] {
        &self.lifters
    }

    pub fn clock(&self) -> &CompetitionClock {
        &self.clock
    }

    pub fn pa_clock(&self) -> &CompetitionClock {
        &self.pa_clock
    }

    pub fn referees(&self) -> &DecisionController {
        &self.referees
    }

    /// Re-sorts into lifting order and returns who is up.
    pub fn current_lifter(&mut self) -> Option<&Lifter> {
        ordering::lifting_order(&mut self.lifters);
        ordering::current_lifter(&self.lifters)
    }

    /// Hands both clocks to the lifter who is up and opens the referee panel.
    ///
    /// A lifter with no weight requested for their next attempt forfeits it
    /// and the next lifter is tried.
    pub fn call_lifter(&mut self) -> Option<LifterRef> {
        let lifter = loop {
            let id = self.current_lifter()?.id;
            let current = self.lifters.iter_mut().find(|l| l.id == id)?;
            if current.next_attempt_requested_weight().is_some_and(|w| w > 0) {
                break LifterRef::from(&*current);
            }
            let attempt = current.attempts_done() + 1;
            warn!(session = %self.name, lifter = %current.full_name(), attempt, "no weight requested, attempt forfeited");
            if let Err(e) = current.forfeit(Utc::now()) {
                warn!(session = %self.name, error = %e, "could not forfeit attempt");
                return None;
            }
        };
        self.clock.set_owner(lifter.clone());
        self.pa_clock.set_owner(lifter.clone());
        self.referees.start_attempt();
        while self.panel.try_recv().is_ok() {}
        info!(session = %self.name, lifter = %lifter.name, attempt = lifter.attempts_done + 1, "lifter called");
        Some(lifter)
    }

    pub fn start_clock(&self) {
        self.clock.start();
        self.pa_clock.start();
    }

    pub fn referee_vote(&self, referee_index: usize, accepted: bool) {
        self.referees.decision_made(referee_index, accepted);
    }

    /// Waits for the referees' decision to lock and records it on the lifter
    /// holding the clock. Reversals up to the lock are taken into account.
    pub async fn await_decision(&mut self, lifter: &LifterRef) -> Result<AttemptOutcome> {
        let good = match self.panel.recv().await {
            Some(PanelEvent::Locked(good)) => good,
            Some(PanelEvent::Reset) => {
                return Err(PlatformError::Session(
                    "referee panel reset before the decision was locked".to_string(),
                ));
            }
            None => return Err(PlatformError::Session("referee panel closed".to_string())),
        };
        self.pa_clock.attempt_completed();

        let current = self
            .lifters
            .iter_mut()
            .find(|l| l.id == lifter.id)
            .ok_or_else(|| PlatformError::Session(format!("{} is not in this session", lifter.name)))?;
        let attempt = current.attempts_done() + 1;
        let weight = current.record_lift(good, Utc::now())?.abs();
        info!(lifter = %lifter.name, attempt, weight, good, "attempt recorded");

        Ok(AttemptOutcome {
            lifter: lifter.clone(),
            attempt,
            weight,
            good,
        })
    }

    /// Waits until the referee panel clears the decision display.
    pub async fn await_panel_reset(&mut self) -> Result<()> {
        while let Some(event) = self.panel.recv().await {
            if event == PanelEvent::Reset {
                return Ok(());
            }
        }
        Err(PlatformError::Session("referee panel closed".to_string()))
    }

    /// Runs one attempt end to end with the given referee votes, returning
    /// once the panel has been reset for the next lifter.
    pub async fn run_attempt(&mut self, votes: [bool; 3], lift_time: Duration) -> Result<Option<AttemptOutcome>> {
        let Some(lifter) = self.call_lifter() else {
            return Ok(None);
        };
        self.start_clock();
        tokio::time::sleep(lift_time).await;
        for (index, accepted) in votes.into_iter().enumerate() {
            self.referee_vote(index, accepted);
        }
        let outcome = self.await_decision(&lifter).await?;
        self.await_panel_reset().await?;
        Ok(Some(outcome))
    }

    pub fn end_session(&mut self) {
        self.referees.end_session();
        self.clock.stop(ClockReason::SessionEnded);
        self.pa_clock.stop(ClockReason::SessionEnded);
        if self.lifters.iter().any(|l| !l.is_finished()) {
            warn!(session = %self.name, "session ended with lifters still to lift");
        }
        info!(session = %self.name, "session ended");
    }

    /// Assigns ranks for every ranking type and returns the lifters in total
    /// results order.
    pub fn results(&mut self, coefficients: Option<&dyn CoefficientTable>) -> &[Lifter] {
        let mut ctx = ScoreContext::new(&self.ranking);
        if let Some(table) = coefficients {
            ctx = ctx.with_coefficients(table);
        }
        for ranking_type in RankingType::ALL {
            ordering::assign_category_ranks(&mut self.lifters, ranking_type, ctx);
            ordering::assign_ranks(&mut self.lifters, ranking_type, ctx);
        }
        ordering::assign_ranks(&mut self.lifters, RankingType::Total, ctx);
        &self.lifters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockStatus;
    use crate::signal::NullSignalSink;
    use competition::models::{CompetitionSession, Gender};

    fn roster() -> Roster {
        let mut lifters = Vec::new();
        for (lot, (first, snatch)) in [("Ana", 62), ("Bea", 60)].into_iter().enumerate() {
            let mut l = Lifter::new(first, "Test", Gender::F);
            l.lot_number = Some(lot as u32 + 1);
            l.declare(1, snatch).unwrap();
            l.declare(4, snatch + 20).unwrap();
            lifters.push(l);
        }
        Roster {
            session: CompetitionSession::new("W1"),
            categories: Vec::new(),
            lifters,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lightest_request_lifts_first_and_is_recorded() {
        let mut fop = FieldOfPlay::new(roster(), &PlatformConfig::default(), Arc::new(NullSignalSink));
        let outcome = fop
            .run_attempt([true, true, false], Duration::from_secs(20))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.lifter.name, "TEST Bea");
        assert_eq!(outcome.weight, 60);
        assert!(outcome.good);
        assert_eq!(fop.clock().status(), ClockStatus::Stopped);

        // Bea is on 61, still below 62, so the same lifter is called again
        let next = fop.call_lifter().unwrap();
        assert_eq!(next.name, "TEST Bea");
        assert_eq!(fop.clock().time_remaining(), 120_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_whole_session_runs_to_completion() {
        let mut fop = FieldOfPlay::new(roster(), &PlatformConfig::default(), Arc::new(NullSignalSink));
        let mut attempts = 0;
        while let Some(outcome) = fop
            .run_attempt([false, true, true], Duration::from_secs(5))
            .await
            .unwrap()
        {
            assert!(outcome.good);
            attempts += 1;
        }
        fop.end_session();
        assert_eq!(attempts, 12);
        assert!(fop.lifters().iter().all(|l| l.is_finished()));

        let results = fop.results(None);
        assert_eq!(results[0].first_name, "Ana");
        assert_eq!(results[0].ranks.total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reversal_before_lock_is_recorded() {
        let mut fop = FieldOfPlay::new(roster(), &PlatformConfig::default(), Arc::new(NullSignalSink));
        let lifter = fop.call_lifter().unwrap();
        fop.start_clock();
        tokio::time::sleep(Duration::from_secs(10)).await;
        fop.referee_vote(0, false);
        fop.referee_vote(1, false);
        fop.referee_vote(2, true);

        // shown as no lift at 1 s, referee 2 changes their mind before the lock at 3 s
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(fop.referees().decisions().shown);
        fop.referee_vote(1, true);

        let outcome = fop.await_decision(&lifter).await.unwrap();
        assert!(outcome.good);
        assert_eq!(outcome.weight, 60);
        let bea = fop.lifters().iter().find(|l| l.id == lifter.id).unwrap();
        assert_eq!(bea.snatch[0].actual, Some(60));
    }

    #[derive(Default)]
    struct PanelLog {
        events: parking_lot::Mutex<Vec<&'static str>>,
    }

    impl DecisionListener for PanelLog {
        fn on_show(&self, _d: &DecisionSet) -> anyhow::Result<()> {
            self.events.lock().push("show");
            Ok(())
        }
        fn on_block(&self, _d: &DecisionSet) -> anyhow::Result<()> {
            self.events.lock().push("block");
            Ok(())
        }
        fn on_reset(&self) -> anyhow::Result<()> {
            self.events.lock().push("reset");
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_shows_locks_and_resets() {
        let mut fop = FieldOfPlay::new(roster(), &PlatformConfig::default(), Arc::new(NullSignalSink));
        let log = Arc::new(PanelLog::default());
        fop.referees().add_listener(log.clone());

        for _ in 0..2 {
            fop.run_attempt([true, true, true], Duration::from_secs(5))
                .await
                .unwrap()
                .unwrap();
        }
        assert_eq!(
            *log.events.lock(),
            vec!["show", "block", "reset", "show", "block", "reset"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_declaration_forfeits_instead_of_failing() {
        let mut roster = roster();
        let ana = roster.lifters.iter_mut().find(|l| l.first_name == "Ana").unwrap();
        ana.clean_jerk[0].declaration = None;

        let mut fop = FieldOfPlay::new(roster, &PlatformConfig::default(), Arc::new(NullSignalSink));
        let mut attempts = 0;
        while fop
            .run_attempt([true, true, true], Duration::from_secs(5))
            .await
            .unwrap()
            .is_some()
        {
            attempts += 1;
        }
        assert_eq!(attempts, 9);

        let ana = fop.lifters().iter().find(|l| l.first_name == "Ana").unwrap();
        assert!(ana.is_finished());
        assert_eq!(ana.clean_jerk.map(|s| s.actual), [Some(0); 3]);
        assert_eq!(ana.total(), 0);
    }
}
