//! Referee and jury decision aggregation.
//!
//! Votes for one attempt move the controller through
//! Idle -> Collecting -> AllGiven -> Locked and back to Idle. SHOW, LOCK and
//! RESET are timed from the instant the third vote arrived; later reversals
//! inside the window do not move them.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::clock::CompetitionClock;
use crate::fanout::Fanout;
use crate::signal::SignalSink;
use crate::timer::CancellableTimer;

pub const REFEREE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub accepted: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionSet {
    pub slots: [Option<Decision>; REFEREE_COUNT],
    pub decisions_made: usize,
    pub pros: usize,
    pub cons: usize,
    pub down_emitted: bool,
    pub shown: bool,
    pub all_decisions_made_at: Option<DateTime<Utc>>,
}

impl DecisionSet {
    fn record(&mut self, index: usize, accepted: bool) {
        self.slots[index] = Some(Decision {
            accepted,
            at: Utc::now(),
        });
        self.pros = self.slots.iter().flatten().filter(|d| d.accepted).count();
        self.cons = self.slots.iter().flatten().filter(|d| !d.accepted).count();
        self.decisions_made = self.pros + self.cons;
    }

    /// Two of three referees agree.
    pub fn has_majority(&self) -> bool {
        self.pros >= 2 || self.cons >= 2
    }

    /// `Some(true)` for a good lift once a majority exists.
    pub fn is_good_lift(&self) -> Option<bool> {
        if self.pros >= 2 {
            Some(true)
        } else if self.cons >= 2 {
            Some(false)
        } else {
            None
        }
    }

    /// Two votes in and they disagree.
    pub fn is_split(&self) -> bool {
        self.decisions_made == 2 && self.pros == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionPhase {
    Idle,
    Collecting,
    AllGiven,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    /// Field-of-play referees: down signal, stops the clock, blocked between lifts.
    Referee,
    /// Jury panel: decision shown at once, never blocked.
    Jury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionTiming {
    pub show_delay: Duration,
    pub reversal_delay: Duration,
    pub reset_delay: Duration,
}

impl Default for DecisionTiming {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(1000),
            reversal_delay: Duration::from_millis(3000),
            reset_delay: Duration::from_millis(5000),
        }
    }
}

/// Receives decision events. Every method defaults to doing nothing.
pub trait DecisionListener: Send + Sync {
    fn on_update(&self, _decisions: &DecisionSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_down(&self, _decisions: &DecisionSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_waiting(&self, _decisions: &DecisionSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_show(&self, _decisions: &DecisionSet) -> anyhow::Result<()> {
        Ok(())
    }

    /// Decisions are locked; no more reversals.
    fn on_block(&self, _decisions: &DecisionSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_reset(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Deferred {
    Show,
    Lock,
    Reset,
}

struct DecisionInner {
    kind: ControllerKind,
    timing: DecisionTiming,
    phase: DecisionPhase,
    decisions: DecisionSet,
    lift_in_progress: bool,
    clock: Option<CompetitionClock>,
    signal: Arc<dyn SignalSink>,
    listeners: Fanout<dyn DecisionListener>,
    timer: CancellableTimer,
}

impl DecisionInner {
    fn is_blocked(&self) -> bool {
        match self.kind {
            ControllerKind::Referee => !self.lift_in_progress,
            ControllerKind::Jury => false,
        }
    }

    fn clear(&mut self) {
        self.timer.cancel();
        self.decisions = DecisionSet::default();
        self.phase = DecisionPhase::Idle;
    }

    fn reset(&mut self) {
        self.clear();
        self.listeners.emit("reset", |l| l.on_reset());
    }

    fn emit_show(&mut self) {
        if self.decisions.shown {
            return;
        }
        self.decisions.shown = true;
        info!(kind = ?self.kind, good = ?self.decisions.is_good_lift(), "decision shown");
        let decisions = &self.decisions;
        self.listeners.emit("show", |l| l.on_show(decisions));
    }

    fn down(&mut self) {
        self.decisions.down_emitted = true;
        debug!(kind = ?self.kind, pros = self.decisions.pros, cons = self.decisions.cons, "down");
        if self.kind == ControllerKind::Referee {
            if let Err(e) = self.signal.down_signal() {
                error!(error = %e, "down signal failed");
            }
            if let Some(clock) = &self.clock {
                clock.attempt_completed();
            }
        }
        let decisions = &self.decisions;
        self.listeners.emit("down", |l| l.on_down(decisions));
    }

    fn on_deferred(&mut self, action: Deferred) {
        debug!(kind = ?self.kind, ?action, "deferred decision action");
        match action {
            Deferred::Show => self.emit_show(),
            Deferred::Lock => {
                self.phase = DecisionPhase::Locked;
                let decisions = &self.decisions;
                self.listeners.emit("block", |l| l.on_block(decisions));
            }
            Deferred::Reset => {
                self.lift_in_progress = false;
                self.reset();
            }
        }
    }

    fn schedule(&mut self, weak: &Weak<Mutex<DecisionInner>>, from: Instant) -> crate::Result<()> {
        let mut plan = Vec::with_capacity(3);
        if self.kind == ControllerKind::Referee {
            plan.push((self.timing.show_delay, Deferred::Show));
        }
        plan.push((self.timing.reversal_delay, Deferred::Lock));
        plan.push((
            self.timing.reversal_delay + self.timing.reset_delay,
            Deferred::Reset,
        ));

        for (delay, action) in plan {
            let weak = weak.clone();
            self.timer.schedule_at(from + delay, action, move |ticket, action| {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                let mut inner = controller.lock();
                if inner.timer.is_current(ticket) {
                    inner.on_deferred(action);
                }
            })?;
        }
        Ok(())
    }
}

/// Cloneable handle to one decision controller; all mutators go through a
/// single lock.
///
/// Listeners are called with the lock held and must not call back into the
/// controller that notified them.
#[derive(Clone)]
pub struct DecisionController {
    inner: Arc<Mutex<DecisionInner>>,
}

impl DecisionController {
    fn new(
        kind: ControllerKind,
        timing: DecisionTiming,
        clock: Option<CompetitionClock>,
        signal: Arc<dyn SignalSink>,
    ) -> Self {
        let inner = DecisionInner {
            kind,
            timing,
            phase: DecisionPhase::Idle,
            decisions: DecisionSet::default(),
            lift_in_progress: false,
            clock,
            signal,
            listeners: Fanout::new(),
            timer: CancellableTimer::new(match kind {
                ControllerKind::Referee => "referee-decisions",
                ControllerKind::Jury => "jury-decisions",
            }),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Referee controller. A majority sounds `signal` and completes the
    /// attempt on `clock`, if one is attached.
    pub fn referee(
        timing: DecisionTiming,
        clock: Option<CompetitionClock>,
        signal: Arc<dyn SignalSink>,
    ) -> Self {
        Self::new(ControllerKind::Referee, timing, clock, signal)
    }

    pub fn jury(timing: DecisionTiming) -> Self {
        Self::new(
            ControllerKind::Jury,
            timing,
            None,
            Arc::new(crate::signal::NullSignalSink),
        )
    }

    pub fn kind(&self) -> ControllerKind {
        self.inner.lock().kind
    }

    pub fn add_listener(&self, listener: Arc<dyn DecisionListener>) -> bool {
        self.inner.lock().listeners.register(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn DecisionListener>) -> bool {
        self.inner.lock().listeners.unregister(listener)
    }

    pub fn decisions(&self) -> DecisionSet {
        self.inner.lock().decisions.clone()
    }

    pub fn phase(&self) -> DecisionPhase {
        self.inner.lock().phase
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.lock().is_blocked()
    }

    /// Records one vote. Stray input is logged and dropped.
    pub fn decision_made(&self, referee_index: usize, accepted: bool) {
        let weak = Arc::downgrade(&self.inner);
        let mut inner = self.inner.lock();

        if referee_index >= REFEREE_COUNT {
            warn!(kind = ?inner.kind, referee_index, "vote ignored: no such referee");
            return;
        }
        if inner.phase == DecisionPhase::Locked {
            warn!(kind = ?inner.kind, referee_index, "vote ignored: decisions locked");
            return;
        }
        if inner.is_blocked() {
            warn!(kind = ?inner.kind, referee_index, "vote ignored: no lift in progress");
            return;
        }

        inner.decisions.record(referee_index, accepted);
        let made = inner.decisions.decisions_made;
        debug!(kind = ?inner.kind, referee_index, accepted, made, "vote recorded");

        let first_full_set = made == REFEREE_COUNT && inner.decisions.all_decisions_made_at.is_none();
        inner.phase = if made == REFEREE_COUNT {
            DecisionPhase::AllGiven
        } else {
            DecisionPhase::Collecting
        };

        {
            let decisions = &inner.decisions;
            inner.listeners.emit("update", |l| l.on_update(decisions));
        }

        if made == REFEREE_COUNT && !first_full_set {
            return;
        }

        if inner.decisions.has_majority() && !inner.decisions.down_emitted {
            inner.down();
        } else if inner.decisions.is_split() {
            let decisions = &inner.decisions;
            inner.listeners.emit("waiting", |l| l.on_waiting(decisions));
        }

        if first_full_set {
            inner.decisions.all_decisions_made_at = Some(Utc::now());
            if inner.kind == ControllerKind::Jury {
                inner.emit_show();
            }
            if let Err(e) = inner.schedule(&weak, Instant::now()) {
                error!(kind = ?inner.kind, error = %e, "could not schedule decision display, resetting");
                inner.reset();
            }
        }
    }

    /// Clears the votes and tells listeners.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Readies the controller for a new lift, dropping anything still
    /// pending from the previous one.
    pub fn start_attempt(&self) {
        let mut inner = self.inner.lock();
        if inner.phase == DecisionPhase::Idle && inner.decisions.decisions_made == 0 {
            inner.clear();
        } else {
            inner.reset();
        }
        inner.lift_in_progress = true;
        debug!(kind = ?inner.kind, "attempt started");
    }

    pub fn end_session(&self) {
        let mut inner = self.inner.lock();
        inner.lift_in_progress = false;
        inner.reset();
        info!(kind = ?inner.kind, "session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockKind, ClockStatus};
    use competition::Lifter;
    use competition::models::Gender;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<&'static str>>,
    }

    impl Recorder {
        fn count(&self, name: &str) -> usize {
            self.events.lock().iter().filter(|e| **e == name).count()
        }

        fn take(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl DecisionListener for Recorder {
        fn on_update(&self, _d: &DecisionSet) -> anyhow::Result<()> {
            self.events.lock().push("update");
            Ok(())
        }
        fn on_down(&self, _d: &DecisionSet) -> anyhow::Result<()> {
            self.events.lock().push("down");
            Ok(())
        }
        fn on_waiting(&self, _d: &DecisionSet) -> anyhow::Result<()> {
            self.events.lock().push("waiting");
            Ok(())
        }
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

    #[derive(Default)]
    struct CountingSink {
        downs: Mutex<usize>,
    }

    impl SignalSink for CountingSink {
        fn down_signal(&self) -> anyhow::Result<()> {
            *self.downs.lock() += 1;
            Ok(())
        }

        fn time_warning(&self, _warning: crate::signal::TimeWarning) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn referee() -> (DecisionController, Arc<Recorder>) {
        let controller = DecisionController::referee(
            DecisionTiming::default(),
            None,
            Arc::new(crate::signal::NullSignalSink),
        );
        let recorder = Arc::new(Recorder::default());
        controller.add_listener(recorder.clone());
        controller.start_attempt();
        recorder.take();
        (controller, recorder)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_good_votes() {
        let (controller, recorder) = referee();
        controller.decision_made(0, true);
        controller.decision_made(1, true);
        controller.decision_made(2, true);
        assert_eq!(recorder.take(), vec!["update", "update", "down", "update"]);
        assert_eq!(controller.phase(), DecisionPhase::AllGiven);

        sleep_ms(999).await;
        assert_eq!(recorder.count("show"), 0);
        sleep_ms(2).await;
        assert_eq!(recorder.take(), vec!["show"]);

        sleep_ms(2_000).await;
        assert_eq!(recorder.take(), vec!["block"]);
        assert_eq!(controller.phase(), DecisionPhase::Locked);

        controller.decision_made(1, false);
        assert_eq!(controller.decisions().decisions_made, 3);
        assert_eq!(controller.decisions().pros, 3);

        sleep_ms(5_000).await;
        assert_eq!(recorder.take(), vec!["reset"]);
        assert_eq!(controller.phase(), DecisionPhase::Idle);
        assert!(controller.is_blocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_then_majority() {
        let (controller, recorder) = referee();
        controller.decision_made(0, true);
        controller.decision_made(1, false);
        assert_eq!(recorder.take(), vec!["update", "update", "waiting"]);
        assert_eq!(controller.decisions().is_good_lift(), None);

        controller.decision_made(2, false);
        assert_eq!(recorder.take(), vec!["update", "down"]);
        assert_eq!(controller.decisions().is_good_lift(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reversal_does_not_reschedule() {
        let (controller, recorder) = referee();
        controller.decision_made(0, false);
        controller.decision_made(1, false);
        controller.decision_made(2, true);
        recorder.take();

        sleep_ms(600).await;
        controller.decision_made(1, true);
        assert_eq!(recorder.take(), vec!["update"]);
        assert_eq!(controller.decisions().is_good_lift(), Some(true));

        sleep_ms(401).await;
        assert_eq!(recorder.take(), vec!["show"]);
        sleep_ms(10_000).await;
        assert_eq!(recorder.take(), vec!["block", "reset"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stray_votes_ignored() {
        let (controller, recorder) = referee();
        controller.decision_made(3, true);
        controller.decision_made(usize::MAX, false);
        assert!(recorder.take().is_empty());
        assert_eq!(controller.decisions().decisions_made, 0);
        assert_eq!(controller.phase(), DecisionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_attempt_cancels_stale_reset() {
        let (controller, recorder) = referee();
        for i in 0..3 {
            controller.decision_made(i, true);
        }
        sleep_ms(4_000).await;
        controller.start_attempt();
        controller.decision_made(0, true);
        recorder.take();

        sleep_ms(10_000).await;
        assert!(recorder.take().is_empty());
        assert_eq!(controller.decisions().decisions_made, 1);
        assert_eq!(controller.phase(), DecisionPhase::Collecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_attempt_resets_only_stale_votes() {
        let (controller, recorder) = referee();
        controller.start_attempt();
        assert!(recorder.take().is_empty());

        controller.decision_made(0, false);
        controller.start_attempt();
        assert_eq!(recorder.take(), vec!["update", "reset"]);
        assert_eq!(controller.decisions().decisions_made, 0);
        assert!(!controller.is_blocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_referee_blocked_between_lifts() {
        let controller = DecisionController::referee(
            DecisionTiming::default(),
            None,
            Arc::new(crate::signal::NullSignalSink),
        );
        assert!(controller.is_blocked());
        controller.decision_made(0, true);
        assert_eq!(controller.decisions().decisions_made, 0);

        controller.start_attempt();
        assert!(!controller.is_blocked());
        controller.end_session();
        assert!(controller.is_blocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jury_shows_immediately() {
        let controller = DecisionController::jury(DecisionTiming::default());
        let recorder = Arc::new(Recorder::default());
        controller.add_listener(recorder.clone());
        assert!(!controller.is_blocked());

        controller.decision_made(0, true);
        controller.decision_made(1, false);
        controller.decision_made(2, true);
        assert_eq!(
            recorder.take(),
            vec!["update", "update", "waiting", "update", "down", "show"]
        );
        sleep_ms(8_001).await;
        assert_eq!(recorder.take(), vec!["block", "reset"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_stops_clock_and_signals() {
        let clock = CompetitionClock::new(ClockKind::Primary);
        clock.set_owner((&Lifter::new("Ana", "Silva", Gender::F)).into());
        clock.start();
        let sink = Arc::new(CountingSink::default());
        let controller =
            DecisionController::referee(DecisionTiming::default(), Some(clock.clone()), sink.clone());
        controller.start_attempt();

        sleep_ms(5_000).await;
        controller.decision_made(2, true);
        assert_eq!(clock.status(), ClockStatus::Running);
        controller.decision_made(0, true);
        controller.decision_made(1, false);

        assert_eq!(clock.status(), ClockStatus::Stopped);
        assert!(clock.owner().is_none());
        assert_eq!(*sink.downs.lock(), 1);
    }

    #[test]
    fn test_scheduling_failure_falls_back_to_reset() {
        let controller = DecisionController::jury(DecisionTiming::default());
        let recorder = Arc::new(Recorder::default());
        controller.add_listener(recorder.clone());
        for i in 0..3 {
            controller.decision_made(i, true);
        }
        assert_eq!(recorder.take().last(), Some(&"reset"));
        assert_eq!(controller.phase(), DecisionPhase::Idle);
        assert_eq!(controller.decisions().decisions_made, 0);
    }
}
