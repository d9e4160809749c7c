//! Attempt countdown clock.
//!
//! Remaining time is measured against the instant the clock last started, so
//! tick jitter never accumulates. Warnings fire once per run; thresholds
//! already behind the starting time are marked as fired up front.

use competition::LifterRef;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::fanout::PrivilegedFanout;
use crate::timer::CancellableTimer;

pub const INITIAL_WARNING_MS: i64 = 90_000;
pub const FINAL_WARNING_MS: i64 = 30_000;
pub const STANDARD_ALLOWANCE_MS: i64 = 60_000;
pub const EXTENDED_ALLOWANCE_MS: i64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockKind {
    /// Field-of-play clock driving the buzzer.
    Primary,
    /// Coarse clock for the announcer's public-address screen.
    PublicAddress,
}

impl ClockKind {
    pub fn default_tick(&self) -> Duration {
        match self {
            ClockKind::Primary => Duration::from_millis(100),
            ClockKind::PublicAddress => Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockStatus {
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockReason {
    Announcer,
    Jury,
    TechnicalController,
    AttemptCompleted,
    OwnerChanged,
    SessionEnded,
}

/// Receives clock events. Every method defaults to doing nothing.
pub trait ClockListener: Send + Sync {
    fn start(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn normal_tick(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn initial_warning(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn final_warning(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn no_time_left(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn pause(&self, _remaining_ms: u64, _reason: ClockReason) -> anyhow::Result<()> {
        Ok(())
    }

    fn stop(&self, _remaining_ms: u64, _reason: ClockReason) -> anyhow::Result<()> {
        Ok(())
    }

    fn force_time_remaining(&self, _remaining_ms: u64, _reason: ClockReason) -> anyhow::Result<()> {
        Ok(())
    }
}

struct ClockInner {
    kind: ClockKind,
    tick: Duration,
    status: ClockStatus,
    owner: Option<LifterRef>,
    /// Remaining time as of `started_at`, or as of the last pause when idle.
    remaining_ms: i64,
    started_at: Option<Instant>,
    initial_warned: bool,
    final_warned: bool,
    time_over: bool,
    /// Set once the current owner's time has actually run.
    ran_for_owner: bool,
    last_completed: Option<Uuid>,
    interrupted: HashSet<Uuid>,
    listeners: PrivilegedFanout<dyn ClockListener>,
    timer: CancellableTimer,
}

fn clamp_ms(ms: i64) -> u64 {
    ms.max(0) as u64
}

impl ClockInner {
    fn remaining_now(&self) -> i64 {
        match self.started_at {
            Some(started) => self.remaining_ms - started.elapsed().as_millis() as i64,
            None => self.remaining_ms,
        }
    }

    fn mark_passed_thresholds(&mut self, remaining: i64) {
        self.initial_warned = remaining <= INITIAL_WARNING_MS;
        self.final_warned = remaining <= FINAL_WARNING_MS;
        self.time_over = remaining <= 0;
    }

    fn allowance_for(&self, lifter: &LifterRef) -> i64 {
        if self.last_completed == Some(lifter.id) || self.interrupted.contains(&lifter.id) {
            EXTENDED_ALLOWANCE_MS
        } else {
            STANDARD_ALLOWANCE_MS
        }
    }

    /// Freezes the countdown at its current value.
    fn halt(&mut self) -> i64 {
        self.timer.cancel();
        let remaining = self.remaining_now();
        self.remaining_ms = remaining.max(0);
        self.started_at = None;
        remaining
    }

    /// Returns false once the clock has stopped ticking.
    fn on_tick(&mut self) -> bool {
        let remaining = self.remaining_now();

        if self.time_over {
            self.halt();
            self.status = ClockStatus::Paused;
            debug!(kind = ?self.kind, "clock expired");
            return false;
        }

        let shown = clamp_ms(remaining);
        self.listeners
            .emit("normal_tick", |l| l.normal_tick(shown));

        if !self.initial_warned && remaining <= INITIAL_WARNING_MS {
            self.initial_warned = true;
            self.listeners
                .emit("initial_warning", |l| l.initial_warning(shown));
        }
        if !self.final_warned && remaining <= FINAL_WARNING_MS {
            self.final_warned = true;
            self.listeners
                .emit("final_warning", |l| l.final_warning(shown));
        }
        if !self.time_over && remaining <= 0 {
            self.time_over = true;
            info!(kind = ?self.kind, owner = ?self.owner.as_ref().map(|o| &o.name), "time over");
            self.listeners.emit("no_time_left", |l| l.no_time_left(0));
        }
        true
    }
}

/// Cloneable handle to one clock; all mutators go through a single lock.
///
/// Listeners are called with the lock held and must not call back into the
/// clock that notified them.
#[derive(Clone)]
pub struct CompetitionClock {
    inner: Arc<Mutex<ClockInner>>,
}

impl CompetitionClock {
    pub fn new(kind: ClockKind) -> Self {
        Self::with_tick(kind, kind.default_tick())
    }

    pub fn with_tick(kind: ClockKind, tick: Duration) -> Self {
        let inner = ClockInner {
            kind,
            tick,
            status: ClockStatus::Stopped,
            owner: None,
            remaining_ms: STANDARD_ALLOWANCE_MS,
            started_at: None,
            initial_warned: false,
            final_warned: false,
            time_over: false,
            ran_for_owner: false,
            last_completed: None,
            interrupted: HashSet::new(),
            listeners: PrivilegedFanout::new(),
            timer: CancellableTimer::new(match kind {
                ClockKind::Primary => "clock",
                ClockKind::PublicAddress => "pa-clock",
            }),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn kind(&self) -> ClockKind {
        self.inner.lock().kind
    }

    pub fn status(&self) -> ClockStatus {
        self.inner.lock().status
    }

    pub fn owner(&self) -> Option<LifterRef> {
        self.inner.lock().owner.clone()
    }

    pub fn time_remaining(&self) -> u64 {
        clamp_ms(self.inner.lock().remaining_now())
    }

    /// Time the lifter gets when the clock is handed to them.
    pub fn allowance_for(&self, lifter: &LifterRef) -> u64 {
        clamp_ms(self.inner.lock().allowance_for(lifter))
    }

    pub fn set_primary_display(&self, listener: Option<Arc<dyn ClockListener>>) {
        self.inner.lock().listeners.set_primary(listener);
    }

    pub fn set_buzzer(&self, listener: Option<Arc<dyn ClockListener>>) {
        self.inner.lock().listeners.set_buzzer(listener);
    }

    pub fn add_listener(&self, listener: Arc<dyn ClockListener>) -> bool {
        self.inner.lock().listeners.register(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ClockListener>) -> bool {
        self.inner.lock().listeners.unregister(listener)
    }

    /// Hands the clock to a lifter. The same lifter on the same attempt keeps
    /// the time left; anyone else gets a fresh allowance.
    pub fn set_owner(&self, lifter: LifterRef) {
        let mut inner = self.inner.lock();
        if inner.owner.as_ref() == Some(&lifter) {
            debug!(owner = %lifter.name, "clock owner unchanged");
            return;
        }

        inner.halt();
        if let Some(previous) = inner.owner.take()
            && inner.ran_for_owner
        {
            inner.interrupted.insert(previous.id);
        }

        let allowance = inner.allowance_for(&lifter);
        info!(kind = ?inner.kind, owner = %lifter.name, allowance_ms = allowance, "clock owner changed");
        inner.owner = Some(lifter);
        inner.ran_for_owner = false;
        inner.remaining_ms = allowance;
        inner.mark_passed_thresholds(allowance);
        inner.status = ClockStatus::Paused;
        inner.listeners.emit("force_time_remaining", |l| {
            l.force_time_remaining(clamp_ms(allowance), ClockReason::OwnerChanged)
        });
    }

    pub fn start(&self) {
        let weak: Weak<Mutex<ClockInner>> = Arc::downgrade(&self.inner);
        let mut inner = self.inner.lock();
        if inner.owner.is_none() {
            warn!(kind = ?inner.kind, "start ignored: clock has no owner");
            return;
        }
        if inner.status == ClockStatus::Running {
            debug!(kind = ?inner.kind, "clock already running");
            return;
        }

        let remaining = inner.remaining_ms;
        inner.mark_passed_thresholds(remaining);
        let now = Instant::now();
        let tick = inner.tick;
        let scheduled = inner.timer.schedule_every(now + tick, tick, move |ticket| {
            let Some(clock) = weak.upgrade() else {
                return false;
            };
            let mut inner = clock.lock();
            if !inner.timer.is_current(ticket) {
                return false;
            }
            inner.on_tick()
        });
        if let Err(e) = scheduled {
            error!(kind = ?inner.kind, error = %e, "clock could not start");
            return;
        }

        inner.started_at = Some(now);
        inner.status = ClockStatus::Running;
        inner.ran_for_owner = true;
        debug!(kind = ?inner.kind, remaining_ms = remaining, "clock started");
        inner
            .listeners
            .emit("start", |l| l.start(clamp_ms(remaining)));
    }

    pub fn pause(&self, reason: ClockReason) {
        let mut inner = self.inner.lock();
        if inner.owner.is_none() {
            warn!(kind = ?inner.kind, ?reason, "pause ignored: clock has no owner");
            return;
        }
        if inner.status != ClockStatus::Running {
            debug!(kind = ?inner.kind, ?reason, "clock not running");
            return;
        }
        let remaining = clamp_ms(inner.halt());
        inner.status = ClockStatus::Paused;
        debug!(kind = ?inner.kind, ?reason, remaining_ms = remaining, "clock paused");
        inner.listeners.emit("pause", |l| l.pause(remaining, reason));
    }

    /// Stops the clock and releases its owner.
    pub fn stop(&self, reason: ClockReason) {
        let mut inner = self.inner.lock();
        if inner.status == ClockStatus::Stopped && inner.owner.is_none() {
            return;
        }
        let remaining = clamp_ms(inner.halt());
        if let Some(owner) = inner.owner.take() {
            if reason == ClockReason::AttemptCompleted {
                inner.interrupted.remove(&owner.id);
                inner.last_completed = Some(owner.id);
            } else if inner.ran_for_owner {
                inner.interrupted.insert(owner.id);
            }
        }
        inner.ran_for_owner = false;
        inner.status = ClockStatus::Stopped;
        debug!(kind = ?inner.kind, ?reason, remaining_ms = remaining, "clock stopped");
        inner.listeners.emit("stop", |l| l.stop(remaining, reason));
    }

    /// The owner's attempt has been decided.
    pub fn attempt_completed(&self) {
        self.stop(ClockReason::AttemptCompleted);
    }

    /// Overrides the time left, whatever state the clock is in.
    pub fn force_time_remaining(&self, ms: u64, reason: ClockReason) {
        let mut inner = self.inner.lock();
        let ms = ms as i64;
        inner.remaining_ms = ms;
        inner.mark_passed_thresholds(ms);
        if inner.status == ClockStatus::Running {
            inner.started_at = Some(Instant::now());
        }
        info!(kind = ?inner.kind, ?reason, remaining_ms = ms, "time remaining forced");
        inner.listeners.emit("force_time_remaining", |l| {
            l.force_time_remaining(clamp_ms(ms), reason)
        });
    }
}
