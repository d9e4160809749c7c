//! Single-owner cancellable timer for deferred controller actions.
//!
//! Scheduled work runs on tokio tasks. Every callback receives the [`Ticket`]
//! that was current when it was scheduled; the owner checks it with
//! [`CancellableTimer::is_current`] while holding its own lock, so once
//! [`CancellableTimer::cancel`] returns no earlier callback can take effect.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::debug;

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct CancellableTimer {
    label: &'static str,
    epoch: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl CancellableTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            epoch: 0,
            tasks: Vec::new(),
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.epoch
    }

    /// Number of scheduled tasks that have not completed yet.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    fn spawn(&mut self, task: impl std::future::Future<Output = ()> + Send + 'static) -> Result<()> {
        let handle = Handle::try_current().map_err(|e| {
            PlatformError::Scheduler(format!("{} timer has no runtime: {}", self.label, e))
        })?;
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(handle.spawn(task));
        Ok(())
    }

    /// Delivers `message` to `dispatch` at `deadline`.
    pub fn schedule_at<M, F>(&mut self, deadline: Instant, message: M, dispatch: F) -> Result<Ticket>
    where
        M: Send + 'static,
        F: FnOnce(Ticket, M) + Send + 'static,
    {
        let ticket = Ticket(self.epoch);
        self.spawn(async move {
            sleep_until(deadline).await;
            dispatch(ticket, message);
        })?;
        Ok(ticket)
    }

    /// Calls `on_tick` every `period` starting at `first` until it returns false.
    pub fn schedule_every<F>(&mut self, first: Instant, period: Duration, mut on_tick: F) -> Result<Ticket>
    where
        F: FnMut(Ticket) -> bool + Send + 'static,
    {
        let ticket = Ticket(self.epoch);
        self.spawn(async move {
            let mut interval = interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !on_tick(ticket) {
                    break;
                }
            }
        })?;
        Ok(ticket)
    }

    /// Cancels everything scheduled so far. Idempotent.
    pub fn cancel(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if !self.tasks.is_empty() {
            debug!(timer = self.label, tasks = self.tasks.len(), "cancelling scheduled tasks");
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
