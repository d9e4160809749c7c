//! Audible and visual signalling devices, seen only through [`SignalSink`].

use std::sync::Arc;
use tracing::info;

use crate::clock::ClockListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWarning {
    Initial,
    Final,
    TimeOver,
}

/// Side-effecting output device: tone generator, scoreboard relay, ...
pub trait SignalSink: Send + Sync {
    /// Referees' majority reached: the lifter may put the bar down.
    fn down_signal(&self) -> anyhow::Result<()>;

    fn time_warning(&self, warning: TimeWarning) -> anyhow::Result<()>;
}

pub struct NullSignalSink;

impl SignalSink for NullSignalSink {
    fn down_signal(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn time_warning(&self, _warning: TimeWarning) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct LoggingSignalSink;

impl SignalSink for LoggingSignalSink {
    fn down_signal(&self) -> anyhow::Result<()> {
        info!("DOWN signal");
        Ok(())
    }

    fn time_warning(&self, warning: TimeWarning) -> anyhow::Result<()> {
        info!(?warning, "time warning tone");
        Ok(())
    }
}

/// Drives a [`SignalSink`] from clock events; installed as the master buzzer.
pub struct BuzzerListener {
    sink: Arc<dyn SignalSink>,
}

impl BuzzerListener {
    pub fn new(sink: Arc<dyn SignalSink>) -> Self {
        Self { sink }
    }
}

impl ClockListener for BuzzerListener {
    fn initial_warning(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        self.sink.time_warning(TimeWarning::Initial)
    }

    fn final_warning(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        self.sink.time_warning(TimeWarning::Final)
    }

    fn no_time_left(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        self.sink.time_warning(TimeWarning::TimeOver)
    }
}
