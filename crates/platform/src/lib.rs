pub mod clock;
pub mod config;
pub mod decisions;
pub mod error;
pub mod fanout;
pub mod field_of_play;
pub mod signal;
pub mod timer;

pub use clock::{ClockKind, ClockListener, ClockReason, ClockStatus, CompetitionClock};
pub use config::PlatformConfig;
pub use decisions::{
    ControllerKind, Decision, DecisionController, DecisionListener, DecisionPhase, DecisionSet,
    DecisionTiming,
};
pub use error::{PlatformError, Result};
pub use field_of_play::{AttemptOutcome, FieldOfPlay};
pub use signal::{BuzzerListener, LoggingSignalSink, NullSignalSink, SignalSink, TimeWarning};
