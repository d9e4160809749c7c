use serde::{Deserialize, Serialize};

/// The two phases of a weightlifting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftType {
    Snatch,
    CleanJerk,
}

impl LiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snatch => "Snatch",
            Self::CleanJerk => "Clean & Jerk",
        }
    }
}

/// One attempt as recorded on the lifter card.
///
/// The actual weight is signed: positive is a good lift, negative a failed
/// lift of the absolute weight, and zero a forfeited attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSlot {
    #[serde(default)]
    pub declaration: Option<i32>,
    #[serde(default)]
    pub change1: Option<i32>,
    #[serde(default)]
    pub change2: Option<i32>,
    #[serde(default)]
    pub actual: Option<i32>,
}

impl AttemptSlot {
    /// The most recent weight asked for: change2, else change1, else the declaration.
    pub fn requested_weight(&self) -> Option<i32> {
        self.change2.or(self.change1).or(self.declaration)
    }

    pub fn is_done(&self) -> bool {
        self.actual.is_some()
    }

    pub fn is_good(&self) -> bool {
        self.actual.is_some_and(|w| w > 0)
    }

    /// Absolute weight that was on the bar, 0 when not attempted.
    pub fn attempted_weight(&self) -> i32 {
        self.actual.map(i32::abs).unwrap_or(0)
    }

    /// Weight to declare for the following attempt when the lifter asks for nothing.
    pub fn automatic_progression(&self) -> Option<i32> {
        match self.actual {
            Some(w) if w > 0 => Some(w + 1),
            Some(w) if w < 0 => Some(-w),
            _ => None,
        }
    }
}
