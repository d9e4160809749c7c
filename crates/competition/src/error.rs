use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompetitionError {
    #[error("Attempt {0} does not exist (expected 1-6)")]
    NoSuchAttempt(usize),

    #[error("Attempt {0} has already been lifted")]
    AlreadyLifted(usize),

    #[error("Invalid weight {weight} for attempt {attempt}")]
    InvalidWeight { attempt: usize, weight: i32 },

    #[error("Attempt {0} already has two changes")]
    TooManyChanges(usize),

    #[error("No weight requested for attempt {0}")]
    NoRequestedWeight(usize),

    #[error("All six attempts are done")]
    Finished,

    #[error("Failed to parse roster: {0}")]
    Roster(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CompetitionError>;

impl CompetitionError {
    /// Errors caused by the caller editing an attempt that can no longer change.
    pub fn is_attempt_locked(&self) -> bool {
        matches!(
            self,
            CompetitionError::AlreadyLifted(_)
                | CompetitionError::TooManyChanges(_)
                | CompetitionError::Finished
        )
    }
}
