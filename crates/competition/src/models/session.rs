use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A competition session ("group"): the lifters that weigh in and lift together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionSession {
    pub name: String,
    pub weigh_in_time: Option<NaiveDateTime>,
    pub platform: Option<String>,
}

impl CompetitionSession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weigh_in_time: None,
            platform: None,
        }
    }
}
