use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Competition error: {0}")]
    Competition(#[from] competition::CompetitionError),

    #[error("Session error: {0}")]
    Session(String),
}
