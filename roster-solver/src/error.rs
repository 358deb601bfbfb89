use shared::time::TimeParseError;
use thiserror::Error;

// Roster Solver Error
#[derive(Debug, Error)]
pub enum SolverServiceError {
    /// Rejected before any model construction happens.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure inside the builder, driver, or projector.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SolverServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<TimeParseError> for SolverServiceError {
    fn from(err: TimeParseError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
