//! Error handling for the scheduler.

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur during scheduler operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SchedError {
    /// Job failed validation before scheduling.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// Job not found in the scheduler.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Device not known to the scheduler.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// No device satisfied eligibility and constraints.
    #[error("No eligible device: {0}")]
    NoEligibleDevice(String),

    /// An operation is not valid for the job's current state.
    #[error("Invalid job state: expected {expected}, found {found}")]
    InvalidJobState { expected: String, found: String },

    /// A terminal job cannot change state.
    #[error("Job {0} is in a terminal state")]
    TerminalState(String),

    /// Results requested before the job completed.
    #[error("Job {0} has no results yet")]
    ResultsNotReady(String),

    /// Provider-layer failure.
    #[error("Provider error: {0}")]
    Provider(#[from] alsvin_hal::HalError),

    /// Circuit preparation failed.
    #[error("Compilation error: {0}")]
    Compile(#[from] alsvin_compile::CompileError),

    /// Repository write or read failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The scheduler is shutting down.
    #[error("Scheduler is shut down")]
    ShutDown,

    /// Internal scheduler error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::InvalidJob("shots out of range".to_string());
        assert_eq!(err.to_string(), "Invalid job: shots out of range");

        let err = SchedError::InvalidJobState {
            expected: "Queued".to_string(),
            found: "Running".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid job state: expected Queued, found Running"
        );
    }
}
