//! Error types for the provider abstraction layer.

use thiserror::Error;

/// Errors that can occur in provider operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Credential rejection; the provider becomes unavailable and is not
    /// retried automatically.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Provider is not reachable or not initialized.
    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    /// Job submission was rejected.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// The provider no longer knows the job id.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Results requested before the job reached a terminal state.
    #[error("Job not yet complete: {0}")]
    NotYetComplete(String),

    /// The provider reported an exhausted quota.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Circuit rejected by the provider or its wire format.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Shot count outside the device limits.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// No device satisfied the selection constraints.
    #[error("No eligible device: {0}")]
    NoEligibleDevice(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a 5xx.
    #[error("Provider service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller-supplied deadline elapsed.
    #[error("Deadline exceeded during {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic provider-side error.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl HalError {
    /// Whether the error is worth retrying with back-off.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HalError::Network(_) | HalError::ServiceUnavailable(_) | HalError::Timeout(_)
        )
    }
}

/// Result type for provider operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HalError::Timeout("poll".into()).is_transient());
        assert!(HalError::ServiceUnavailable("502".into()).is_transient());
        assert!(!HalError::AuthFailure("bad token".into()).is_transient());
        assert!(!HalError::QuotaExceeded("0 credits".into()).is_transient());
    }
}
