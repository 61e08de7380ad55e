//! Deadlines and transient-failure retries for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{HalError, HalResult};

/// Per-operation deadlines for external calls.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub authenticate: Duration,
    pub devices: Duration,
    pub submit: Duration,
    pub status: Duration,
    pub results: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            authenticate: Duration::from_secs(60),
            devices: Duration::from_secs(30),
            submit: Duration::from_secs(30),
            status: Duration::from_secs(10),
            results: Duration::from_secs(30),
        }
    }
}

/// Run a provider call under a deadline.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, call: F) -> HalResult<T>
where
    F: Future<Output = HalResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(HalError::Timeout(operation.to_string())),
    }
}

/// Back-off delays between retry attempts.
const BACKOFF_SECS: [u64; 3] = [1, 2, 4];

/// Retry a call on transient errors with exponential back-off.
///
/// Non-transient errors surface immediately; transient ones are retried up
/// to three times with 1 s / 2 s / 4 s delays.
pub async fn retry_transient<T, F, Fut>(operation: &str, mut call: F) -> HalResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HalResult<T>>,
{
    for (attempt, delay_secs) in BACKOFF_SECS.iter().enumerate() {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() => {
                warn!(operation, attempt, %error, "transient failure, backing off");
                tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
            }
            Err(error) => return Err(error),
        }
    }
    // Final attempt, transient or not.
    call().await
}
