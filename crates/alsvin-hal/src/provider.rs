//! The uniform provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use alsvin_ir::Circuit;

use crate::device::Device;
use crate::error::HalResult;
use crate::result::ExecutionResult;

/// Provider-side job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderJobId(pub String);

impl ProviderJobId {
    /// Create a new provider job id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProviderJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized job status vocabulary; every adapter maps vendor states here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderJobStatus {
    /// Accepted by the vendor, not yet queued.
    Submitted,
    /// Waiting in the vendor queue.
    Queued,
    /// Executing.
    Running,
    /// Finished successfully; results are available.
    Completed,
    /// Cancelled before completion.
    Cancelled,
    /// Failed with a vendor message.
    Failed(String),
}

impl ProviderJobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderJobStatus::Completed
                | ProviderJobStatus::Cancelled
                | ProviderJobStatus::Failed(_)
        )
    }
}

impl std::fmt::Display for ProviderJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderJobStatus::Submitted => write!(f, "submitted"),
            ProviderJobStatus::Queued => write!(f, "queued"),
            ProviderJobStatus::Running => write!(f, "running"),
            ProviderJobStatus::Completed => write!(f, "completed"),
            ProviderJobStatus::Cancelled => write!(f, "cancelled"),
            ProviderJobStatus::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Account or user identifier, if the vendor reports one.
    pub user: Option<String>,
    /// Remaining credits, if reported during authentication.
    pub credits_remaining: Option<f64>,
}

/// Everything an adapter needs to submit one job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// The circuit to execute.
    pub circuit: Circuit,
    /// Target device id within the provider.
    pub device_id: String,
    /// Number of shots.
    pub shots: u32,
}

/// Receipt returned by a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// The vendor's job id.
    pub provider_job_id: ProviderJobId,
    /// Status immediately after submission.
    pub status: ProviderJobStatus,
    /// Estimated queue time, if the vendor reports one.
    pub estimated_queue_ms: Option<u64>,
}

/// Uniform contract over heterogeneous quantum providers.
///
/// Implementations must be safe for concurrent reads (`devices`,
/// `job_status`, `job_results`); the scheduler guarantees writes to the
/// same provider job id never race.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider id (e.g. `ionq`).
    fn id(&self) -> &str;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Verify credentials against the vendor.
    async fn authenticate(&self) -> HalResult<AuthInfo>;

    /// Fetch the device catalog.
    async fn devices(&self) -> HalResult<Vec<Device>>;

    /// Submit a job for execution.
    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt>;

    /// Poll the normalized status of a job.
    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus>;

    /// Fetch the results of a completed job.
    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult>;

    /// Request cancellation; `true` when the vendor accepted it.
    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool>;

    /// Remaining account credits.
    async fn credits_remaining(&self) -> HalResult<f64>;
}
