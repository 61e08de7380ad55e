//! Job types and the job state machine.

use alsvin_hal::{ExecutionResult, ProviderJobId};
use alsvin_ir::Circuit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SchedError, SchedResult};
use crate::score::ScoreWeights;

/// Unique identifier for a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Create a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job priority classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Execution parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    /// Optimization level 1-3 applied during preparation.
    pub optimization_level: u8,
    /// Request per-shot memory from the vendor where supported.
    pub memory: bool,
    /// Seed for simulator runs.
    pub seed: Option<u64>,
    /// Cap on credits this job may consume.
    pub max_credits: Option<f64>,
}

impl Default for JobParameters {
    fn default() -> Self {
        Self {
            optimization_level: 2,
            memory: false,
            seed: None,
            max_credits: None,
        }
    }
}

/// The submitting user's scheduling profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: String,
    /// Budget used to normalize the cost score.
    pub max_cost_per_job: f64,
    /// Scoring weights; must sum to one.
    pub weights: ScoreWeights,
    /// Restrict scheduling to these providers.
    pub preferred_providers: Option<Vec<String>>,
    /// Hard cap on the job's estimated cost.
    pub max_cost: Option<f64>,
    /// Hard cap on the estimated queue wait.
    pub max_wait_ms: Option<u64>,
}

impl UserProfile {
    /// A profile with default budget and weights.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_cost_per_job: 10.0,
            weights: ScoreWeights::default(),
            preferred_providers: None,
            max_cost: None,
            max_wait_ms: None,
        }
    }
}

/// Job lifecycle states.
///
/// ```text
///   Pending ──→ Queued ──→ Running ──→ Completed
///                 │           ├──→ Failed(reason)
///                 │           ├──→ TimedOut
///                 └───────────┴──→ Cancelled
/// ```
///
/// Terminal states are permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet placed on a device queue.
    Pending,
    /// Waiting on a device queue.
    Queued,
    /// Submitted to the provider and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Failed with a reason.
    Failed(String),
    /// Cancelled by the user.
    Cancelled,
    /// The polling window elapsed without a terminal status.
    TimedOut,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::Failed(_)
                | JobStatus::Cancelled
                | JobStatus::TimedOut
        )
    }

    /// Short status name.
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed(_) => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::TimedOut => "timeout",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Failed(reason) => write!(f, "failed: {reason}"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Scheduling metadata attached once a decision is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingInfo {
    /// The weighted decision score.
    pub priority_score: f64,
    /// Estimated start time.
    pub estimated_start: DateTime<Utc>,
    /// Estimated completion time.
    pub estimated_completion: DateTime<Utc>,
    /// Position in the device queue at enqueue time.
    pub queue_position: usize,
}

/// A job owned by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// The circuit to execute; immutable from submission onward.
    pub circuit: Circuit,
    /// The submitting user.
    pub user: UserProfile,
    /// Number of shots.
    pub shots: u32,
    /// Priority class.
    pub priority: JobPriority,
    /// Execution parameters.
    pub parameters: JobParameters,
    /// Assigned device, set by scheduling.
    pub device_id: Option<String>,
    /// Provider owning the assigned device.
    pub provider_id: Option<String>,
    /// Vendor-side job id, set at dispatch.
    pub provider_job_id: Option<ProviderJobId>,
    /// Current lifecycle state.
    status: JobStatus,
    /// Scheduling metadata.
    pub scheduling: Option<SchedulingInfo>,
    /// Results of a completed run.
    pub result: Option<ExecutionResult>,
    /// Estimated monetary cost.
    pub cost: Option<f64>,
    /// Currency of `cost`.
    pub currency: Option<String>,
    /// Opaque details accompanying a failure.
    pub error_details: Option<serde_json::Value>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was accepted for scheduling.
    pub submitted_at: Option<DateTime<Utc>>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(circuit: Circuit, user: UserProfile, shots: u32) -> Self {
        Self {
            id: JobId::new(),
            circuit,
            user,
            shots,
            priority: JobPriority::default(),
            parameters: JobParameters::default(),
            device_id: None,
            provider_id: None,
            provider_job_id: None,
            status: JobStatus::Pending,
            scheduling: None,
            result: None,
            cost: None,
            currency: None,
            error_details: None,
            created_at: Utc::now(),
            submitted_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Set the priority class.
    #[must_use]
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the execution parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: JobParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Pin the job to a specific device.
    #[must_use]
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Current lifecycle state.
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance the state machine, stamping timestamps.
    ///
    /// Terminal states are permanent: transitioning out of one fails.
    pub fn transition(&mut self, next: JobStatus) -> SchedResult<()> {
        if self.status.is_terminal() {
            return Err(SchedError::TerminalState(self.id.to_string()));
        }
        let now = Utc::now();
        match &next {
            JobStatus::Queued if self.submitted_at.is_none() => {
                self.submitted_at = Some(now);
            }
            JobStatus::Running if self.started_at.is_none() => {
                self.started_at = Some(now);
            }
            _ => {}
        }
        if next.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.status = next;
        Ok(())
    }

    /// Execution time once both endpoints are stamped.
    pub fn execution_time_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some((completed - started).num_milliseconds()),
            _ => None,
        }
    }

    /// Queue time once both endpoints are stamped.
    pub fn queue_time_ms(&self) -> Option<i64> {
        match (self.submitted_at, self.started_at) {
            (Some(submitted), Some(started)) => Some((started - submitted).num_milliseconds()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(Circuit::bell().unwrap(), UserProfile::new("alice"), 1000)
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = job();
        assert_eq!(*job.status(), JobStatus::Pending);
        assert!(!job.is_terminal());
        assert!(job.submitted_at.is_none());
    }

    #[test]
    fn test_transition_stamps_timestamps() {
        let mut job = job();
        job.transition(JobStatus::Queued).unwrap();
        assert!(job.submitted_at.is_some());
        assert!(job.started_at.is_none());

        job.transition(JobStatus::Running).unwrap();
        assert!(job.started_at.is_some());

        job.transition(JobStatus::Completed).unwrap();
        assert!(job.completed_at.is_some());
        assert!(job.execution_time_ms().is_some());
        assert!(job.queue_time_ms().is_some());
    }

    #[test]
    fn test_terminal_is_permanent() {
        let mut job = job();
        job.transition(JobStatus::Queued).unwrap();
        job.transition(JobStatus::Cancelled).unwrap();

        let result = job.transition(JobStatus::Running);
        assert!(matches!(result, Err(SchedError::TerminalState(_))));
        assert_eq!(*job.status(), JobStatus::Cancelled);
    }

    #[test]
    fn test_timestamp_ordering() {
        let mut job = job();
        job.transition(JobStatus::Queued).unwrap();
        job.transition(JobStatus::Running).unwrap();
        job.transition(JobStatus::Completed).unwrap();

        let submitted = job.submitted_at.unwrap();
        let started = job.started_at.unwrap();
        let completed = job.completed_at.unwrap();
        assert!(submitted <= started);
        assert!(started <= completed);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(JobPriority::Urgent > JobPriority::High);
        assert!(JobPriority::High > JobPriority::Normal);
        assert!(JobPriority::Normal > JobPriority::Low);
    }
}
