//! Repository contract and implementations.
//!
//! The repository is an external collaborator: the scheduler only needs
//! the [`Repository`] trait. [`MemoryRepository`] ships for tests and
//! single-process deployments; durable stores implement the same trait.

mod memory;

pub use memory::MemoryRepository;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use alsvin_hal::Device;
use alsvin_ir::Circuit;

use crate::error::SchedResult;
use crate::job::{Job, JobId, JobStatus, UserProfile};

/// A stored circuit with catalog bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitRecord {
    /// Circuit identifier.
    pub id: String,
    /// The circuit definition.
    pub circuit: Circuit,
    /// How many jobs have referenced this circuit.
    pub usage_count: u64,
    /// Template circuits are exempt from retention cleanup.
    pub is_template: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Query filter for stored jobs.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Match by status name (`pending`, `queued`, `running`, ...).
    pub status: Option<Vec<&'static str>>,
    /// Match by assigned device.
    pub device_id: Option<String>,
    /// Match by submitting user.
    pub user_id: Option<String>,
    /// Only terminal jobs completed before this instant.
    pub completed_before: Option<DateTime<Utc>>,
}

impl JobFilter {
    /// Jobs currently executing.
    pub fn running() -> Self {
        Self {
            status: Some(vec!["running"]),
            ..Self::default()
        }
    }

    /// Terminal jobs older than a cutoff.
    pub fn terminal_older_than(cutoff: DateTime<Utc>) -> Self {
        Self {
            status: Some(vec!["completed", "failed", "cancelled", "timeout"]),
            completed_before: Some(cutoff),
            ..Self::default()
        }
    }

    /// Whether a job matches this filter.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(statuses) = &self.status {
            if !statuses.contains(&job.status().name()) {
                return false;
            }
        }
        if let Some(device_id) = &self.device_id {
            if job.device_id.as_ref() != Some(device_id) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &job.user.id != user_id {
                return false;
            }
        }
        if let Some(cutoff) = self.completed_before {
            match job.completed_at {
                Some(completed) if completed < cutoff => {}
                _ => return false,
            }
        }
        true
    }
}

/// Retention windows for cleanup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Terminal jobs older than this are deleted.
    pub job_retention_days: i64,
    /// Unused non-template circuits older than this are deleted.
    pub circuit_retention_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            job_retention_days: 30,
            circuit_retention_days: 90,
        }
    }
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub jobs_deleted: usize,
    pub circuits_deleted: usize,
}

/// One write in a transaction batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Job(Job),
    Circuit(CircuitRecord),
    Device(Device),
    User(UserProfile),
}

/// Persistence contract consumed by the scheduler.
#[async_trait]
pub trait Repository: Send + Sync {
    // Jobs
    async fn save_job(&self, job: &Job) -> SchedResult<()>;
    async fn load_job(&self, id: &JobId) -> SchedResult<Option<Job>>;
    async fn find_jobs(&self, filter: &JobFilter) -> SchedResult<Vec<Job>>;
    async fn delete_job(&self, id: &JobId) -> SchedResult<()>;

    // Circuits
    async fn save_circuit(&self, record: &CircuitRecord) -> SchedResult<()>;
    async fn load_circuit(&self, id: &str) -> SchedResult<Option<CircuitRecord>>;
    async fn delete_circuit(&self, id: &str) -> SchedResult<()>;

    // Devices
    async fn save_device(&self, device: &Device) -> SchedResult<()>;
    async fn load_device(&self, id: &str) -> SchedResult<Option<Device>>;
    async fn delete_device(&self, id: &str) -> SchedResult<()>;

    // Users
    async fn save_user(&self, user: &UserProfile) -> SchedResult<()>;
    async fn load_user(&self, id: &str) -> SchedResult<Option<UserProfile>>;
    async fn delete_user(&self, id: &str) -> SchedResult<()>;

    /// Apply a batch of writes atomically.
    async fn transaction(&self, ops: Vec<WriteOp>) -> SchedResult<()>;

    /// Delete old terminal jobs and stale unused circuits.
    async fn cleanup(&self, policy: &RetentionPolicy) -> SchedResult<CleanupReport>;
}

/// The cutoff instant for a retention window.
pub(crate) fn retention_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}
