//! In-memory repository.

use chrono::Utc;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use alsvin_hal::Device;
use async_trait::async_trait;

use crate::error::SchedResult;
use crate::job::{Job, JobId, UserProfile};

use super::{
    CircuitRecord, CleanupReport, JobFilter, Repository, RetentionPolicy, WriteOp,
    retention_cutoff,
};

#[derive(Default)]
struct Tables {
    jobs: FxHashMap<JobId, Job>,
    circuits: FxHashMap<String, CircuitRecord>,
    devices: FxHashMap<String, Device>,
    users: FxHashMap<String, UserProfile>,
}

/// Repository keeping everything in process memory.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub async fn job_count(&self) -> usize {
        self.tables.read().await.jobs.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn save_job(&self, job: &Job) -> SchedResult<()> {
        self.tables
            .write()
            .await
            .jobs
            .insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn load_job(&self, id: &JobId) -> SchedResult<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(id).cloned())
    }

    async fn find_jobs(&self, filter: &JobFilter) -> SchedResult<Vec<Job>> {
        Ok(self
            .tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect())
    }

    async fn delete_job(&self, id: &JobId) -> SchedResult<()> {
        self.tables.write().await.jobs.remove(id);
        Ok(())
    }

    async fn save_circuit(&self, record: &CircuitRecord) -> SchedResult<()> {
        self.tables
            .write()
            .await
            .circuits
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn load_circuit(&self, id: &str) -> SchedResult<Option<CircuitRecord>> {
        Ok(self.tables.read().await.circuits.get(id).cloned())
    }

    async fn delete_circuit(&self, id: &str) -> SchedResult<()> {
        self.tables.write().await.circuits.remove(id);
        Ok(())
    }

    async fn save_device(&self, device: &Device) -> SchedResult<()> {
        self.tables
            .write()
            .await
            .devices
            .insert(device.id.clone(), device.clone());
        Ok(())
    }

    async fn load_device(&self, id: &str) -> SchedResult<Option<Device>> {
        Ok(self.tables.read().await.devices.get(id).cloned())
    }

    async fn delete_device(&self, id: &str) -> SchedResult<()> {
        self.tables.write().await.devices.remove(id);
        Ok(())
    }

    async fn save_user(&self, user: &UserProfile) -> SchedResult<()> {
        self.tables
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn load_user(&self, id: &str) -> SchedResult<Option<UserProfile>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn delete_user(&self, id: &str) -> SchedResult<()> {
        self.tables.write().await.users.remove(id);
        Ok(())
    }

    async fn transaction(&self, ops: Vec<WriteOp>) -> SchedResult<()> {
        // One write guard for the whole batch makes it atomic.
        let mut tables = self.tables.write().await;
        for op in ops {
            match op {
                WriteOp::Job(job) => {
                    tables.jobs.insert(job.id.clone(), job);
                }
                WriteOp::Circuit(record) => {
                    tables.circuits.insert(record.id.clone(), record);
                }
                WriteOp::Device(device) => {
                    tables.devices.insert(device.id.clone(), device);
                }
                WriteOp::User(user) => {
                    tables.users.insert(user.id.clone(), user);
                }
            }
        }
        Ok(())
    }

    async fn cleanup(&self, policy: &RetentionPolicy) -> SchedResult<CleanupReport> {
        let now = Utc::now();
        let job_cutoff = retention_cutoff(now, policy.job_retention_days);
        let circuit_cutoff = retention_cutoff(now, policy.circuit_retention_days);

        let mut tables = self.tables.write().await;

        let stale_jobs: Vec<JobId> = tables
            .jobs
            .values()
            .filter(|job| {
                job.is_terminal()
                    && job.completed_at.is_some_and(|completed| completed < job_cutoff)
            })
            .map(|job| job.id.clone())
            .collect();
        for id in &stale_jobs {
            tables.jobs.remove(id);
        }

        let stale_circuits: Vec<String> = tables
            .circuits
            .values()
            .filter(|record| {
                record.usage_count == 0
                    && !record.is_template
                    && record.created_at < circuit_cutoff
            })
            .map(|record| record.id.clone())
            .collect();
        for id in &stale_circuits {
            tables.circuits.remove(id);
        }

        Ok(CleanupReport {
            jobs_deleted: stale_jobs.len(),
            circuits_deleted: stale_circuits.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use alsvin_ir::Circuit;
    use chrono::Duration;

    fn job() -> Job {
        Job::new(Circuit::bell().unwrap(), UserProfile::new("alice"), 100)
    }

    #[tokio::test]
    async fn test_job_roundtrip() {
        let repo = MemoryRepository::new();
        let job = job();
        let id = job.id.clone();

        repo.save_job(&job).await.unwrap();
        let loaded = repo.load_job(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.shots, 100);

        repo.delete_job(&id).await.unwrap();
        assert!(repo.load_job(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_jobs_filtered() {
        let repo = MemoryRepository::new();
        let mut running = job();
        running.transition(JobStatus::Queued).unwrap();
        running.transition(JobStatus::Running).unwrap();
        repo.save_job(&running).await.unwrap();
        repo.save_job(&job()).await.unwrap();

        let found = repo.find_jobs(&JobFilter::running()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, running.id);
    }

    #[tokio::test]
    async fn test_transaction_applies_all() {
        let repo = MemoryRepository::new();
        let job = job();
        let user = UserProfile::new("bob");

        repo.transaction(vec![WriteOp::Job(job.clone()), WriteOp::User(user.clone())])
            .await
            .unwrap();

        assert!(repo.load_job(&job.id).await.unwrap().is_some());
        assert!(repo.load_user("bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_retention() {
        let repo = MemoryRepository::new();

        // Old completed job: deleted.
        let mut old = job();
        old.transition(JobStatus::Queued).unwrap();
        old.transition(JobStatus::Completed).unwrap();
        old.completed_at = Some(Utc::now() - Duration::days(45));
        repo.save_job(&old).await.unwrap();

        // Fresh completed job: kept.
        let mut fresh = job();
        fresh.transition(JobStatus::Queued).unwrap();
        fresh.transition(JobStatus::Completed).unwrap();
        repo.save_job(&fresh).await.unwrap();

        // Old running job: kept regardless of age.
        let mut running = job();
        running.transition(JobStatus::Queued).unwrap();
        running.transition(JobStatus::Running).unwrap();
        repo.save_job(&running).await.unwrap();

        // Stale unused circuit: deleted. Template: kept.
        let stale = CircuitRecord {
            id: "stale".to_string(),
            circuit: Circuit::bell().unwrap(),
            usage_count: 0,
            is_template: false,
            created_at: Utc::now() - Duration::days(120),
        };
        let template = CircuitRecord {
            id: "template".to_string(),
            is_template: true,
            ..stale.clone()
        };
        repo.save_circuit(&stale).await.unwrap();
        repo.save_circuit(&template).await.unwrap();

        let report = repo.cleanup(&RetentionPolicy::default()).await.unwrap();
        assert_eq!(report.jobs_deleted, 1);
        assert_eq!(report.circuits_deleted, 1);

        assert!(repo.load_job(&old.id).await.unwrap().is_none());
        assert!(repo.load_job(&fresh.id).await.unwrap().is_some());
        assert!(repo.load_job(&running.id).await.unwrap().is_some());
        assert!(repo.load_circuit("stale").await.unwrap().is_none());
        assert!(repo.load_circuit("template").await.unwrap().is_some());
    }
}
