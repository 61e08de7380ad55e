//! The multi-criteria job scheduler.
//!
//! `submit` validates a job, scores every eligible device, and places the
//! job on the chosen device's priority queue. A periodic dispatcher is the
//! single point of provider submission: it drains queues onto free online
//! devices and spawns one polling task per running job. Pollers drive jobs
//! to a terminal state, persist the outcome, and release the device slot
//! exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use alsvin_hal::{
    CatalogEntry, Deadlines, DeviceStatus, ExecutionResult, HalError, JobRequest, Provider,
    ProviderJobId, ProviderJobStatus, ProviderSupervisor, retry_transient, with_deadline,
};

use crate::error::{SchedError, SchedResult};
use crate::events::{EventBus, JobCompleted, JobScheduled};
use crate::job::{Job, JobId, JobStatus};
use crate::metrics::{DecisionRecord, ExecutionRecord, MetricsCollector};
use crate::persistence::Repository;
use crate::predict::{CircuitClass, PerformancePredictor};
use crate::queue::DeviceQueue;
use crate::score::{self, DeviceScore, SchedulingDecision};

/// Validation bounds.
const MAX_SHOTS: u32 = 1_000_000;
const MAX_QUBITS: usize = 100;
const MAX_GATES: usize = 10_000;

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the dispatcher tick.
    pub dispatch_interval: Duration,
    /// Period of per-job polling.
    pub poll_interval: Duration,
    /// Hard cap on polling per job; exceeding it times the job out.
    pub poll_timeout: Duration,
    /// Assumed drain time per queued job for wait estimates.
    pub average_job_time_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_secs(5),
            poll_interval: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(3600),
            average_job_time_ms: 60_000,
        }
    }
}

/// Answer to a `status` query.
#[derive(Debug, Clone)]
pub struct JobStatusReport {
    pub state: JobStatus,
    pub device_id: Option<String>,
    pub provider_job_id: Option<ProviderJobId>,
    pub estimated_completion: Option<chrono::DateTime<Utc>>,
}

/// Answer to a `queue_status` query.
#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub queue_size: usize,
    pub running_job_id: Option<JobId>,
    pub estimated_wait_ms: u64,
}

/// Scheduler-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_queued: usize,
    pub running: usize,
    pub active_devices: usize,
}

/// Everything a poller needs to track one dispatched job.
struct PollTicket {
    job_id: JobId,
    device_id: String,
    provider_job_id: ProviderJobId,
    provider: Arc<dyn Provider>,
}

/// The scheduler.
pub struct Scheduler {
    supervisor: Arc<ProviderSupervisor>,
    repository: Arc<dyn Repository>,
    metrics: Arc<dyn MetricsCollector>,
    predictor: PerformancePredictor,
    events: EventBus,
    config: SchedulerConfig,
    deadlines: Deadlines,

    /// All jobs the scheduler has accepted, keyed by id.
    jobs: RwLock<FxHashMap<JobId, Job>>,
    /// Per-device priority queues.
    queues: Mutex<FxHashMap<String, DeviceQueue>>,
    /// Device slot occupancy: device id -> running job.
    running: Mutex<FxHashMap<String, JobId>>,
    /// Device snapshots captured at scoring time.
    snapshots: RwLock<FxHashMap<String, CatalogEntry>>,
    /// Jobs whose last persistence write failed; retried each tick.
    pending_writes: Mutex<FxHashSet<JobId>>,
    /// Poller handles, for shutdown. Never locked across an await.
    pollers: std::sync::Mutex<FxHashMap<JobId, tokio::task::JoinHandle<()>>>,
    /// Dispatcher handle, for shutdown.
    dispatcher: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler over a supervisor, repository, and metrics sink.
    pub fn new(
        supervisor: Arc<ProviderSupervisor>,
        repository: Arc<dyn Repository>,
        metrics: Arc<dyn MetricsCollector>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            supervisor,
            repository,
            predictor: PerformancePredictor::new(metrics.clone()),
            metrics,
            events: EventBus::new(),
            config,
            deadlines: Deadlines::default(),
            jobs: RwLock::new(FxHashMap::default()),
            queues: Mutex::new(FxHashMap::default()),
            running: Mutex::new(FxHashMap::default()),
            snapshots: RwLock::new(FxHashMap::default()),
            pending_writes: Mutex::new(FxHashSet::default()),
            pollers: std::sync::Mutex::new(FxHashMap::default()),
            dispatcher: std::sync::Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }

    /// The scheduler's event channels.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Start the periodic dispatcher.
    pub fn start(self: Arc<Self>) {
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(scheduler.config.dispatch_interval);
            loop {
                ticker.tick().await;
                let tickets = scheduler.dispatch_tick().await;
                for ticket in tickets {
                    scheduler.clone().spawn_poller(ticket);
                }
            }
        });
        *self.dispatcher.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(handle);
        info!("scheduler dispatcher started");
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate, score, and enqueue a job; returns the scheduling decision.
    pub async fn submit(&self, mut job: Job) -> SchedResult<SchedulingDecision> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(SchedError::ShutDown);
        }
        validate_job(&job)?;

        // Snapshot the cross-provider catalog and keep only devices that
        // can run the job at all.
        let catalog = self.supervisor.all_devices().await;
        {
            let mut snapshots = self.snapshots.write().await;
            for entry in &catalog {
                snapshots.insert(entry.device.id.clone(), entry.clone());
            }
        }

        let pinned = job.device_id.clone();
        let eligible: Vec<&CatalogEntry> = catalog
            .iter()
            .filter(|entry| match &pinned {
                Some(device_id) => &entry.device.id == device_id,
                None => true,
            })
            .filter(|entry| score::is_eligible(&job, entry))
            .collect();

        if eligible.is_empty() {
            return Err(SchedError::NoEligibleDevice(format!(
                "no device can run a {}-qubit circuit with gates {:?}",
                job.circuit.num_qubits(),
                job.circuit.gate_names()
            )));
        }

        // Score each candidate; devices whose queue is already at the
        // concurrency cap push back and are skipped.
        let queue_lens: FxHashMap<String, usize> = {
            let queues = self.queues.lock().await;
            queues
                .iter()
                .map(|(device, queue)| (device.clone(), queue.len()))
                .collect()
        };

        let mut ranked: Vec<DeviceScore> = vec![];
        for entry in eligible {
            let queue_len = queue_lens.get(&entry.device.id).copied().unwrap_or(0);
            if queue_len >= entry.device.max_concurrent_jobs as usize {
                debug!(device = %entry.device.id, "queue full, skipping device");
                continue;
            }
            let execution_ms = self.predictor.predict_ms(&job.circuit, &entry.device).await;
            ranked.push(score::score_device(
                &job,
                entry,
                queue_len,
                execution_ms,
                self.config.average_job_time_ms,
                Utc::now(),
            ));
        }

        if ranked.is_empty() {
            return Err(SchedError::NoEligibleDevice(
                "all eligible devices are at their concurrency limit".to_string(),
            ));
        }

        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        let chosen = score::select(&ranked, &job)
            .expect("ranked is non-empty")
            .clone();
        let decision = SchedulingDecision::from_score(&chosen, Utc::now());

        // Assign and enqueue.
        job.device_id = Some(chosen.device_id.clone());
        job.provider_id = Some(chosen.provider_id.clone());
        job.cost = Some(chosen.total_cost);
        job.currency = Some(chosen.currency.clone());
        job.transition(JobStatus::Queued)?;

        let job_id = job.id.clone();
        let submitted_at = job.submitted_at.expect("stamped by transition to Queued");

        let queue_position = {
            let mut queues = self.queues.lock().await;
            let queue = queues.entry(chosen.device_id.clone()).or_default();
            queue.push(job_id.clone(), chosen.priority, submitted_at);
            queue.len()
        };

        job.scheduling = Some(crate::job::SchedulingInfo {
            priority_score: chosen.priority,
            estimated_start: decision.estimated_start,
            estimated_completion: decision.estimated_completion,
            queue_position,
        });

        self.jobs.write().await.insert(job_id.clone(), job.clone());
        self.persist(&job).await;

        self.metrics
            .record_decision(DecisionRecord {
                job_id: job_id.clone(),
                device_id: chosen.device_id.clone(),
                priority_score: chosen.priority,
                timestamp: Utc::now(),
            })
            .await;
        self.events.publish_job_scheduled(JobScheduled {
            job_id: job_id.clone(),
            device_id: chosen.device_id.clone(),
            priority: chosen.priority,
        });

        info!(job = %job_id, device = %chosen.device_id, score = chosen.priority, "job queued");
        Ok(decision)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current state of a job.
    pub async fn status(&self, job_id: &JobId) -> SchedResult<JobStatusReport> {
        let jobs = self.jobs.read().await;
        let job = jobs
            .get(job_id)
            .ok_or_else(|| SchedError::JobNotFound(job_id.to_string()))?;
        Ok(JobStatusReport {
            state: job.status().clone(),
            device_id: job.device_id.clone(),
            provider_job_id: job.provider_job_id.clone(),
            estimated_completion: job.scheduling.as_ref().map(|s| s.estimated_completion),
        })
    }

    /// Results of a completed job.
    pub async fn results(&self, job_id: &JobId) -> SchedResult<ExecutionResult> {
        let jobs = self.jobs.read().await;
        let job = jobs
            .get(job_id)
            .ok_or_else(|| SchedError::JobNotFound(job_id.to_string()))?;
        if *job.status() != JobStatus::Completed {
            return Err(SchedError::ResultsNotReady(job_id.to_string()));
        }
        job.result
            .clone()
            .ok_or_else(|| SchedError::Internal(format!("completed job {job_id} has no result")))
    }

    /// Queue state of one device.
    pub async fn queue_status(&self, device_id: &str) -> SchedResult<QueueStatus> {
        let queue_size = self
            .queues
            .lock()
            .await
            .get(device_id)
            .map_or(0, DeviceQueue::len);
        let running_job_id = self.running.lock().await.get(device_id).cloned();
        Ok(QueueStatus {
            queue_size,
            running_job_id,
            estimated_wait_ms: queue_size as u64 * self.config.average_job_time_ms,
        })
    }

    /// Scheduler-wide counters.
    pub async fn stats(&self) -> SchedulerStats {
        let queues = self.queues.lock().await;
        let running = self.running.lock().await;
        let total_queued: usize = queues.values().map(DeviceQueue::len).sum();
        let active_devices = queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(device, _)| device)
            .chain(running.keys())
            .collect::<FxHashSet<_>>()
            .len();
        SchedulerStats {
            total_queued,
            running: running.len(),
            active_devices,
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Cancel a job.
    ///
    /// Queued jobs leave the queue synchronously; running jobs are
    /// cancelled at the provider and marked cancelled on success. Terminal
    /// jobs are unaffected and return `false`.
    pub async fn cancel(&self, job_id: &JobId) -> SchedResult<bool> {
        let (status, device_id, provider_id, provider_job_id) = {
            let jobs = self.jobs.read().await;
            let job = jobs
                .get(job_id)
                .ok_or_else(|| SchedError::JobNotFound(job_id.to_string()))?;
            (
                job.status().clone(),
                job.device_id.clone(),
                job.provider_id.clone(),
                job.provider_job_id.clone(),
            )
        };

        match status {
            JobStatus::Pending | JobStatus::Queued => {
                if let Some(device_id) = &device_id {
                    let mut queues = self.queues.lock().await;
                    if let Some(queue) = queues.get_mut(device_id) {
                        queue.remove(job_id);
                    }
                }
                self.finalize(job_id, JobStatus::Cancelled, None).await;
                Ok(true)
            }
            JobStatus::Running => {
                let provider = provider_id
                    .as_deref()
                    .and_then(|id| self.supervisor.provider(id))
                    .ok_or_else(|| {
                        SchedError::Internal(format!("running job {job_id} has no provider"))
                    })?;
                let provider_job_id = provider_job_id.ok_or_else(|| {
                    SchedError::Internal(format!("running job {job_id} has no provider job id"))
                })?;

                let accepted = provider.cancel(&provider_job_id).await?;
                if accepted {
                    // The poller observes the terminal state on its next
                    // tick and releases the device slot.
                    self.finalize(job_id, JobStatus::Cancelled, None).await;
                }
                Ok(accepted)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Dispatcher
    // =========================================================================

    /// One dispatcher pass: retry failed persistence writes, then submit
    /// the top queued job of every free online device. Returns the poll
    /// tickets of every newly running job.
    async fn dispatch_tick(&self) -> Vec<PollTicket> {
        self.retry_pending_writes().await;

        // Devices with work, skipping occupied slots.
        let candidates: Vec<String> = {
            let mut queues = self.queues.lock().await;
            let running = self.running.lock().await;
            let mut with_work = vec![];
            for (device_id, queue) in queues.iter_mut() {
                if !running.contains_key(device_id) && queue.peek().is_some() {
                    with_work.push(device_id.clone());
                }
            }
            with_work
        };

        let mut tickets = vec![];
        for device_id in candidates {
            let online = {
                let snapshots = self.snapshots.read().await;
                snapshots
                    .get(&device_id)
                    .is_some_and(|entry| entry.device.status == DeviceStatus::Online)
            };
            if !online {
                debug!(device = %device_id, "device not online, leaving queue untouched");
                continue;
            }

            // Claim the slot, then pop; cancellation may have removed the
            // job since the scan.
            let popped = {
                let mut queues = self.queues.lock().await;
                let mut running = self.running.lock().await;
                if running.contains_key(&device_id) {
                    continue;
                }
                match queues.get_mut(&device_id).and_then(DeviceQueue::pop) {
                    Some(job_id) => {
                        running.insert(device_id.clone(), job_id.clone());
                        Some(job_id)
                    }
                    None => None,
                }
            };
            let Some(job_id) = popped else { continue };

            if let Some(ticket) = self.dispatch_job(&device_id, &job_id).await {
                tickets.push(ticket);
            }
        }
        tickets
    }

    /// Submit one dequeued job through its provider adapter.
    async fn dispatch_job(&self, device_id: &str, job_id: &JobId) -> Option<PollTicket> {
        let (request, provider) = {
            let jobs = self.jobs.read().await;
            let Some(job) = jobs.get(job_id) else {
                self.release_slot(device_id, job_id).await;
                return None;
            };
            if *job.status() != JobStatus::Queued {
                // Cancelled (or otherwise finalized) after the pop.
                self.release_slot(device_id, job_id).await;
                return None;
            }
            let provider = job
                .provider_id
                .as_deref()
                .and_then(|id| self.supervisor.provider(id));
            (
                JobRequest {
                    circuit: job.circuit.clone(),
                    device_id: device_id.to_string(),
                    shots: job.shots,
                },
                provider,
            )
        };

        let Some(provider) = provider else {
            self.finalize(job_id, JobStatus::Failed("provider unavailable".into()), None)
                .await;
            self.release_slot(device_id, job_id).await;
            return None;
        };

        let deadline = self.deadlines.submit;
        let submitted = retry_transient("submit", || {
            with_deadline("submit", deadline, provider.submit(&request))
        })
        .await;

        match submitted {
            Ok(receipt) => {
                let started = {
                    let mut jobs = self.jobs.write().await;
                    match jobs.get_mut(job_id) {
                        Some(job) => {
                            job.provider_job_id = Some(receipt.provider_job_id.clone());
                            job.transition(JobStatus::Running).is_ok()
                        }
                        None => false,
                    }
                };
                if !started {
                    // Finalized concurrently; no poller to start.
                    warn!(job = %job_id, "job finalized during dispatch");
                    self.release_slot(device_id, job_id).await;
                    return None;
                }
                self.persist_by_id(job_id).await;
                Some(PollTicket {
                    job_id: job_id.clone(),
                    device_id: device_id.to_string(),
                    provider_job_id: receipt.provider_job_id,
                    provider,
                })
            }
            Err(err) => {
                warn!(job = %job_id, device = %device_id, %err, "submission failed");
                let reason = match &err {
                    HalError::QuotaExceeded(msg) => format!("quota exceeded: {msg}"),
                    other => other.to_string(),
                };
                self.finalize(job_id, JobStatus::Failed(reason), None).await;
                self.release_slot(device_id, job_id).await;
                None
            }
        }
    }

    // =========================================================================
    // Polling
    // =========================================================================

    fn spawn_poller(self: Arc<Self>, ticket: PollTicket) {
        let job_id = ticket.job_id.clone();
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let id = ticket.job_id.clone();
            scheduler.poll_job(ticket).await;
            scheduler
                .pollers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&id);
        });
        self.pollers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(job_id, handle);
    }

    /// Poll one running job until it terminates or the window elapses.
    async fn poll_job(&self, ticket: PollTicket) {
        let PollTicket {
            job_id,
            device_id,
            provider_job_id,
            provider,
        } = ticket;

        let started = tokio::time::Instant::now();
        let mut ticker = interval(self.config.poll_interval);

        loop {
            ticker.tick().await;

            // Cancellation (or any external finalization) ends the poll.
            let already_terminal = {
                let jobs = self.jobs.read().await;
                jobs.get(&job_id).is_none_or(Job::is_terminal)
            };
            if already_terminal {
                self.release_slot(&device_id, &job_id).await;
                return;
            }

            if started.elapsed() >= self.config.poll_timeout {
                warn!(job = %job_id, "polling window elapsed, timing out");
                if let Err(err) = provider.cancel(&provider_job_id).await {
                    debug!(job = %job_id, %err, "best-effort cancel after timeout failed");
                }
                self.finalize(&job_id, JobStatus::TimedOut, None).await;
                self.release_slot(&device_id, &job_id).await;
                return;
            }

            let deadline = self.deadlines.status;
            let status = retry_transient("job_status", || {
                with_deadline("job_status", deadline, provider.job_status(&provider_job_id))
            })
            .await;

            match status {
                Ok(ProviderJobStatus::Completed) => {
                    self.complete_job(&job_id, &device_id, &provider_job_id, &provider)
                        .await;
                    return;
                }
                Ok(ProviderJobStatus::Failed(reason)) => {
                    self.record_execution(&job_id, &device_id, false).await;
                    self.finalize(&job_id, JobStatus::Failed(reason), None).await;
                    self.release_slot(&device_id, &job_id).await;
                    return;
                }
                Ok(ProviderJobStatus::Cancelled) => {
                    self.finalize(&job_id, JobStatus::Cancelled, None).await;
                    self.release_slot(&device_id, &job_id).await;
                    return;
                }
                Ok(_) => {}
                Err(HalError::JobNotFound(msg)) => {
                    self.finalize(
                        &job_id,
                        JobStatus::Failed(format!("provider lost job: {msg}")),
                        None,
                    )
                    .await;
                    self.release_slot(&device_id, &job_id).await;
                    return;
                }
                Err(err) => {
                    // Retries are exhausted; the job's visible state is
                    // unchanged and the next tick tries again.
                    warn!(job = %job_id, %err, "status poll failed");
                }
            }
        }
    }

    /// Fetch results, record them, and finalize a completed job.
    async fn complete_job(
        &self,
        job_id: &JobId,
        device_id: &str,
        provider_job_id: &ProviderJobId,
        provider: &Arc<dyn Provider>,
    ) {
        let deadline = self.deadlines.results;
        let fetched = retry_transient("job_results", || {
            with_deadline(
                "job_results",
                deadline,
                provider.job_results(provider_job_id),
            )
        })
        .await;

        match fetched {
            Ok(result) => {
                if !result.is_consistent() {
                    warn!(
                        job = %job_id,
                        total = result.counts.total(),
                        shots = result.shots,
                        "result counts do not sum to shots"
                    );
                }
                self.record_execution(job_id, device_id, true).await;
                self.finalize(job_id, JobStatus::Completed, Some(result)).await;
            }
            Err(err) => {
                error!(job = %job_id, %err, "result fetch failed");
                self.record_execution(job_id, device_id, false).await;
                self.finalize(
                    job_id,
                    JobStatus::Failed(format!("result fetch failed: {err}")),
                    None,
                )
                .await;
            }
        }
        self.release_slot(device_id, job_id).await;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply a terminal transition, persist, and publish the completion.
    async fn finalize(&self, job_id: &JobId, status: JobStatus, result: Option<ExecutionResult>) {
        let (applied, device_id) = {
            let mut jobs = self.jobs.write().await;
            match jobs.get_mut(job_id) {
                Some(job) => {
                    if let Some(result) = result {
                        job.result = Some(result);
                    }
                    match job.transition(status.clone()) {
                        Ok(()) => (true, job.device_id.clone()),
                        Err(_) => (false, job.device_id.clone()),
                    }
                }
                None => (false, None),
            }
        };
        if !applied {
            return;
        }
        self.persist_by_id(job_id).await;
        self.events.publish_job_completed(JobCompleted {
            job_id: job_id.clone(),
            device_id,
            status,
        });
    }

    /// Free a device slot if this job holds it.
    async fn release_slot(&self, device_id: &str, job_id: &JobId) {
        let mut running = self.running.lock().await;
        if running.get(device_id) == Some(job_id) {
            running.remove(device_id);
        }
    }

    async fn record_execution(&self, job_id: &JobId, device_id: &str, success: bool) {
        let (class, execution_ms) = {
            let jobs = self.jobs.read().await;
            match jobs.get(job_id) {
                Some(job) => (
                    CircuitClass::classify(&job.circuit),
                    job.started_at
                        .map(|started| (Utc::now() - started).num_milliseconds().max(0) as u64)
                        .unwrap_or(0),
                ),
                None => return,
            }
        };
        self.metrics
            .record_execution(ExecutionRecord {
                job_id: job_id.clone(),
                device_id: device_id.to_string(),
                class,
                execution_ms,
                success,
                timestamp: Utc::now(),
            })
            .await;
    }

    /// Persist a job; failures are queued for the next dispatcher tick and
    /// never change in-memory state.
    async fn persist(&self, job: &Job) {
        if let Err(err) = self.repository.save_job(job).await {
            error!(job = %job.id, %err, "persistence failed, will retry");
            self.pending_writes.lock().await.insert(job.id.clone());
        }
    }

    async fn persist_by_id(&self, job_id: &JobId) {
        let job = self.jobs.read().await.get(job_id).cloned();
        if let Some(job) = job {
            self.persist(&job).await;
        }
    }

    async fn retry_pending_writes(&self) {
        let retry: Vec<JobId> = self.pending_writes.lock().await.drain().collect();
        for job_id in retry {
            self.persist_by_id(&job_id).await;
        }
    }

    /// Stop periodic tasks, cancel outstanding polls, and flush writes.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self
            .dispatcher
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        let pollers: Vec<_> = {
            let mut pollers = self
                .pollers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            pollers.drain().collect()
        };
        for (_, handle) in pollers {
            handle.abort();
        }
        self.retry_pending_writes().await;
        info!("scheduler shut down");
    }
}

/// Scheduler-side job validation.
fn validate_job(job: &Job) -> SchedResult<()> {
    if job.circuit.num_qubits() == 0 {
        return Err(SchedError::InvalidJob("circuit has no qubits".to_string()));
    }
    if job.shots == 0 || job.shots > MAX_SHOTS {
        return Err(SchedError::InvalidJob(format!(
            "shots must be in [1, {MAX_SHOTS}], got {}",
            job.shots
        )));
    }
    if job.circuit.num_qubits() > MAX_QUBITS {
        return Err(SchedError::InvalidJob(format!(
            "circuit has {} qubits, limit is {MAX_QUBITS}",
            job.circuit.num_qubits()
        )));
    }
    if job.circuit.gate_count() > MAX_GATES {
        return Err(SchedError::InvalidJob(format!(
            "circuit has {} gates, limit is {MAX_GATES}",
            job.circuit.gate_count()
        )));
    }
    Ok(())
}
