//! Alsvin multi-criteria job scheduler.
//!
//! Takes validated jobs, scores every eligible device across providers on
//! performance, cost, reliability, and availability, queues the job on the
//! chosen device, and drives it to completion through a periodic
//! dispatcher and per-job polling tasks.
//!
//! The [`Orchestrator`] is the intended entry point: it owns the provider
//! supervisor, the [`Scheduler`], and the repository handle, and manages
//! their lifecycles.
//!
//! ```ignore
//! use alsvin_sched::{Job, Orchestrator, OrchestratorConfig, UserProfile};
//! use alsvin_sched::persistence::MemoryRepository;
//! use alsvin_sched::metrics::InMemoryMetrics;
//! use std::sync::Arc;
//!
//! # async fn run(providers: Vec<Arc<dyn alsvin_hal::Provider>>) {
//! let orchestrator = Orchestrator::init(
//!     providers,
//!     Arc::new(MemoryRepository::new()),
//!     Arc::new(InMemoryMetrics::new()),
//!     OrchestratorConfig::default(),
//! )
//! .await;
//!
//! let circuit = alsvin_ir::Circuit::bell().unwrap();
//! let job = Job::new(circuit, UserProfile::new("alice"), 1000);
//! let decision = orchestrator.submit(job).await.unwrap();
//! println!("scheduled on {}", decision.device_id);
//! # }
//! ```

pub mod cost;
pub mod error;
pub mod events;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod persistence;
pub mod predict;
pub mod queue;
pub mod scheduler;
pub mod score;

pub use error::{SchedError, SchedResult};
pub use events::{EventBus, JobCompleted, JobScheduled, ProviderStatusChanged};
pub use job::{Job, JobId, JobParameters, JobPriority, JobStatus, UserProfile};
pub use metrics::{DecisionRecord, ExecutionRecord, InMemoryMetrics, MetricsCollector};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use persistence::{
    CircuitRecord, CleanupReport, JobFilter, MemoryRepository, Repository, RetentionPolicy,
};
pub use predict::{CircuitClass, PerformancePredictor};
pub use scheduler::{
    JobStatusReport, QueueStatus, Scheduler, SchedulerConfig, SchedulerStats,
};
pub use score::{SchedulingDecision, ScoreWeights};
