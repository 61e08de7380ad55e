//! Process-wide owner of the orchestration stack.
//!
//! The [`Orchestrator`] is constructed once at startup and threaded through
//! the API surface; it owns the provider supervisor, the scheduler, and the
//! repository handle, and is the only place that starts or stops their
//! periodic tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;

use alsvin_compile::{BasisGates, OptimizationLevel, RouterOptions, transpile};
use alsvin_hal::{
    Device, DeviceConstraints, HealthReport, Provider, ProviderConfig, ProviderRegistry,
    ProviderSupervisor,
};
use alsvin_ir::Circuit;

use crate::error::{SchedError, SchedResult};
use crate::job::{Job, JobId, UserProfile};
use crate::metrics::MetricsCollector;
use crate::persistence::{CleanupReport, Repository, RetentionPolicy};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::score::SchedulingDecision;

/// Configuration surface of the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Scheduler timing configuration.
    pub scheduler: SchedulerConfig,
    /// Shots used when a caller does not specify any.
    pub default_shots: u32,
    /// Optimization level applied by `prepare_circuit` by default.
    pub default_optimization_level: u8,
    /// Upper bound on in-flight jobs per device when the device itself
    /// does not declare one.
    pub max_concurrent_jobs: u32,
    /// Polling window per job, seconds.
    pub job_timeout_secs: u64,
    /// Size of the prepared-circuit cache (external cache collaborator).
    pub circuit_cache_size: usize,
    /// TTL for cached results, seconds (external cache collaborator).
    pub result_cache_ttl_secs: u64,
    /// Retention windows for the repository cleanup.
    pub retention: RetentionPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            default_shots: 1024,
            default_optimization_level: 2,
            max_concurrent_jobs: 8,
            job_timeout_secs: 3600,
            circuit_cache_size: 256,
            result_cache_ttl_secs: 900,
            retention: RetentionPolicy::default(),
        }
    }
}

/// Owner of the supervisor, scheduler, and repository.
pub struct Orchestrator {
    supervisor: Arc<ProviderSupervisor>,
    scheduler: Arc<Scheduler>,
    repository: Arc<dyn Repository>,
    config: OrchestratorConfig,
    health_task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
    /// Last observed per-provider availability, for change events.
    provider_availability: std::sync::Mutex<rustc_hash::FxHashMap<String, bool>>,
    ready: AtomicBool,
}

impl Orchestrator {
    /// Initialize every provider, start the scheduler and the supervisor
    /// health check, and return the ready owner.
    pub async fn init(
        providers: Vec<Arc<dyn Provider>>,
        repository: Arc<dyn Repository>,
        metrics: Arc<dyn MetricsCollector>,
        config: OrchestratorConfig,
    ) -> Arc<Self> {
        let supervisor = ProviderSupervisor::initialize(providers).await;

        let mut scheduler_config = config.scheduler.clone();
        scheduler_config.poll_timeout = Duration::from_secs(config.job_timeout_secs);
        let scheduler = Scheduler::new(
            supervisor.clone(),
            repository.clone(),
            metrics,
            scheduler_config,
        );
        scheduler.clone().start();

        let health_task = supervisor.clone().start_health_check_task();

        info!("orchestrator ready");
        Arc::new(Self {
            supervisor,
            scheduler,
            repository,
            config,
            health_task: std::sync::Mutex::new(Some(health_task)),
            provider_availability: std::sync::Mutex::new(rustc_hash::FxHashMap::default()),
            ready: AtomicBool::new(true),
        })
    }

    /// Build every configured provider through the registry, then
    /// initialize.
    ///
    /// An unknown provider id fails the whole startup; authentication
    /// failures of individual providers are tolerated afterwards by the
    /// supervisor.
    pub async fn init_from_registry(
        registry: &ProviderRegistry,
        configs: Vec<(String, ProviderConfig)>,
        repository: Arc<dyn Repository>,
        metrics: Arc<dyn MetricsCollector>,
        config: OrchestratorConfig,
    ) -> SchedResult<Arc<Self>> {
        let mut providers = vec![];
        for (id, provider_config) in configs {
            providers.push(registry.create(&id, provider_config)?);
        }
        Ok(Self::init(providers, repository, metrics, config).await)
    }

    /// Whether `init` completed and `shutdown` has not run.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// The provider supervisor.
    pub fn supervisor(&self) -> &Arc<ProviderSupervisor> {
        &self.supervisor
    }

    /// The repository handle.
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// The active configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Submit a job through the scheduler.
    pub async fn submit(&self, job: Job) -> SchedResult<SchedulingDecision> {
        if !self.is_ready() {
            return Err(SchedError::ShutDown);
        }
        self.scheduler.submit(job).await
    }

    /// Pick the best eligible device across all providers and queue a job
    /// pinned to it.
    ///
    /// Selection happens here; the actual provider submission still goes
    /// through the dispatcher tick, which is the single submission path.
    pub async fn submit_to_optimal_device(
        &self,
        circuit: Circuit,
        user: UserProfile,
        shots: u32,
        constraints: &DeviceConstraints,
    ) -> SchedResult<(JobId, SchedulingDecision)> {
        if !self.is_ready() {
            return Err(SchedError::ShutDown);
        }
        let entry = self.supervisor.select_optimal_device(constraints).await?;
        let job = Job::new(circuit, user, shots).with_device(&entry.device.id);
        let job_id = job.id.clone();
        let decision = self.scheduler.submit(job).await?;
        Ok((job_id, decision))
    }

    /// Optimize, decompose, and route a circuit for a specific device.
    pub fn prepare_circuit(
        &self,
        circuit: &Circuit,
        device: &Device,
        level: Option<u8>,
    ) -> SchedResult<Circuit> {
        let level = level.unwrap_or(self.config.default_optimization_level);
        let basis = BasisGates::new(device.basis_gates.iter().cloned());
        let routed = transpile(
            circuit,
            &device.topology,
            &basis,
            OptimizationLevel::from_u8(level),
            &RouterOptions::default(),
        )?;
        Ok(routed.circuit)
    }

    /// Aggregate provider health.
    ///
    /// Availability flips publish a [`crate::events::ProviderStatusChanged`]
    /// event on the scheduler's bus.
    pub async fn health(&self) -> HealthReport {
        let report = self.supervisor.perform_health_check().await;
        {
            let mut seen = self
                .provider_availability
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for status in &report.providers {
                let changed = seen
                    .insert(status.id.clone(), status.available)
                    .is_some_and(|previous| previous != status.available);
                if changed {
                    self.scheduler.events().publish_provider_status(
                        crate::events::ProviderStatusChanged {
                            provider_id: status.id.clone(),
                            available: status.available,
                        },
                    );
                }
            }
        }
        report
    }

    /// Run the repository retention cleanup.
    pub async fn run_retention_cleanup(&self) -> SchedResult<CleanupReport> {
        self.repository.cleanup(&self.config.retention).await
    }

    /// Stop all periodic tasks, cancel outstanding polls, and drain
    /// pending persistence writes. Idempotent.
    pub async fn shutdown(&self) {
        if !self.ready.swap(false, Ordering::SeqCst) {
            return;
        }
        self.scheduler.shutdown().await;
        if let Some(handle) = self
            .health_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        info!("orchestrator shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::InMemoryMetrics;
    use crate::persistence::MemoryRepository;
    use alsvin_hal::{
        AuthInfo, Counts, ExecutionResult, HalResult, JobRequest, ProviderJobId,
        ProviderJobStatus, SubmissionReceipt,
    };
    use async_trait::async_trait;

    struct MockProvider {
        devices: Vec<Device>,
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn id(&self) -> &str {
            "mock"
        }

        fn name(&self) -> &str {
            "Mock"
        }

        async fn authenticate(&self) -> HalResult<AuthInfo> {
            Ok(AuthInfo::default())
        }

        async fn devices(&self) -> HalResult<Vec<Device>> {
            Ok(self.devices.clone())
        }

        async fn submit(&self, _request: &JobRequest) -> HalResult<SubmissionReceipt> {
            Ok(SubmissionReceipt {
                provider_job_id: ProviderJobId::new("mock-1"),
                status: ProviderJobStatus::Queued,
                estimated_queue_ms: Some(0),
            })
        }

        async fn job_status(&self, _job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
            Ok(ProviderJobStatus::Completed)
        }

        async fn job_results(&self, _job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
            Ok(ExecutionResult::new(
                Counts::from_pairs([("00", 50u64), ("11", 50u64)]),
                100,
            ))
        }

        async fn cancel(&self, _job_id: &ProviderJobId) -> HalResult<bool> {
            Ok(true)
        }

        async fn credits_remaining(&self) -> HalResult<f64> {
            Ok(10.0)
        }
    }

    async fn orchestrator() -> Arc<Orchestrator> {
        let provider = Arc::new(MockProvider {
            devices: vec![Device::simulator("sim", "mock", 20)],
        });
        Orchestrator::init(
            vec![provider],
            Arc::new(MemoryRepository::new()),
            Arc::new(InMemoryMetrics::new()),
            OrchestratorConfig::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_init_and_shutdown() {
        let orchestrator = orchestrator().await;
        assert!(orchestrator.is_ready());

        orchestrator.shutdown().await;
        assert!(!orchestrator.is_ready());

        // Idempotent.
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_rejected() {
        let orchestrator = orchestrator().await;
        orchestrator.shutdown().await;

        let job = Job::new(Circuit::bell().unwrap(), UserProfile::new("alice"), 100);
        assert!(matches!(
            orchestrator.submit(job).await,
            Err(SchedError::ShutDown)
        ));
    }

    #[tokio::test]
    async fn test_submit_to_optimal_device() {
        let orchestrator = orchestrator().await;

        let (job_id, decision) = orchestrator
            .submit_to_optimal_device(
                Circuit::bell().unwrap(),
                UserProfile::new("alice"),
                100,
                &DeviceConstraints::default(),
            )
            .await
            .unwrap();

        assert_eq!(decision.device_id, "sim");
        let report = orchestrator.scheduler().status(&job_id).await.unwrap();
        assert_eq!(report.device_id.as_deref(), Some("sim"));

        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_prepare_circuit_for_device() {
        let orchestrator = orchestrator().await;

        let mut device = Device::simulator("hw", "mock", 5);
        device.topology = alsvin_ir::Topology::linear(5);
        device.basis_gates = vec!["rx".into(), "rz".into(), "cx".into()];

        let mut circuit = Circuit::new("test", 3);
        circuit.h(0).unwrap().cx(0, 2).unwrap();

        let prepared = orchestrator
            .prepare_circuit(&circuit, &device, None)
            .unwrap();

        for op in prepared.gates() {
            assert!(device.supports_gates([op.gate.name()]));
            if op.qubits.len() == 2 {
                assert!(device.topology.is_connected(op.qubits[0], op.qubits[1]));
            }
        }

        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_report() {
        let orchestrator = orchestrator().await;
        let report = orchestrator.health().await;
        assert_eq!(report.overall, alsvin_hal::OverallHealth::Healthy);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_init_from_registry() {
        let mut registry = ProviderRegistry::new();
        registry.register("mock", |_config| {
            Ok(Arc::new(MockProvider {
                devices: vec![Device::simulator("sim", "mock", 20)],
            }))
        });

        let orchestrator = Orchestrator::init_from_registry(
            &registry,
            vec![("mock".to_string(), ProviderConfig::new("mock"))],
            Arc::new(MemoryRepository::new()),
            Arc::new(InMemoryMetrics::new()),
            OrchestratorConfig::default(),
        )
        .await
        .unwrap();

        assert!(orchestrator.supervisor().provider("mock").is_some());
        orchestrator.shutdown().await;

        // Unknown provider ids fail startup.
        let result = Orchestrator::init_from_registry(
            &registry,
            vec![("nope".to_string(), ProviderConfig::new("nope"))],
            Arc::new(MemoryRepository::new()),
            Arc::new(InMemoryMetrics::new()),
            OrchestratorConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
