//! Provider supervisor.
//!
//! Initializes every configured provider, keeps per-provider status, and
//! answers catalog-wide queries: all devices, aggregate health, and
//! best-eligible-device selection under constraints.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{HalError, HalResult};
use crate::provider::Provider;
use crate::retry::{Deadlines, with_deadline};

/// Supervisor view of one provider.
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub id: String,
    pub name: String,
    pub available: bool,
    pub authenticated: bool,
    pub device_count: usize,
    pub error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

/// Aggregate health over all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallHealth {
    /// Every provider is available.
    Healthy,
    /// At least one provider is available.
    Degraded,
    /// No provider is available.
    Unhealthy,
}

/// The report produced by a health check.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub overall: OverallHealth,
    pub providers: Vec<ProviderStatus>,
}

/// One device of the cross-provider catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub device: Device,
    pub provider_id: String,
    pub provider_name: String,
}

/// Constraints for best-eligible-device selection.
#[derive(Debug, Clone, Default)]
pub struct DeviceConstraints {
    /// Minimum qubit count.
    pub min_qubits: Option<usize>,
    /// Maximum estimated cost for the given shot count.
    pub max_cost: Option<f64>,
    /// Restrict to these provider ids.
    pub preferred_providers: Option<Vec<String>>,
    /// Require (or forbid) simulators.
    pub simulator: Option<bool>,
    /// Shots used for the cost estimate.
    pub shots: u32,
}

/// Default period between supervisor health checks.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// Supervises a fixed set of provider adapters.
pub struct ProviderSupervisor {
    /// Providers in configuration order; the order breaks selection ties.
    providers: Vec<Arc<dyn Provider>>,
    statuses: RwLock<FxHashMap<String, ProviderStatus>>,
    deadlines: Deadlines,
    health_check_interval: Duration,
}

impl ProviderSupervisor {
    /// Initialize every provider in parallel, tolerating per-provider
    /// failure.
    ///
    /// Each attempt runs `authenticate` then `devices`; failures are
    /// recorded on the provider's status and do not abort the others.
    pub async fn initialize(providers: Vec<Arc<dyn Provider>>) -> Arc<Self> {
        let deadlines = Deadlines::default();

        let attempts = providers.iter().map(|provider| {
            let provider = provider.clone();
            async move {
                let id = provider.id().to_string();
                let name = provider.name().to_string();

                let auth = with_deadline(
                    "authenticate",
                    deadlines.authenticate,
                    provider.authenticate(),
                )
                .await;
                if let Err(error) = auth {
                    warn!(provider = %id, %error, "authentication failed");
                    return ProviderStatus {
                        id,
                        name,
                        available: false,
                        authenticated: false,
                        device_count: 0,
                        error: Some(error.to_string()),
                        last_checked: Utc::now(),
                    };
                }

                match with_deadline("devices", deadlines.devices, provider.devices()).await {
                    Ok(devices) => {
                        info!(provider = %id, devices = devices.len(), "provider initialized");
                        ProviderStatus {
                            id,
                            name,
                            available: true,
                            authenticated: true,
                            device_count: devices.len(),
                            error: None,
                            last_checked: Utc::now(),
                        }
                    }
                    Err(error) => {
                        warn!(provider = %id, %error, "device catalog fetch failed");
                        ProviderStatus {
                            id,
                            name,
                            available: false,
                            authenticated: true,
                            device_count: 0,
                            error: Some(error.to_string()),
                            last_checked: Utc::now(),
                        }
                    }
                }
            }
        });

        let statuses = join_all(attempts)
            .await
            .into_iter()
            .map(|status| (status.id.clone(), status))
            .collect();

        Arc::new(Self {
            providers,
            statuses: RwLock::new(statuses),
            deadlines,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        })
    }

    /// Get a provider by id.
    pub fn provider(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|provider| provider.id() == id)
            .cloned()
    }

    /// Provider ids in configuration order.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.id().to_string())
            .collect()
    }

    /// Current status snapshot of one provider.
    pub async fn provider_status(&self, id: &str) -> Option<ProviderStatus> {
        self.statuses.read().await.get(id).cloned()
    }

    /// All devices across available providers.
    ///
    /// Per-provider errors are logged and swallowed so one failing vendor
    /// does not hide the rest of the catalog.
    pub async fn all_devices(&self) -> Vec<CatalogEntry> {
        let mut catalog = vec![];
        for provider in &self.providers {
            if !self.is_available(provider.id()).await {
                continue;
            }
            match with_deadline("devices", self.deadlines.devices, provider.devices()).await {
                Ok(devices) => {
                    for device in devices {
                        catalog.push(CatalogEntry {
                            device,
                            provider_id: provider.id().to_string(),
                            provider_name: provider.name().to_string(),
                        });
                    }
                }
                Err(error) => {
                    warn!(provider = provider.id(), %error, "skipping provider in catalog");
                }
            }
        }
        catalog
    }

    async fn is_available(&self, id: &str) -> bool {
        self.statuses
            .read()
            .await
            .get(id)
            .is_some_and(|status| status.available)
    }

    /// Re-check every authenticated provider and report aggregate health.
    pub async fn perform_health_check(&self) -> HealthReport {
        let mut providers = vec![];

        for provider in &self.providers {
            let id = provider.id().to_string();
            let authenticated = self
                .statuses
                .read()
                .await
                .get(&id)
                .is_some_and(|status| status.authenticated);

            let status = if authenticated {
                match with_deadline("devices", self.deadlines.devices, provider.devices()).await {
                    Ok(devices) => ProviderStatus {
                        id: id.clone(),
                        name: provider.name().to_string(),
                        available: true,
                        authenticated: true,
                        device_count: devices.len(),
                        error: None,
                        last_checked: Utc::now(),
                    },
                    Err(error) => ProviderStatus {
                        id: id.clone(),
                        name: provider.name().to_string(),
                        available: false,
                        authenticated: true,
                        device_count: 0,
                        error: Some(error.to_string()),
                        last_checked: Utc::now(),
                    },
                }
            } else {
                // Unauthenticated providers stay down until reconfigured.
                match self.statuses.read().await.get(&id).cloned() {
                    Some(previous) => previous,
                    None => continue,
                }
            };

            self.statuses
                .write()
                .await
                .insert(id.clone(), status.clone());
            providers.push(status);
        }

        let available = providers.iter().filter(|status| status.available).count();
        let overall = if available == providers.len() && !providers.is_empty() {
            OverallHealth::Healthy
        } else if available > 0 {
            OverallHealth::Degraded
        } else {
            OverallHealth::Unhealthy
        };

        debug!(?overall, providers = providers.len(), available, "health check");
        HealthReport { overall, providers }
    }

    /// Spawn the periodic health-check task.
    pub fn start_health_check_task(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let supervisor = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(supervisor.health_check_interval);
            // The first tick fires immediately; initialization already
            // checked every provider, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                supervisor.perform_health_check().await;
            }
        })
    }

    /// Pick the best eligible device across all providers.
    ///
    /// Eligible devices are schedulable, satisfy the constraints, and have
    /// queue room. Ranking is `1 / (average_wait_ms + 1000)`, ties broken
    /// by provider configuration order (the catalog is already in that
    /// order and the sort is stable).
    pub async fn select_optimal_device(
        &self,
        constraints: &DeviceConstraints,
    ) -> HalResult<CatalogEntry> {
        let catalog = self.all_devices().await;

        let mut eligible: Vec<CatalogEntry> = catalog
            .into_iter()
            .filter(|entry| Self::is_eligible(entry, constraints))
            .collect();

        if eligible.is_empty() {
            return Err(HalError::NoEligibleDevice(
                "no device satisfies the constraints".to_string(),
            ));
        }

        eligible.sort_by(|a, b| {
            let score_a = 1.0 / (a.device.queue.average_wait_ms as f64 + 1000.0);
            let score_b = 1.0 / (b.device.queue.average_wait_ms as f64 + 1000.0);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(eligible.remove(0))
    }

    fn is_eligible(entry: &CatalogEntry, constraints: &DeviceConstraints) -> bool {
        let device = &entry.device;
        if device.status != crate::device::DeviceStatus::Online {
            return false;
        }
        if let Some(min_qubits) = constraints.min_qubits {
            if device.num_qubits() < min_qubits {
                return false;
            }
        }
        if let Some(simulator) = constraints.simulator {
            if (device.device_type == crate::device::DeviceType::Simulator) != simulator {
                return false;
            }
        }
        if let Some(preferred) = &constraints.preferred_providers {
            if !preferred.iter().any(|id| id == &entry.provider_id) {
                return false;
            }
        }
        if let Some(max_cost) = constraints.max_cost {
            let estimated = (f64::from(constraints.shots) * device.cost.cost_per_shot)
                .max(device.cost.minimum_cost);
            if estimated > max_cost {
                return false;
            }
        }
        // Backpressure: a full device queue rejects new submissions.
        if device.queue.pending_jobs >= device.max_concurrent_jobs {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceStatus, DeviceType};
    use crate::provider::{
        AuthInfo, JobRequest, ProviderJobId, ProviderJobStatus, SubmissionReceipt,
    };
    use crate::result::{Counts, ExecutionResult};
    use async_trait::async_trait;

    /// Mock provider for supervisor tests.
    struct MockProvider {
        id: String,
        devices: Vec<Device>,
        auth_ok: bool,
    }

    impl MockProvider {
        fn new(id: &str, devices: Vec<Device>) -> Arc<dyn Provider> {
            Arc::new(Self {
                id: id.to_string(),
                devices,
                auth_ok: true,
            })
        }

        fn failing_auth(id: &str) -> Arc<dyn Provider> {
            Arc::new(Self {
                id: id.to_string(),
                devices: vec![],
                auth_ok: false,
            })
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.id
        }

        async fn authenticate(&self) -> HalResult<AuthInfo> {
            if self.auth_ok {
                Ok(AuthInfo::default())
            } else {
                Err(HalError::AuthFailure("invalid token".into()))
            }
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
            Ok(ExecutionResult::new(Counts::new(), 0))
        }

        async fn cancel(&self, _job_id: &ProviderJobId) -> HalResult<bool> {
            Ok(true)
        }

        async fn credits_remaining(&self) -> HalResult<f64> {
            Ok(100.0)
        }
    }

    fn hardware_device(id: &str, provider: &str, qubits: usize, wait_ms: u64) -> Device {
        let mut device = Device::simulator(id, provider, qubits);
        device.device_type = DeviceType::Superconducting;
        device.queue.average_wait_ms = wait_ms;
        device
    }

    #[tokio::test]
    async fn test_initialize_tolerates_auth_failure() {
        let supervisor = ProviderSupervisor::initialize(vec![
            MockProvider::new("good", vec![Device::simulator("sim", "good", 10)]),
            MockProvider::failing_auth("bad"),
        ])
        .await;

        let good = supervisor.provider_status("good").await.unwrap();
        assert!(good.available);
        assert!(good.authenticated);
        assert_eq!(good.device_count, 1);

        let bad = supervisor.provider_status("bad").await.unwrap();
        assert!(!bad.available);
        assert!(!bad.authenticated);
        assert!(bad.error.is_some());
    }

    #[tokio::test]
    async fn test_all_devices_skips_unavailable_providers() {
        let supervisor = ProviderSupervisor::initialize(vec![
            MockProvider::new("good", vec![Device::simulator("sim", "good", 10)]),
            MockProvider::failing_auth("bad"),
        ])
        .await;

        let catalog = supervisor.all_devices().await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].provider_id, "good");
    }

    #[tokio::test]
    async fn test_health_degraded() {
        let supervisor = ProviderSupervisor::initialize(vec![
            MockProvider::new("good", vec![]),
            MockProvider::failing_auth("bad"),
        ])
        .await;

        let report = supervisor.perform_health_check().await;
        assert_eq!(report.overall, OverallHealth::Degraded);
    }

    #[tokio::test]
    async fn test_health_healthy() {
        let supervisor =
            ProviderSupervisor::initialize(vec![MockProvider::new("solo", vec![])]).await;
        let report = supervisor.perform_health_check().await;
        assert_eq!(report.overall, OverallHealth::Healthy);
    }

    #[tokio::test]
    async fn test_select_prefers_shorter_queue() {
        let supervisor = ProviderSupervisor::initialize(vec![
            MockProvider::new("a", vec![hardware_device("slow", "a", 10, 60_000)]),
            MockProvider::new("b", vec![hardware_device("fast", "b", 10, 1_000)]),
        ])
        .await;

        let chosen = supervisor
            .select_optimal_device(&DeviceConstraints::default())
            .await
            .unwrap();
        assert_eq!(chosen.device.id, "fast");
    }

    #[tokio::test]
    async fn test_select_tie_broken_by_provider_order() {
        let supervisor = ProviderSupervisor::initialize(vec![
            MockProvider::new("first", vec![hardware_device("d1", "first", 10, 5_000)]),
            MockProvider::new("second", vec![hardware_device("d2", "second", 10, 5_000)]),
        ])
        .await;

        let chosen = supervisor
            .select_optimal_device(&DeviceConstraints::default())
            .await
            .unwrap();
        assert_eq!(chosen.provider_id, "first");
    }

    #[tokio::test]
    async fn test_select_no_eligible_device() {
        let supervisor = ProviderSupervisor::initialize(vec![MockProvider::new(
            "a",
            vec![hardware_device("small", "a", 20, 0)],
        )])
        .await;

        let result = supervisor
            .select_optimal_device(&DeviceConstraints {
                min_qubits: Some(50),
                ..DeviceConstraints::default()
            })
            .await;
        assert!(matches!(result, Err(HalError::NoEligibleDevice(_))));
    }

    #[tokio::test]
    async fn test_select_respects_simulator_flag() {
        let supervisor = ProviderSupervisor::initialize(vec![MockProvider::new(
            "a",
            vec![
                Device::simulator("sim", "a", 20),
                hardware_device("hw", "a", 20, 0),
            ],
        )])
        .await;

        let simulator = supervisor
            .select_optimal_device(&DeviceConstraints {
                simulator: Some(true),
                ..DeviceConstraints::default()
            })
            .await
            .unwrap();
        assert_eq!(simulator.device.id, "sim");

        let hardware = supervisor
            .select_optimal_device(&DeviceConstraints {
                simulator: Some(false),
                ..DeviceConstraints::default()
            })
            .await
            .unwrap();
        assert_eq!(hardware.device.id, "hw");
    }

    #[tokio::test]
    async fn test_select_backpressure() {
        let mut full = hardware_device("full", "a", 10, 0);
        full.queue.pending_jobs = full.max_concurrent_jobs;

        let supervisor =
            ProviderSupervisor::initialize(vec![MockProvider::new("a", vec![full])]).await;

        let result = supervisor
            .select_optimal_device(&DeviceConstraints::default())
            .await;
        assert!(matches!(result, Err(HalError::NoEligibleDevice(_))));
    }

    #[tokio::test]
    async fn test_select_offline_never_eligible() {
        let mut offline = hardware_device("down", "a", 10, 0);
        offline.status = DeviceStatus::Offline;

        let supervisor =
            ProviderSupervisor::initialize(vec![MockProvider::new("a", vec![offline])]).await;

        let result = supervisor
            .select_optimal_device(&DeviceConstraints::default())
            .await;
        assert!(matches!(result, Err(HalError::NoEligibleDevice(_))));
    }
}
