//! Simulator provider implementation.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use alsvin_hal::{
    AuthInfo, Device, ExecutionResult, HalError, HalResult, JobRequest, Provider, ProviderJobId,
    ProviderJobStatus, SubmissionReceipt,
};
use alsvin_ir::Circuit;

use crate::statevector::Statevector;

/// One simulated job.
struct SimJob {
    status: ProviderJobStatus,
    result: Option<ExecutionResult>,
}

/// In-process statevector simulator behind the provider contract.
///
/// Jobs execute synchronously at submission and are `Completed` by the
/// time the receipt returns; the polling machinery above sees an instant
/// vendor.
pub struct SimulatorProvider {
    max_qubits: usize,
    seed: Option<u64>,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
}

impl SimulatorProvider {
    /// Create a simulator with the default 24-qubit ceiling.
    pub fn new() -> Self {
        Self::with_max_qubits(24)
    }

    /// Create a simulator with a custom qubit ceiling.
    pub fn with_max_qubits(max_qubits: usize) -> Self {
        Self {
            max_qubits,
            seed: None,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Fix the sampling seed for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[instrument(skip(self, circuit))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();
        debug!(
            qubits = circuit.num_qubits(),
            gates = circuit.gate_count(),
            shots,
            "starting simulation"
        );

        let mut statevector = Statevector::new(circuit.num_qubits());
        statevector.run(circuit);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let counts = statevector.sample_counts(circuit, shots, &mut rng);

        let elapsed = start.elapsed();
        debug!(?elapsed, "simulation finished");
        ExecutionResult::new(counts, shots)
            .with_execution_time(elapsed.as_millis() as u64)
            .with_queue_time(0)
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for SimulatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for SimulatorProvider {
    fn id(&self) -> &str {
        "sim"
    }

    fn name(&self) -> &str {
        "Local statevector simulator"
    }

    async fn authenticate(&self) -> HalResult<AuthInfo> {
        // Nothing to authenticate locally.
        Ok(AuthInfo {
            user: Some("local".to_string()),
            credits_remaining: None,
        })
    }

    async fn devices(&self) -> HalResult<Vec<Device>> {
        Ok(vec![Device::simulator("simulator", self.id(), self.max_qubits)])
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
        if request.circuit.num_qubits() > self.max_qubits {
            return Err(HalError::InvalidCircuit(format!(
                "circuit has {} qubits but the simulator supports {}",
                request.circuit.num_qubits(),
                self.max_qubits
            )));
        }
        if request.shots == 0 {
            return Err(HalError::InvalidShots("shots must be positive".to_string()));
        }

        let job_id = ProviderJobId::new(Uuid::new_v4().to_string());
        let result = self.run_simulation(&request.circuit, request.shots);

        self.lock_jobs().insert(
            job_id.0.clone(),
            SimJob {
                status: ProviderJobStatus::Completed,
                result: Some(result),
            },
        );

        debug!(job = %job_id, "simulation job stored");
        Ok(SubmissionReceipt {
            provider_job_id: job_id,
            status: ProviderJobStatus::Completed,
            estimated_queue_ms: Some(0),
        })
    }

    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|job| job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
        let jobs = self.lock_jobs();
        let job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match &job.status {
            ProviderJobStatus::Completed => job
                .result
                .clone()
                .ok_or_else(|| HalError::NotYetComplete(job_id.0.clone())),
            _ => Err(HalError::NotYetComplete(job_id.0.clone())),
        }
    }

    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
        let mut jobs = self.lock_jobs();
        match jobs.get_mut(&job_id.0) {
            Some(job) if !job.status.is_terminal() => {
                job.status = ProviderJobStatus::Cancelled;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }

    async fn credits_remaining(&self) -> HalResult<f64> {
        // Local execution is free.
        Ok(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_device_catalog() {
        let provider = SimulatorProvider::new();
        let devices = provider.devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "simulator");
        assert!(devices[0].simulation_capable);
    }

    #[tokio::test]
    async fn test_bell_distribution() {
        let provider = SimulatorProvider::new().with_seed(42);
        let circuit = Circuit::bell().unwrap();

        let receipt = provider
            .submit(&JobRequest {
                circuit,
                device_id: "simulator".to_string(),
                shots: 1000,
            })
            .await
            .unwrap();
        assert_eq!(receipt.status, ProviderJobStatus::Completed);

        let result = provider.job_results(&receipt.provider_job_id).await.unwrap();
        assert_eq!(result.shots, 1000);
        assert!(result.is_consistent());

        let zeros = result.counts.get("00") as f64 / 1000.0;
        let ones = result.counts.get("11") as f64 / 1000.0;
        assert!((zeros - 0.5).abs() < 0.1);
        assert!((ones - 0.5).abs() < 0.1);
        assert!(result.counts.get("01") + result.counts.get("10") < 10);
    }

    #[tokio::test]
    async fn test_oversized_circuit_rejected() {
        let provider = SimulatorProvider::with_max_qubits(4);
        let circuit = Circuit::new("wide", 10);

        let result = provider
            .submit(&JobRequest {
                circuit,
                device_id: "simulator".to_string(),
                shots: 10,
            })
            .await;
        assert!(matches!(result, Err(HalError::InvalidCircuit(_))));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let provider = SimulatorProvider::new();
        let missing = ProviderJobId::new("nope");
        assert!(matches!(
            provider.job_status(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_completed_job() {
        let provider = SimulatorProvider::new().with_seed(1);
        let receipt = provider
            .submit(&JobRequest {
                circuit: Circuit::bell().unwrap(),
                device_id: "simulator".to_string(),
                shots: 10,
            })
            .await
            .unwrap();

        // Jobs complete synchronously, so cancellation is declined.
        assert!(!provider.cancel(&receipt.provider_job_id).await.unwrap());
    }
}
