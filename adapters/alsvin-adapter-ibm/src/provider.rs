//! Provider implementation over the IBM client.

use async_trait::async_trait;
use tracing::debug;

use alsvin_hal::{
    AuthInfo, BitOrder, Calibration, CostModel, Counts, Device, DeviceStatus, DeviceType,
    ExecutionResult, HalError, HalResult, JobRequest, Provider, ProviderConfig, ProviderJobId,
    ProviderJobStatus, QueueInfo, ResultMetadata, SubmissionReceipt,
};
use alsvin_ir::Topology;

use crate::api::{BackendInfo, IbmClient, JobResult, JobSubmission};

/// IBM Quantum provider adapter.
///
/// Circuits are serialized to `OPENQASM 2.0`; result histograms arrive
/// hex-keyed with clbit 0 in the least significant bit and are normalized
/// to big-endian bitstrings.
pub struct IbmProvider {
    client: IbmClient,
}

impl IbmProvider {
    /// Create the adapter from configuration.
    pub fn from_config(config: &ProviderConfig) -> HalResult<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| HalError::Configuration("IBM adapter requires a token".into()))?;
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| crate::api::DEFAULT_ENDPOINT.to_string());
        Ok(Self {
            client: IbmClient::new(endpoint, token)?,
        })
    }

    fn device_from_backend(&self, info: &BackendInfo) -> Device {
        let status = match (info.operational, info.status_msg.as_deref()) {
            (false, _) => DeviceStatus::Offline,
            (true, Some("calibrating")) => DeviceStatus::Calibrating,
            (true, Some("maintenance")) => DeviceStatus::Maintenance,
            (true, _) => DeviceStatus::Online,
        };
        Device {
            id: info.name.clone(),
            provider_id: self.id().to_string(),
            name: info.name.clone(),
            version: info.version.clone().unwrap_or_else(|| "1".to_string()),
            device_type: if info.simulator {
                DeviceType::Simulator
            } else {
                DeviceType::Superconducting
            },
            status,
            topology: Topology::from_edges(info.n_qubits, info.coupling_map.iter().copied()),
            basis_gates: info.basis_gates.clone(),
            max_shots: info.max_shots.unwrap_or(100_000),
            max_experiments: info.max_experiments.unwrap_or(1),
            simulation_capable: info.simulator,
            calibration: Calibration::default(),
            queue: QueueInfo {
                pending_jobs: info.pending_jobs,
                average_wait_ms: u64::from(info.pending_jobs) * 60_000,
                priority: 0,
            },
            cost: CostModel::default(),
            max_concurrent_jobs: 8,
        }
    }
}

/// Normalize an IBM status string.
fn normalize_status(status: &str) -> ProviderJobStatus {
    match status.to_ascii_uppercase().as_str() {
        "CREATING" | "CREATED" | "VALIDATING" | "VALIDATED" => ProviderJobStatus::Submitted,
        "QUEUED" => ProviderJobStatus::Queued,
        "RUNNING" => ProviderJobStatus::Running,
        "COMPLETED" => ProviderJobStatus::Completed,
        "CANCELLED" => ProviderJobStatus::Cancelled,
        other => ProviderJobStatus::Failed(format!("backend reported {other}")),
    }
}

/// Convert a hex-keyed histogram into big-endian bitstring counts.
fn normalize_counts(result: &JobResult, num_clbits: usize) -> HalResult<Counts> {
    let mut counts = Counts::new();
    for (key, &count) in &result.counts {
        let value = u64::from_str_radix(key.trim_start_matches("0x"), 16).map_err(|_| {
            HalError::Provider(format!("unparseable counts key from backend: {key}"))
        })?;
        // Hex value has clbit 0 as the LSB; the normalized form puts
        // clbit 0 first.
        let bitstring: String = (0..num_clbits.max(1))
            .map(|bit| if (value >> bit) & 1 == 1 { '1' } else { '0' })
            .collect();
        counts.insert(bitstring, count);
    }
    Ok(counts)
}

#[async_trait]
impl Provider for IbmProvider {
    fn id(&self) -> &str {
        "ibm"
    }

    fn name(&self) -> &str {
        "IBM Quantum"
    }

    async fn authenticate(&self) -> HalResult<AuthInfo> {
        let account = self.client.whoami().await.map_err(|err| match err {
            HalError::AuthFailure(msg) => HalError::AuthFailure(msg),
            other => HalError::AuthFailure(other.to_string()),
        })?;
        Ok(AuthInfo {
            user: account.email,
            credits_remaining: account.credits_remaining,
        })
    }

    async fn devices(&self) -> HalResult<Vec<Device>> {
        let backends = self.client.list_backends().await?;
        Ok(backends
            .iter()
            .map(|info| self.device_from_backend(info))
            .collect())
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
        let qasm = alsvin_qasm::emit(&request.circuit);
        debug!(device = %request.device_id, bytes = qasm.len(), "submitting QASM program");

        let info = self
            .client
            .submit_job(&JobSubmission {
                backend: request.device_id.clone(),
                shots: request.shots,
                qasm,
            })
            .await?;

        Ok(SubmissionReceipt {
            provider_job_id: ProviderJobId::new(info.id),
            status: normalize_status(&info.status),
            estimated_queue_ms: info.estimated_start_ms,
        })
    }

    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
        let info = self.client.get_job(&job_id.0).await?;
        Ok(normalize_status(&info.status))
    }

    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
        let info = self.client.get_job(&job_id.0).await?;
        let status = normalize_status(&info.status);
        if status != ProviderJobStatus::Completed {
            return Err(HalError::NotYetComplete(job_id.0.clone()));
        }

        let raw = self.client.get_job_result(&job_id.0).await?;
        let width = raw
            .counts
            .keys()
            .filter_map(|key| u64::from_str_radix(key.trim_start_matches("0x"), 16).ok())
            .map(|value| 64 - value.leading_zeros() as usize)
            .max()
            .unwrap_or(1)
            .max(1);
        let counts = normalize_counts(&raw, width)?;

        let mut result = ExecutionResult::new(counts, raw.shots).with_metadata(ResultMetadata {
            source_bit_order: BitOrder::LittleEndian,
            extra: serde_json::Map::new(),
        });
        if let Some(ms) = raw.time_taken_ms {
            result = result.with_execution_time(ms);
        }
        if let Some(ms) = raw.queue_ms {
            result = result.with_queue_time(ms);
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
        self.client.cancel_job(&job_id.0).await
    }

    async fn credits_remaining(&self) -> HalResult<f64> {
        self.client.credits().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_status_normalization() {
        assert_eq!(normalize_status("QUEUED"), ProviderJobStatus::Queued);
        assert_eq!(normalize_status("running"), ProviderJobStatus::Running);
        assert_eq!(normalize_status("COMPLETED"), ProviderJobStatus::Completed);
        assert_eq!(normalize_status("CANCELLED"), ProviderJobStatus::Cancelled);
        assert_eq!(normalize_status("VALIDATING"), ProviderJobStatus::Submitted);
        assert!(matches!(
            normalize_status("ERROR_RUNNING_JOB"),
            ProviderJobStatus::Failed(_)
        ));
    }

    #[test]
    fn test_counts_normalization() {
        let result = JobResult {
            shots: 100,
            counts: HashMap::from([("0x0".to_string(), 52), ("0x3".to_string(), 48)]),
            time_taken_ms: None,
            queue_ms: None,
        };
        let counts = normalize_counts(&result, 2).unwrap();
        assert_eq!(counts.get("00"), 52);
        assert_eq!(counts.get("11"), 48);
        assert_eq!(counts.total(), 100);
    }

    #[test]
    fn test_counts_endianness() {
        // 0x1 sets clbit 0, which is the FIRST character when normalized.
        let result = JobResult {
            shots: 10,
            counts: HashMap::from([("0x1".to_string(), 10)]),
            time_taken_ms: None,
            queue_ms: None,
        };
        let counts = normalize_counts(&result, 3).unwrap();
        assert_eq!(counts.get("100"), 10);
    }

    #[test]
    fn test_bad_counts_key() {
        let result = JobResult {
            shots: 1,
            counts: HashMap::from([("garbage".to_string(), 1)]),
            time_taken_ms: None,
            queue_ms: None,
        };
        assert!(normalize_counts(&result, 1).is_err());
    }

    #[test]
    fn test_device_mapping() {
        let config = ProviderConfig::new("ibm").with_token("t");
        let provider = IbmProvider::from_config(&config).unwrap();

        let info = BackendInfo {
            name: "ibm_kyiv".to_string(),
            version: Some("2.1".to_string()),
            n_qubits: 5,
            basis_gates: vec!["rz".into(), "sx".into(), "x".into(), "cx".into()],
            coupling_map: vec![(0, 1), (1, 2), (2, 3), (3, 4)],
            simulator: false,
            operational: true,
            status_msg: None,
            pending_jobs: 3,
            max_shots: Some(20_000),
            max_experiments: None,
        };

        let device = provider.device_from_backend(&info);
        assert_eq!(device.id, "ibm_kyiv");
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.device_type, DeviceType::Superconducting);
        assert_eq!(device.num_qubits(), 5);
        assert!(device.topology.is_connected(0, 1));
        assert!(!device.topology.is_connected(0, 2));
        assert_eq!(device.queue.pending_jobs, 3);
    }

    #[test]
    fn test_offline_backend() {
        let config = ProviderConfig::new("ibm").with_token("t");
        let provider = IbmProvider::from_config(&config).unwrap();

        let info = BackendInfo {
            name: "down".to_string(),
            version: None,
            n_qubits: 5,
            basis_gates: vec![],
            coupling_map: vec![],
            simulator: false,
            operational: false,
            status_msg: Some("internal".to_string()),
            pending_jobs: 0,
            max_shots: None,
            max_experiments: None,
        };

        assert_eq!(
            provider.device_from_backend(&info).status,
            DeviceStatus::Offline
        );
    }

    #[test]
    fn test_missing_token_rejected() {
        let config = ProviderConfig::new("ibm");
        assert!(matches!(
            IbmProvider::from_config(&config),
            Err(HalError::Configuration(_))
        ));
    }
}
