//! Provider implementation over the Rigetti QCS REST API.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use alsvin_hal::{
    AuthInfo, BitOrder, Calibration, CostModel, Counts, Device, DeviceStatus, DeviceType,
    ExecutionResult, HalError, HalResult, JobRequest, Provider, ProviderConfig, ProviderJobId,
    ProviderJobStatus, QueueInfo, ResultMetadata, SubmissionReceipt,
};
use alsvin_ir::Topology;

use crate::quil::to_quil;

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.qcs.rigetti.com/v1";

/// Rigetti QCS provider adapter.
///
/// Circuits travel as Quil text. Result bitstrings arrive with `ro[0]` as
/// the rightmost character and are normalized to big-endian.
pub struct RigettiProvider {
    client: Client,
    endpoint: String,
}

impl fmt::Debug for RigettiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigettiProvider")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RigettiProvider {
    /// Create the adapter from configuration.
    pub fn from_config(config: &ProviderConfig) -> HalResult<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| HalError::Configuration("Rigetti adapter requires a token".into()))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HalError::Configuration("invalid token characters".into()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }

    async fn check(response: reqwest::Response) -> HalResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "no body".into());
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HalError::AuthFailure(body),
            StatusCode::NOT_FOUND => HalError::JobNotFound(body),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                HalError::QuotaExceeded(body)
            }
            status if status.is_server_error() => {
                HalError::ServiceUnavailable(format!("{status}: {body}"))
            }
            status => HalError::Provider(format!("{status}: {body}")),
        })
    }

    fn device_from_processor(&self, info: &QuantumProcessor) -> Device {
        let status = match info.status.as_str() {
            "online" => DeviceStatus::Online,
            "calibrating" => DeviceStatus::Calibrating,
            "maintenance" => DeviceStatus::Maintenance,
            "offline" => DeviceStatus::Offline,
            _ => DeviceStatus::Error,
        };
        Device {
            id: info.id.clone(),
            provider_id: self.id().to_string(),
            name: info.id.clone(),
            version: info.revision.clone().unwrap_or_else(|| "1".to_string()),
            device_type: DeviceType::Superconducting,
            status,
            topology: Topology::from_edges(info.num_qubits, info.edges.iter().copied()),
            basis_gates: ["rx", "rz", "cz", "cp", "x", "z", "h", "cx", "s", "t"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_shots: 100_000,
            max_experiments: 1,
            simulation_capable: false,
            calibration: Calibration::default(),
            queue: QueueInfo {
                pending_jobs: info.pending_jobs.unwrap_or(0),
                average_wait_ms: info.average_wait_ms.unwrap_or(0),
                priority: 0,
            },
            cost: CostModel {
                cost_per_shot: 0.0,
                cost_per_second: 0.02,
                minimum_cost: 0.5,
                currency: "USD".to_string(),
            },
            max_concurrent_jobs: 4,
        }
    }
}

/// Normalize a QCS status string.
fn normalize_status(status: &str, error: Option<&str>) -> ProviderJobStatus {
    match status {
        "CREATED" => ProviderJobStatus::Submitted,
        "QUEUED" => ProviderJobStatus::Queued,
        "RUNNING" => ProviderJobStatus::Running,
        "DONE" => ProviderJobStatus::Completed,
        "CANCELLED" => ProviderJobStatus::Cancelled,
        "ERROR" => ProviderJobStatus::Failed(error.unwrap_or("unspecified error").to_string()),
        other => ProviderJobStatus::Failed(format!("unknown vendor status {other}")),
    }
}

/// Reverse vendor bitstrings: `ro[0]` is rightmost on the wire, leftmost in
/// the normalized form.
fn normalize_counts(raw: &HashMap<String, u64>) -> Counts {
    Counts::from_pairs(raw.iter().map(|(bitstring, &count)| (bitstring.clone(), count)))
        .reversed_bits()
}

#[derive(Debug, Deserialize)]
struct QuantumProcessor {
    id: String,
    num_qubits: usize,
    status: String,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    edges: Vec<(usize, usize)>,
    #[serde(default)]
    pending_jobs: Option<u32>,
    #[serde(default)]
    average_wait_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProcessorsResponse {
    #[serde(rename = "quantumProcessors")]
    quantum_processors: Vec<QuantumProcessor>,
}

#[derive(Debug, Serialize)]
struct QuilSubmission {
    #[serde(rename = "quantumProcessorId")]
    quantum_processor_id: String,
    shots: u32,
    quil: String,
}

#[derive(Debug, Deserialize)]
struct QcsJob {
    id: String,
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    estimated_queue_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct QcsResults {
    shots: u32,
    /// Bitstring histogram over the `ro` register, `ro[0]` rightmost.
    counts: HashMap<String, u64>,
    #[serde(default)]
    execution_duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AccountBalance {
    #[serde(rename = "availableCredit")]
    available_credit: f64,
}

#[async_trait]
impl Provider for RigettiProvider {
    fn id(&self) -> &str {
        "rigetti"
    }

    fn name(&self) -> &str {
        "Rigetti QCS"
    }

    async fn authenticate(&self) -> HalResult<AuthInfo> {
        let url = format!("{}/account", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let balance: AccountBalance = Self::check(response)
            .await
            .map_err(|err| match err {
                HalError::AuthFailure(msg) => HalError::AuthFailure(msg),
                other => HalError::AuthFailure(other.to_string()),
            })?
            .json()
            .await?;
        Ok(AuthInfo {
            user: None,
            credits_remaining: Some(balance.available_credit),
        })
    }

    async fn devices(&self) -> HalResult<Vec<Device>> {
        let url = format!("{}/quantumProcessors", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let body: ProcessorsResponse = Self::check(response).await?.json().await?;
        Ok(body
            .quantum_processors
            .iter()
            .map(|info| self.device_from_processor(info))
            .collect())
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
        let quil = to_quil(&request.circuit)?;
        debug!(device = %request.device_id, bytes = quil.len(), "submitting Quil program");

        let url = format!("{}/jobs", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&QuilSubmission {
                quantum_processor_id: request.device_id.clone(),
                shots: request.shots,
                quil,
            })
            .send()
            .await?;
        let job: QcsJob = Self::check(response).await?.json().await?;

        Ok(SubmissionReceipt {
            provider_job_id: ProviderJobId::new(job.id),
            status: normalize_status(&job.status, job.error.as_deref()),
            estimated_queue_ms: job.estimated_queue_ms,
        })
    }

    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
        let url = format!("{}/jobs/{}", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let job: QcsJob = Self::check(response).await?.json().await?;
        Ok(normalize_status(&job.status, job.error.as_deref()))
    }

    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
        let status = self.job_status(job_id).await?;
        if status != ProviderJobStatus::Completed {
            return Err(HalError::NotYetComplete(job_id.0.clone()));
        }

        let url = format!("{}/jobs/{}/results", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let raw: QcsResults = Self::check(response).await?.json().await?;

        let mut result = ExecutionResult::new(normalize_counts(&raw.counts), raw.shots)
            .with_metadata(ResultMetadata {
                source_bit_order: BitOrder::LittleEndian,
                extra: serde_json::Map::new(),
            });
        if let Some(ms) = raw.execution_duration_ms {
            result = result.with_execution_time(ms);
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
        let url = format!("{}/jobs/{}/cancel", self.endpoint, job_id.0);
        let response = self.client.post(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            _ => {
                Self::check(response).await?;
                Ok(false)
            }
        }
    }

    async fn credits_remaining(&self) -> HalResult<f64> {
        let url = format!("{}/account", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let balance: AccountBalance = Self::check(response).await?.json().await?;
        Ok(balance.available_credit.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_normalization() {
        assert_eq!(normalize_status("QUEUED", None), ProviderJobStatus::Queued);
        assert_eq!(normalize_status("RUNNING", None), ProviderJobStatus::Running);
        assert_eq!(normalize_status("DONE", None), ProviderJobStatus::Completed);
        assert_eq!(
            normalize_status("CANCELLED", None),
            ProviderJobStatus::Cancelled
        );
        assert_eq!(
            normalize_status("ERROR", Some("compile failure")),
            ProviderJobStatus::Failed("compile failure".to_string())
        );
    }

    #[test]
    fn test_counts_reversed() {
        // "01" on the wire has ro[0]=1 (rightmost); normalized "10".
        let raw = HashMap::from([("01".to_string(), 30), ("00".to_string(), 70)]);
        let counts = normalize_counts(&raw);
        assert_eq!(counts.get("10"), 30);
        assert_eq!(counts.get("00"), 70);
    }

    #[test]
    fn test_device_mapping() {
        let config = ProviderConfig::new("rigetti").with_token("t");
        let provider = RigettiProvider::from_config(&config).unwrap();

        let info = QuantumProcessor {
            id: "Ankaa-3".to_string(),
            num_qubits: 84,
            status: "online".to_string(),
            revision: Some("3".to_string()),
            edges: vec![(0, 1), (1, 2)],
            pending_jobs: Some(5),
            average_wait_ms: Some(45_000),
        };

        let device = provider.device_from_processor(&info);
        assert_eq!(device.id, "Ankaa-3");
        assert_eq!(device.device_type, DeviceType::Superconducting);
        assert_eq!(device.status, DeviceStatus::Online);
        assert!(device.topology.is_connected(1, 2));
        assert!(!device.topology.is_connected(0, 2));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderConfig::new("rigetti").with_token("hunter2");
        let provider = RigettiProvider::from_config(&config).unwrap();
        assert!(!format!("{provider:?}").contains("hunter2"));
    }
}
