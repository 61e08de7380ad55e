//! Provider implementation over the IonQ REST API.

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

use crate::wire::{WireCircuit, to_wire};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ionq.co/v0.3";

/// IonQ provider adapter.
///
/// Circuits travel as a gate-list JSON program. Result histograms are
/// keyed by decimal basis-state index with qubit 0 in the least
/// significant bit; they are normalized to big-endian bitstrings.
pub struct IonqProvider {
    client: Client,
    endpoint: String,
}

impl fmt::Debug for IonqProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IonqProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl IonqProvider {
    /// Create the adapter from configuration.
    pub fn from_config(config: &ProviderConfig) -> HalResult<Self> {
        let api_key = config
            .token
            .as_deref()
            .ok_or_else(|| HalError::Configuration("IonQ adapter requires an API key".into()))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("apiKey {api_key}"))
                .map_err(|_| HalError::Configuration("invalid API key characters".into()))?,
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

    fn device_from_backend(&self, info: &IonqBackend) -> Device {
        let status = match info.status.as_str() {
            "available" => DeviceStatus::Online,
            "calibrating" => DeviceStatus::Calibrating,
            "reserved" | "maintenance" => DeviceStatus::Maintenance,
            "offline" | "retired" => DeviceStatus::Offline,
            _ => DeviceStatus::Error,
        };
        let simulator = info.backend.contains("simulator");
        Device {
            id: info.backend.clone(),
            provider_id: self.id().to_string(),
            name: info.backend.clone(),
            version: "1".to_string(),
            device_type: if simulator {
                DeviceType::Simulator
            } else {
                DeviceType::IonTrap
            },
            status,
            // Trapped ions are all-to-all connected.
            topology: Topology::full(info.qubits),
            basis_gates: [
                "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
                "cx", "swap", "rxx", "ryy", "rzz", "ccx",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_shots: 10_000,
            max_experiments: 1,
            simulation_capable: simulator,
            calibration: Calibration::default(),
            queue: QueueInfo {
                pending_jobs: info.pending_jobs.unwrap_or(0),
                average_wait_ms: info.average_queue_time_ms.unwrap_or(0),
                priority: 0,
            },
            cost: CostModel {
                cost_per_shot: 0.00003,
                cost_per_second: 0.0,
                minimum_cost: 1.0,
                currency: "USD".to_string(),
            },
            max_concurrent_jobs: 4,
        }
    }
}

/// Normalize an IonQ status string.
fn normalize_status(status: &str, failure: Option<&str>) -> ProviderJobStatus {
    match status {
        "submitted" => ProviderJobStatus::Submitted,
        "ready" | "queued" => ProviderJobStatus::Queued,
        "running" => ProviderJobStatus::Running,
        "completed" => ProviderJobStatus::Completed,
        "canceled" => ProviderJobStatus::Cancelled,
        "failed" => {
            ProviderJobStatus::Failed(failure.unwrap_or("unspecified failure").to_string())
        }
        other => ProviderJobStatus::Failed(format!("unknown vendor status {other}")),
    }
}

/// Convert a decimal-keyed little-endian histogram into big-endian counts.
fn normalize_counts(histogram: &HashMap<String, u64>, num_qubits: usize) -> HalResult<Counts> {
    let mut counts = Counts::new();
    for (key, &count) in histogram {
        let value: u64 = key
            .parse()
            .map_err(|_| HalError::Provider(format!("unparseable counts key: {key}")))?;
        let bitstring: String = (0..num_qubits.max(1))
            .map(|bit| if (value >> bit) & 1 == 1 { '1' } else { '0' })
            .collect();
        counts.insert(bitstring, count);
    }
    Ok(counts)
}

#[derive(Debug, Deserialize)]
struct IonqBackend {
    backend: String,
    qubits: usize,
    status: String,
    #[serde(default)]
    pending_jobs: Option<u32>,
    #[serde(default)]
    average_queue_time_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct IonqSubmission {
    target: String,
    shots: u32,
    input: WireCircuit,
}

#[derive(Debug, Deserialize)]
struct IonqJob {
    id: String,
    status: String,
    #[serde(default)]
    failure: Option<IonqFailure>,
    #[serde(default)]
    predicted_execution_time_ms: Option<u64>,
    #[serde(default)]
    execution_time_ms: Option<u64>,
    #[serde(default)]
    qubits: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct IonqFailure {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IonqResults {
    shots: u32,
    histogram: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct IonqCredits {
    credits: f64,
}

#[async_trait]
impl Provider for IonqProvider {
    fn id(&self) -> &str {
        "ionq"
    }

    fn name(&self) -> &str {
        "IonQ"
    }

    async fn authenticate(&self) -> HalResult<AuthInfo> {
        // Listing backends both verifies the key and warms nothing up.
        let url = format!("{}/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await.map_err(|err| match err {
            HalError::AuthFailure(msg) => HalError::AuthFailure(msg),
            other => HalError::AuthFailure(other.to_string()),
        })?;
        Ok(AuthInfo::default())
    }

    async fn devices(&self) -> HalResult<Vec<Device>> {
        let url = format!("{}/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let backends: Vec<IonqBackend> = Self::check(response).await?.json().await?;
        Ok(backends
            .iter()
            .map(|info| self.device_from_backend(info))
            .collect())
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
        let input = to_wire(&request.circuit)?;
        debug!(device = %request.device_id, gates = input.circuit.len(), "submitting gate list");

        let url = format!("{}/jobs", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&IonqSubmission {
                target: request.device_id.clone(),
                shots: request.shots,
                input,
            })
            .send()
            .await?;
        let job: IonqJob = Self::check(response).await?.json().await?;

        let failure = job.failure.as_ref().and_then(|f| f.error.as_deref());
        Ok(SubmissionReceipt {
            provider_job_id: ProviderJobId::new(job.id),
            status: normalize_status(&job.status, failure),
            estimated_queue_ms: job.predicted_execution_time_ms,
        })
    }

    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
        let url = format!("{}/jobs/{}", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let job: IonqJob = Self::check(response).await?.json().await?;
        let failure = job.failure.as_ref().and_then(|f| f.error.as_deref());
        Ok(normalize_status(&job.status, failure))
    }

    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
        let url = format!("{}/jobs/{}", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let job: IonqJob = Self::check(response).await?.json().await?;

        let failure = job.failure.as_ref().and_then(|f| f.error.as_deref());
        if normalize_status(&job.status, failure) != ProviderJobStatus::Completed {
            return Err(HalError::NotYetComplete(job_id.0.clone()));
        }

        let url = format!("{}/jobs/{}/results", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let results: IonqResults = Self::check(response).await?.json().await?;

        let counts = normalize_counts(&results.histogram, job.qubits.unwrap_or(1))?;
        let mut result = ExecutionResult::new(counts, results.shots).with_metadata(
            ResultMetadata {
                source_bit_order: BitOrder::LittleEndian,
                extra: serde_json::Map::new(),
            },
        );
        if let Some(ms) = job.execution_time_ms {
            result = result.with_execution_time(ms);
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
        let url = format!("{}/jobs/{}/status/cancel", self.endpoint, job_id.0);
        let response = self.client.put(&url).send().await?;
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
        let url = format!("{}/credits", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let credits: IonqCredits = Self::check(response).await?.json().await?;
        Ok(credits.credits.max(0.0))
    }
}
