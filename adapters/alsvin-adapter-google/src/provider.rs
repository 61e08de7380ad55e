//! Provider implementation over the Quantum Engine REST API.

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

use crate::moments::{WireProgram, to_moments};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.googleapis.com/v1alpha1";

/// Google Quantum Engine provider adapter.
///
/// Circuits travel as moment-grouped JSON. Result bitstrings already put
/// qubit 0 first, so no endianness conversion is needed.
pub struct GoogleProvider {
    client: Client,
    endpoint: String,
    project: String,
}

impl fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GoogleProvider {
    /// Create the adapter from configuration; requires a `project` entry.
    pub fn from_config(config: &ProviderConfig) -> HalResult<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| HalError::Configuration("Google adapter requires a token".into()))?;
        let project = config
            .extra
            .get("project")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                HalError::Configuration("Google adapter requires a 'project' entry".into())
            })?
            .to_string();

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
            project,
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
            StatusCode::TOO_MANY_REQUESTS => HalError::QuotaExceeded(body),
            status if status.is_server_error() => {
                HalError::ServiceUnavailable(format!("{status}: {body}"))
            }
            status => HalError::Provider(format!("{status}: {body}")),
        })
    }

    fn device_from_processor(&self, info: &ProcessorInfo) -> Device {
        let status = match info.health.as_str() {
            "OK" => DeviceStatus::Online,
            "CALIBRATING" => DeviceStatus::Calibrating,
            "MAINTENANCE" => DeviceStatus::Maintenance,
            "DOWN" => DeviceStatus::Offline,
            _ => DeviceStatus::Error,
        };
        Device {
            id: info.name.clone(),
            provider_id: self.id().to_string(),
            name: info.display_name.clone().unwrap_or_else(|| info.name.clone()),
            version: "1".to_string(),
            device_type: DeviceType::Superconducting,
            status,
            topology: Topology::grid(info.grid_rows, info.grid_cols),
            basis_gates: ["x", "y", "z", "h", "s", "t", "rx", "ry", "rz", "cz", "cx", "swap"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_shots: 1_000_000,
            max_experiments: 1,
            simulation_capable: false,
            calibration: Calibration::default(),
            queue: QueueInfo {
                pending_jobs: info.pending_jobs.unwrap_or(0),
                average_wait_ms: info.average_wait_ms.unwrap_or(0),
                priority: 0,
            },
            cost: CostModel::default(),
            max_concurrent_jobs: 8,
        }
    }
}

/// Normalize a Quantum Engine execution state.
fn normalize_status(state: &str, failure: Option<&str>) -> ProviderJobStatus {
    match state {
        "STATE_UNSPECIFIED" | "READY" => ProviderJobStatus::Submitted,
        "QUEUED" => ProviderJobStatus::Queued,
        "RUNNING" => ProviderJobStatus::Running,
        "SUCCESS" => ProviderJobStatus::Completed,
        "CANCELLED" => ProviderJobStatus::Cancelled,
        "FAILURE" => ProviderJobStatus::Failed(failure.unwrap_or("unspecified failure").into()),
        other => ProviderJobStatus::Failed(format!("unknown vendor state {other}")),
    }
}

#[derive(Debug, Deserialize)]
struct ProcessorInfo {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    health: String,
    grid_rows: usize,
    grid_cols: usize,
    #[serde(default)]
    pending_jobs: Option<u32>,
    #[serde(default)]
    average_wait_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProcessorsResponse {
    processors: Vec<ProcessorInfo>,
}

#[derive(Debug, Serialize)]
struct EngineSubmission {
    processor: String,
    repetitions: u32,
    program: WireProgram,
}

#[derive(Debug, Deserialize)]
struct EngineJob {
    name: String,
    #[serde(rename = "executionStatus")]
    execution_status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
struct ExecutionStatus {
    state: String,
    #[serde(default)]
    failure: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EngineResults {
    repetitions: u32,
    /// Bitstring histogram, qubit 0 first.
    histogram: HashMap<String, u64>,
    #[serde(default)]
    execution_duration_ms: Option<u64>,
}

#[async_trait]
impl Provider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Google Quantum Engine"
    }

    async fn authenticate(&self) -> HalResult<AuthInfo> {
        let url = format!("{}/projects/{}", self.endpoint, self.project);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await.map_err(|err| match err {
            HalError::AuthFailure(msg) => HalError::AuthFailure(msg),
            other => HalError::AuthFailure(other.to_string()),
        })?;
        Ok(AuthInfo {
            user: Some(self.project.clone()),
            credits_remaining: None,
        })
    }

    async fn devices(&self) -> HalResult<Vec<Device>> {
        let url = format!("{}/projects/{}/processors", self.endpoint, self.project);
        let response = self.client.get(&url).send().await?;
        let body: ProcessorsResponse = Self::check(response).await?.json().await?;
        Ok(body
            .processors
            .iter()
            .map(|info| self.device_from_processor(info))
            .collect())
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
        let program = to_moments(&request.circuit)?;
        debug!(device = %request.device_id, moments = program.moments.len(), "submitting program");

        let url = format!("{}/projects/{}/jobs", self.endpoint, self.project);
        let response = self
            .client
            .post(&url)
            .json(&EngineSubmission {
                processor: request.device_id.clone(),
                repetitions: request.shots,
                program,
            })
            .send()
            .await?;
        let job: EngineJob = Self::check(response).await?.json().await?;

        Ok(SubmissionReceipt {
            provider_job_id: ProviderJobId::new(job.name),
            status: normalize_status(
                &job.execution_status.state,
                job.execution_status.failure.as_deref(),
            ),
            estimated_queue_ms: None,
        })
    }

    async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
        let url = format!("{}/{}", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let job: EngineJob = Self::check(response).await?.json().await?;
        Ok(normalize_status(
            &job.execution_status.state,
            job.execution_status.failure.as_deref(),
        ))
    }

    async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
        let status = self.job_status(job_id).await?;
        if status != ProviderJobStatus::Completed {
            return Err(HalError::NotYetComplete(job_id.0.clone()));
        }

        let url = format!("{}/{}/results", self.endpoint, job_id.0);
        let response = self.client.get(&url).send().await?;
        let raw: EngineResults = Self::check(response).await?.json().await?;

        let counts = Counts::from_pairs(
            raw.histogram
                .iter()
                .map(|(bitstring, &count)| (bitstring.clone(), count)),
        );
        let mut result = ExecutionResult::new(counts, raw.repetitions).with_metadata(
            ResultMetadata {
                source_bit_order: BitOrder::BigEndian,
                extra: serde_json::Map::new(),
            },
        );
        if let Some(ms) = raw.execution_duration_ms {
            result = result.with_execution_time(ms);
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
        let url = format!("{}/{}:cancel", self.endpoint, job_id.0);
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
        // Quantum Engine bills by project; there is no credit counter.
        Ok(f64::INFINITY)
    }
}
