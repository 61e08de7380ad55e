//! IBM Quantum REST API client.
//!
//! Speaks the backend-listing and job endpoints of the IBM Quantum
//! platform. Circuits travel as `OPENQASM 2.0` text; counts come back as
//! hex-keyed histograms over the classical register.

use std::fmt;

use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use alsvin_hal::{HalError, HalResult};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.quantum-computing.ibm.com/v1";

/// User-Agent sent with requests.
const USER_AGENT: &str = "alsvin/0.4 (quantum-orchestrator)";

/// IBM Quantum API client.
pub struct IbmClient {
    client: Client,
    endpoint: String,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl IbmClient {
    /// Create a client with a bearer token.
    pub fn new(endpoint: impl Into<String>, token: &str) -> HalResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HalError::Configuration("invalid token characters".into()))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Verify the token against the account endpoint.
    pub async fn whoami(&self) -> HalResult<AccountInfo> {
        let url = format!("{}/users/me", self.endpoint);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await?.json().await.map_err(Into::into)
    }

    /// List backends visible to the account.
    pub async fn list_backends(&self) -> HalResult<Vec<BackendInfo>> {
        let url = format!("{}/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let body: BackendsResponse = Self::check(response).await?.json().await?;
        Ok(body.backends)
    }

    /// Submit a QASM program.
    pub async fn submit_job(&self, request: &JobSubmission) -> HalResult<JobInfo> {
        let url = format!("{}/jobs", self.endpoint);
        let response = self.client.post(&url).json(request).send().await?;
        Self::check(response).await?.json().await.map_err(Into::into)
    }

    /// Fetch one job.
    pub async fn get_job(&self, job_id: &str) -> HalResult<JobInfo> {
        let url = format!("{}/jobs/{job_id}", self.endpoint);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await?.json().await.map_err(Into::into)
    }

    /// Fetch the results of a completed job.
    pub async fn get_job_result(&self, job_id: &str) -> HalResult<JobResult> {
        let url = format!("{}/jobs/{job_id}/results", self.endpoint);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await?.json().await.map_err(Into::into)
    }

    /// Request cancellation.
    pub async fn cancel_job(&self, job_id: &str) -> HalResult<bool> {
        let url = format!("{}/jobs/{job_id}/cancel", self.endpoint);
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

    /// Remaining account credits.
    pub async fn credits(&self) -> HalResult<f64> {
        let account = self.whoami().await?;
        Ok(account.credits_remaining.unwrap_or(0.0).max(0.0))
    }

    /// Map HTTP errors onto the provider error taxonomy.
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
}

/// `GET /users/me` response.
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub email: Option<String>,
    #[serde(rename = "creditsRemaining")]
    pub credits_remaining: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BackendsResponse {
    backends: Vec<BackendInfo>,
}

/// One backend as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub n_qubits: usize,
    #[serde(default)]
    pub basis_gates: Vec<String>,
    #[serde(default)]
    pub coupling_map: Vec<(usize, usize)>,
    #[serde(default)]
    pub simulator: bool,
    #[serde(default)]
    pub operational: bool,
    #[serde(default)]
    pub status_msg: Option<String>,
    #[serde(default)]
    pub pending_jobs: u32,
    #[serde(default)]
    pub max_shots: Option<u32>,
    #[serde(default)]
    pub max_experiments: Option<u32>,
}

/// `POST /jobs` body.
#[derive(Debug, Serialize)]
pub struct JobSubmission {
    pub backend: String,
    pub shots: u32,
    pub qasm: String,
}

/// Job record returned by the API.
#[derive(Debug, Deserialize)]
pub struct JobInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub estimated_start_ms: Option<u64>,
}

/// Result payload of a completed job.
#[derive(Debug, Deserialize)]
pub struct JobResult {
    pub shots: u32,
    /// Hex-keyed histogram (`"0x3": 512`), clbit 0 in the least
    /// significant bit.
    pub counts: HashMap<String, u64>,
    #[serde(default)]
    pub time_taken_ms: Option<u64>,
    #[serde(default)]
    pub queue_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = IbmClient::new(DEFAULT_ENDPOINT, "very-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_submission_serializes() {
        let submission = JobSubmission {
            backend: "ibm_kyiv".to_string(),
            shots: 1024,
            qasm: "OPENQASM 2.0;".to_string(),
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["backend"], "ibm_kyiv");
        assert_eq!(json["shots"], 1024);
    }

    #[test]
    fn test_result_deserializes() {
        let body = r#"{"shots": 100, "counts": {"0x0": 52, "0x3": 48}, "time_taken_ms": 220}"#;
        let result: JobResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.shots, 100);
        assert_eq!(result.counts["0x3"], 48);
    }
}
