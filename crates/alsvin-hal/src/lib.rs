//! Alsvin provider abstraction layer.
//!
//! A uniform contract over heterogeneous quantum providers:
//!
//! - The [`Provider`] trait: authenticate, list devices, submit, poll,
//!   fetch results, cancel, query credits
//! - [`Device`] descriptors with calibration data and a composite
//!   [`health score`](Device::health_score)
//! - The [`ProviderSupervisor`]: parallel initialization, per-provider
//!   status, periodic health checks, and best-eligible-device selection
//!   across the whole catalog
//! - [`ProviderRegistry`]: a closed table of adapter factories
//! - Deadline and retry helpers shared by every adapter
//!
//! # Implementing an adapter
//!
//! ```ignore
//! use alsvin_hal::{
//!     AuthInfo, Device, ExecutionResult, HalResult, JobRequest, Provider,
//!     ProviderJobId, ProviderJobStatus, SubmissionReceipt,
//! };
//! use async_trait::async_trait;
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl Provider for MyProvider {
//!     fn id(&self) -> &str { "my-vendor" }
//!     fn name(&self) -> &str { "My Vendor" }
//!
//!     async fn authenticate(&self) -> HalResult<AuthInfo> {
//!         # todo!()
//!     }
//!
//!     async fn devices(&self) -> HalResult<Vec<Device>> {
//!         # todo!()
//!     }
//!
//!     async fn submit(&self, request: &JobRequest) -> HalResult<SubmissionReceipt> {
//!         // Convert request.circuit to the vendor wire format and POST it.
//!         # todo!()
//!     }
//!
//!     async fn job_status(&self, job_id: &ProviderJobId) -> HalResult<ProviderJobStatus> {
//!         # todo!()
//!     }
//!
//!     async fn job_results(&self, job_id: &ProviderJobId) -> HalResult<ExecutionResult> {
//!         # todo!()
//!     }
//!
//!     async fn cancel(&self, job_id: &ProviderJobId) -> HalResult<bool> {
//!         # todo!()
//!     }
//!
//!     async fn credits_remaining(&self) -> HalResult<f64> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod provider;
pub mod registry;
pub mod result;
pub mod retry;
pub mod supervisor;

pub use config::ProviderConfig;
pub use device::{
    Calibration, CostModel, DEFAULT_GATE_ERROR, Device, DeviceStatus, DeviceType, QueueInfo,
};
pub use error::{HalError, HalResult};
pub use provider::{
    AuthInfo, JobRequest, Provider, ProviderJobId, ProviderJobStatus, SubmissionReceipt,
};
pub use registry::ProviderRegistry;
pub use result::{BitOrder, Counts, ExecutionResult, ResultMetadata};
pub use retry::{Deadlines, retry_transient, with_deadline};
pub use supervisor::{
    CatalogEntry, DEFAULT_HEALTH_CHECK_INTERVAL, DeviceConstraints, HealthReport, OverallHealth,
    ProviderStatus, ProviderSupervisor,
};

/// Gate names every standard-gate circuit can be expressed in.
pub fn universal_basis() -> Vec<String> {
    [
        "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz", "p",
        "u", "cx", "cy", "cz", "ch", "swap", "crx", "cry", "crz", "cp", "rxx", "ryy", "rzz",
        "ccx", "cswap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
