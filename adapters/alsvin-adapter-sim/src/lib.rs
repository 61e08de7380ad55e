//! Local statevector simulator provider.
//!
//! Runs circuits in process with ideal (noise-free) sampling. Useful as a
//! zero-cost execution target and as the reference backend in tests.
//!
//! ```
//! use alsvin_adapter_sim::SimulatorProvider;
//! use alsvin_hal::{JobRequest, Provider};
//! use alsvin_ir::Circuit;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = SimulatorProvider::new().with_seed(7);
//! let receipt = provider
//!     .submit(&JobRequest {
//!         circuit: Circuit::bell().unwrap(),
//!         device_id: "simulator".to_string(),
//!         shots: 100,
//!     })
//!     .await
//!     .unwrap();
//!
//! let result = provider.job_results(&receipt.provider_job_id).await.unwrap();
//! assert_eq!(result.counts.total(), 100);
//! # }
//! ```

mod provider;
mod statevector;

pub use provider::SimulatorProvider;
pub use statevector::Statevector;
