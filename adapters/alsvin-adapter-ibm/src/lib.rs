//! IBM Quantum provider adapter.
//!
//! Serializes circuits to `OPENQASM 2.0` (via `alsvin-qasm`), submits them
//! over the IBM Quantum REST API, and normalizes hex-keyed result
//! histograms into big-endian counts.

mod api;
mod provider;

pub use api::{DEFAULT_ENDPOINT, IbmClient};
pub use provider::IbmProvider;
