//! Google Quantum Engine provider adapter.
//!
//! Circuits travel as moment-grouped JSON programs; result histograms are
//! already big-endian bitstrings.

mod moments;
mod provider;

pub use moments::{WireMoment, WireOp, WireProgram, to_moments};
pub use provider::{DEFAULT_ENDPOINT, GoogleProvider};
