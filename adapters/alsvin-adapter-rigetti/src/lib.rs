//! Rigetti QCS provider adapter.
//!
//! Circuits travel as Quil text programs; result bitstrings arrive with
//! `ro[0]` rightmost and are normalized to big-endian counts.

mod provider;
mod quil;

pub use provider::{DEFAULT_ENDPOINT, RigettiProvider};
pub use quil::to_quil;
