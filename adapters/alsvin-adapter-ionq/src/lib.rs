//! IonQ provider adapter.
//!
//! Circuits travel as a gate-list JSON program; result histograms are
//! decimal-keyed with qubit 0 in the least significant bit and are
//! normalized to big-endian counts.

mod provider;
mod wire;

pub use provider::{DEFAULT_ENDPOINT, IonqProvider};
pub use wire::{WireCircuit, WireGate, to_wire};
