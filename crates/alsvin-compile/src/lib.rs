//! Alsvin circuit optimization and routing.
//!
//! Two entry points:
//!
//! - [`Optimizer::optimize`] rewrites a circuit without changing its
//!   unitary (up to global phase): identity removal, inverse cancellation,
//!   rotation merging, and commutation reordering at higher levels.
//! - [`route`] maps a circuit onto a device [`Topology`], inserting SWAPs
//!   so that every two-qubit gate acts on connected physical qubits.
//!   [`decompose_to_basis`] rewrites gates into a device's native set
//!   first.
//!
//! [`transpile`] chains all three for a target device.
//!
//! # Example
//!
//! ```
//! use alsvin_compile::{Optimizer, OptimizationLevel};
//! use alsvin_ir::Circuit;
//!
//! let mut circuit = Circuit::new("redundant", 1);
//! circuit.h(0).unwrap().h(0).unwrap().x(0).unwrap();
//!
//! let optimizer = Optimizer::new(OptimizationLevel::Standard);
//! let optimized = optimizer.optimize(&circuit).unwrap();
//! assert_eq!(optimized.gate_count(), 1);
//! ```

pub mod error;
pub mod optimizer;
pub mod pass;
pub mod passes;
pub mod route;

pub use error::{CompileError, CompileResult};
pub use optimizer::{OptimizationLevel, Optimizer, validate};
pub use pass::Pass;
pub use route::{BasisGates, Layout, RouterOptions, RoutingResult, decompose_to_basis, route};

use alsvin_ir::{Circuit, Topology};

/// Optimize, decompose to the device basis, and route in one step.
///
/// This is the full pipeline a circuit goes through before submission to a
/// hardware device.
pub fn transpile(
    circuit: &Circuit,
    topology: &Topology,
    basis: &BasisGates,
    level: OptimizationLevel,
    options: &RouterOptions,
) -> CompileResult<RoutingResult> {
    let optimized = Optimizer::new(level).optimize(circuit)?;
    let decomposed = decompose_to_basis(&optimized, basis)?;
    let routed = route(&decomposed, topology, options)?;

    // Inserted SWAPs sit on connected pairs, so rewriting them afterwards
    // (3 CX on the same pair) keeps the circuit physically valid.
    if basis.contains("swap") || routed.swap_count == 0 {
        return Ok(routed);
    }
    Ok(RoutingResult {
        circuit: decompose_to_basis(&routed.circuit, basis)?,
        layout: routed.layout,
        swap_count: routed.swap_count,
    })
}
