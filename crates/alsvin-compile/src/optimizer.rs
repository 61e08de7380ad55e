//! Level-driven optimization pipeline.

use tracing::{debug, instrument};

use alsvin_ir::Circuit;

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::passes::{
    CancelInverses, CliffordSimplification, CommuteReorder, IdentityRemoval, MergeRotations,
};

/// How aggressively to optimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    /// Identity removal, inverse cancellation, rotation merging.
    Light,
    /// Adds commutation reordering and Clifford simplification; the result
    /// never has more gates than the input.
    #[default]
    Standard,
    /// Iterates the full pipeline while the gate count keeps shrinking.
    Aggressive,
}

impl OptimizationLevel {
    /// Map the configuration-surface values 1/2/3; out-of-range clamps.
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 | 1 => OptimizationLevel::Light,
            2 => OptimizationLevel::Standard,
            _ => OptimizationLevel::Aggressive,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            OptimizationLevel::Light => 1,
            OptimizationLevel::Standard => 2,
            OptimizationLevel::Aggressive => 3,
        }
    }
}

/// The optimization pipeline.
///
/// Passes run in a fixed order; at level 2 and above any pass whose output
/// has more gates than its input is discarded, so the pipeline never grows
/// a circuit. Level 3 repeats the pipeline up to `max_iterations` times,
/// stopping when a full round no longer strictly reduces the gate count.
pub struct Optimizer {
    level: OptimizationLevel,
    max_iterations: usize,
}

impl Optimizer {
    /// Create an optimizer at the given level with the default iteration cap.
    pub fn new(level: OptimizationLevel) -> Self {
        Self {
            level,
            max_iterations: 10,
        }
    }

    /// Override the level-3 iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    fn passes(&self) -> Vec<Box<dyn Pass>> {
        let mut passes: Vec<Box<dyn Pass>> = vec![
            Box::new(IdentityRemoval),
            Box::new(CancelInverses),
            Box::new(MergeRotations),
        ];
        if self.level != OptimizationLevel::Light {
            passes.push(Box::new(CommuteReorder));
            passes.push(Box::new(CliffordSimplification));
        }
        passes
    }

    /// Optimize a circuit, preserving its unitary up to global phase.
    #[instrument(skip(self, circuit), fields(level = self.level.as_u8()))]
    pub fn optimize(&self, circuit: &Circuit) -> CompileResult<Circuit> {
        validate(circuit)?;

        let mut current = circuit.copy();
        if current.gate_count() == 0 {
            return Ok(current);
        }

        let rounds = if self.level == OptimizationLevel::Aggressive {
            self.max_iterations
        } else {
            1
        };

        let guard_growth = self.level != OptimizationLevel::Light;

        for round in 0..rounds {
            let count_before_round = current.gate_count();

            for pass in self.passes() {
                if !pass.should_run(&current) {
                    continue;
                }
                let mut candidate = current.copy();
                pass.run(&mut candidate)?;
                if guard_growth && candidate.gate_count() > current.gate_count() {
                    debug!(
                        pass = pass.name(),
                        "discarding pass output that grew the circuit"
                    );
                    continue;
                }
                current = candidate;
            }

            debug!(
                round,
                gates = current.gate_count(),
                "optimization round complete"
            );

            if current.gate_count() >= count_before_round {
                break;
            }
        }

        Ok(current)
    }
}

/// Check the structural invariants of the circuit model.
///
/// The builder API enforces these on construction; re-checking here guards
/// circuits assembled through deserialization or foreign wire formats.
pub fn validate(circuit: &Circuit) -> CompileResult<()> {
    for op in circuit.gates() {
        if op.qubits.len() != op.gate.num_qubits() {
            return Err(CompileError::InvalidCircuit(format!(
                "gate {} has {} operands, expects {}",
                op.gate.name(),
                op.qubits.len(),
                op.gate.num_qubits()
            )));
        }
        for &q in &op.qubits {
            if q >= circuit.num_qubits() {
                return Err(CompileError::InvalidCircuit(format!(
                    "gate {} references qubit {q} in a {}-qubit circuit",
                    op.gate.name(),
                    circuit.num_qubits()
                )));
            }
        }
    }
    for m in circuit.measurements() {
        if m.qubit >= circuit.num_qubits() {
            return Err(CompileError::InvalidCircuit(format!(
                "measurement references qubit {} in a {}-qubit circuit",
                m.qubit,
                circuit.num_qubits()
            )));
        }
    }
    Ok(())
}
