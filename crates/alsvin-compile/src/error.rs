//! Error types for the compile crate.

use thiserror::Error;

/// Errors that can occur during optimization and routing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The input circuit violates a model invariant.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// No trial produced a routing within the swap budget.
    #[error("Could not route circuit onto topology: {0}")]
    UnroutableCircuit(String),

    /// A gate has no rewrite into the target basis.
    #[error("Gate {0} cannot be expressed in the target basis")]
    GateNotInBasis(String),

    /// The topology is too small for the circuit.
    #[error("Circuit needs {needed} qubits but topology has {available}")]
    TopologyTooSmall { needed: usize, available: usize },

    /// An IR operation failed.
    #[error(transparent)]
    Ir(#[from] alsvin_ir::IrError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
