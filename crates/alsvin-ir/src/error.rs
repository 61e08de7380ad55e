//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building or transforming circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A gate references a qubit outside the circuit.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit circuit (gate {gate})")]
    QubitOutOfRange {
        qubit: usize,
        num_qubits: usize,
        gate: String,
    },

    /// A measurement references a qubit outside the circuit.
    #[error("Measurement qubit {qubit} out of range for {num_qubits}-qubit circuit")]
    MeasureOutOfRange { qubit: usize, num_qubits: usize },

    /// Gate arity does not match the number of qubit operands.
    #[error("Gate {gate} expects {expected} qubits, got {got}")]
    QubitCountMismatch {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// The same qubit appears twice in one gate's operand tuple.
    #[error("Duplicate qubit {qubit} in operands of gate {gate}")]
    DuplicateQubit { qubit: usize, gate: String },

    /// Two circuits with different widths cannot be composed.
    #[error("Cannot compose circuits with {left} and {right} qubits")]
    SizeMismatch { left: usize, right: usize },

    /// Requested slice bounds fall outside the gate sequence.
    #[error("Slice {start}..{end} out of bounds for {len} gates")]
    SliceOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The full unitary would be too large to materialize.
    #[error("Refusing to build a {num_qubits}-qubit unitary (limit {limit})")]
    UnitaryTooLarge { num_qubits: usize, limit: usize },

    /// A gate matrix failed the unitarity check.
    #[error("Matrix for gate {gate} is not unitary")]
    NonUnitary { gate: String },

    /// Unknown gate name (e.g. from a wire-format parser).
    #[error("Unknown gate: {0}")]
    UnknownGate(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
